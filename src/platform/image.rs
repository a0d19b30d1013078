//! Portrait encoding into `data:` URIs

use std::path::Path;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ImageError {
    #[error("Failed to read image {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Image file is empty: {0}")]
    Empty(String),
}

/// MIME type guessed from the file extension
pub fn mime_for_path(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());
    match ext.as_deref() {
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("bmp") => "image/bmp",
        Some("svg") => "image/svg+xml",
        _ => "application/octet-stream",
    }
}

/// Encode raw bytes as `data:<mime>;base64,<payload>`
pub fn encode_image_bytes(mime: &str, bytes: &[u8]) -> String {
    format!("data:{mime};base64,{}", STANDARD.encode(bytes))
}

/// Read an image file and encode it for embedding in a record
#[cfg(not(target_arch = "wasm32"))]
pub fn encode_image_file(path: &Path) -> Result<String, ImageError> {
    let bytes = std::fs::read(path).map_err(|source| ImageError::Read {
        path: path.display().to_string(),
        source,
    })?;
    if bytes.is_empty() {
        return Err(ImageError::Empty(path.display().to_string()));
    }
    Ok(encode_image_bytes(mime_for_path(path), &bytes))
}
