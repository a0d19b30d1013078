//! Character Vault entry point
//!
//! Native builds run a line-oriented terminal front-end over a file store.
//! The browser build starts from `wasm_main` and is driven by `web::CharacterVault`.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(not(target_arch = "wasm32"))]
mod terminal {
    use std::io::{self, BufRead, Write};
    use std::path::{Path, PathBuf};

    use character_vault::consts::PROPERTY_SLOTS;
    use character_vault::controller::ViewState;
    use character_vault::persistence::{CharacterStore, FileStore, KeyValueStore, MemoryStore};
    use character_vault::platform::{self, Prompter};
    use character_vault::{
        BasicField, Character, CharacterId, Controller, PropertyEdit, Settings, ViewMode,
    };

    /// Asks on stdout and reads y/n from stdin
    struct StdinPrompter;

    impl Prompter for StdinPrompter {
        fn confirm(&self, message: &str) -> bool {
            print!("{message} [y/N] ");
            let _ = io::stdout().flush();
            let mut line = String::new();
            if io::stdin().lock().read_line(&mut line).is_err() {
                return false;
            }
            matches!(line.trim().to_lowercase().as_str(), "y" | "yes")
        }

        fn alert(&self, message: &str) {
            println!("! {message}");
        }
    }

    const HELP: &str = "\
list                      show all characters
new                       start a new character
edit <id>                 open a character
delete <id>               delete a character
set <field> <value>       name, gender, age, capacity, appearance, powerRecovery
prop <1-8> <field> <val>  name, look, genre, strength, notes, broken
image <path>              attach a portrait
noimage                   remove the portrait
show                      print the open sheet
save                      save the open sheet
back                      return to the list without saving
quit                      exit";

    fn print_list<S: KeyValueStore>(c: &Controller<S, StdinPrompter>) {
        let entries = c.list_entries();
        if entries.is_empty() {
            println!("No characters yet. Use `new` to create one.");
            return;
        }
        for entry in entries {
            let img = if entry.has_image { "[img]" } else { "[   ]" };
            let name = &entry.display_name;
            println!("{img} {:>14}  {name}  {}", entry.id, entry.summary);
        }
    }

    fn print_sheet(ch: &Character) {
        println!("id: {}", ch.id);
        for field in BasicField::ALL {
            println!("{:>14}: {}", field.as_str(), ch.field(field));
        }
        let image = match &ch.image {
            Some(uri) => format!("{} bytes", uri.len()),
            None => "none".to_string(),
        };
        println!("{:>14}: {image}", "image");
        for (i, p) in ch.properties.iter().enumerate() {
            let broken = if p.broken { " (broken)" } else { "" };
            println!(
                "  #{} {} | look:{} genre:{} strength:{} notes:{}{broken}",
                i + 1,
                p.name,
                p.look,
                p.genre,
                p.strength,
                p.notes
            );
        }
    }

    /// Returns false when the user asked to quit
    fn dispatch<S: KeyValueStore>(c: &mut Controller<S, StdinPrompter>, line: &str) -> bool {
        let mut parts = line.trim().splitn(2, char::is_whitespace);
        let cmd = parts.next().unwrap_or("");
        let rest = parts.next().unwrap_or("").trim();

        match cmd {
            "" => {}
            "help" | "?" => println!("{HELP}"),
            "quit" | "exit" => return false,
            "list" | "ls" => print_list(c),
            "new" => match c.start_create() {
                Some(id) => println!("Editing new character {id}"),
                None => println!("Finish or `back` out of the open sheet first"),
            },
            "edit" => {
                if !c.start_edit(&CharacterId::new(rest)) && c.view_mode() == ViewMode::List {
                    println!("No character {rest}");
                }
            }
            "delete" | "rm" => {
                if c.delete_character(&CharacterId::new(rest)) {
                    println!("Deleted {rest}");
                }
            }
            "set" => {
                let (field, value) = split_arg(rest);
                let result = field
                    .parse::<BasicField>()
                    .map_err(|e| e.to_string())
                    .and_then(|f| c.update_field(f, value).map_err(|e| e.to_string()));
                if let Err(e) = result {
                    println!("{e}");
                }
            }
            "prop" => {
                let (slot, rest) = split_arg(rest);
                let (field, value) = split_arg(rest);
                let index = match slot.parse::<usize>() {
                    Ok(n) if (1..=PROPERTY_SLOTS).contains(&n) => n - 1,
                    _ => {
                        println!("Property number must be 1-{PROPERTY_SLOTS}");
                        return true;
                    }
                };
                let result = match PropertyEdit::parse(field, value) {
                    Ok(edit) => c.update_property(index, edit).map_err(|e| e.to_string()),
                    Err(e) => Err(e.to_string()),
                };
                if let Err(e) = result {
                    println!("{e}");
                }
            }
            "image" => attach_image(c, Path::new(rest)),
            "noimage" => {
                if let Err(e) = c.clear_image() {
                    println!("{e}");
                }
            }
            "show" => match c.view() {
                ViewState::Sheet(session) => print_sheet(session.character()),
                ViewState::List => print_list(c),
            },
            "save" => {
                if let Ok(id) = c.save() {
                    println!("Saved {id}");
                    if !c.is_synced() {
                        println!("! Could not write to storage; changes are kept until exit");
                    }
                }
            }
            "back" => {
                c.cancel_edit();
            }
            other => println!("Unknown command `{other}` (try `help`)"),
        }
        true
    }

    fn split_arg(s: &str) -> (&str, &str) {
        let mut parts = s.splitn(2, char::is_whitespace);
        let head = parts.next().unwrap_or("");
        (head, parts.next().unwrap_or("").trim())
    }

    fn attach_image<S: KeyValueStore>(c: &mut Controller<S, StdinPrompter>, path: &Path) {
        let Some(ticket) = c.begin_image() else {
            println!("Open a character first");
            return;
        };
        if path.as_os_str().is_empty() {
            c.complete_image(ticket, None);
            return;
        }
        match platform::encode_image_file(path) {
            Ok(uri) => {
                c.complete_image(ticket, Some(uri));
            }
            Err(e) => {
                log::error!("{e}");
                println!("{e}");
            }
        }
    }

    fn run_loop<S: KeyValueStore>(mut c: Controller<S, StdinPrompter>) {
        print_list(&c);
        let stdin = io::stdin();
        loop {
            let prompt = match c.session() {
                Some(ch) => format!("{}> ", ch.display_name()),
                None => "vault> ".to_string(),
            };
            print!("{prompt}");
            let _ = io::stdout().flush();

            let mut line = String::new();
            match stdin.lock().read_line(&mut line) {
                Ok(0) => break,
                Ok(_) => {
                    if !dispatch(&mut c, &line) {
                        break;
                    }
                }
                Err(e) => {
                    log::error!("stdin: {e}");
                    break;
                }
            }
        }
    }

    pub fn run() {
        let settings = std::env::args()
            .nth(1)
            .map(|path| Settings::load_from(&PathBuf::from(path)))
            .unwrap_or_default();

        println!("Character Vault (type `help` for commands)");
        match FileStore::open(&settings.data_dir) {
            Ok(files) => {
                log::info!("Using data directory {}", files.dir().display());
                let store = CharacterStore::new(files, settings.storage_key.clone());
                run_loop(Controller::new(store, StdinPrompter, &settings));
            }
            Err(e) => {
                log::error!("{e}; characters will not persist");
                let store = CharacterStore::new(MemoryStore::new(), settings.storage_key.clone());
                run_loop(Controller::new(store, StdinPrompter, &settings));
            }
        }
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn wasm_main() {
    console_error_panic_hook::set_once();
    if console_log::init_with_level(log::Level::Info).is_err() {
        web_sys::console::warn_1(&"Logger already initialized".into());
    }
    log::info!("Character Vault starting...");
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::init();
    log::info!("Character Vault (native) starting...");
    terminal::run();
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}
