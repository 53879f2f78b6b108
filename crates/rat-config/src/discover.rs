//! Locates the user's config file: `$RATRC`, then `$XDG_CONFIG_HOME/rat/ratrc`
//! (or `~/.config/rat/ratrc`), then `~/.ratrc`. Returns `None` if none of
//! those paths exist (an override path from the CLI is never subject to this
//! search — it's used as-is).

use std::path::PathBuf;

pub fn discover() -> Option<PathBuf> {
    if let Ok(explicit) = std::env::var("RATRC") {
        let path = PathBuf::from(explicit);
        if path.exists() {
            return Some(path);
        }
    }

    if let Some(config_dir) = dirs::config_dir() {
        let path = config_dir.join("rat").join("ratrc");
        if path.exists() {
            return Some(path);
        }
    }

    if let Some(home) = dirs::home_dir() {
        let path = home.join(".ratrc");
        if path.exists() {
            return Some(path);
        }
    }

    None
}
