//! Loads and parses the directive-based config file that wires up modes, key
//! bindings, and annotators.

pub mod directive;
pub mod discover;
pub mod parser;

use std::path::Path;

pub use directive::{Action, AnnotatorDirective, BindKey, Config, ModeBlock};
pub use parser::ConfigError;

/// The built-in config, loaded before any user file. Cursor movement, paging,
/// reload, and parent-cursor replay are wired up in code regardless of this
/// file's contents; this just demonstrates the `mode`/`annotate`/`bindkey`
/// grammar with one starter mode a user file can build on via `source`.
const DEFAULT_RATRC: &str = "\
mode ls
    annotate regex file \\S+
    bindkey l file >cat %(file)
end
";

/// Loads the built-in defaults, then the user's config (`override_path` if
/// given, otherwise the result of [`discover::discover`]) on top of them.
/// Never fails outright: a missing or unreadable user file is reported as a
/// diagnostic in the returned list, and the defaults are still usable.
pub fn load(override_path: Option<&Path>) -> (Config, Vec<ConfigError>) {
    let (mut config, mut errors) = parser::parse_str(DEFAULT_RATRC, "<builtin>");

    let user_path = override_path.map(Path::to_path_buf).or_else(discover::discover);
    if let Some(path) = user_path {
        let (user_config, user_errors) = parser::load_file(&path);
        config.merge(user_config);
        errors.extend(user_errors);
    }

    (config, errors)
}
