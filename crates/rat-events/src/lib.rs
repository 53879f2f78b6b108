//! Canonical key events (`KeyEvent`) and the terminal event envelope they
//! travel in, shared by `rat-terminal` (produces them), `rat-input` (accumulates
//! them into sequences), and `rat-keymap` (matches them against bindings).

pub mod key;
pub mod terminal_event;

pub use key::{parse_key, parse_key_sequence, KeyCode, KeyEvent, KeyParseError, NamedKey};
pub use terminal_event::TerminalEvent;
