//! `KeyEvent`s and the key-string grammar used in config files and bindings:
//!
//! ```text
//! key    ::= mods token
//! mods   ::= ("C-" | "M-" | "S-")*
//! token  ::= namedKey | char
//! keySeq ::= key ("," key)*
//! ```

use std::fmt;

use thiserror::Error;

/// A named (non-printable) key, as reported by the terminal backend or written
/// literally in a config file / key binding string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NamedKey {
    F(u8),
    Insert,
    Delete,
    Home,
    End,
    PgUp,
    PgDn,
    Up,
    Down,
    Left,
    Right,
    Tab,
    Backspace,
    Enter,
    Esc,
    Space,
}

impl NamedKey {
    fn name(self) -> String {
        match self {
            NamedKey::F(n) => format!("f{n}"),
            NamedKey::Insert => "insert".into(),
            NamedKey::Delete => "delete".into(),
            NamedKey::Home => "home".into(),
            NamedKey::End => "end".into(),
            NamedKey::PgUp => "pgup".into(),
            NamedKey::PgDn => "pgdn".into(),
            NamedKey::Up => "up".into(),
            NamedKey::Down => "down".into(),
            NamedKey::Left => "left".into(),
            NamedKey::Right => "right".into(),
            NamedKey::Tab => "tab".into(),
            NamedKey::Backspace => "backspace".into(),
            NamedKey::Enter => "enter".into(),
            NamedKey::Esc => "esc".into(),
            NamedKey::Space => "space".into(),
        }
    }

    fn parse(token: &str) -> Option<Self> {
        let lower = token.to_ascii_lowercase();
        if let Some(rest) = lower.strip_prefix('f') {
            if let Ok(n) = rest.parse::<u8>() {
                if (1..=12).contains(&n) {
                    return Some(NamedKey::F(n));
                }
            }
            return None;
        }
        Some(match lower.as_str() {
            "insert" => NamedKey::Insert,
            "delete" => NamedKey::Delete,
            "home" => NamedKey::Home,
            "end" => NamedKey::End,
            "pgup" => NamedKey::PgUp,
            "pgdn" => NamedKey::PgDn,
            "up" => NamedKey::Up,
            "down" => NamedKey::Down,
            "left" => NamedKey::Left,
            "right" => NamedKey::Right,
            "tab" => NamedKey::Tab,
            "backspace" => NamedKey::Backspace,
            "enter" => NamedKey::Enter,
            "esc" => NamedKey::Esc,
            "space" => NamedKey::Space,
            _ => return None,
        })
    }
}

/// The token half of a `KeyEvent`: either a named key or a single (already
/// case-folded) printable rune.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyCode {
    Named(NamedKey),
    Char(char),
}

/// `(ctrl, meta, shift, key-code or rune)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KeyEvent {
    pub ctrl: bool,
    pub meta: bool,
    pub shift: bool,
    pub code: KeyCode,
}

impl KeyEvent {
    pub const fn new(code: KeyCode, ctrl: bool, meta: bool, shift: bool) -> Self {
        Self {
            ctrl,
            meta,
            shift,
            code,
        }
    }

    pub const fn plain(ch: char) -> Self {
        Self::new(KeyCode::Char(ch), false, false, false)
    }

    pub const fn named(key: NamedKey) -> Self {
        Self::new(KeyCode::Named(key), false, false, false)
    }

    /// Maps a raw printable rune to a canonical key event the way the terminal
    /// backend does: uppercase letters fold to lowercase with `shift` set.
    pub fn from_rune(ch: char, ctrl: bool, meta: bool) -> Self {
        let shift = ch.is_uppercase();
        let folded = ch.to_lowercase().next().unwrap_or(ch);
        Self::new(KeyCode::Char(folded), ctrl, meta, shift)
    }
}

impl fmt::Display for KeyEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.ctrl {
            write!(f, "C-")?;
        }
        if self.meta {
            write!(f, "M-")?;
        }
        if self.shift {
            write!(f, "S-")?;
        }
        match self.code {
            KeyCode::Named(n) => write!(f, "{}", n.name()),
            KeyCode::Char(c) => write!(f, "{c}"),
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum KeyParseError {
    #[error("empty key token")]
    Empty,
    #[error("unrecognised key token `{0}`")]
    UnknownToken(String),
}

/// Parses a single `key` per the grammar: zero or more `C-`/`M-`/`S-` prefixes
/// followed by a named key or a single character.
pub fn parse_key(s: &str) -> Result<KeyEvent, KeyParseError> {
    if s.is_empty() {
        return Err(KeyParseError::Empty);
    }

    let mut rest = s;
    let mut ctrl = false;
    let mut meta = false;
    let mut shift = false;

    loop {
        if let Some(r) = rest.strip_prefix("C-") {
            ctrl = true;
            rest = r;
        } else if let Some(r) = rest.strip_prefix("M-") {
            meta = true;
            rest = r;
        } else if let Some(r) = rest.strip_prefix("S-") {
            shift = true;
            rest = r;
        } else {
            break;
        }
    }

    if rest.is_empty() {
        return Err(KeyParseError::Empty);
    }

    if let Some(named) = NamedKey::parse(rest) {
        return Ok(KeyEvent::new(KeyCode::Named(named), ctrl, meta, shift));
    }

    let mut chars = rest.chars();
    let first = chars.next().expect("rest is non-empty");
    if chars.next().is_some() {
        return Err(KeyParseError::UnknownToken(rest.to_string()));
    }

    let is_upper = first.is_uppercase();
    let folded = first.to_lowercase().next().unwrap_or(first);
    Ok(KeyEvent::new(
        KeyCode::Char(folded),
        ctrl,
        meta,
        shift || is_upper,
    ))
}

/// Parses a `,`-separated `keySeq`.
pub fn parse_key_sequence(s: &str) -> Result<Vec<KeyEvent>, KeyParseError> {
    s.split(',').map(parse_key).collect()
}
