//! A single decoded character with its current terminal style.

use crate::style::TermStyle;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StyledRune {
    pub ch: char,
    pub style: TermStyle,
}

impl StyledRune {
    pub const fn new(ch: char, style: TermStyle) -> Self {
        Self { ch, style }
    }
}

/// Builds a `Vec<StyledRune>` from a plain string and a single style, for header lines,
/// prompts, and other static chrome that never carries SGR sequences of its own.
pub fn styled_runes_from_str(s: &str, style: TermStyle) -> Vec<StyledRune> {
    s.chars().map(|ch| StyledRune::new(ch, style)).collect()
}
