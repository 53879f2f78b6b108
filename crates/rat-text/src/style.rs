//! Terminal style attributes and interning.
//!
//! A [`TermStyle`] packs a foreground and background [`Attr`]: each `Attr` is a base
//! colour (default, or index 1..=256) plus a handful of boolean attributes. Styles are
//! interned so that value-equal instances share identity, a style-caching pattern
//! worth keeping on any render-path hot data.

use bitflags::bitflags;
use std::collections::HashMap;
use std::sync::Mutex;

bitflags! {
    /// Boolean attribute bits, stored alongside a colour index in [`Attr`].
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct AttrFlags: u8 {
        const BOLD      = 0b0001;
        const UNDERLINE = 0b0010;
        const REVERSE   = 0b0100;
    }
}

/// A colour (default, or 1..=256) combined with boolean attributes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Attr {
    /// `0` means "default colour"; `1..=256` is a colour index (1 + the 0-based palette index).
    pub color: u16,
    pub flags: AttrFlags,
}

impl Attr {
    pub const fn default_color() -> Self {
        Self {
            color: 0,
            flags: AttrFlags::empty(),
        }
    }

    pub fn with_color(self, color: u16) -> Self {
        Self {
            color,
            flags: self.flags,
        }
    }

    pub fn is_default_color(self) -> bool {
        self.color == 0
    }
}

/// `(fg, bg)` pair. Cheaply `Copy`; identical `TermStyle`s produced by [`TermStyles::get`]
/// are the same interned value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TermStyle {
    pub fg: Attr,
    pub bg: Attr,
}

impl TermStyle {
    pub const fn default_style() -> Self {
        Self {
            fg: Attr::default_color(),
            bg: Attr::default_color(),
        }
    }
}

impl Default for TermStyle {
    fn default() -> Self {
        Self::default_style()
    }
}

/// An interning cache for [`TermStyle`] values, keyed by `(fg, bg)`.
///
/// The scanner constructs many transient `(fg, bg)` pairs while walking SGR
/// sequences; interning keeps the buffer's per-rune style field a cheap `Copy`
/// without re-allocating for repeated styles.
#[derive(Default)]
pub struct TermStyles {
    cache: Mutex<HashMap<(Attr, Attr), TermStyle>>,
}

impl TermStyles {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, fg: Attr, bg: Attr) -> TermStyle {
        let mut cache = self.cache.lock().expect("term style cache poisoned");
        *cache.entry((fg, bg)).or_insert(TermStyle { fg, bg })
    }

    pub fn default_style(&self) -> TermStyle {
        self.get(Attr::default_color(), Attr::default_color())
    }
}
