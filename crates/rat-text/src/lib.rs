//! Styled-rune decoding and the minimal acyclic trie used by the literal-match
//! annotator. These are the lowest-level, dependency-free building blocks of `rat`: every
//! other crate in the workspace either consumes the types defined here or wraps the
//! scanner in a concurrency model of its own.

pub mod point;
pub mod rune;
pub mod scanner;
pub mod style;
pub mod trie;

pub use point::{BufferPoint, PositionedRune};
pub use rune::{styled_runes_from_str, StyledRune};
pub use scanner::{StyledRuneOut, StyledRuneReader};
pub use style::{Attr, AttrFlags, TermStyle, TermStyles};
pub use trie::{Trie, TrieCursor, TrieError};
