//! A single pager: the buffer, annotators, key bindings, and scroll window
//! behind one entry in a pager stack.

pub mod handler;
pub mod mode;
pub mod pager;
pub mod prompt;
pub mod reload;

pub use handler::{Effect, ResolvedAction};
pub use pager::{HandleOutcome, Pager, Rendered, Source};
pub use prompt::{ConfirmOutcome, ConfirmPrompt, TextOutcome, TextPrompt};
pub use reload::ReloadWatcher;
