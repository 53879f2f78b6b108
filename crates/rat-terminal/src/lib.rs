//! Terminal backend: a crossterm-backed implementation of the cell-grid
//! contract, plus the async input stream every pager-stack consumer polls.
//!
//! Builds on the raw-mode/alt-screen enter/leave lifecycle and the
//! `Drop`-guarded `TerminalGuard` RAII pattern, generalised with the
//! `size()`/cell-writing/event-stream surface a pager stack needs that a
//! single-view terminal backend did not expose directly.

pub mod backend;
pub mod events;
pub mod frame;

pub use backend::{CrosstermBackend, TerminalBackend, TerminalGuard};
pub use frame::CellWriter;
