//! The streaming, concurrently-annotated buffer: an append-only rune grid fed
//! by one ingest task and indexed by a growing set of [`Annotation`]s inserted by
//! any number of annotator tasks.

pub mod annotation;
pub mod buffer;
pub mod reader;

pub use annotation::Annotation;
pub use buffer::{Buffer, BufferGuard};
pub use reader::BufferReader;
