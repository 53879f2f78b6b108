//! The three annotator kinds a mode can attach to a buffer: literal dictionary
//! matches, regular expressions, and arbitrary external programs. Each is
//! compiled once (building its `Trie`/`Regex`, or just capturing the command
//! line) and then run to completion inside a blocking task, inserting the
//! annotations it finds into the buffer as it goes.

pub mod external;
pub mod literal;
pub mod regex_annot;

use std::collections::HashMap;
use std::sync::Arc;

use rat_buffer::reader::BufferReader;
use rat_buffer::Buffer;
use rat_text::trie::Trie;
use regex::Regex;
use thiserror::Error;
use tracing::{info, warn};

pub use external::ExternalAnnotatorError;
pub use literal::LiteralAnnotatorError;
pub use regex_annot::RegexAnnotatorError;

#[derive(Debug, Error)]
pub enum AnnotatorError {
    #[error(transparent)]
    Literal(#[from] LiteralAnnotatorError),
    #[error(transparent)]
    Regex(#[from] RegexAnnotatorError),
    #[error(transparent)]
    External(#[from] ExternalAnnotatorError),
}

/// The unresolved configuration for one of a mode's annotators, as read out of
/// a binding such as `annotate match <class> <cmd>` or `annotate regex <class>
/// <pattern>`.
#[derive(Debug, Clone)]
pub enum AnnotatorSpec {
    Literal { dictionary_cmd: String, class: String },
    Regex { pattern: String, class: String },
    External {
        cmd: String,
        annotators_dir: Option<String>,
        ctx: HashMap<String, String>,
        class: String,
    },
}

/// A compiled annotator, ready to run against any number of buffers without
/// recompiling its dictionary or pattern.
pub enum CompiledAnnotator {
    Literal { trie: Trie, class: String },
    Regex { re: Regex, class: String },
    External {
        cmd: String,
        annotators_dir: Option<String>,
        ctx: HashMap<String, String>,
        class: String,
    },
}

impl CompiledAnnotator {
    pub fn compile(spec: &AnnotatorSpec) -> Result<Self, AnnotatorError> {
        Ok(match spec {
            AnnotatorSpec::Literal { dictionary_cmd, class } => CompiledAnnotator::Literal {
                trie: literal::build_dictionary(dictionary_cmd)?,
                class: class.clone(),
            },
            AnnotatorSpec::Regex { pattern, class } => CompiledAnnotator::Regex {
                re: regex_annot::compile(pattern)?,
                class: class.clone(),
            },
            AnnotatorSpec::External {
                cmd,
                annotators_dir,
                ctx,
                class,
            } => CompiledAnnotator::External {
                cmd: cmd.clone(),
                annotators_dir: annotators_dir.clone(),
                ctx: ctx.clone(),
                class: class.clone(),
            },
        })
    }

    fn class(&self) -> &str {
        match self {
            CompiledAnnotator::Literal { class, .. } => class,
            CompiledAnnotator::Regex { class, .. } => class,
            CompiledAnnotator::External { class, .. } => class,
        }
    }

    /// Runs this annotator against `buffer` to completion, inserting each
    /// annotation it finds as soon as it's found. Blocks the calling thread;
    /// callers run this inside `tokio::task::spawn_blocking`.
    fn run(&self, buffer: &Arc<Buffer>) -> Result<(), AnnotatorError> {
        match self {
            CompiledAnnotator::Literal { trie, class } => {
                let mut reader = BufferReader::new(buffer.clone());
                for ann in literal::scan(trie, class, &mut reader) {
                    buffer.insert_annotation(ann);
                }
            }
            CompiledAnnotator::Regex { re, class } => {
                let mut reader = BufferReader::new(buffer.clone());
                for ann in regex_annot::scan(re, class, &mut reader) {
                    buffer.insert_annotation(ann);
                }
            }
            CompiledAnnotator::External {
                cmd,
                annotators_dir,
                ctx,
                class,
            } => {
                let anns = external::scan(cmd, annotators_dir.as_deref(), ctx, class, buffer.clone())?;
                for ann in anns {
                    buffer.insert_annotation(ann);
                }
            }
        }
        Ok(())
    }
}

/// Spawns `annotator` on a blocking task against `buffer`. Failures (a
/// subprocess that won't start, an unreadable dictionary) are logged and
/// otherwise swallowed: a misbehaving annotator leaves its class unmatched
/// rather than bringing the pager down.
pub fn spawn(annotator: CompiledAnnotator, buffer: Arc<Buffer>) -> tokio::task::JoinHandle<()> {
    tokio::task::spawn_blocking(move || {
        let class = annotator.class().to_string();
        match annotator.run(&buffer) {
            Ok(()) => info!(class = %class, "annotator finished"),
            Err(err) => warn!(class = %class, %err, "annotator failed"),
        }
    })
}
