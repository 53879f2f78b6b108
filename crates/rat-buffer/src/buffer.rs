//! The append-only, concurrently-annotated rune store.
//!
//! Two independent locks guard disjoint state so a slow annotator never blocks the
//! ingest task: `inner` (lines + next-rune waiters) and `annotations`. Readers that
//! need a cross-cutting snapshot of both take [`Buffer::lock`].

use std::io::Read;
use std::sync::{Mutex, MutexGuard};

use tokio::sync::oneshot;
use tracing::{trace, warn};

use rat_text::point::{BufferPoint, PositionedRune};
use rat_text::rune::StyledRune;
use rat_text::scanner::StyledRuneReader;

use crate::annotation::Annotation;

struct Inner {
    lines: Vec<Vec<StyledRune>>,
    waiters: Vec<oneshot::Sender<PositionedRune>>,
    stopped: bool,
}

impl Default for Inner {
    fn default() -> Self {
        Self {
            lines: vec![Vec::with_capacity(128)],
            waiters: Vec::new(),
            stopped: false,
        }
    }
}

/// An append-only grid of [`StyledRune`]s with a growing [`Annotation`] index.
///
/// Mutated by exactly one ingest task (via [`Buffer::spawn_ingest`]) and any number
/// of annotator tasks (via [`Buffer::insert_annotation`]); read by the UI render
/// path and by [`crate::reader::BufferReader`] on behalf of annotators.
pub struct Buffer {
    inner: Mutex<Inner>,
    annotations: Mutex<Vec<Annotation>>,
}

impl Default for Buffer {
    fn default() -> Self {
        Self::new()
    }
}

impl Buffer {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner::default()),
            annotations: Mutex::new(Vec::with_capacity(8)),
        }
    }

    /// Feeds the buffer from a blocking byte source, decoding SGR-styled runes along
    /// the way. Intended to run inside a `tokio::task::spawn_blocking`; returns once
    /// the source is exhausted or [`Buffer::destroy`] stops it.
    pub fn ingest_from<R: Read>(&self, reader: R) {
        let mut srr = StyledRuneReader::new(reader);
        loop {
            if self.inner.lock().expect("buffer inner poisoned").stopped {
                return;
            }

            match srr.read_styled_rune() {
                Ok(Some(out)) => {
                    self.append(StyledRune::new(out.ch, out.style));
                }
                Ok(None) => {
                    self.finish();
                    return;
                }
                Err(err) => {
                    warn!(%err, "styled-rune source errored, stopping ingest");
                    self.finish();
                    return;
                }
            }
        }
    }

    fn append(&self, sr: StyledRune) {
        let mut inner = self.inner.lock().expect("buffer inner poisoned");

        if !inner.waiters.is_empty() {
            let cur_line = inner.lines.len() - 1;
            let cur_col = inner.lines[cur_line].len();
            let pr = PositionedRune::new(sr.ch, BufferPoint::new(cur_line as u32, cur_col as u32));

            for waiter in inner.waiters.drain(..) {
                let _ = waiter.send(pr);
            }
        }

        let last = inner.lines.len() - 1;
        inner.lines[last].push(sr);

        if sr.ch == '\n' {
            inner.lines.push(Vec::with_capacity(128));
        }
    }

    /// Closes all pending waiters with EOF and marks the buffer stopped, as the
    /// ingest task does when its source is exhausted.
    fn finish(&self) {
        let mut inner = self.inner.lock().expect("buffer inner poisoned");
        inner.waiters.clear();
        inner.stopped = true;
    }

    /// Stops ingest (if still running) and releases every pending waiter with EOF.
    /// Idempotent.
    pub fn destroy(&self) {
        trace!("destroying buffer");
        self.finish();
    }

    pub fn line_range(&self, start: usize, num_lines: usize) -> Vec<Vec<StyledRune>> {
        let inner = self.inner.lock().expect("buffer inner poisoned");
        if start > inner.lines.len().saturating_sub(1) {
            Vec::new()
        } else if start + num_lines < inner.lines.len() {
            inner.lines[start..start + num_lines].to_vec()
        } else {
            inner.lines[start..].to_vec()
        }
    }

    pub fn num_lines(&self) -> usize {
        self.inner.lock().expect("buffer inner poisoned").lines.len()
    }

    pub fn num_annotations(&self) -> usize {
        self.annotations.lock().expect("annotation list poisoned").len()
    }

    pub fn insert_annotation(&self, a: Annotation) {
        self.annotations.lock().expect("annotation list poisoned").push(a);
    }

    pub fn annotations_for_line(&self, line: u32) -> Vec<Annotation> {
        self.annotations
            .lock()
            .expect("annotation list poisoned")
            .iter()
            .filter(|a| a.intersects_line(line))
            .cloned()
            .collect()
    }

    /// All annotations of `class`, in insertion order, for callers (cursor
    /// search) that scan across the whole buffer rather than one line.
    pub fn annotations_by_class(&self, class: &str) -> Vec<Annotation> {
        self.annotations
            .lock()
            .expect("annotation list poisoned")
            .iter()
            .filter(|a| a.class == class)
            .cloned()
            .collect()
    }

    /// Blocks (asynchronously) until the rune after `pos` (or the first rune, if
    /// `pos` is `None`) is available, or returns `None` at EOF.
    pub async fn next_positioned_rune(&self, pos: Option<BufferPoint>) -> Option<PositionedRune> {
        let rx = {
            let mut inner = self.inner.lock().expect("buffer inner poisoned");

            let next = match pos {
                None => Some(BufferPoint::new(0, 0)).filter(|_| !inner.lines[0].is_empty()),
                Some(bp) => {
                    if (bp.col + 1) < inner.lines[bp.line as usize].len() as u32 {
                        Some(BufferPoint::new(bp.line, bp.col + 1))
                    } else if (bp.line as usize + 1) < inner.lines.len()
                        && !inner.lines[bp.line as usize + 1].is_empty()
                    {
                        Some(BufferPoint::new(bp.line + 1, 0))
                    } else {
                        None
                    }
                }
            };

            if let Some(next) = next {
                let ch = inner.lines[next.line as usize][next.col as usize].ch;
                return Some(PositionedRune::new(ch, next));
            }

            if inner.stopped {
                return None;
            }

            let (tx, rx) = oneshot::channel();
            inner.waiters.push(tx);
            rx
        };

        rx.await.ok()
    }

    /// Brackets a consistent read across multiple queries, acquiring both locks in
    /// the fixed order (lines, then annotations) that [`Buffer::append`] and
    /// [`Buffer::insert_annotation`] never invert.
    pub fn lock(&self) -> BufferGuard<'_> {
        let inner = self.inner.lock().expect("buffer inner poisoned");
        let annotations = self.annotations.lock().expect("annotation list poisoned");
        BufferGuard { inner, annotations }
    }
}

/// A held snapshot of both buffer locks, for callers (the render path) that need
/// several queries to observe the same state.
pub struct BufferGuard<'a> {
    inner: MutexGuard<'a, Inner>,
    annotations: MutexGuard<'a, Vec<Annotation>>,
}

impl<'a> BufferGuard<'a> {
    pub fn num_lines(&self) -> usize {
        self.inner.lines.len()
    }

    pub fn num_annotations(&self) -> usize {
        self.annotations.len()
    }

    pub fn line_range(&self, start: usize, num_lines: usize) -> Vec<Vec<StyledRune>> {
        if start > self.inner.lines.len().saturating_sub(1) {
            Vec::new()
        } else if start + num_lines < self.inner.lines.len() {
            self.inner.lines[start..start + num_lines].to_vec()
        } else {
            self.inner.lines[start..].to_vec()
        }
    }

    pub fn annotations_for_line(&self, line: u32) -> Vec<Annotation> {
        self.annotations.iter().filter(|a| a.intersects_line(line)).cloned().collect()
    }

    pub fn annotations_by_class(&self, class: &str) -> Vec<Annotation> {
        self.annotations.iter().filter(|a| a.class == class).cloned().collect()
    }
}
