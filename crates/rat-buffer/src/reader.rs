//! Adapts [`Buffer::next_positioned_rune`] into the blocking, rune-at-a-time (and
//! byte-at-a-time) pull that annotators consume.

use std::io::{self, Read};
use std::sync::Arc;

use rat_text::point::{BufferPoint, PositionedRune};

use crate::buffer::Buffer;

/// Walks a [`Buffer`] from the start, one rune at a time, blocking the calling
/// thread until each rune is available or the buffer is exhausted.
///
/// Intended for use from inside `tokio::task::spawn_blocking`, or from any plain
/// OS thread spawned from one (the external annotator's stdin feeder): the tokio
/// `Handle` is captured once at construction, on whatever thread has runtime
/// context at the time, and carried along so [`Self::read_rune`] can `block_on`
/// it later from a different thread that may have none of its own. Capturing it
/// lazily per call would panic as soon as `read_rune` ran on a thread with no
/// ambient runtime context (a freshly spawned `std::thread`), or as soon as it
/// ran on a thread already inside a `block_on` call (reentrant `block_on`).
pub struct BufferReader {
    buffer: Arc<Buffer>,
    handle: tokio::runtime::Handle,
    pos: Option<BufferPoint>,
    pending: Option<(char, usize)>,
}

impl BufferReader {
    pub fn new(buffer: Arc<Buffer>) -> Self {
        Self {
            buffer,
            handle: tokio::runtime::Handle::current(),
            pos: None,
            pending: None,
        }
    }

    /// Blocks until the next rune (with its buffer position) is available, or
    /// returns `None` at EOF.
    pub fn read_rune(&mut self) -> Option<PositionedRune> {
        let pr = self
            .handle
            .block_on(self.buffer.next_positioned_rune(self.pos))?;
        self.pos = Some(pr.pos);
        Some(pr)
    }
}

impl Read for BufferReader {
    /// Encodes each rune as UTF-8 into `buf`, for annotators that only need the raw
    /// byte stream (the regex annotator's whole-buffer read, and the external
    /// annotator's subprocess stdin).
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let mut written = 0;

        if let Some((ch, consumed)) = self.pending.take() {
            let mut tmp = [0u8; 4];
            let encoded = ch.encode_utf8(&mut tmp).as_bytes();
            let remaining = &encoded[consumed..];
            let n = remaining.len().min(buf.len());
            buf[..n].copy_from_slice(&remaining[..n]);
            written += n;
            if consumed + n < encoded.len() {
                self.pending = Some((ch, consumed + n));
                return Ok(written);
            }
        }

        while written < buf.len() {
            let Some(pr) = self.read_rune() else {
                break;
            };
            let mut tmp = [0u8; 4];
            let encoded = pr.ch.encode_utf8(&mut tmp).as_bytes();
            let space = buf.len() - written;
            let n = encoded.len().min(space);
            buf[written..written + n].copy_from_slice(&encoded[..n]);
            written += n;
            if n < encoded.len() {
                self.pending = Some((pr.ch, n));
                break;
            }
        }

        Ok(written)
    }
}
