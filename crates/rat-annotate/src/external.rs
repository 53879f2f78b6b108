//! External annotator: pipes the buffer to a subprocess's stdin and decodes a
//! binary record stream off its stdout — `u64 start (LE) · u64 end (LE) ·
//! u64 len (LE) · len bytes value` — byte offsets into the subprocess's own
//! stdin.

use std::collections::HashMap;
use std::io::{self, Read};
use std::process::{Command, Stdio};
use std::sync::Arc;
use std::thread;

use rat_buffer::reader::BufferReader;
use rat_buffer::{Annotation, Buffer};
use rat_text::point::BufferPoint;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExternalAnnotatorError {
    #[error("failed to spawn external annotator `{cmd}`: {source}")]
    Spawn { cmd: String, source: io::Error },
}

/// A byte-offset span as reported by the subprocess, before it is mapped into
/// rune-space buffer points.
#[derive(Debug, Clone, PartialEq, Eq)]
struct ByteAnnotation {
    start: u64,
    end: u64,
    value: String,
}

/// Spawns `cmd` with `PATH` prefixed by `annotators_dir` and `ctx` merged into
/// its environment, streams the buffer's UTF-8 bytes into its stdin on a
/// helper thread, decodes the record stream off stdout until EOF (a truncated
/// trailing record is discarded, not an error), and maps the resulting byte
/// offsets back to rune-space [`Annotation`]s.
pub fn scan(
    cmd: &str,
    annotators_dir: Option<&str>,
    ctx: &HashMap<String, String>,
    class: &str,
    buffer: Arc<Buffer>,
) -> Result<Vec<Annotation>, ExternalAnnotatorError> {
    let shell = std::env::var("SHELL").unwrap_or_else(|_| "/bin/sh".to_string());
    let mut command = Command::new(shell);
    command.arg("-c").arg(cmd);
    command.envs(ctx);

    if let Some(dir) = annotators_dir {
        let path = std::env::var("PATH").unwrap_or_default();
        command.env("PATH", format!("{dir}:{path}"));
    }

    command.stdin(Stdio::piped());
    command.stdout(Stdio::piped());
    command.stderr(Stdio::null());

    let mut child = command.spawn().map_err(|source| ExternalAnnotatorError::Spawn {
        cmd: cmd.to_string(),
        source,
    })?;

    let mut reader = BufferReader::new(buffer.clone());
    let mut stdin = child.stdin.take().expect("stdin was piped");
    let feeder = thread::spawn(move || {
        let _ = io::copy(&mut reader, &mut stdin);
        // drop(stdin) closes the pipe, signalling EOF to the child.
    });

    let mut stdout = child.stdout.take().expect("stdout was piped");
    let records = read_records(&mut stdout);

    let _ = feeder.join();
    let _ = child.wait();

    let table = byte_to_point_table(&buffer);
    Ok(records
        .into_iter()
        .filter_map(|r| {
            let start = *table.get(r.start as usize)?;
            let end = *table.get(r.end as usize)?;
            Some(Annotation::new(start, end, class, r.value))
        })
        .collect())
}

/// Builds a byte-offset -> `BufferPoint` lookup table over the whole buffer's
/// UTF-8 encoding, one entry per byte (plus one past the end).
fn byte_to_point_table(buffer: &Buffer) -> Vec<BufferPoint> {
    let guard = buffer.lock();
    let n = guard.num_lines();
    let mut table = Vec::new();
    let mut pos = BufferPoint::new(0, 0);
    for line in guard.line_range(0, n) {
        for sr in line {
            for _ in 0..sr.ch.len_utf8() {
                table.push(pos);
            }
            pos = if sr.ch == '\n' {
                BufferPoint::new(pos.line + 1, 0)
            } else {
                BufferPoint::new(pos.line, pos.col + 1)
            };
        }
    }
    table.push(pos);
    table
}

fn read_records<R: Read>(r: &mut R) -> Vec<ByteAnnotation> {
    let mut out = Vec::new();
    loop {
        let mut header = [0u8; 24];
        if !read_exact_or_eof(r, &mut header) {
            break;
        }
        let start = u64::from_le_bytes(header[0..8].try_into().unwrap());
        let end = u64::from_le_bytes(header[8..16].try_into().unwrap());
        let len = u64::from_le_bytes(header[16..24].try_into().unwrap()) as usize;

        let mut value = vec![0u8; len];
        if !read_exact_or_eof(r, &mut value) {
            break; // partial record at EOF, ignored
        }

        out.push(ByteAnnotation {
            start,
            end,
            value: String::from_utf8_lossy(&value).into_owned(),
        });
    }
    out
}

/// Like `Read::read_exact`, but treats EOF before any byte is read as a clean
/// stop (`false`) rather than a truncated-record error; a partial fill is
/// still reported as a failed read (also `false`), matching "partial record
/// at EOF is ignored".
fn read_exact_or_eof<R: Read>(r: &mut R, buf: &mut [u8]) -> bool {
    let mut read = 0;
    while read < buf.len() {
        match r.read(&mut buf[read..]) {
            Ok(0) => return false,
            Ok(n) => read += n,
            Err(_) => return false,
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use rat_buffer::Buffer;
    use std::sync::Arc;

    fn record(start: u64, end: u64, value: &str) -> Vec<u8> {
        let mut buf = Vec::new();
        buf.extend_from_slice(&start.to_le_bytes());
        buf.extend_from_slice(&end.to_le_bytes());
        buf.extend_from_slice(&(value.len() as u64).to_le_bytes());
        buf.extend_from_slice(value.as_bytes());
        buf
    }

    #[test]
    fn decodes_multiple_records() {
        let mut stream = Vec::new();
        stream.extend(record(0, 3, "foo"));
        stream.extend(record(4, 7, "bar"));
        let records = read_records(&mut &stream[..]);
        assert_eq!(
            records,
            vec![
                ByteAnnotation {
                    start: 0,
                    end: 3,
                    value: "foo".into()
                },
                ByteAnnotation {
                    start: 4,
                    end: 7,
                    value: "bar".into()
                },
            ]
        );
    }

    #[test]
    fn partial_trailing_record_is_ignored() {
        let mut stream = record(0, 3, "foo");
        stream.extend_from_slice(&9u64.to_le_bytes()); // start of a new record, then nothing
        let records = read_records(&mut &stream[..]);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].value, "foo");
    }

    #[tokio::test]
    async fn scans_subprocess_echoing_one_record() {
        let buf = Arc::new(Buffer::new());
        buf.ingest_from("hello".as_bytes());

        // A shell one-liner that reads stdin then writes one fixed record.
        let cmd = r#"cat >/dev/null; printf '\x00\x00\x00\x00\x00\x00\x00\x00\x05\x00\x00\x00\x00\x00\x00\x00\x05\x00\x00\x00\x00\x00\x00\x00hello'"#;
        let anns = scan(cmd, None, &HashMap::new(), "ext", buf).unwrap();
        assert_eq!(anns.len(), 1);
        assert_eq!(anns[0].value, "hello");
        assert_eq!(anns[0].start, BufferPoint::new(0, 0));
        assert_eq!(anns[0].end, BufferPoint::new(0, 5));
    }
}
