//! Literal-match annotator: builds a [`Trie`] from a dictionary command's
//! output, then greedily scans the buffer for longest matches.

use std::io::Read;
use std::process::{Command, Stdio};

use rat_buffer::reader::BufferReader;
use rat_buffer::Annotation;
use rat_text::point::BufferPoint;
use rat_text::trie::{Trie, TrieError};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum LiteralAnnotatorError {
    #[error("failed to spawn dictionary command `{cmd}`: {source}")]
    Spawn { cmd: String, source: std::io::Error },
    #[error("failed to read dictionary command output: {0}")]
    Read(#[from] std::io::Error),
    #[error("dictionary build failed: {0}")]
    Trie(#[from] TrieError),
}

/// Runs `cmd`, splits its stdout into trimmed, non-empty, sorted, deduplicated
/// lines, and builds a [`Trie`] over them. `cmd` is run once at mode-resolution
/// time (construction), not per scan.
pub fn build_dictionary(cmd: &str) -> Result<Trie, LiteralAnnotatorError> {
    let shell = std::env::var("SHELL").unwrap_or_else(|_| "/bin/sh".to_string());
    let mut child = Command::new(&shell)
        .arg("-c")
        .arg(cmd)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .map_err(|source| LiteralAnnotatorError::Spawn {
            cmd: cmd.to_string(),
            source,
        })?;

    let mut out = String::new();
    child
        .stdout
        .take()
        .expect("stdout was piped")
        .read_to_string(&mut out)?;
    let _ = child.wait();

    let mut words: Vec<String> = out
        .lines()
        .map(|l| l.trim().to_string())
        .filter(|l| !l.is_empty())
        .collect();
    words.sort();
    words.dedup();

    Ok(Trie::build(&words)?)
}

fn next_point(pos: BufferPoint, ch: char) -> BufferPoint {
    if ch == '\n' {
        BufferPoint::new(pos.line + 1, 0)
    } else {
        BufferPoint::new(pos.line, pos.col + 1)
    }
}

/// Left-to-right greedy longest-match scan over `reader`, emitting one
/// [`Annotation`] of `class` per match. Blocks on `reader` until EOF.
pub fn scan(trie: &Trie, class: &str, reader: &mut BufferReader) -> Vec<Annotation> {
    let mut out = Vec::new();
    let mut cursor = trie.cursor();
    let mut at_root = true;
    let mut match_start: Option<BufferPoint> = None;
    let mut chars: Vec<char> = Vec::new();
    let mut candidate: Option<(BufferPoint, usize)> = None;

    while let Some(pr) = reader.read_rune() {
        loop {
            if cursor.advance(pr.ch) {
                if at_root {
                    match_start = Some(pr.pos);
                    chars.clear();
                }
                chars.push(pr.ch);
                at_root = false;
                let end = next_point(pr.pos, pr.ch);
                if cursor.is_terminal() {
                    if cursor.has_children() {
                        candidate = Some((end, chars.len()));
                    } else {
                        emit(&mut out, match_start.unwrap(), end, class, &chars);
                        cursor.reset();
                        at_root = true;
                        match_start = None;
                        chars.clear();
                        candidate = None;
                    }
                }
                break;
            } else if !at_root {
                if let Some((end, len)) = candidate.take() {
                    emit(&mut out, match_start.unwrap(), end, class, &chars[..len]);
                }
                cursor.reset();
                at_root = true;
                match_start = None;
                chars.clear();
                continue;
            } else {
                break;
            }
        }
    }

    if let Some((end, len)) = candidate.take() {
        emit(&mut out, match_start.unwrap(), end, class, &chars[..len]);
    }

    out
}

fn emit(out: &mut Vec<Annotation>, start: BufferPoint, end: BufferPoint, class: &str, chars: &[char]) {
    let value: String = chars.iter().collect();
    out.push(Annotation::new(start, end, class, value));
}

#[cfg(test)]
mod tests {
    use super::*;
    use rat_buffer::Buffer;
    use std::sync::Arc;

    // Runs the scan on a `spawn_blocking` thread, the same way `CompiledAnnotator`
    // does in `lib.rs`. `BufferReader::read_rune` blocks on a tokio `Handle`, which
    // would panic with a reentrant `block_on` if called inline on the test's own
    // async worker thread.
    async fn scan_str(words: &[&str], input: &str) -> Vec<Annotation> {
        let sorted: Vec<String> = {
            let mut w: Vec<String> = words.iter().map(|s| s.to_string()).collect();
            w.sort();
            w
        };
        let input = input.to_string();
        tokio::task::spawn_blocking(move || {
            let trie = Trie::build(&sorted).unwrap();
            let buf = Arc::new(Buffer::new());
            buf.ingest_from(input.as_bytes());
            let mut reader = BufferReader::new(buf);
            scan(&trie, "word", &mut reader)
        })
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn greedy_longest_match_abc() {
        let anns = scan_str(&["ab", "abc"], "abcd").await;
        assert_eq!(anns.len(), 1);
        assert_eq!(anns[0].value, "abc");
        assert_eq!(anns[0].start, BufferPoint::new(0, 0));
        assert_eq!(anns[0].end, BufferPoint::new(0, 3));
    }

    #[tokio::test]
    async fn shorter_match_when_extension_fails() {
        let anns = scan_str(&["ab", "abc"], "abd").await;
        assert_eq!(anns.len(), 1);
        assert_eq!(anns[0].value, "ab");
        assert_eq!(anns[0].end, BufferPoint::new(0, 2));
    }

    #[tokio::test]
    async fn flushes_pending_candidate_at_eof() {
        let anns = scan_str(&["ab", "abc"], "ab").await;
        assert_eq!(anns.len(), 1);
        assert_eq!(anns[0].value, "ab");
    }

    #[tokio::test]
    async fn no_match_produces_no_annotations() {
        let anns = scan_str(&["xyz"], "abc").await;
        assert!(anns.is_empty());
    }

    #[tokio::test]
    async fn match_spanning_newline() {
        let anns = scan_str(&["a\nb"], "a\nb").await;
        assert_eq!(anns.len(), 1);
        assert_eq!(anns[0].start, BufferPoint::new(0, 0));
        assert_eq!(anns[0].end, BufferPoint::new(1, 1));
    }

    #[test]
    fn build_dictionary_sorts_trims_and_dedupes() {
        let trie = build_dictionary("printf 'b\\n  a  \\na\\n\\nb\\n'").unwrap();
        assert!(trie.accepts("a"));
        assert!(trie.accepts("b"));
        assert!(!trie.accepts(""));
    }
}
