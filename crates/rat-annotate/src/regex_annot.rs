//! Regex annotator: reads the whole buffer stream into memory and emits one
//! annotation per leftmost-non-overlapping match.

use std::io::Read;

use rat_buffer::reader::BufferReader;
use rat_buffer::Annotation;
use rat_text::point::BufferPoint;
use regex::Regex;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RegexAnnotatorError {
    #[error("invalid regular expression `{pattern}`: {source}")]
    Pattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },
}

pub fn compile(pattern: &str) -> Result<Regex, RegexAnnotatorError> {
    Regex::new(pattern).map_err(|source| RegexAnnotatorError::Pattern {
        pattern: pattern.to_string(),
        source,
    })
}

/// Reads the entire buffer (blocking until EOF) and runs `re` over it,
/// mapping each byte-offset match back to rune-space [`BufferPoint`]s.
pub fn scan(re: &Regex, class: &str, reader: &mut BufferReader) -> Vec<Annotation> {
    let mut text = String::new();
    if reader.read_to_string(&mut text).is_err() {
        return Vec::new();
    }

    let offsets = byte_to_point_table(&text);

    re.find_iter(&text)
        .map(|m| {
            Annotation::new(
                offsets[m.start()],
                offsets[m.end()],
                class,
                m.as_str().to_string(),
            )
        })
        .collect()
}

/// Builds a byte-offset -> `BufferPoint` lookup table, one entry per byte
/// offset a rune could start or end at (including one past the end).
fn byte_to_point_table(text: &str) -> Vec<BufferPoint> {
    let mut table = Vec::with_capacity(text.len() + 1);
    let mut line = 0u32;
    let mut col = 0u32;
    for ch in text.chars() {
        for _ in 0..ch.len_utf8() {
            table.push(BufferPoint::new(line, col));
        }
        if ch == '\n' {
            line += 1;
            col = 0;
        } else {
            col += 1;
        }
    }
    table.push(BufferPoint::new(line, col));
    table
}

#[cfg(test)]
mod tests {
    use super::*;
    use rat_buffer::Buffer;
    use std::sync::Arc;

    // Runs the scan on a `spawn_blocking` thread, matching the `CompiledAnnotator`
    // production path in `lib.rs`: `BufferReader` blocks on a captured tokio
    // `Handle`, which must not be the same thread that's driving the test's async
    // runtime, or `block_on` panics as reentrant.
    async fn scan_str(pattern: &str, input: &str) -> Vec<Annotation> {
        let pattern = pattern.to_string();
        let input = input.to_string();
        tokio::task::spawn_blocking(move || {
            let re = compile(&pattern).unwrap();
            let buf = Arc::new(Buffer::new());
            buf.ingest_from(input.as_bytes());
            let mut reader = BufferReader::new(buf);
            scan(&re, "num", &mut reader)
        })
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn matches_non_overlapping_occurrences() {
        let anns = scan_str(r"\d+", "a12 b345 c").await;
        assert_eq!(anns.len(), 2);
        assert_eq!(anns[0].value, "12");
        assert_eq!(anns[1].value, "345");
    }

    #[tokio::test]
    async fn positions_account_for_multibyte_runes() {
        let anns = scan_str("b+", "a\u{00e9}bb c").await;
        assert_eq!(anns.len(), 1);
        assert_eq!(anns[0].start, BufferPoint::new(0, 2));
        assert_eq!(anns[0].end, BufferPoint::new(0, 4));
    }

    #[test]
    fn invalid_pattern_is_rejected() {
        assert!(compile("(").is_err());
    }
}
