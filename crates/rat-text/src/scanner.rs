//! ECMA-48-subset escape scanner: decodes a raw byte stream into [`StyledRune`]s,
//! tracking SGR (Select Graphic Rendition) state as it goes.
//!
//! Only the states needed to recognise `CSI ... m` (SGR) sequences are modelled —
//! Default, Esc, CSI-Parameter, CSI-Intermediate. Anything else terminates the
//! sequence and is silently dropped, matching the tolerant, never-abort contract of
//! the wider styled-rune stream.

use std::io::{self, Read};

use crate::style::{Attr, TermStyle, TermStyles};

/// Decodes a byte stream into styled runes, one rune per `next()` call.
///
/// `R` is expected to be a blocking `Read` (a pipe, subprocess stdout, or similar);
/// the reader never blocks on anything but `R` itself.
pub struct StyledRuneReader<R> {
    reader: R,
    fg: Attr,
    bg: Attr,
    styles: TermStyles,
}

impl<R: Read> StyledRuneReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            fg: Attr::default_color(),
            bg: Attr::default_color(),
            styles: TermStyles::new(),
        }
    }

    /// Reads the next styled rune, skipping over any SGR escape sequences along the
    /// way. Returns `Ok(None)` at EOF.
    pub fn read_styled_rune(&mut self) -> io::Result<Option<StyledRuneOut>> {
        loop {
            let mut b = [0u8; 1];
            match self.read_exact_or_eof(&mut b)? {
                false => return Ok(None),
                true => {}
            }

            if b[0] == 0x1B {
                self.scan_escape()?;
                continue;
            }

            let ch = self.decode_utf8_rune(b[0])?;
            let style = self.styles.get(self.fg, self.bg);
            return Ok(Some(StyledRuneOut { ch, style }));
        }
    }

    fn read_exact_or_eof(&mut self, buf: &mut [u8]) -> io::Result<bool> {
        let mut read = 0;
        while read < buf.len() {
            match self.reader.read(&mut buf[read..])? {
                0 => return Ok(read > 0),
                n => read += n,
            }
        }
        Ok(true)
    }

    fn decode_utf8_rune(&mut self, first: u8) -> io::Result<char> {
        let expected = utf8_len(first);
        if expected == 1 {
            return Ok(if first.is_ascii() {
                first as char
            } else {
                char::REPLACEMENT_CHARACTER
            });
        }

        let mut buf = [0u8; 4];
        buf[0] = first;
        let mut got = 1;
        while got < expected {
            let mut b = [0u8; 1];
            if !self.read_exact_or_eof(&mut b)? {
                break;
            }
            buf[got] = b[0];
            got += 1;
        }

        match std::str::from_utf8(&buf[..got]) {
            Ok(s) => Ok(s.chars().next().unwrap_or(char::REPLACEMENT_CHARACTER)),
            Err(_) => Ok(char::REPLACEMENT_CHARACTER),
        }
    }

    /// Consumes one escape sequence (the leading `ESC` byte has already been read).
    /// Only a well-formed `CSI ... m` sequence updates style; everything else is
    /// silently dropped.
    fn scan_escape(&mut self) -> io::Result<()> {
        let mut b = [0u8; 1];
        if !self.read_exact_or_eof(&mut b)? {
            return Ok(());
        }
        if b[0] != b'[' {
            // Any other Fe byte (or a malformed lead-in) returns to Default.
            return Ok(());
        }

        let mut params: Vec<i64> = Vec::new();
        let mut current: Option<i64> = None;

        loop {
            if !self.read_exact_or_eof(&mut b)? {
                return Ok(()); // truncated sequence, drop silently
            }
            match b[0] {
                0x30..=0x39 => {
                    let digit = (b[0] - b'0') as i64;
                    current = Some(current.unwrap_or(0) * 10 + digit);
                }
                b';' | b':' => {
                    params.push(current.take().unwrap_or(0));
                }
                0x3C..=0x3F => {
                    // private-use marker in first position; reserved, no effect here.
                }
                0x20..=0x2F => {
                    // CSI-Intermediate: keep scanning for the final byte.
                }
                0x40..=0x7E => {
                    if let Some(v) = current.take() {
                        params.push(v);
                    }
                    if b[0] == b'm' {
                        self.apply_sgr(&params);
                    }
                    return Ok(());
                }
                _ => return Ok(()), // invalid byte inside the sequence
            }
        }
    }

    fn apply_sgr(&mut self, params: &[i64]) {
        if params.is_empty() {
            self.fg = Attr::default_color();
            self.bg = Attr::default_color();
            return;
        }

        let mut i = 0;
        while i < params.len() {
            match params[i] {
                0 => {
                    self.fg = Attr::default_color();
                    self.bg = Attr::default_color();
                }
                1 => self.fg.flags |= crate::style::AttrFlags::BOLD,
                4 => self.fg.flags |= crate::style::AttrFlags::UNDERLINE,
                7 => self.fg.flags |= crate::style::AttrFlags::REVERSE,
                27 => self.fg.flags.remove(crate::style::AttrFlags::REVERSE),
                p @ 30..=37 => self.fg = self.fg.with_color((p - 29) as u16),
                38 if params.len() > i + 2 && params[i + 1] == 5 => {
                    self.fg = self.fg.with_color((params[i + 2] + 1) as u16);
                    i += 2;
                }
                39 => self.fg = self.fg.with_color(0),
                p @ 40..=47 => self.bg = self.bg.with_color((p - 39) as u16),
                48 if params.len() > i + 2 && params[i + 1] == 5 => {
                    self.bg = self.bg.with_color((params[i + 2] + 1) as u16);
                    i += 2;
                }
                49 => self.bg = self.bg.with_color(0),
                _ => {}
            }
            i += 1;
        }
    }
}

/// The scanner's minimal output type (decoupled from [`crate::rune::StyledRune`] so
/// callers pick whichever buffer-point wrapping they need).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StyledRuneOut {
    pub ch: char,
    pub style: TermStyle,
}

fn utf8_len(first: u8) -> usize {
    if first & 0x80 == 0 {
        1
    } else if first & 0xE0 == 0xC0 {
        2
    } else if first & 0xF0 == 0xE0 {
        3
    } else if first & 0xF8 == 0xF0 {
        4
    } else {
        1
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::style::AttrFlags;

    fn scan_all(input: &[u8]) -> Vec<StyledRuneOut> {
        let mut r = StyledRuneReader::new(input);
        let mut out = Vec::new();
        while let Some(sr) = r.read_styled_rune().unwrap() {
            out.push(sr);
        }
        out
    }

    #[test]
    fn ansi_round_trip() {
        let runes = scan_all(b"\x1b[31mA\x1b[0mB");
        assert_eq!(runes.len(), 2);
        assert_eq!(runes[0].ch, 'A');
        assert_eq!(runes[0].style.fg.color, 2); // 31 - 29 = 2
        assert_eq!(runes[1].ch, 'B');
        assert!(runes[1].style.fg.is_default_color());
    }

    #[test]
    fn ansi_256_color() {
        let runes = scan_all(b"\x1b[38;5;200mX");
        assert_eq!(runes[0].style.fg.color, 201);
    }

    #[test]
    fn bold_and_reverse_flags() {
        let runes = scan_all(b"\x1b[1;7mX");
        assert!(runes[0].style.fg.flags.contains(AttrFlags::BOLD));
        assert!(runes[0].style.fg.flags.contains(AttrFlags::REVERSE));
    }

    #[test]
    fn unrecognised_params_are_ignored() {
        let runes = scan_all(b"\x1b[99mX");
        assert_eq!(runes[0].ch, 'X');
        assert!(runes[0].style.fg.is_default_color());
    }

    #[test]
    fn invalid_utf8_emits_replacement_char() {
        let runes = scan_all(&[0xFF, b'A']);
        assert_eq!(runes[0].ch, char::REPLACEMENT_CHARACTER);
        assert_eq!(runes[1].ch, 'A');
    }

    #[test]
    fn truncated_sequence_is_dropped_silently() {
        let runes = scan_all(b"\x1b[31");
        assert!(runes.is_empty());
    }
}
