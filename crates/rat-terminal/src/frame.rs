//! The cell-grid write side of the terminal backend contract: `setCell`,
//! `flush`, `setCursor`/`hideCursor`, scoped to a [`rat_layout::Rect`] so the
//! pager stack's split sections can each write only into their own area
//! without clipping logic duplicated per caller.

use std::io::Write;

use crossterm::{cursor, queue, style};
use rat_text::style::{Attr, TermStyle};

/// Writes styled cells into a rectangular region of the real terminal. Column
/// and row are region-relative; out-of-bounds writes are silently clipped
/// (matching the "never blocks, never panics" contract of the render path).
pub struct CellWriter<'a, W: Write> {
    out: &'a mut W,
    left: u16,
    top: u16,
    width: u16,
    height: u16,
}

impl<'a, W: Write> CellWriter<'a, W> {
    pub fn new(out: &'a mut W, left: u16, top: u16, width: u16, height: u16) -> Self {
        Self {
            out,
            left,
            top,
            width,
            height,
        }
    }

    pub fn set_cell(&mut self, x: u16, y: u16, ch: char, sty: TermStyle) -> std::io::Result<()> {
        if x >= self.width || y >= self.height {
            return Ok(());
        }
        queue!(
            self.out,
            cursor::MoveTo(self.left + x, self.top + y),
            style::SetForegroundColor(to_color(sty.fg)),
            style::SetBackgroundColor(to_color(sty.bg)),
            style::SetAttribute(attr_mode(sty, true)),
            style::SetAttribute(attr_mode(sty, false)),
            style::Print(ch),
        )
    }

    pub fn set_cursor(&mut self, x: u16, y: u16) -> std::io::Result<()> {
        queue!(self.out, cursor::MoveTo(self.left + x, self.top + y), cursor::Show)
    }

    pub fn hide_cursor(&mut self) -> std::io::Result<()> {
        queue!(self.out, cursor::Hide)
    }

    pub fn flush(&mut self) -> std::io::Result<()> {
        self.out.flush()
    }
}

fn to_color(attr: Attr) -> style::Color {
    if attr.is_default_color() {
        style::Color::Reset
    } else {
        style::Color::AnsiValue((attr.color - 1) as u8)
    }
}

/// crossterm attribute toggles don't compose as a single value; this emits
/// either the "on" or the "reset" attribute depending on `set` so a caller can
/// queue both in sequence (reset first via `SetAttribute(Reset)` is simpler,
/// but bold/underline/reverse are independent bits so each is issued directly).
fn attr_mode(sty: TermStyle, bold_pass: bool) -> style::Attribute {
    use rat_text::style::AttrFlags;
    if bold_pass {
        if sty.fg.flags.contains(AttrFlags::BOLD) {
            style::Attribute::Bold
        } else {
            style::Attribute::NormalIntensity
        }
    } else if sty.fg.flags.contains(AttrFlags::UNDERLINE) {
        style::Attribute::Underlined
    } else if sty.fg.flags.contains(AttrFlags::REVERSE) {
        style::Attribute::Reverse
    } else {
        style::Attribute::NoUnderline
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_color_maps_to_reset() {
        assert_eq!(to_color(Attr::default_color()), style::Color::Reset);
    }

    #[test]
    fn colored_attr_maps_to_ansi_value() {
        let attr = Attr::default_color().with_color(2);
        assert_eq!(to_color(attr), style::Color::AnsiValue(1));
    }

    #[test]
    fn out_of_bounds_write_is_clipped() {
        let mut buf: Vec<u8> = Vec::new();
        let mut w = CellWriter::new(&mut buf, 0, 0, 4, 4);
        w.set_cell(10, 0, 'x', TermStyle::default()).unwrap();
        assert!(buf.is_empty());
    }
}
