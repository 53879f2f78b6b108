//! Paints a [`rat_stack::Layout`] into the real terminal: each section's
//! header and content lines, the dividers between sections, and the one-line
//! prompt reserved at the bottom of the screen when one is active.

use std::io::Write;

use rat_layout::Rect;
use rat_stack::Layout;
use rat_terminal::CellWriter;
use rat_text::rune::styled_runes_from_str;
use rat_text::style::{Attr, AttrFlags, TermStyle};

fn header_style() -> TermStyle {
    TermStyle {
        fg: Attr {
            color: 0,
            flags: AttrFlags::REVERSE,
        },
        bg: Attr::default_color(),
    }
}

fn rect_cells(rect: Rect) -> (u16, u16, u16, u16) {
    (
        rect.left.max(0) as u16,
        rect.top.max(0) as u16,
        rect.width.max(0) as u16,
        rect.height.max(0) as u16,
    )
}

/// Draws every section's header (row 0 of its rect) and content lines (rows
/// 1..), then the divider lines between sections.
pub fn draw<W: Write>(out: &mut W, layout: &Layout) -> std::io::Result<()> {
    for section in &layout.sections {
        let (left, top, width, height) = rect_cells(section.rect);
        if width == 0 || height == 0 {
            continue;
        }
        let mut writer = CellWriter::new(out, left, top, width, height);

        for (x, rune) in styled_runes_from_str(&section.rendered.header, header_style())
            .into_iter()
            .enumerate()
        {
            writer.set_cell(x as u16, 0, rune.ch, rune.style)?;
        }

        for (y, line) in section.rendered.lines.iter().enumerate() {
            for (x, rune) in line.iter().enumerate() {
                writer.set_cell(x as u16, (y + 1) as u16, rune.ch, rune.style)?;
            }
        }
    }

    for divider in &layout.dividers {
        let (left, top, width, height) = rect_cells(divider.rect);
        let mut writer = CellWriter::new(out, left, top, width, height);
        for y in 0..height {
            for x in 0..width {
                writer.set_cell(x, y, divider.ch, TermStyle::default())?;
            }
        }
    }

    Ok(())
}

/// Draws the confirm prompt's one line at `row`, styled the same as a
/// section header so it reads as distinct chrome.
pub fn draw_prompt<W: Write>(out: &mut W, row: u16, width: u16, text: &str) -> std::io::Result<()> {
    let mut writer = CellWriter::new(out, 0, row, width, 1);
    for (x, rune) in styled_runes_from_str(text, header_style()).into_iter().enumerate() {
        if x as u16 >= width {
            break;
        }
        writer.set_cell(x as u16, 0, rune.ch, rune.style)?;
    }
    Ok(())
}
