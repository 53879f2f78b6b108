//! Splitting a stack's bounding box among its visible pagers: side-by-side
//! columns when the box is wide, stacked rows otherwise, using whichever of
//! `rat_layout`'s two split schemes the stack is configured with.

use rat_layout::{even_split, golden_split, Rect};

/// Width threshold above which the stack lays its sections out side by side
/// instead of stacked top to bottom.
const WIDE_THRESHOLD: i64 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    /// Sections side by side, split along width.
    Columns,
    /// Sections stacked, split along height.
    Rows,
}

pub fn orientation_for(area: Rect) -> Orientation {
    if area.width > WIDE_THRESHOLD {
        Orientation::Columns
    } else {
        Orientation::Rows
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SplitScheme {
    /// The stack's default: the active (last) section gets the golden-ratio
    /// majority share, the rest recurse over the remainder.
    Golden,
    /// `size_i = (remaining - (n - i - 1)) / (n - i)`, as even as integer
    /// division allows.
    Even,
}

impl SplitScheme {
    fn split(self, n: usize, total: i64) -> Vec<(i64, i64)> {
        match self {
            SplitScheme::Golden => golden_split(n, total),
            SplitScheme::Even => even_split(n, total),
        }
    }
}

/// Splits `area` into `n` adjacent rects along whichever axis `orientation`
/// names, in order from least active (first) to most active / topmost-pager
/// (last) — the same order `scheme.split` returns.
pub fn split_rects(area: Rect, n: usize, scheme: SplitScheme) -> Vec<Rect> {
    if n == 0 {
        return Vec::new();
    }

    let orientation = orientation_for(area);
    let total = match orientation {
        Orientation::Columns => area.width,
        Orientation::Rows => area.height,
    };

    scheme
        .split(n, total)
        .into_iter()
        .map(|(offset, size)| match orientation {
            Orientation::Columns => Rect::new(area.left + offset, area.top, size, area.height),
            Orientation::Rows => Rect::new(area.left, area.top + offset, area.width, size),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wide_area_splits_into_columns() {
        let area = Rect::new(0, 0, 120, 40);
        assert_eq!(orientation_for(area), Orientation::Columns);
        let rects = split_rects(area, 3, SplitScheme::Golden);
        assert_eq!(rects.len(), 3);
        assert_eq!(rects[2].width, 74);
        assert_eq!(rects[2].height, 40);
    }

    #[test]
    fn narrow_area_splits_into_rows() {
        let area = Rect::new(0, 0, 80, 40);
        assert_eq!(orientation_for(area), Orientation::Rows);
        let rects = split_rects(area, 3, SplitScheme::Even);
        assert_eq!(rects.len(), 3);
        assert_eq!(rects[0].height, 13);
        assert_eq!(rects[0].width, 80);
    }

    #[test]
    fn single_section_spans_whole_area() {
        let area = Rect::new(0, 0, 120, 40);
        let rects = split_rects(area, 1, SplitScheme::Golden);
        assert_eq!(rects, vec![area]);
    }
}
