//! Splitting a bounding box into `n` adjacent sections with a 1-unit divider gap
//! between each, for the pager stack's master-detail layout.
//!
//! Two schemes are provided. [`golden_split`] is the stack's default: the
//! rightmost/bottommost ("active") section gets the golden-ratio majority share and
//! the remainder recurses over the rest. [`even_split`] distributes space as evenly
//! as integer division allows and is kept as an explicit alternative.

const PHI: f64 = 1.618_033_988_749_895;

/// Golden-ratio split: for `n > 1`, the last section takes `floor(total / phi)` units;
/// the remaining `total - big - 1` (1 unit reserved for the divider) is split
/// recursively among the other `n - 1` sections.
pub fn golden_split(n: usize, total: i64) -> Vec<(i64, i64)> {
    golden_split_range(n, 0, total)
}

fn golden_split_range(n: usize, offset: i64, total: i64) -> Vec<(i64, i64)> {
    if n == 0 {
        return Vec::new();
    }
    if n == 1 {
        return vec![(offset, total)];
    }

    let big = (total as f64 / PHI).floor() as i64;
    let remainder = total - big - 1;

    let mut sections = golden_split_range(n - 1, offset, remainder);
    sections.push((offset + remainder + 1, big));
    sections
}

/// Even split: `size_i = (remaining - (n - i - 1)) / (n - i)`, consuming a 1-unit
/// divider after each section.
pub fn even_split(n: usize, total: i64) -> Vec<(i64, i64)> {
    if n == 0 {
        return Vec::new();
    }

    let mut sections = Vec::with_capacity(n);
    let mut offset = 0i64;
    let mut remaining = total;

    for i in 0..n {
        let size = (remaining - (n - i - 1) as i64) / (n - i) as i64;
        sections.push((offset, size));
        offset += size + 1;
        remaining = total - offset;
    }

    sections
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn golden_split_pinned_values() {
        assert_eq!(golden_split(3, 120), vec![(0, 17), (18, 27), (46, 74)]);
    }

    #[test]
    fn even_split_pinned_values() {
        assert_eq!(even_split(3, 120), vec![(0, 39), (40, 39), (80, 40)]);
    }

    #[test]
    fn single_section_spans_whole_size() {
        assert_eq!(golden_split(1, 50), vec![(0, 50)]);
        assert_eq!(even_split(1, 50), vec![(0, 50)]);
    }

    #[test]
    fn zero_sections_is_empty() {
        assert!(golden_split(0, 50).is_empty());
        assert!(even_split(0, 50).is_empty());
    }
}
