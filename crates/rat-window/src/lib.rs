//! Cursor + scroll offset over a height that may grow while the underlying content
//! streams in. Pure navigation arithmetic, parameterised by `height()`/`total_height()`
//! closures so the same `Window` works for a pager (height = terminal rows, total =
//! buffer line count) or any other scrollable view.

/// `(cursor, scroll)` over a dynamically-sized content area.
///
/// Invariants maintained after every call: `0 <= scroll <= max(0, total - height)`,
/// and, whenever `total > 0`, `scroll <= cursor <= scroll + height - 1`.
pub struct Window {
    cursor: i64,
    scroll: i64,
    height: Box<dyn Fn() -> i64>,
    total_height: Box<dyn Fn() -> i64>,
}

impl Window {
    pub fn new(
        height: impl Fn() -> i64 + 'static,
        total_height: impl Fn() -> i64 + 'static,
    ) -> Self {
        Self {
            cursor: 0,
            scroll: 0,
            height: Box::new(height),
            total_height: Box::new(total_height),
        }
    }

    pub fn cursor(&self) -> i64 {
        self.cursor
    }

    pub fn scroll(&self) -> i64 {
        self.scroll
    }

    fn height_val(&self) -> i64 {
        (self.height)()
    }

    fn total_height_val(&self) -> i64 {
        (self.total_height)()
    }

    /// Moves the cursor to `n`, clamped to `[0, total_height - 1]`. Negative `n` is
    /// counted back from the end (`-1` is the last line). If the cursor drifts out of
    /// the viewport, scrolls the minimum amount to bring it back in.
    pub fn move_cursor_to(&mut self, n: i64) {
        let total = self.total_height_val();

        if total <= 0 {
            self.cursor = 0;
            return;
        }

        self.cursor = if n < 0 {
            (total + n).clamp(0, total - 1)
        } else if n >= total {
            total - 1
        } else {
            n
        };

        let height = self.height_val();
        if self.cursor < self.scroll {
            self.scroll_to(self.cursor);
        } else if self.cursor > self.scroll + height - 1 {
            self.scroll_to(self.cursor - (height - 1));
        }
    }

    /// Moves the cursor by `delta`, with the same clamp as [`Self::move_cursor_to`].
    pub fn move_cursor(&mut self, delta: i64) {
        let total = self.total_height_val();
        let mut dest = self.cursor + delta;

        if dest < 0 {
            dest = 0;
        } else if total > 0 && dest > total - 1 {
            dest = total - 1;
        }

        self.move_cursor_to(dest);
    }

    /// Scrolls to `n`, clamped to `[0, max(0, total_height - height)]`. If the cursor
    /// is now off-screen, moves it to the nearest edge of the new viewport.
    pub fn scroll_to(&mut self, n: i64) {
        let total = self.total_height_val();
        let height = self.height_val();

        if n < 0 {
            self.scroll = 0;
        } else if n >= total - height {
            self.scroll = if total > height { total - height } else { 0 };
        } else {
            self.scroll = n;
        }

        if self.cursor < self.scroll {
            self.move_cursor_to(self.scroll);
        } else if self.cursor > self.scroll + height - 1 {
            self.move_cursor_to(self.scroll + height - 1);
        }
    }

    pub fn scroll_by(&mut self, delta: i64) {
        self.scroll_to(self.scroll + delta);
    }

    pub fn page_up(&mut self) {
        let height = self.height_val();
        self.scroll_by(-height);
    }

    pub fn page_down(&mut self) {
        let height = self.height_val();
        self.scroll_by(height);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    fn window(height: i64, total: i64) -> Window {
        Window::new(move || height, move || total)
    }

    #[test]
    fn cursor_last_line_alias() {
        let mut w = window(10, 100);
        w.move_cursor_to(-1);
        assert_eq!(w.cursor(), 99);
        assert_eq!(w.scroll(), 90);
    }

    #[test]
    fn move_cursor_does_not_overshoot_total() {
        let mut w = window(10, 20);
        w.move_cursor(1000);
        assert_eq!(w.cursor(), 19);
        assert!(w.scroll() <= 19 && w.scroll() >= 0);
    }

    #[test]
    fn invariants_hold_after_random_walk_with_growing_total() {
        let total = Rc::new(Cell::new(1i64));
        let total_clone = total.clone();
        let mut w = Window::new(move || 5, move || total_clone.get());

        let ops: &[fn(&mut Window)] = &[
            |w| w.move_cursor(3),
            |w| w.move_cursor(-7),
            |w| w.scroll_by(2),
            |w| w.page_down(),
            |w| w.page_up(),
            |w| w.move_cursor_to(-1),
        ];

        for i in 0..200 {
            total.set(1 + (i * 7) % 50);
            for op in ops {
                op(&mut w);
                let t = total.get();
                let h = 5i64;
                assert!(w.scroll() >= 0 && w.scroll() <= (t - h).max(0));
                if t > 0 {
                    assert!(w.cursor() >= w.scroll() && w.cursor() <= w.scroll() + h - 1);
                }
            }
        }
    }

    #[test]
    fn zero_total_height_keeps_cursor_at_zero() {
        let mut w = window(10, 0);
        w.move_cursor_to(5);
        assert_eq!(w.cursor(), 0);
        w.move_cursor(3);
        assert_eq!(w.cursor(), 0);
    }
}
