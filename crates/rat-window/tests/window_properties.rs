//! Property-based tests for `Window`'s navigation invariants.

use std::cell::Cell;
use std::rc::Rc;

use proptest::prelude::*;
use rat_window::Window;

#[derive(Debug, Clone, Copy)]
enum Op {
    MoveCursorTo(i64),
    MoveCursor(i64),
    ScrollTo(i64),
    ScrollBy(i64),
    PageUp,
    PageDown,
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        (-200i64..200).prop_map(Op::MoveCursorTo),
        (-50i64..50).prop_map(Op::MoveCursor),
        (-200i64..200).prop_map(Op::ScrollTo),
        (-50i64..50).prop_map(Op::ScrollBy),
        Just(Op::PageUp),
        Just(Op::PageDown),
    ]
}

fn apply(w: &mut Window, op: Op) {
    match op {
        Op::MoveCursorTo(n) => w.move_cursor_to(n),
        Op::MoveCursor(d) => w.move_cursor(d),
        Op::ScrollTo(n) => w.scroll_to(n),
        Op::ScrollBy(d) => w.scroll_by(d),
        Op::PageUp => w.page_up(),
        Op::PageDown => w.page_down(),
    }
}

proptest! {
    // After any sequence of navigation ops, scroll and cursor stay within the
    // bounds the spec pins for the Window invariant, for any fixed height/total.
    #[test]
    fn invariants_hold_for_fixed_profile(
        height in 1i64..30,
        total in 0i64..500,
        ops in prop::collection::vec(op_strategy(), 0..50),
    ) {
        let mut w = Window::new(move || height, move || total);
        for op in ops {
            apply(&mut w, op);
        }
        prop_assert!(w.scroll() >= 0);
        prop_assert!(w.scroll() <= (total - height).max(0));
        if total > 0 {
            prop_assert!(w.cursor() >= w.scroll());
            prop_assert!(w.cursor() <= w.scroll() + height - 1);
            prop_assert!(w.cursor() >= 0 && w.cursor() < total);
        } else {
            prop_assert_eq!(w.cursor(), 0);
        }
    }

    // Same, but the content height grows between ops (streaming ingest), the
    // scenario the spec's "total height may grow" note calls out.
    #[test]
    fn invariants_hold_while_total_grows(
        height in 1i64..20,
        growth in prop::collection::vec(0i64..20, 1..30),
        ops in prop::collection::vec(op_strategy(), 0..30),
    ) {
        let total = Rc::new(Cell::new(0i64));
        let total_for_window = total.clone();
        let mut w = Window::new(move || height, move || total_for_window.get());

        for (i, op) in ops.iter().enumerate() {
            let delta = growth[i % growth.len()];
            total.set(total.get() + delta);
            apply(&mut w, *op);

            let t = total.get();
            prop_assert!(w.scroll() >= 0);
            prop_assert!(w.scroll() <= (t - height).max(0));
            if t > 0 {
                prop_assert!(w.cursor() >= w.scroll());
                prop_assert!(w.cursor() <= w.scroll() + height - 1);
            }
        }
    }
}
