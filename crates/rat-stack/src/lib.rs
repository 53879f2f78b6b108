//! Pager stack (C7): an ordered chain of pagers, each optionally linked to its
//! parent by the key sequence that created it, laid out over the terminal as
//! a reactive master-detail view.
//!
//! The stack never constructs a [`Pager`] itself — that needs the mode
//! registry a config file builds, which lives above this crate. Instead
//! [`PagerStack::handle_event`] bubbles a fired binding's resolved action
//! back to the caller, tagged with the id of the pager that produced it, so
//! the caller can build the new `Pager` and hand it to [`PagerStack::push`]
//! or [`PagerStack::add_child`].

pub mod layout;

use std::collections::HashMap;

use rat_events::KeyEvent;
use rat_layout::Rect;
use rat_pager::{HandleOutcome, Pager, Rendered, ResolvedAction};
use tracing::debug;

pub use layout::{Orientation, SplitScheme};

/// Opaque identity for a stack element, stable across pushes/pops of other
/// elements so a bubbled-up action can name which pager it came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PagerId(u64);

struct StackElement {
    id: PagerId,
    pager: Pager,
    creating_keys: Vec<KeyEvent>,
}

/// What handling a key sequence did, from the stack's point of view.
pub enum StackOutcome {
    /// No pager in the stack had a binding for this sequence.
    NotHandled,
    /// The topmost pager (or a parent replay) applied the effect to itself.
    Handled,
    /// A binding resolved to a config action; `source` names the pager whose
    /// context it was resolved against (the parent for an `AddChildPager`,
    /// the acting pager for `Push`/`Confirm`/`Exec`).
    Action { source: PagerId, action: ResolvedAction },
}

/// One rendered section of the stack's layout, ready for a terminal backend
/// to paint into its rect.
pub struct Section {
    pub rect: Rect,
    pub rendered: Rendered,
    pub is_active: bool,
}

/// A divider line to draw between two adjacent sections.
pub struct Divider {
    pub rect: Rect,
    pub ch: char,
}

pub struct Layout {
    pub sections: Vec<Section>,
    pub dividers: Vec<Divider>,
}

/// A stack of pagers with master-detail split layout and parent/child
/// `creatingKeys` linkage.
pub struct PagerStack {
    elements: Vec<StackElement>,
    next_id: u64,
    num_to_show: usize,
    scheme: SplitScheme,
}

impl Default for PagerStack {
    fn default() -> Self {
        Self::new()
    }
}

impl PagerStack {
    pub fn new() -> Self {
        Self {
            elements: Vec::new(),
            next_id: 0,
            num_to_show: 3,
            scheme: SplitScheme::Golden,
        }
    }

    pub fn set_num_to_show(&mut self, n: usize) {
        self.num_to_show = n.max(1);
    }

    pub fn num_to_show(&self) -> usize {
        self.num_to_show
    }

    pub fn set_scheme(&mut self, scheme: SplitScheme) {
        self.scheme = scheme;
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    fn alloc_id(&mut self) -> PagerId {
        let id = PagerId(self.next_id);
        self.next_id += 1;
        id
    }

    /// Pushes `pager` as a new root, equivalent to `push_as_child(pager, [])`.
    pub fn push(&mut self, pager: Pager) -> PagerId {
        self.push_as_child(pager, Vec::new())
    }

    /// Pushes `pager` onto the top of the stack, recording `creating_keys` as
    /// the binding that produced it (empty for a plain push).
    pub fn push_as_child(&mut self, pager: Pager, creating_keys: Vec<KeyEvent>) -> PagerId {
        let id = self.alloc_id();
        self.elements.push(StackElement {
            id,
            pager,
            creating_keys,
        });
        id
    }

    /// Pops elements from the top until the top is `parent`, then pushes
    /// `child` as its child. If `parent` is never found, every element is
    /// popped and `child` becomes the new (only) root.
    pub fn add_child(&mut self, parent: PagerId, child: Pager, creating_keys: Vec<KeyEvent>) -> PagerId {
        while let Some(top) = self.elements.last() {
            if top.id == parent {
                break;
            }
            let mut popped = self.elements.pop().expect("checked by last() above");
            popped.pager.destroy();
        }
        self.push_as_child(child, creating_keys)
    }

    /// Removes and destroys the topmost pager. Returns `false` if the stack
    /// was already empty.
    pub fn pop(&mut self) -> bool {
        match self.elements.pop() {
            Some(mut top) => {
                top.pager.destroy();
                true
            }
            None => false,
        }
    }

    pub fn top(&self) -> Option<&Pager> {
        self.elements.last().map(|e| &e.pager)
    }

    pub fn top_mut(&mut self) -> Option<&mut Pager> {
        self.elements.last_mut().map(|e| &mut e.pager)
    }

    pub fn top_id(&self) -> Option<PagerId> {
        self.elements.last().map(|e| e.id)
    }

    fn find_index(&self, id: PagerId) -> Option<usize> {
        self.elements.iter().position(|e| e.id == id)
    }

    /// The annotation context of the pager named by `id`, for resolving a
    /// bubbled-up action's placeholders against the pager it came from.
    pub fn context_of(&self, id: PagerId) -> HashMap<String, String> {
        self.find_index(id)
            .map(|i| self.elements[i].pager.context())
            .unwrap_or_default()
    }

    /// Delivers `seq` to the topmost pager only; the stack itself never
    /// intercepts keys ahead of it.
    pub fn handle_event(&mut self, seq: &[KeyEvent]) -> StackOutcome {
        let Some(idx) = self.elements.len().checked_sub(1) else {
            return StackOutcome::NotHandled;
        };
        let outcome = self.elements[idx].pager.handle_event(seq);
        self.apply_outcome(idx, outcome)
    }

    fn apply_outcome(&mut self, idx: usize, outcome: HandleOutcome) -> StackOutcome {
        match outcome {
            HandleOutcome::NotHandled => StackOutcome::NotHandled,
            HandleOutcome::Handled => StackOutcome::Handled,
            HandleOutcome::Action(action) => StackOutcome::Action {
                source: self.elements[idx].id,
                action,
            },
            HandleOutcome::ParentCursorUp => self.replay_parent_cursor(idx, -1),
            HandleOutcome::ParentCursorDown => self.replay_parent_cursor(idx, 1),
        }
    }

    /// `ParentCursorUp/Down` only fires when there's a parent to move, more
    /// than one section is visible, and the current top was created by a key
    /// sequence. Otherwise the key is swallowed (it was still "handled" in
    /// the sense that nothing should fall through to a global binding).
    fn replay_parent_cursor(&mut self, idx: usize, delta: i64) -> StackOutcome {
        if idx == 0 || self.num_to_show <= 1 || self.elements.len() <= 1 {
            return StackOutcome::Handled;
        }
        if self.elements[idx].creating_keys.is_empty() {
            return StackOutcome::Handled;
        }

        let creating_keys = self.elements[idx].creating_keys.clone();
        let mut child = self.elements.pop().expect("idx is the top, checked above");
        child.pager.destroy();

        let parent_idx = self.elements.len() - 1;
        debug!(delta, "replaying creating keys against parent after cursor move");
        self.elements[parent_idx].pager.move_cursor(delta);
        let replay_outcome = self.elements[parent_idx].pager.handle_event(&creating_keys);
        self.apply_outcome(parent_idx, replay_outcome)
    }

    /// Computes the split layout for `area` and renders each visible pager
    /// into its section. The stack shows at most `num_to_show` pagers,
    /// the most recently pushed ("active") one in the golden/even-split's
    /// last (rightmost/bottommost) section.
    pub fn render(&self, area: Rect) -> Layout {
        let n = self.num_to_show.min(self.elements.len());
        if n == 0 {
            return Layout {
                sections: Vec::new(),
                dividers: Vec::new(),
            };
        }

        let rects = layout::split_rects(area, n, self.scheme);
        let orientation = layout::orientation_for(area);
        let visible = &self.elements[self.elements.len() - n..];

        let mut sections = Vec::with_capacity(n);
        let mut dividers = Vec::with_capacity(n.saturating_sub(1));

        for (i, (elem, rect)) in visible.iter().zip(rects.iter()).enumerate() {
            elem.pager.set_height(rect.height);
            sections.push(Section {
                rect: *rect,
                rendered: elem.pager.render(),
                is_active: i + 1 == n,
            });

            if i + 1 < n {
                let (divider_rect, ch) = match orientation {
                    Orientation::Columns => (Rect::new(rect.right(), area.top, 1, area.height), '│'),
                    Orientation::Rows => (Rect::new(area.left, rect.bottom(), area.width, 1), '─'),
                };
                dividers.push(Divider { rect: divider_rect, ch });
            }
        }

        Layout { sections, dividers }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rat_pager::Source;
    use std::collections::HashMap as Map;

    fn pager(cmd: &str) -> Pager {
        Pager::new(cmd, Source::Cmd(cmd.to_string()), Vec::new(), Vec::new(), Map::new())
    }

    #[tokio::test]
    async fn push_then_pop_destroys_and_empties() {
        let mut stack = PagerStack::new();
        stack.push(pager("true"));
        assert_eq!(stack.len(), 1);
        assert!(stack.pop());
        assert!(stack.is_empty());
        assert!(!stack.pop());
    }

    #[tokio::test]
    async fn add_child_pops_down_to_named_parent() {
        let mut stack = PagerStack::new();
        let root = stack.push(pager("true"));
        stack.push(pager("true"));
        stack.push(pager("true"));
        assert_eq!(stack.len(), 3);

        stack.add_child(root, pager("true"), Vec::new());
        assert_eq!(stack.len(), 2);
    }

    #[tokio::test]
    async fn add_child_with_unknown_parent_empties_the_stack_first() {
        let mut stack = PagerStack::new();
        stack.push(pager("true"));
        stack.push(pager("true"));

        stack.add_child(PagerId(999), pager("true"), Vec::new());
        assert_eq!(stack.len(), 1);
    }

    #[tokio::test]
    async fn render_shows_at_most_num_to_show_with_active_last() {
        let mut stack = PagerStack::new();
        stack.set_num_to_show(2);
        stack.push(pager("true"));
        stack.push(pager("true"));
        stack.push(pager("true"));

        let layout = stack.render(Rect::new(0, 0, 120, 40));
        assert_eq!(layout.sections.len(), 2);
        assert!(layout.sections.last().unwrap().is_active);
        assert_eq!(layout.dividers.len(), 1);
    }

    #[tokio::test]
    async fn parent_cursor_replay_is_swallowed_without_creating_keys() {
        let mut stack = PagerStack::new();
        stack.push(pager("true"));
        stack.push(pager("true"));

        let outcome = stack.replay_parent_cursor(1, 1);
        assert!(matches!(outcome, StackOutcome::Handled));
        assert_eq!(stack.len(), 2);
    }

    #[tokio::test]
    async fn parent_cursor_replay_with_single_section_visible_is_swallowed() {
        let mut stack = PagerStack::new();
        stack.set_num_to_show(1);
        let root = stack.push(pager("true"));
        stack.add_child(root, pager("true"), rat_events::parse_key_sequence("l").unwrap());

        let outcome = stack.replay_parent_cursor(1, 1);
        assert!(matches!(outcome, StackOutcome::Handled));
        assert_eq!(stack.len(), 2);
    }
}
