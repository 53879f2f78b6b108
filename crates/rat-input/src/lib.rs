//! The dispatch loop's rolling key-stack: accumulates key events until one of
//! an ordered list of [`KeySource`]s reports a match, then clears. A
//! [`KeySource`] is anything that can attempt to consume the current
//! accumulated sequence — the active prompt, the pager stack's topmost pager,
//! or the global registry, tried in that order each keypress.

use std::time::{Duration, Instant};

use rat_events::KeyEvent;

/// Bounds how many trailing keys the stack retains. No binding is longer than
/// a handful of keys; capping avoids unbounded growth when a key never
/// matches anything (e.g. random mashing with no global fallback).
const MAX_STACK_LEN: usize = 16;

pub trait KeySource {
    /// Attempts to consume `seq`. Returns `true` if a handler fired.
    fn try_handle(&mut self, seq: &[KeyEvent]) -> bool;
}

/// The rolling buffer of not-yet-matched key events, plus the time of the
/// last push so a caller can apply its own idle timeout policy.
pub struct KeyStack {
    events: Vec<KeyEvent>,
    last_push: Instant,
}

impl Default for KeyStack {
    fn default() -> Self {
        Self::new()
    }
}

impl KeyStack {
    pub fn new() -> Self {
        Self {
            events: Vec::new(),
            last_push: Instant::now(),
        }
    }

    pub fn as_slice(&self) -> &[KeyEvent] {
        &self.events
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }

    pub fn idle_for(&self) -> Duration {
        self.last_push.elapsed()
    }

    fn push(&mut self, key: KeyEvent) {
        self.events.push(key);
        if self.events.len() > MAX_STACK_LEN {
            let overflow = self.events.len() - MAX_STACK_LEN;
            self.events.drain(0..overflow);
        }
        self.last_push = Instant::now();
    }
}

/// Pushes `key` onto `stack`, then tries each source in order (prompt first,
/// then the active widget, then the global registry). The first source that
/// reports a match clears the stack; otherwise the stack keeps accumulating.
/// Returns whether any source handled the event.
pub fn dispatch_key(stack: &mut KeyStack, key: KeyEvent, sources: &mut [&mut dyn KeySource]) -> bool {
    stack.push(key);
    for source in sources.iter_mut() {
        if source.try_handle(stack.as_slice()) {
            stack.clear();
            return true;
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use rat_events::parse_key_sequence;

    struct MatchOn(Vec<KeyEvent>);
    impl KeySource for MatchOn {
        fn try_handle(&mut self, seq: &[KeyEvent]) -> bool {
            seq.ends_with(&self.0)
        }
    }

    struct NeverMatches;
    impl KeySource for NeverMatches {
        fn try_handle(&mut self, _seq: &[KeyEvent]) -> bool {
            false
        }
    }

    #[test]
    fn unmatched_key_accumulates() {
        let mut stack = KeyStack::new();
        let mut never = NeverMatches;
        let mut sources: Vec<&mut dyn KeySource> = vec![&mut never];
        let handled = dispatch_key(&mut stack, parse_key_sequence("g").unwrap()[0], &mut sources);
        assert!(!handled);
        assert_eq!(stack.as_slice().len(), 1);
    }

    #[test]
    fn matching_source_clears_stack() {
        let mut stack = KeyStack::new();
        let mut matcher = MatchOn(parse_key_sequence("g,g").unwrap());
        let mut sources: Vec<&mut dyn KeySource> = vec![&mut matcher];

        let g = parse_key_sequence("g").unwrap()[0];
        assert!(!dispatch_key(&mut stack, g, &mut sources));
        assert!(dispatch_key(&mut stack, g, &mut sources));
        assert!(stack.is_empty());
    }

    #[test]
    fn earlier_source_takes_priority() {
        let mut stack = KeyStack::new();
        let mut prompt = MatchOn(parse_key_sequence("y").unwrap());
        let mut never = NeverMatches;
        let mut sources: Vec<&mut dyn KeySource> = vec![&mut prompt, &mut never];
        let y = parse_key_sequence("y").unwrap()[0];
        assert!(dispatch_key(&mut stack, y, &mut sources));
    }

    #[test]
    fn stack_length_is_bounded() {
        let mut stack = KeyStack::new();
        let mut never = NeverMatches;
        let mut sources: Vec<&mut dyn KeySource> = vec![&mut never];
        let g = parse_key_sequence("g").unwrap()[0];
        for _ in 0..(MAX_STACK_LEN + 10) {
            dispatch_key(&mut stack, g, &mut sources);
        }
        assert!(stack.as_slice().len() <= MAX_STACK_LEN);
    }
}
