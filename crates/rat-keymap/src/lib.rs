//! Key-sequence dispatcher: a multi-level map keyed by `KeyEvent`, built by
//! inserting each registered key sequence **from the end inward**, so that a
//! short suffix binding (e.g. a single `j`) still matches against a longer
//! rolling key-stack that happens to end in it.
//!
//! Each node can carry more than one [`Handler`]: several modes may bind the
//! same key sequence with different context requirements (e.g. `l` bound once
//! globally and once more specifically when a `file` annotation is under the
//! cursor). [`HandlerRegistry::find`] walks the tree consuming the query
//! sequence in the same end-inward order, and at every node reached picks the
//! most-specific context-compatible handler (ties broken by insertion order);
//! the deepest (= longest matched suffix) node that has a compatible handler
//! wins overall.

use std::collections::HashMap;

use rat_events::KeyEvent;

struct Handler<T> {
    requirements: Vec<String>,
    specificity: usize,
    insertion_order: usize,
    payload: T,
}

#[derive(Default)]
struct Node<T> {
    edges: HashMap<KeyEvent, usize>,
    handlers: Vec<Handler<T>>,
}

impl<T> Node<T> {
    fn new() -> Self {
        Self {
            edges: HashMap::new(),
            handlers: Vec::new(),
        }
    }
}

/// A prefix tree of context-qualified handlers, keyed by key-event suffix.
pub struct HandlerRegistry<T> {
    nodes: Vec<Node<T>>,
    next_insertion_order: usize,
}

impl<T> Default for HandlerRegistry<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> HandlerRegistry<T> {
    pub fn new() -> Self {
        Self {
            nodes: vec![Node::new()],
            next_insertion_order: 0,
        }
    }

    /// Registers `payload` for `seq`, requiring every class in `requirements`
    /// to be present in the context at dispatch time.
    pub fn register<I, S>(&mut self, seq: &[KeyEvent], requirements: I, payload: T)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let requirements: Vec<String> = requirements.into_iter().map(Into::into).collect();
        let specificity = requirements.len();

        let mut cur = 0usize;
        for key in seq.iter().rev() {
            cur = match self.nodes[cur].edges.get(key) {
                Some(&next) => next,
                None => {
                    self.nodes.push(Node::new());
                    let new_idx = self.nodes.len() - 1;
                    self.nodes[cur].edges.insert(*key, new_idx);
                    new_idx
                }
            };
        }

        let insertion_order = self.next_insertion_order;
        self.next_insertion_order += 1;
        self.nodes[cur].handlers.push(Handler {
            requirements,
            specificity,
            insertion_order,
            payload,
        });
    }

    /// Finds the most-specific handler compatible with `context` along the
    /// end-inward walk of `seq`. Returns `None` if no node visited has a
    /// handler whose requirements are satisfied.
    pub fn find(&self, seq: &[KeyEvent], context: &HashMap<String, String>) -> Option<&T> {
        let mut cur = 0usize;
        let mut best: Option<&Handler<T>> = Self::best_at(&self.nodes[cur], context);

        for key in seq.iter().rev() {
            match self.nodes[cur].edges.get(key) {
                Some(&next) => cur = next,
                None => break,
            }
            if let Some(h) = Self::best_at(&self.nodes[cur], context) {
                best = Some(h);
            }
        }

        best.map(|h| &h.payload)
    }

    fn best_at<'a>(node: &'a Node<T>, context: &HashMap<String, String>) -> Option<&'a Handler<T>> {
        let mut best: Option<&Handler<T>> = None;
        for h in &node.handlers {
            if !h.requirements.iter().all(|r| context.contains_key(r)) {
                continue;
            }
            best = match best {
                None => Some(h),
                Some(cur) => {
                    if h.specificity > cur.specificity
                        || (h.specificity == cur.specificity && h.insertion_order < cur.insertion_order)
                    {
                        Some(h)
                    } else {
                        Some(cur)
                    }
                }
            };
        }
        best
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rat_events::parse_key_sequence;

    fn seq(s: &str) -> Vec<KeyEvent> {
        parse_key_sequence(s).unwrap()
    }

    #[test]
    fn exact_match_no_context() {
        let mut r = HandlerRegistry::new();
        r.register(&seq("j"), Vec::<String>::new(), "down");
        let ctx = HashMap::new();
        assert_eq!(r.find(&seq("j"), &ctx), Some(&"down"));
    }

    #[test]
    fn suffix_matches_longer_stack() {
        let mut r = HandlerRegistry::new();
        r.register(&seq("j"), Vec::<String>::new(), "down");
        let ctx = HashMap::new();
        assert_eq!(r.find(&seq("x,j"), &ctx), Some(&"down"));
    }

    #[test]
    fn most_specific_context_wins() {
        let mut r = HandlerRegistry::new();
        r.register(&seq("l"), Vec::<String>::new(), "generic");
        r.register(&seq("l"), vec!["file".to_string()], "open_file");

        let mut ctx = HashMap::new();
        assert_eq!(r.find(&seq("l"), &ctx), Some(&"generic"));

        ctx.insert("file".to_string(), "a.txt".to_string());
        assert_eq!(r.find(&seq("l"), &ctx), Some(&"open_file"));
    }

    #[test]
    fn ties_broken_by_insertion_order() {
        let mut r = HandlerRegistry::new();
        r.register(&seq("l"), vec!["file".to_string()], "first");
        r.register(&seq("l"), vec!["word".to_string()], "second");

        let mut ctx = HashMap::new();
        ctx.insert("file".to_string(), "x".to_string());
        ctx.insert("word".to_string(), "y".to_string());
        assert_eq!(r.find(&seq("l"), &ctx), Some(&"first"));
    }

    #[test]
    fn longest_matching_suffix_wins_over_shallower_match() {
        let mut r = HandlerRegistry::new();
        r.register(&seq("g"), Vec::<String>::new(), "single_g");
        r.register(&seq("g,g"), Vec::<String>::new(), "double_g");

        let ctx = HashMap::new();
        assert_eq!(r.find(&seq("g,g"), &ctx), Some(&"double_g"));
        assert_eq!(r.find(&seq("x,g"), &ctx), Some(&"single_g"));
    }

    #[test]
    fn no_compatible_handler_returns_none() {
        let mut r = HandlerRegistry::new();
        r.register(&seq("l"), vec!["file".to_string()], "open_file");
        let ctx = HashMap::new();
        assert_eq!(r.find(&seq("l"), &ctx), None);
    }
}
