//! Minimal acyclic DFA (trie) construction, ported from the Daciuk–Mihov incremental
//! algorithm: equivalent subtrees (same terminal flag, same ordered transition labels
//! pointing to equivalent children) are shared via a registry rather than duplicated.
//!
//! Nodes are reference-counted with `Arc` rather than `Rc`: a compiled [`Trie`] is
//! moved into the blocking task that runs its annotator (`rat-annotate`), so it has
//! to be `Send`.

use std::collections::HashMap;
use std::sync::Arc;

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TrieError {
    #[error("input words are not lexicographically sorted")]
    UnsortedInput,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct Transition {
    label: char,
    child: Arc<Node>,
}

#[derive(Debug, Default)]
struct Node {
    terminal: bool,
    transitions: Vec<Transition>,
}

impl PartialEq for Node {
    fn eq(&self, other: &Self) -> bool {
        self.terminal == other.terminal
            && self.transitions.len() == other.transitions.len()
            && self
                .transitions
                .iter()
                .zip(other.transitions.iter())
                .all(|(a, b)| a.label == b.label && Arc::ptr_eq(&a.child, &b.child))
    }
}
impl Eq for Node {}

impl std::hash::Hash for Node {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.terminal.hash(state);
        for t in &self.transitions {
            t.label.hash(state);
            Arc::as_ptr(&t.child).hash(state);
        }
    }
}

impl Node {
    fn child(&self, label: char) -> Option<&Arc<Node>> {
        self.transitions
            .binary_search_by(|t| t.label.cmp(&label))
            .ok()
            .map(|i| &self.transitions[i].child)
    }
}

/// A minimal acyclic DFA over a fixed, sorted word list.
pub struct Trie {
    root: Arc<Node>,
}

/// A cursor walking the trie one rune at a time, used by the greedy longest-match
/// scanner in `rat-annotate`.
#[derive(Clone)]
pub struct TrieCursor<'a> {
    trie: &'a Trie,
    node: Option<Arc<Node>>,
}

impl Trie {
    /// Builds a trie from a word list. The list must already be sorted
    /// lexicographically; an unsorted list fails with [`TrieError::UnsortedInput`]
    /// before any nodes are constructed.
    pub fn build<S: AsRef<str>>(words: &[S]) -> Result<Self, TrieError> {
        for pair in words.windows(2) {
            if pair[0].as_ref() > pair[1].as_ref() {
                return Err(TrieError::UnsortedInput);
            }
        }

        let mut builder = Builder::default();
        for w in words {
            builder.insert(w.as_ref());
        }
        let root = builder.finish();
        Ok(Self { root })
    }

    pub fn cursor(&self) -> TrieCursor<'_> {
        TrieCursor {
            trie: self,
            node: Some(self.root.clone()),
        }
    }

    /// Returns whether `word` is accepted, i.e. following its runes from the root
    /// lands on a terminal node.
    pub fn accepts(&self, word: &str) -> bool {
        let mut cur = self.cursor();
        for ch in word.chars() {
            if !cur.advance(ch) {
                return false;
            }
        }
        cur.is_terminal()
    }
}

impl<'a> TrieCursor<'a> {
    /// Advances the cursor by one rune. Returns `false` (leaving the cursor at the
    /// root) if no transition exists.
    pub fn advance(&mut self, ch: char) -> bool {
        match self.node.as_ref().and_then(|n| n.child(ch)) {
            Some(child) => {
                self.node = Some(child.clone());
                true
            }
            None => {
                self.node = None;
                false
            }
        }
    }

    pub fn reset(&mut self) {
        self.node = Some(self.trie.root.clone());
    }

    pub fn is_terminal(&self) -> bool {
        self.node.as_ref().is_some_and(|n| n.terminal)
    }

    pub fn has_children(&self) -> bool {
        self.node.as_ref().is_some_and(|n| !n.transitions.is_empty())
    }

    pub fn is_valid(&self) -> bool {
        self.node.is_some()
    }
}

/// Incremental Daciuk–Mihov construction state: an explicit path from the root
/// (`register`-pending suffix) plus an equivalence-class registry for structural
/// sharing of already-finished subtrees.
#[derive(Default)]
struct Builder {
    registry: HashMap<RegKey, Arc<Node>>,
    // path[i] is the node at depth i in the word currently being inserted, in
    // mutable (not-yet-registered) form.
    path: Vec<MutNode>,
    last_word: String,
}

#[derive(Default, Clone)]
struct MutNode {
    terminal: bool,
    transitions: Vec<(char, NodeRef)>,
}

#[derive(Clone)]
enum NodeRef {
    Frozen(Arc<Node>),
}

#[derive(PartialEq, Eq, Hash)]
struct RegKey {
    terminal: bool,
    transitions: Vec<(char, usize)>,
}

impl Builder {
    fn insert(&mut self, word: &str) {
        let common = common_prefix_len(&self.last_word, word);

        // Freeze (register-or-reuse) every node deeper than the common prefix from
        // the previous word, from the deepest back up to just past the prefix.
        self.freeze_from(common);

        if self.path.is_empty() {
            self.path.push(MutNode::default());
        }

        let suffix: Vec<char> = word.chars().skip(common).collect();
        let mut depth = common;
        for ch in &suffix {
            self.path.push(MutNode::default());
            let idx = self.path.len() - 2;
            // placeholder transition; child gets attached once frozen.
            self.path[idx].transitions.push((*ch, NodeRef::Frozen(Arc::new(Node::default()))));
            depth += 1;
        }
        let _ = depth;

        self.path.last_mut().unwrap().terminal = true;
        self.last_word = word.to_string();
    }

    /// Registers (or reuses via the equivalence registry) every node in `self.path`
    /// strictly deeper than `keep_depth`, replacing the placeholder child references
    /// left by `insert` with the frozen, shared node.
    fn freeze_from(&mut self, keep_depth: usize) {
        while self.path.len() > keep_depth + 1 {
            let node = self.path.pop().unwrap();
            let frozen = self.register(node);
            if let Some(parent) = self.path.last_mut() {
                if let Some(last) = parent.transitions.last_mut() {
                    last.1 = NodeRef::Frozen(frozen);
                }
            }
        }
    }

    fn register(&mut self, node: MutNode) -> Arc<Node> {
        let mut transitions = Vec::with_capacity(node.transitions.len());
        for (ch, r) in &node.transitions {
            let NodeRef::Frozen(rc) = r;
            transitions.push((*ch, rc.clone()));
        }
        transitions.sort_by_key(|(ch, _)| *ch);

        let key = RegKey {
            terminal: node.terminal,
            transitions: transitions
                .iter()
                .map(|(ch, rc)| (*ch, Arc::as_ptr(rc) as usize))
                .collect(),
        };

        if let Some(existing) = self.registry.get(&key) {
            return existing.clone();
        }

        let real = Arc::new(Node {
            terminal: node.terminal,
            transitions: transitions
                .into_iter()
                .map(|(label, child)| Transition { label, child })
                .collect(),
        });
        self.registry.insert(key, real.clone());
        real
    }

    fn finish(mut self) -> Arc<Node> {
        self.freeze_from(0);
        if self.path.is_empty() {
            return Arc::new(Node::default());
        }
        let root = self.path.pop().unwrap();
        self.register(root)
    }
}

fn common_prefix_len(a: &str, b: &str) -> usize {
    a.chars().zip(b.chars()).take_while(|(x, y)| x == y).count()
}
