//! Incremental prefix tree with per-node frequency counts and cached,
//! ranked suggestion lists.
//!
//! The tree is built in one phase (`insert`) and served in another
//! (`generate_completions`). Nothing here synchronizes the two: an insertion
//! can rewrite counts deep in the tree, so a reader running alongside a
//! writer may see a torn update. Mutation needs `&mut Trie`; share a built
//! trie read-only (see `crate::autocomplete::Autocomplete`) or guard it with
//! an external `RwLock`.

mod insert;
mod node;
mod query;

#[cfg(test)]
mod proptests;

pub use node::{Counts, Label, Node, NodeId, SuggestionLimit};

use serde::Serialize;

pub const DEFAULT_MAX_SUGGESTIONS: i64 = 3;
pub const DEFAULT_MIN_WORDS_PARTIAL: usize = 4;

#[derive(Debug, thiserror::Error)]
pub enum TrieError {
    #[error("max_suggestions must be >= 0, got {0}")]
    InvalidArgument(SuggestionLimit),
    #[error("max_suggestions must be an integer, got {0}")]
    TypeMismatch(SuggestionLimit),
    #[error("malformed trie: {0}")]
    Malformed(String),
    #[error("trie is full: {0} nodes")]
    Capacity(usize),
}

/// Id for the node appended to an arena of `len` nodes.
fn next_id(len: usize) -> Result<NodeId, TrieError> {
    u32::try_from(len)
        .map(NodeId)
        .map_err(|_| TrieError::Capacity(len))
}

/// Prefix tree over response strings.
#[derive(Debug, Clone, PartialEq)]
pub struct Trie {
    nodes: Vec<Node>,
    max_suggestions: SuggestionLimit,
    min_words_partial: usize,
    responses: u64,
}

/// Shape summary of a trie.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TrieStats {
    pub nodes: usize,
    pub responses: u64,
    /// Nodes holding non-empty counts.
    pub decision_nodes: usize,
    /// Nodes with more than one child.
    pub branch_points: usize,
    pub max_depth: usize,
}

impl Default for Trie {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_SUGGESTIONS, DEFAULT_MIN_WORDS_PARTIAL)
    }
}

impl Trie {
    /// Create an empty trie. The suggestion limit is not validated here.
    pub fn new(max_suggestions: impl Into<SuggestionLimit>, min_words_partial: usize) -> Self {
        Self {
            nodes: vec![Node::new(Label::Root)],
            max_suggestions: max_suggestions.into(),
            min_words_partial,
            responses: 0,
        }
    }

    pub fn max_suggestions(&self) -> SuggestionLimit {
        self.max_suggestions
    }

    pub fn min_words_partial(&self) -> usize {
        self.min_words_partial
    }

    /// Number of responses inserted so far.
    pub fn responses(&self) -> u64 {
        self.responses
    }

    /// Number of nodes, root included.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// True when nothing has been inserted.
    pub fn is_empty(&self) -> bool {
        self.nodes.len() == 1
    }

    pub fn root(&self) -> &Node {
        &self.nodes[NodeId::ROOT.index()]
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.index()]
    }

    fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.index()]
    }

    /// Follow `prefix` character by character from the root.
    pub fn walk(&self, prefix: &str) -> Option<NodeId> {
        let mut current = NodeId::ROOT;
        for ch in prefix.chars() {
            current = self.node(current).child_for(Label::Char(ch))?;
        }
        Some(current)
    }

    /// Counts stored at the node reached by `prefix`.
    pub fn counts_at(&self, prefix: &str) -> Option<&Counts> {
        self.walk(prefix).map(|id| self.node(id).counts())
    }

    /// Create a child of `parent` labeled `label` and return its id.
    fn create_child(&mut self, parent: NodeId, label: Label) -> Result<NodeId, TrieError> {
        let id = next_id(self.nodes.len())?;
        self.nodes.push(Node::new(label));
        self.node_mut(parent).attach_child(label, id);
        Ok(id)
    }

    /// Change the suggestion limit and re-rank every node holding counts.
    /// On error, neither the limit nor any node changes.
    pub fn compute_ranking(&mut self, max_suggestions: impl Into<SuggestionLimit>) -> Result<(), TrieError> {
        let limit = max_suggestions.into();
        limit.resolve()?;

        self.max_suggestions = limit;
        for node in self.nodes.iter_mut().filter(|n| !n.counts.is_empty()) {
            node.compute_ranking(limit)?;
        }
        Ok(())
    }

    /// Walk the whole tree (iteratively) and summarize its shape.
    pub fn stats(&self) -> TrieStats {
        let mut out = TrieStats {
            nodes: self.nodes.len(),
            responses: self.responses,
            ..Default::default()
        };

        let mut stack = vec![(NodeId::ROOT, 0usize)];
        while let Some((id, depth)) = stack.pop() {
            let node = self.node(id);
            if !node.counts.is_empty() {
                out.decision_nodes += 1;
            }
            if node.children.len() > 1 {
                out.branch_points += 1;
            }
            out.max_depth = out.max_depth.max(depth);
            for (_, child) in node.children() {
                stack.push((child, depth + 1));
            }
        }

        out
    }

    pub(crate) fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Rebuild a trie from decoded parts, checking that `nodes` forms a
    /// rooted tree: root at index 0, every node reached exactly once,
    /// edge labels matching child labels.
    pub(crate) fn from_parts(
        nodes: Vec<Node>,
        max_suggestions: SuggestionLimit,
        min_words_partial: usize,
        responses: u64,
    ) -> Result<Self, TrieError> {
        let malformed = |msg: String| Err(TrieError::Malformed(msg));

        match nodes.first() {
            Some(n) if n.label == Label::Root => {}
            Some(_) => return malformed("first node is not the root".to_string()),
            None => return malformed("no nodes".to_string()),
        }
        if u32::try_from(nodes.len()).is_err() {
            return malformed(format!("too many nodes: {}", nodes.len()));
        }

        let mut seen = vec![false; nodes.len()];
        seen[0] = true;
        let mut stack = vec![NodeId::ROOT];

        while let Some(id) = stack.pop() {
            let node = &nodes[id.index()];
            if node.label == Label::End && !node.children.is_empty() {
                return malformed(format!("end node {} has children", id.0));
            }
            if node.children.len() > 1 && !node.branched {
                return malformed(format!("node {} has several children but is not branched", id.0));
            }

            for (label, child) in node.children() {
                let Some(target) = nodes.get(child.index()) else {
                    return malformed(format!("node {} points past the end ({})", id.0, child.0));
                };
                if seen[child.index()] {
                    return malformed(format!("node {} is reached twice", child.0));
                }
                if label == Label::Root || target.label != label {
                    return malformed(format!("edge label mismatch at node {}", child.0));
                }
                seen[child.index()] = true;
                stack.push(child);
            }
        }

        if let Some(pos) = seen.iter().position(|s| !s) {
            return malformed(format!("node {} is unreachable", pos));
        }

        Ok(Self {
            nodes,
            max_suggestions,
            min_words_partial,
            responses,
        })
    }
}
