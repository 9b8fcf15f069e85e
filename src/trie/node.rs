use std::{
    collections::{btree_map, BTreeMap},
    fmt,
    str::FromStr,
};

use serde::{Deserialize, Serialize};

use super::TrieError;

/// Index of a node in the trie's arena. The root is always `NodeId::ROOT`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub(crate) u32);

impl NodeId {
    pub const ROOT: NodeId = NodeId(0);

    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Label on the edge leading into a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Label {
    /// Sentinel carried by the root only.
    Root,
    Char(char),
    /// Transition marking the end of a response.
    End,
}

impl Label {
    /// Partial substrings are only recorded right after a space.
    pub fn is_word_boundary(self) -> bool {
        self == Label::Char(' ')
    }
}

/// Frequency table of responses (and shared substrings) seen through a node.
/// Absent keys read as zero.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Counts(BTreeMap<String, u64>);

impl Counts {
    pub fn new() -> Self {
        Self(BTreeMap::new())
    }

    /// Count for `key`, or 0 when it was never recorded.
    pub fn get(&self, key: &str) -> u64 {
        self.0.get(key).copied().unwrap_or(0)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// Add `delta` to `key`, creating the entry at 0 first if needed.
    pub fn add(&mut self, key: &str, delta: u64) {
        match self.0.get_mut(key) {
            Some(n) => *n += delta,
            None => {
                self.0.insert(key.to_string(), delta);
            }
        }
    }

    pub fn remove(&mut self, key: &str) -> Option<u64> {
        self.0.remove(key)
    }

    /// Sum of every recorded count.
    pub fn total(&self) -> u64 {
        self.0.values().sum()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> btree_map::Iter<'_, String, u64> {
        self.0.iter()
    }
}

impl FromIterator<(String, u64)> for Counts {
    fn from_iter<I: IntoIterator<Item = (String, u64)>>(iter: I) -> Self {
        let mut out = Counts::new();
        for (k, v) in iter {
            out.add(&k, v);
        }
        out
    }
}

/// Maximum number of suggestions cached per node.
///
/// The value is kept as configured and only validated when a ranking is
/// computed, so a trie built with a bad limit fails on its first
/// count-changing insertion rather than at construction.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum SuggestionLimit {
    Integer(i64),
    Float(f64),
}

impl SuggestionLimit {
    /// Validate the limit. Negative values are rejected before non-integers.
    pub fn resolve(self) -> Result<usize, TrieError> {
        match self {
            SuggestionLimit::Integer(n) if n < 0 => Err(TrieError::InvalidArgument(self)),
            SuggestionLimit::Integer(n) => Ok(n as usize),
            SuggestionLimit::Float(f) if f < 0.0 => Err(TrieError::InvalidArgument(self)),
            SuggestionLimit::Float(_) => Err(TrieError::TypeMismatch(self)),
        }
    }
}

impl Default for SuggestionLimit {
    fn default() -> Self {
        SuggestionLimit::Integer(3)
    }
}

impl From<i64> for SuggestionLimit {
    fn from(n: i64) -> Self {
        SuggestionLimit::Integer(n)
    }
}

impl From<i32> for SuggestionLimit {
    fn from(n: i32) -> Self {
        SuggestionLimit::Integer(n.into())
    }
}

impl From<usize> for SuggestionLimit {
    fn from(n: usize) -> Self {
        SuggestionLimit::Integer(i64::try_from(n).unwrap_or(i64::MAX))
    }
}

impl From<f64> for SuggestionLimit {
    fn from(f: f64) -> Self {
        SuggestionLimit::Float(f)
    }
}

impl fmt::Display for SuggestionLimit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SuggestionLimit::Integer(n) => write!(f, "{}", n),
            SuggestionLimit::Float(v) => write!(f, "{:?}", v),
        }
    }
}

impl FromStr for SuggestionLimit {
    type Err = String;

    /// "5" parses as an integer, "5.0" as a float.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Ok(n) = s.parse::<i64>() {
            return Ok(SuggestionLimit::Integer(n));
        }
        s.parse::<f64>()
            .map(SuggestionLimit::Float)
            .map_err(|_| format!("invalid suggestion limit: {}", s))
    }
}

/// A single trie node.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub(crate) label: Label,
    pub(crate) children: BTreeMap<Label, NodeId>,
    pub(crate) branched: bool,
    pub(crate) counts: Counts,
    pub(crate) suggestions: Vec<String>,
}

impl Node {
    pub fn new(label: Label) -> Self {
        Self {
            label,
            children: BTreeMap::new(),
            branched: false,
            counts: Counts::new(),
            suggestions: Vec::new(),
        }
    }

    pub fn label(&self) -> Label {
        self.label
    }

    /// Existing child for `label`, if any.
    pub fn child_for(&self, label: Label) -> Option<NodeId> {
        self.children.get(&label).copied()
    }

    pub fn children(&self) -> impl Iterator<Item = (Label, NodeId)> + '_ {
        self.children.iter().map(|(l, id)| (*l, *id))
    }

    pub fn has_children(&self) -> bool {
        !self.children.is_empty()
    }

    /// True once this node has ever had more than one child.
    pub fn has_branched(&self) -> bool {
        self.branched
    }

    pub fn counts(&self) -> &Counts {
        &self.counts
    }

    /// Cached ranking, most relevant first.
    pub fn suggestions(&self) -> &[String] {
        &self.suggestions
    }

    /// Attach a child. Gaining a second child marks the node as branched.
    pub(crate) fn attach_child(&mut self, label: Label, id: NodeId) {
        self.children.insert(label, id);
        if self.children.len() > 1 {
            self.branched = true;
        }
    }

    /// Add `delta` to `key` and re-rank.
    pub fn record_count(
        &mut self,
        key: &str,
        delta: u64,
        limit: SuggestionLimit,
    ) -> Result<(), TrieError> {
        self.counts.add(key, delta);
        self.compute_ranking(limit)
    }

    /// Replace the counts wholesale and re-rank.
    pub(crate) fn set_counts(&mut self, counts: Counts, limit: SuggestionLimit) -> Result<(), TrieError> {
        self.counts = counts;
        self.compute_ranking(limit)
    }

    /// Rebuild `suggestions` from `counts`: count descending, then shorter
    /// strings first, truncated to `limit`. The limit is checked before the
    /// node is touched.
    pub fn compute_ranking(&mut self, limit: SuggestionLimit) -> Result<(), TrieError> {
        let max = limit.resolve()?;

        let mut ranked: Vec<(&String, u64)> = self.counts.iter().map(|(k, n)| (k, *n)).collect();
        // Stable sort over BTreeMap order leaves full ties lexicographic.
        ranked.sort_by(|a, b| {
            b.1.cmp(&a.1)
                .then_with(|| a.0.chars().count().cmp(&b.0.chars().count()))
        });

        self.suggestions = ranked.into_iter().take(max).map(|(k, _)| k.clone()).collect();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn counts(items: &[(&str, u64)]) -> Counts {
        items.iter().map(|(k, n)| (k.to_string(), *n)).collect()
    }

    #[test]
    fn counts_default_to_zero() {
        let mut c = Counts::new();
        assert_eq!(c.get("missing"), 0);
        assert!(!c.contains("missing"));

        c.add("a", 0);
        assert!(c.contains("a"));
        assert_eq!(c.get("a"), 0);

        c.add("a", 2);
        c.add("b", 3);
        assert_eq!(c.get("a"), 2);
        assert_eq!(c.total(), 5);
        assert_eq!(c.remove("b"), Some(3));
        assert_eq!(c.len(), 1);
    }

    #[test]
    fn ranking_orders_by_count_then_length() {
        let mut node = Node::new(Label::Char('w'));
        node.counts = counts(&[("aaaa", 1), ("bb", 1), ("c", 5), ("dddddd", 2)]);
        node.compute_ranking(SuggestionLimit::Integer(10)).unwrap();
        assert_eq!(node.suggestions(), ["c", "dddddd", "bb", "aaaa"]);

        node.compute_ranking(SuggestionLimit::Integer(2)).unwrap();
        assert_eq!(node.suggestions(), ["c", "dddddd"]);

        node.compute_ranking(SuggestionLimit::Integer(0)).unwrap();
        assert!(node.suggestions().is_empty());
    }

    #[test]
    fn ranking_length_uses_chars() {
        let mut node = Node::new(Label::Root);
        // 3 chars but 6 bytes vs 4 chars and 4 bytes.
        node.counts = counts(&[("abcd", 1), ("äöü", 1)]);
        node.compute_ranking(SuggestionLimit::Integer(5)).unwrap();
        assert_eq!(node.suggestions(), ["äöü", "abcd"]);
    }

    #[test]
    fn ranking_rejects_negative_limit() {
        let mut node = Node::new(Label::End);
        let err = node.compute_ranking(SuggestionLimit::Integer(-5)).unwrap_err();
        assert!(matches!(err, TrieError::InvalidArgument(_)));

        let err = node.compute_ranking(SuggestionLimit::Float(-5.0)).unwrap_err();
        assert!(matches!(err, TrieError::InvalidArgument(_)));
    }

    #[test]
    fn ranking_rejects_float_limit() {
        let mut node = Node::new(Label::End);
        let err = node.compute_ranking(SuggestionLimit::Float(5.0)).unwrap_err();
        assert!(matches!(err, TrieError::TypeMismatch(_)));
    }

    #[test]
    fn failed_ranking_keeps_previous_suggestions() {
        let mut node = Node::new(Label::Char('a'));
        node.record_count("abc", 1, SuggestionLimit::Integer(3)).unwrap();
        assert!(node.record_count("ab", 4, SuggestionLimit::Integer(-1)).is_err());
        assert_eq!(node.suggestions(), ["abc"]);
        // The count itself was already applied.
        assert_eq!(node.counts().get("ab"), 4);
    }

    #[test]
    fn attach_child_tracks_branching() {
        let mut node = Node::new(Label::Root);
        node.attach_child(Label::Char('a'), NodeId(1));
        assert!(!node.has_branched());
        node.attach_child(Label::Char('b'), NodeId(2));
        assert!(node.has_branched());
        assert_eq!(node.child_for(Label::Char('b')), Some(NodeId(2)));
        assert_eq!(node.child_for(Label::End), None);
    }

    #[test]
    fn parse_limit() {
        assert_eq!("5".parse::<SuggestionLimit>(), Ok(SuggestionLimit::Integer(5)));
        assert_eq!("-5".parse::<SuggestionLimit>(), Ok(SuggestionLimit::Integer(-5)));
        assert_eq!("5.0".parse::<SuggestionLimit>(), Ok(SuggestionLimit::Float(5.0)));
        assert!("five".parse::<SuggestionLimit>().is_err());
    }
}
