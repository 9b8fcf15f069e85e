use super::{Label, NodeId, Trie};

impl Trie {
    /// Ranked completions for `prefix`, most likely first.
    ///
    /// Walks the prefix from the root, keeping the deepest non-empty cached
    /// ranking seen. Stops at the first character with no matching child and
    /// returns an empty list in that case.
    pub fn generate_completions(&self, prefix: &str) -> Vec<String> {
        let mut current = NodeId::ROOT;
        let mut found: &[String] = &[];

        for ch in prefix.chars() {
            let Some(next) = self.node(current).child_for(Label::Char(ch)) else {
                return Vec::new();
            };

            let node = self.node(next);
            if !node.suggestions.is_empty() {
                found = node.suggestions.as_slice();
            }
            current = next;
        }

        found.to_vec()
    }
}
