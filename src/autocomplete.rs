use std::sync::Arc;

use crate::trie::{Trie, TrieStats};

/// Normalize a typed prefix: lowercase only. Responses are expected to be
/// stored lowercased already.
pub fn normalize_prefix(s: &str) -> String {
    s.to_lowercase()
}

/// Read-only, shareable handle over a built trie for the serving phase.
///
/// Wrapping a trie here ends its build phase: there is no way back to
/// `&mut Trie` while handles are alive, so concurrent queries can never
/// observe a half-applied insertion. Callers that need to keep inserting
/// while serving must guard a `Trie` with their own `RwLock` instead.
#[derive(Clone)]
pub struct Autocomplete {
    trie: Arc<Trie>,
}

impl Autocomplete {
    pub fn new(trie: Trie) -> Self {
        Self {
            trie: Arc::new(trie),
        }
    }

    /// Query completions for a prefix (normalizes the prefix internally).
    pub fn query(&self, prefix: &str) -> Vec<String> {
        let p = normalize_prefix(prefix);
        if p.is_empty() {
            return Vec::new();
        }
        self.trie.generate_completions(&p)
    }

    /// Query completions for a prefix as typed, without normalizing it.
    pub fn query_raw(&self, prefix: &str) -> Vec<String> {
        self.trie.generate_completions(prefix)
    }

    pub fn stats(&self) -> TrieStats {
        self.trie.stats()
    }

    pub fn trie(&self) -> &Trie {
        &self.trie
    }
}

impl From<Trie> for Autocomplete {
    fn from(trie: Trie) -> Self {
        Self::new(trie)
    }
}
