//! Prefix autocomplete over a corpus of short, pre-normalized text
//! responses.
//!
//! Build a [`Trie`] by inserting responses, then freeze it into an
//! [`Autocomplete`] handle (or persist it with [`persist`]) to serve
//! ranked completions per prefix.

pub mod autocomplete;
pub mod config;
pub mod importer;
pub mod persist;
pub mod trie;

pub use autocomplete::Autocomplete;
pub use trie::{SuggestionLimit, Trie, TrieError, TrieStats};
