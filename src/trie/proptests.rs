use super::*;

use std::collections::BTreeMap;

use proptest::prelude::*;

use crate::persist::{self, Format};

fn build(responses: &[String], max_suggestions: i64, min_words_partial: usize) -> Trie {
    let mut trie = Trie::new(max_suggestions, min_words_partial);
    for r in responses {
        trie.insert(r).unwrap();
    }
    trie
}

/// Every node's cached ranking must agree with its own counts.
fn validate_rankings(trie: &Trie, max: usize) {
    for node in trie.nodes() {
        let s = node.suggestions();
        assert!(s.len() <= max, "too many suggestions: {}", s.len());
        assert_eq!(s.len(), node.counts().len().min(max));

        for pair in s.windows(2) {
            let (a, b) = (&pair[0], &pair[1]);
            let (ca, cb) = (node.counts().get(a), node.counts().get(b));
            assert!(
                ca > cb || (ca == cb && a.chars().count() <= b.chars().count()),
                "{:?} ({}) ranked before {:?} ({})",
                a,
                ca,
                b,
                cb
            );
        }

        // Nothing left out outranks the last kept entry.
        if let Some(last) = s.last() {
            let floor = node.counts().get(last);
            for (k, n) in node.counts().iter() {
                if !s.contains(k) {
                    assert!(*n <= floor, "{:?} ({}) was dropped", k, n);
                }
            }
        }
    }
}

type NodeDump = (Vec<(String, u64)>, Vec<String>);

/// Counts and suggestions of every node, keyed by the labels leading to it.
/// Arena ids depend on insertion order, label paths do not.
fn dump_by_path(trie: &Trie) -> BTreeMap<Vec<Label>, NodeDump> {
    let mut out = BTreeMap::new();
    let mut stack = vec![(NodeId::ROOT, Vec::new())];

    while let Some((id, path)) = stack.pop() {
        let node = trie.node(id);
        for (label, child) in node.children() {
            let mut p = path.clone();
            p.push(label);
            stack.push((child, p));
        }

        let counts = node.counts().iter().map(|(k, n)| (k.clone(), *n)).collect();
        out.insert(path, (counts, node.suggestions().to_vec()));
    }

    out
}

fn responses() -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec("[ab ]{0,8}", 1..12)
}

proptest! {
    #[test]
    fn completions_are_bounded_and_grounded(
        rs in responses(),
        max in 0i64..5,
        min_words in 0usize..4,
    ) {
        let trie = build(&rs, max, min_words);
        validate_rankings(&trie, max as usize);

        for r in &rs {
            for (i, _) in r.char_indices().chain(std::iter::once((r.len(), ' '))) {
                let got = trie.generate_completions(&r[..i]);
                prop_assert!(got.len() <= max as usize);
                for s in &got {
                    prop_assert!(
                        rs.iter().any(|x| x.contains(s.as_str())),
                        "{:?} is not part of any response", s
                    );
                }
            }
        }
    }

    #[test]
    fn reinserting_never_grows_the_tree(rs in responses(), min_words in 0usize..4) {
        let mut trie = build(&rs, 3, min_words);
        let nodes = trie.len();

        for r in &rs {
            trie.insert(r).unwrap();
        }
        prop_assert_eq!(trie.len(), nodes);
        prop_assert_eq!(trie.responses(), 2 * rs.len() as u64);
    }

    #[test]
    fn every_node_ignores_insertion_order(
        (rs, shuffled) in responses().prop_flat_map(|rs| {
            let shuffled = Just(rs.clone()).prop_shuffle();
            (Just(rs), shuffled)
        }),
    ) {
        // Partial phrases are order dependent; keep them out.
        let a = build(&rs, 3, usize::MAX);
        let b = build(&shuffled, 3, usize::MAX);

        prop_assert_eq!(a.len(), b.len());
        prop_assert_eq!(dump_by_path(&a), dump_by_path(&b));
    }

    #[test]
    fn persisted_tries_load_back_unchanged(rs in responses(), max in 0i64..5, min_words in 0usize..4) {
        let trie = build(&rs, max, min_words);

        for format in [Format::Bincode, Format::MsgPack] {
            let bytes = persist::to_bytes(&trie, format).unwrap();
            let back = persist::from_bytes(&bytes, format).unwrap();
            prop_assert_eq!(&back, &trie);
            prop_assert_eq!(back.stats(), trie.stats());
        }
    }
}
