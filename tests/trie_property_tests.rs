//! Property-based тесты префиксного индекса против модели на `BTreeSet`.

use std::collections::BTreeSet;

use proptest::prelude::*;
use sightline::{CharSet, PrefixConfig, PrefixIndex};

fn word_strategy() -> impl Strategy<Value = String> {
    "[a-d]{0,6}"
}

#[derive(Debug, Clone)]
enum Op {
    Insert(String),
    Delete(String),
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        3 => word_strategy().prop_map(Op::Insert),
        1 => word_strategy().prop_map(Op::Delete),
    ]
}

fn model_completions(
    model: &BTreeSet<String>,
    prefix: &str,
    limit: usize,
) -> Vec<String> {
    model
        .range(prefix.to_string()..)
        .take_while(|w| w.starts_with(prefix))
        .take(limit)
        .cloned()
        .collect()
}

proptest! {
    #[test]
    fn prop_behaves_like_btreeset(
        ops in prop::collection::vec(op_strategy(), 0..150),
        probes in prop::collection::vec(word_strategy(), 1..20),
        limit in 0usize..8,
    ) {
        let mut index = PrefixIndex::default();
        let mut model = BTreeSet::new();

        for op in ops {
            match op {
                Op::Insert(w) => {
                    prop_assert_eq!(index.insert(&w).unwrap(), model.insert(w));
                }
                Op::Delete(w) => {
                    prop_assert_eq!(index.delete(&w).unwrap(), model.remove(&w));
                }
            }
            prop_assert_eq!(index.len(), model.len());
        }

        for probe in &probes {
            prop_assert_eq!(index.contains(probe).unwrap(), model.contains(probe));
            prop_assert_eq!(
                index.has_prefix(probe).unwrap(),
                model.iter().any(|w| w.starts_with(probe.as_str()))
            );
            prop_assert_eq!(
                index.autocomplete(probe, limit).unwrap(),
                model_completions(&model, probe, limit)
            );
        }

        prop_assert_eq!(index.words(), model.into_iter().collect::<Vec<_>>());
    }
}

proptest! {
    #[test]
    fn prop_every_prefix_of_live_word_matches(words in prop::collection::vec("[a-z]{1,8}", 1..30)) {
        let mut index = PrefixIndex::default();
        for w in &words {
            index.insert(w).unwrap();
        }

        for w in &words {
            prop_assert!(index.contains(w).unwrap());
            for end in 1..=w.len() {
                prop_assert!(index.has_prefix(&w[..end]).unwrap());
            }
        }
    }
}

proptest! {
    #[test]
    fn prop_delete_everything_prunes_to_root(words in prop::collection::vec("[a-c]{0,5}", 0..40)) {
        let mut index = PrefixIndex::default();
        for w in &words {
            index.insert(w).unwrap();
        }
        for w in &words {
            index.delete(w).unwrap();
        }

        prop_assert!(index.is_empty());
        prop_assert_eq!(index.node_count(), 1);
    }
}

proptest! {
    #[test]
    fn prop_case_insensitive_matches_lowercase(words in prop::collection::vec("[a-zA-Z]{1,6}", 1..20)) {
        let mut index = PrefixIndex::new(&PrefixConfig {
            case_sensitive: false,
            alphabet: CharSet::AsciiLetters,
        })
        .unwrap();

        for w in &words {
            index.insert(w).unwrap();
        }

        for w in &words {
            prop_assert!(index.contains(&w.to_uppercase()).unwrap());
            prop_assert!(index.contains(&w.to_lowercase()).unwrap());
        }
        prop_assert!(index.words().iter().all(|w| w.chars().all(|c| c.is_ascii_lowercase())));
    }
}

#[test]
fn test_cat_cap_cow() {
    let mut index = PrefixIndex::default();
    for w in ["CAT", "CAP", "COW"] {
        index.insert(w).unwrap();
    }

    assert!(index.has_prefix("CA").unwrap());
    assert_eq!(index.autocomplete("CA", 10).unwrap(), vec!["CAP", "CAT"]);

    index.delete("CAT").unwrap();
    assert!(!index.contains("CAT").unwrap());
    assert!(index.has_prefix("CA").unwrap());
}
