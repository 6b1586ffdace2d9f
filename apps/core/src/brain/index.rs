//! Inverted keyword index over an intent collection.

use std::collections::{BTreeSet, HashMap};

use super::intent::Intent;
use super::keywords;

/// Maps a normalized token to the intents whose patterns or keywords contain it.
///
/// Built in one pass from a complete intent collection and never mutated
/// afterwards: a new collection gets a new index.
#[derive(Debug, Clone, Default)]
pub struct KeywordIndex {
    entries: HashMap<String, BTreeSet<usize>>,
}

impl KeywordIndex {
    pub fn build(intents: &[Intent]) -> Self {
        let mut entries: HashMap<String, BTreeSet<usize>> = HashMap::new();

        for (idx, intent) in intents.iter().enumerate() {
            for pattern in &intent.patterns {
                for token in keywords::tokenize(pattern) {
                    entries.entry(token).or_default().insert(idx);
                }
            }
            for keyword in &intent.keywords {
                for token in keywords::tokenize(keyword) {
                    entries.entry(token).or_default().insert(idx);
                }
            }
        }

        Self { entries }
    }

    /// Intents registered under `token`, in ascending intent order.
    pub fn lookup(&self, token: &str) -> impl Iterator<Item = usize> + '_ {
        self.entries
            .get(token)
            .into_iter()
            .flat_map(|set| set.iter().copied())
    }

    /// Union of the intents registered under any of `tokens`, in ascending order.
    pub fn candidates<S: AsRef<str>>(&self, tokens: &[S]) -> BTreeSet<usize> {
        tokens
            .iter()
            .flat_map(|token| self.lookup(token.as_ref()))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
