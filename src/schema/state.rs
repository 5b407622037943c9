//! Story flags and numeric state counters.

use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};

/// Set of story flags. Membership only; iteration order is not meaningful.
pub type FlagSet = FxHashSet<String>;

/// Named integer counters. Keys that were never written read as 0.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GameState {
    values: FxHashMap<String, i64>,
}

impl GameState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Value of `key`, defaulting to 0.
    pub fn get(&self, key: &str) -> i64 {
        self.values.get(key).copied().unwrap_or(0)
    }

    /// Value of `key` only if it has been written or seeded.
    pub fn value(&self, key: &str) -> Option<i64> {
        self.values.get(key).copied()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn set(&mut self, key: impl Into<String>, value: i64) {
        self.values.insert(key.into(), value);
    }

    /// Insert `value` only when `key` is not present yet.
    pub fn seed(&mut self, key: impl Into<String>, value: i64) {
        self.values.entry(key.into()).or_insert(value);
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Entries sorted by key, for stable display.
    pub fn sorted(&self) -> Vec<(&str, i64)> {
        let mut entries: Vec<(&str, i64)> =
            self.values.iter().map(|(k, v)| (k.as_str(), *v)).collect();
        entries.sort_by(|a, b| a.0.cmp(b.0));
        entries
    }
}

impl<K: Into<String>> FromIterator<(K, i64)> for GameState {
    fn from_iter<I: IntoIterator<Item = (K, i64)>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}
