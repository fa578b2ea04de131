//! Facet count maps.
//!
//! A [`ScoreMap`] maps facet values to integer counts and can be walked in
//! descending count order. Both directions are indexed, so incrementing a
//! value and enumerating the top values are cheap.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// Facet field name to value counts.
pub type FacetMap = HashMap<String, ScoreMap>;

/// Value to count map, ordered by descending count.
///
/// Ties are ordered by value, ascending.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(from = "HashMap<String, i64>", into = "HashMap<String, i64>")]
pub struct ScoreMap {
    scores: HashMap<String, i64>,
    by_score: BTreeMap<i64, BTreeSet<String>>,
}

impl ScoreMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count for `key`, zero when absent.
    pub fn get(&self, key: &str) -> i64 {
        self.scores.get(key).copied().unwrap_or(0)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.scores.contains_key(key)
    }

    /// Set the count of `key`, replacing any previous count.
    pub fn set(&mut self, key: impl Into<String>, score: i64) {
        let key = key.into();
        self.unindex(&key);
        self.index(key.clone(), score);
        self.scores.insert(key, score);
    }

    /// Add `by` to the count of `key` and return the new count.
    pub fn inc(&mut self, key: impl Into<String>, by: i64) -> i64 {
        let key = key.into();
        let score = self.get(&key).saturating_add(by);
        self.set(key, score);
        score
    }

    /// Remove `key`, returning its count.
    pub fn remove(&mut self, key: &str) -> Option<i64> {
        self.unindex(key);
        self.scores.remove(key)
    }

    pub fn len(&self) -> usize {
        self.scores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }

    /// Sum of all counts.
    pub fn total(&self) -> i64 {
        self.scores
            .values()
            .fold(0i64, |total, score| total.saturating_add(*score))
    }

    /// Values in descending count order.
    pub fn keys_by_score(&self) -> impl Iterator<Item = &str> + '_ {
        self.by_score
            .iter()
            .rev()
            .flat_map(|(_, keys)| keys.iter().map(String::as_str))
    }

    /// `(value, count)` pairs in descending count order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, i64)> + '_ {
        self.by_score
            .iter()
            .rev()
            .flat_map(|(score, keys)| keys.iter().map(move |k| (k.as_str(), *score)))
    }

    /// The `n` highest-counted values.
    pub fn top(&self, n: usize) -> Vec<(&str, i64)> {
        self.iter().take(n).collect()
    }

    /// Add every count of `other` into this map.
    pub fn absorb(&mut self, other: &ScoreMap) {
        for (key, score) in other.iter() {
            self.inc(key, score);
        }
    }

    fn index(&mut self, key: String, score: i64) {
        self.by_score.entry(score).or_default().insert(key);
    }

    fn unindex(&mut self, key: &str) {
        let Some(old) = self.scores.get(key).copied() else {
            return;
        };
        if let Some(keys) = self.by_score.get_mut(&old) {
            keys.remove(key);
            if keys.is_empty() {
                self.by_score.remove(&old);
            }
        }
    }
}

impl PartialEq for ScoreMap {
    fn eq(&self, other: &Self) -> bool {
        self.scores == other.scores
    }
}

impl Eq for ScoreMap {}

impl From<HashMap<String, i64>> for ScoreMap {
    fn from(scores: HashMap<String, i64>) -> Self {
        scores.into_iter().collect()
    }
}

impl From<ScoreMap> for HashMap<String, i64> {
    fn from(map: ScoreMap) -> Self {
        map.scores
    }
}

impl<K: Into<String>> FromIterator<(K, i64)> for ScoreMap {
    fn from_iter<I: IntoIterator<Item = (K, i64)>>(iter: I) -> Self {
        let mut map = ScoreMap::new();
        for (key, score) in iter {
            map.set(key, score);
        }
        map
    }
}
