//! Typed key/value storage shared by the states of one machine

use rustc_hash::FxHashMap;
use std::fmt;
use std::hash::Hash;

use crate::fsm::error::FsmError;

/// Per-machine data store.
///
/// States coordinate through the blackboard instead of holding references
/// to each other. Keys and values are owner-defined enums rather than
/// stringly-typed names, so a typo is a compile error.
#[derive(Debug, Clone)]
pub struct Blackboard<K, V> {
    values: FxHashMap<K, V>,
}

impl<K, V> Blackboard<K, V>
where
    K: Copy + Eq + Hash + fmt::Debug,
    V: Clone + fmt::Debug,
{
    /// Create an empty blackboard.
    #[must_use]
    pub fn new() -> Self {
        Self {
            values: FxHashMap::default(),
        }
    }

    /// Fetch a clone of the value stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns [`FsmError::MissingKey`] when nothing is stored under `key`.
    pub fn get(&self, key: K) -> Result<V, FsmError> {
        self.values.get(&key).cloned().ok_or(FsmError::MissingKey {
            key: format!("{key:?}"),
        })
    }

    /// Store `value` under `key`, returning the previous value if any.
    pub fn set(&mut self, key: K, value: V) -> Option<V> {
        self.values.insert(key, value)
    }

    /// Remove the value stored under `key`, returning it if present.
    pub fn remove(&mut self, key: K) -> Option<V> {
        self.values.remove(&key)
    }

    /// Whether a value is stored under `key`.
    #[must_use]
    pub fn contains(&self, key: K) -> bool {
        self.values.contains_key(&key)
    }

    /// Number of stored entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the blackboard holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Drop every entry.
    pub fn clear(&mut self) {
        self.values.clear();
    }
}

impl<K, V> Default for Blackboard<K, V>
where
    K: Copy + Eq + Hash + fmt::Debug,
    V: Clone + fmt::Debug,
{
    fn default() -> Self {
        Self::new()
    }
}
