use dashmap::DashMap;
use std::sync::Arc;

/// In-process plaintext map owned by one [`crate::Cache`]
///
/// Values are stored as whole immutable slices, so a concurrent reader sees
/// either the old or the new value of a key, never a mix.
#[derive(Debug, Default)]
pub struct Precache {
    data: DashMap<String, Arc<[u8]>>,
}

impl Precache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the cached plaintext for `key`
    #[must_use]
    pub fn get(&self, key: &str) -> Option<Vec<u8>> {
        self.data.get(key).map(|value| value.to_vec())
    }

    /// Store plaintext, replacing any previous entry
    pub fn set(&self, key: &str, value: &[u8]) {
        self.data.insert(key.to_string(), Arc::from(value));
    }

    pub fn remove(&self, key: &str) {
        self.data.remove(key);
    }

    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.data.contains_key(key)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}
