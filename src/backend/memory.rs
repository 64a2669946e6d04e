use super::StorageBackend;
use crate::error::{Error, Result};
use async_trait::async_trait;
use dashmap::DashMap;

/// In-process backend, nothing survives the process
#[derive(Debug, Default)]
pub struct MemoryBackend {
    data: DashMap<String, Vec<u8>>,
}

impl MemoryBackend {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Raw bytes as stored, bypassing any decorator
    #[must_use]
    pub fn raw(&self, key: &str) -> Option<Vec<u8>> {
        self.data.get(key).map(|value| value.clone())
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

#[async_trait]
impl StorageBackend for MemoryBackend {
    async fn get(&self, key: &str) -> Result<Vec<u8>> {
        self.data
            .get(key)
            .map(|value| value.clone())
            .ok_or(Error::NotFound)
    }

    async fn put(&self, key: &str, data: &[u8]) -> Result<()> {
        self.data.insert(key.to_string(), data.to_vec());
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.data.remove(key);
        Ok(())
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}
