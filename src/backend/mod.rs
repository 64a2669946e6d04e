//! Storage backends
//!
//! Every store implements [`StorageBackend`], the only contract the cache
//! decorator relies on.
//!
//! - `dir` - one file per key in a local directory
//! - `sql` - base64 encoding adapter over the `MySQL` and `PostgreSQL` dialects
//! - `redis` - one key-value entry per key
//! - `memory` - in-process map

pub mod dir;
pub mod memory;
pub mod redis;
pub mod sql;

pub use dir::DirBackend;
pub use memory::MemoryBackend;
pub use self::redis::{RedisBackend, RedisConfig};
pub use sql::{Dialect, SqlCache};

use crate::error::Result;
use async_trait::async_trait;
use std::sync::Arc;

/// Durable key-value store for certificate data
///
/// `get` returns [`crate::Error::NotFound`] when the key is absent, any other
/// error is a transport or storage fault.
#[async_trait]
pub trait StorageBackend: Send + Sync {
    /// Retrieve the bytes stored under `key`
    async fn get(&self, key: &str) -> Result<Vec<u8>>;

    /// Store `data` under `key`, replacing any previous value
    async fn put(&self, key: &str, data: &[u8]) -> Result<()>;

    /// Remove `key`; removing an absent key is not an error
    async fn delete(&self, key: &str) -> Result<()>;

    /// Label used in logs and metrics
    fn name(&self) -> &'static str;
}

#[async_trait]
impl<T: StorageBackend + ?Sized> StorageBackend for Arc<T> {
    async fn get(&self, key: &str) -> Result<Vec<u8>> {
        (**self).get(key).await
    }

    async fn put(&self, key: &str, data: &[u8]) -> Result<()> {
        (**self).put(key, data).await
    }

    async fn delete(&self, key: &str) -> Result<()> {
        (**self).delete(key).await
    }

    fn name(&self) -> &'static str {
        (**self).name()
    }
}
