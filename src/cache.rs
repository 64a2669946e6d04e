//! Cache decorator
//!
//! [`Cache`] wraps one [`StorageBackend`] and layers optional at-rest
//! encryption and an optional in-memory precache on top of it. It implements
//! the same contract, so callers cannot tell it apart from a plain backend.
//!
//! The precache only ever holds plaintext. It is updated by this process's
//! own `put` and `delete` calls and never invalidated by writes from other
//! processes sharing the backend.

use crate::{
    backend::{DirBackend, RedisBackend, SqlCache, StorageBackend},
    crypto::CacheKey,
    error::Result,
    metrics::{OPERATION_DURATION, OPERATIONS, PRECACHE},
    options::{BackendOptions, CacheOptions},
    precache::Precache,
};
use async_trait::async_trait;
use std::{collections::HashMap, fmt, future::Future};
use tracing::{debug, info};

/// Uniform get/put/delete over any backend, with encryption and precaching
pub struct Cache {
    backend: Box<dyn StorageBackend>,
    key: Option<CacheKey>,
    use_precaching: bool,
    precache: Precache,
}

impl Cache {
    /// Wrap `backend` with encryption and precaching disabled
    pub fn new(backend: impl StorageBackend + 'static) -> Self {
        Self {
            backend: Box::new(backend),
            key: None,
            use_precaching: false,
            precache: Precache::new(),
        }
    }

    /// Encrypt payloads with a key derived from `passphrase`
    ///
    /// An empty passphrase disables encryption.
    #[must_use]
    pub fn with_encryption_key(mut self, passphrase: &str) -> Self {
        self.key = (!passphrase.is_empty()).then(|| CacheKey::derive(passphrase));
        self
    }

    /// Enable or disable the in-memory precache
    #[must_use]
    pub const fn with_precaching(mut self, enabled: bool) -> Self {
        self.use_precaching = enabled;
        self
    }

    /// Build the configured backend and wrap it
    ///
    /// Construction is all or nothing: the backend is connected and checked
    /// before a cache is returned.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be created or reached
    pub async fn from_options(options: &CacheOptions) -> Result<Self> {
        let cache = match &options.backend {
            BackendOptions::Dir { path } => Self::new(DirBackend::open(path).await?),
            BackendOptions::Sql(config) => Self::new(SqlCache::connect(config).await?),
            BackendOptions::Redis(config) => Self::new(RedisBackend::connect(config).await?),
        };

        let cache = cache
            .with_encryption_key(options.encryption_key.as_deref().unwrap_or_default())
            .with_precaching(options.use_precaching);

        info!(
            backend = cache.backend.name(),
            encryption = cache.is_encrypted(),
            precaching = cache.use_precaching,
            "cache ready"
        );

        Ok(cache)
    }

    /// Validate a flat option map and build the cache
    ///
    /// # Errors
    ///
    /// Returns an error for invalid options or an unreachable backend
    pub async fn from_map(options: &HashMap<String, String>) -> Result<Self> {
        Self::from_options(&CacheOptions::from_map(options)?).await
    }

    #[must_use]
    pub const fn is_encrypted(&self) -> bool {
        self.key.is_some()
    }

    #[must_use]
    pub const fn uses_precaching(&self) -> bool {
        self.use_precaching
    }

    /// Number of plaintext entries held in memory
    #[must_use]
    pub fn precached(&self) -> usize {
        self.precache.len()
    }

    /// Time a backend call
    async fn call<T>(
        &self,
        operation: &'static str,
        fut: impl Future<Output = Result<T>> + Send,
    ) -> Result<T> {
        let timer = OPERATION_DURATION
            .with_label_values(&[self.backend.name(), operation])
            .start_timer();
        let result = fut.await;
        timer.observe_duration();
        result
    }

    fn record<T>(&self, operation: &'static str, result: &Result<T>) {
        let outcome = match result {
            Ok(_) => "ok",
            Err(err) => err.kind(),
        };
        OPERATIONS
            .with_label_values(&[self.backend.name(), operation, outcome])
            .inc();
    }

    async fn fetch(&self, key: &str) -> Result<Vec<u8>> {
        if self.use_precaching {
            if let Some(data) = self.precache.get(key) {
                PRECACHE.with_label_values(&["hit"]).inc();
                debug!(key, "precache hit");
                return Ok(data);
            }
            PRECACHE.with_label_values(&["miss"]).inc();
        }

        let payload = self.call("get", self.backend.get(key)).await?;

        let data = match &self.key {
            Some(cache_key) => cache_key.decrypt(&payload)?,
            None => payload,
        };

        if self.use_precaching {
            self.precache.set(key, &data);
        }

        Ok(data)
    }

    async fn store(&self, key: &str, data: &[u8]) -> Result<()> {
        let encrypted;
        let payload = match &self.key {
            Some(cache_key) => {
                encrypted = cache_key.encrypt(data)?;
                encrypted.as_slice()
            }
            None => data,
        };

        self.call("put", self.backend.put(key, payload)).await?;

        if self.use_precaching {
            self.precache.set(key, data);
        }

        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        // evicted even when the backend delete fails
        if self.use_precaching {
            self.precache.remove(key);
        }

        self.call("delete", self.backend.delete(key)).await
    }
}

#[async_trait]
impl StorageBackend for Cache {
    async fn get(&self, key: &str) -> Result<Vec<u8>> {
        let result = self.fetch(key).await;
        self.record("get", &result);
        debug!(key, backend = self.backend.name(), ok = result.is_ok(), "get");
        result
    }

    async fn put(&self, key: &str, data: &[u8]) -> Result<()> {
        let result = self.store(key, data).await;
        self.record("put", &result);
        debug!(key, backend = self.backend.name(), ok = result.is_ok(), "put");
        result
    }

    async fn delete(&self, key: &str) -> Result<()> {
        let result = self.remove(key).await;
        self.record("delete", &result);
        debug!(key, backend = self.backend.name(), ok = result.is_ok(), "delete");
        result
    }

    fn name(&self) -> &'static str {
        self.backend.name()
    }
}

impl fmt::Debug for Cache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cache")
            .field("backend", &self.backend.name())
            .field("encryption", &self.is_encrypted())
            .field("use_precaching", &self.use_precaching)
            .field("precached", &self.precache.len())
            .finish()
    }
}
