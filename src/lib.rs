//! Pluggable certificate cache
//!
//! A [`Cache`] stores opaque byte values (certificates, keys, ACME account
//! data) under string keys in a directory, a SQL table or redis, with
//! optional at-rest encryption and an optional in-memory precache.
//!
//! ```no_run
//! # async fn run() -> certcache::Result<()> {
//! use certcache::{Cache, StorageBackend};
//! use std::collections::HashMap;
//!
//! let options: HashMap<String, String> = [
//!     ("backend", "dir"),
//!     ("path", "/var/cache/certs"),
//!     ("usePrecaching", "true"),
//!     ("encryptionKey", "passphrase"),
//! ]
//! .into_iter()
//! .map(|(k, v)| (k.to_string(), v.to_string()))
//! .collect();
//!
//! let cache = Cache::from_map(&options).await?;
//! cache.put("example.com", b"-----BEGIN CERTIFICATE-----").await?;
//! let pem = cache.get("example.com").await?;
//! # Ok(())
//! # }
//! ```

pub mod backend;
pub mod cache;
pub mod cli;
pub mod crypto;
pub mod error;
pub mod metrics;
pub mod options;
pub mod precache;
pub mod tls;

pub use backend::StorageBackend;
pub use cache::Cache;
pub use error::{Error, Result};
pub use options::CacheOptions;
