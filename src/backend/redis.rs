use super::StorageBackend;
use crate::error::{Error, Result};
use async_trait::async_trait;
use redis::{
    AsyncCommands, IntoConnectionInfo,
    aio::{ConnectionManager, ConnectionManagerConfig},
};
use std::time::Duration;
use tracing::debug;

const CONNECTION_TIMEOUT: Duration = Duration::from_secs(5);

/// Redis connection settings
#[derive(Clone, PartialEq, Eq)]
pub struct RedisConfig {
    /// `host:port`
    pub addr: String,
    pub password: Option<String>,
    /// Logical database index
    pub db: i64,
}

impl std::fmt::Debug for RedisConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisConfig")
            .field("addr", &self.addr)
            .field("password", &self.password.as_ref().map(|_| "***"))
            .field("db", &self.db)
            .finish()
    }
}

/// Stores one redis string per key, value is the raw payload
#[derive(Clone)]
pub struct RedisBackend {
    conn: ConnectionManager,
}

impl RedisBackend {
    /// Connect and verify the server answers `PING`
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] for an unusable address and
    /// [`Error::Connectivity`] if the server cannot be reached
    pub async fn connect(config: &RedisConfig) -> Result<Self> {
        let mut info = format!("redis://{}", config.addr)
            .into_connection_info()
            .map_err(|e| Error::Configuration(format!("Invalid redis addr: {e}")))?;
        info.redis.db = config.db;
        info.redis.password.clone_from(&config.password);

        let client = redis::Client::open(info)
            .map_err(|e| Error::Configuration(format!("Invalid redis options: {e}")))?;

        // single attempt, failures surface to the caller
        let manager_config = ConnectionManagerConfig::new()
            .set_number_of_retries(0)
            .set_connection_timeout(CONNECTION_TIMEOUT);

        let mut conn = client
            .get_connection_manager_with_config(manager_config)
            .await
            .map_err(|e| Error::Connectivity(format!("Error contacting redis: {e}")))?;

        let pong: String = redis::cmd("PING")
            .query_async(&mut conn)
            .await
            .map_err(|e| Error::Connectivity(format!("Error contacting redis: {e}")))?;
        debug!(addr = %config.addr, db = config.db, reply = %pong, "redis is alive");

        Ok(Self { conn })
    }
}

impl std::fmt::Debug for RedisBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisBackend").finish_non_exhaustive()
    }
}

#[async_trait]
impl StorageBackend for RedisBackend {
    async fn get(&self, key: &str) -> Result<Vec<u8>> {
        let mut conn = self.conn.clone();
        let data: Option<Vec<u8>> = conn.get(key).await?;
        data.ok_or(Error::NotFound)
    }

    async fn put(&self, key: &str, data: &[u8]) -> Result<()> {
        let mut conn = self.conn.clone();
        let () = conn.set(key, data).await?;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        let mut conn = self.conn.clone();
        let _removed: i64 = conn.del(key).await?;
        Ok(())
    }

    fn name(&self) -> &'static str {
        "redis"
    }
}
