use super::RowStore;
use crate::{
    error::{Error, Result},
    tls::{TlsConfig, TlsMode},
};
use async_trait::async_trait;
use dsn::DSN;
use sqlx::{
    ConnectOptions, Connection, MySqlPool,
    mysql::{MySqlConnectOptions, MySqlPoolOptions, MySqlSslMode},
};
use std::time::Duration;
use tracing::debug;

const MAX_CONNECTIONS: u32 = 5;
const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(5);

/// Statements for one table, built once
#[derive(Debug)]
struct Statements {
    create: String,
    select: String,
    upsert: String,
    delete: String,
}

impl Statements {
    fn new(table: &str) -> Self {
        Self {
            create: format!(
                r"CREATE TABLE IF NOT EXISTS {table} (
        cache_key VARCHAR(255) NOT NULL,
        data LONGTEXT CHARACTER SET ascii NOT NULL,
        updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP ON UPDATE CURRENT_TIMESTAMP,
        PRIMARY KEY(cache_key)) ENGINE=InnoDB"
            ),
            select: format!("SELECT data FROM {table} WHERE cache_key = ?"),
            upsert: format!(
                "INSERT INTO {table} (cache_key, data) VALUES (?, ?) ON DUPLICATE KEY UPDATE data = VALUES(data)"
            ),
            delete: format!("DELETE FROM {table} WHERE cache_key = ?"),
        }
    }
}

/// `MySQL`/`MariaDB` rows, one per key
#[derive(Debug)]
pub struct MySqlStore {
    pool: MySqlPool,
    statements: Statements,
}

/// Build connect options from the DSN and TLS settings
#[must_use]
pub fn connect_options(dsn: &DSN, tls: &TlsConfig) -> MySqlConnectOptions {
    let mut options = MySqlConnectOptions::new()
        .username(dsn.username.clone().unwrap_or_default().as_ref())
        .password(dsn.password.clone().unwrap_or_default().as_str())
        .database(dsn.database.clone().unwrap_or_default().as_ref());

    if let Some(host) = &dsn.host {
        options = options.host(host.as_str()).port(dsn.port.unwrap_or(3306));
    } else if let Some(socket) = &dsn.socket {
        options = options.socket(socket.as_str());
    }

    options = match tls.mode {
        TlsMode::Disable => options.ssl_mode(MySqlSslMode::Disabled),
        TlsMode::Require => options.ssl_mode(MySqlSslMode::Required),
        TlsMode::VerifyCA => {
            let mut opts = options.ssl_mode(MySqlSslMode::VerifyCa);
            if let Some(ca_path) = &tls.ca {
                opts = opts.ssl_ca(ca_path);
            }
            opts
        }
        TlsMode::VerifyFull => {
            let mut opts = options.ssl_mode(MySqlSslMode::VerifyIdentity);
            if let Some(ca_path) = &tls.ca {
                opts = opts.ssl_ca(ca_path);
            }
            opts
        }
    };

    if let (Some(cert_path), Some(key_path)) = (&tls.cert, &tls.key) {
        options = options.ssl_client_cert(cert_path).ssl_client_key(key_path);
    }

    options
}

impl MySqlStore {
    /// Check the database answers once, then open the pool and make sure the table
    /// exists
    ///
    /// # Errors
    ///
    /// Returns [`Error::Connectivity`] if the database cannot be reached and
    /// [`Error::Sql`] if the table cannot be created
    pub async fn connect(dsn: &DSN, tls: &TlsConfig, table: &str) -> Result<Self> {
        let options = connect_options(dsn, tls);

        // a single attempt, the pool would keep retrying a refused connection
        let mut conn = options.connect().await.map_err(|e| {
            Error::Connectivity(format!("Error establishing database connection: {e}"))
        })?;

        sqlx::query("SELECT 1")
            .execute(&mut conn)
            .await
            .map_err(|e| Error::Connectivity(format!("Error contacting database: {e}")))?;

        let _ = conn.close().await;

        let pool = MySqlPoolOptions::new()
            .max_connections(MAX_CONNECTIONS)
            .acquire_timeout(ACQUIRE_TIMEOUT)
            .connect_lazy_with(options);

        let statements = Statements::new(table);
        sqlx::query(&statements.create).execute(&pool).await?;
        debug!(table, "mysql table ready");

        Ok(Self { pool, statements })
    }
}

#[async_trait]
impl RowStore for MySqlStore {
    async fn get(&self, key: &str) -> Result<String> {
        sqlx::query_scalar::<_, String>(&self.statements.select)
            .bind(key)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(Error::NotFound)
    }

    async fn put(&self, key: &str, data: &str) -> Result<()> {
        sqlx::query(&self.statements.upsert)
            .bind(key)
            .bind(data)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        sqlx::query(&self.statements.delete)
            .bind(key)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
