use super::RowStore;
use crate::{
    error::{Error, Result},
    tls::{TlsConfig, TlsMode},
};
use async_trait::async_trait;
use dsn::DSN;
use sqlx::{
    ConnectOptions, Connection, PgPool,
    postgres::{PgConnectOptions, PgPoolOptions, PgSslMode},
};
use std::time::Duration;
use tracing::debug;

const MAX_CONNECTIONS: u32 = 5;
const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(5);

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
        cache_key VARCHAR(255) PRIMARY KEY,
        data TEXT NOT NULL,
        updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW())"
            ),
            select: format!("SELECT data FROM {table} WHERE cache_key = $1"),
            upsert: format!(
                "INSERT INTO {table} (cache_key, data) VALUES ($1, $2) ON CONFLICT (cache_key) DO UPDATE SET data = EXCLUDED.data, updated_at = NOW()"
            ),
            delete: format!("DELETE FROM {table} WHERE cache_key = $1"),
        }
    }
}

/// `PostgreSQL` rows, one per key
#[derive(Debug)]
pub struct PgStore {
    pool: PgPool,
    statements: Statements,
}

#[must_use]
pub fn connect_options(dsn: &DSN, tls: &TlsConfig) -> PgConnectOptions {
    let mut options = PgConnectOptions::new()
        .username(dsn.username.clone().unwrap_or_default().as_ref())
        .password(dsn.password.clone().unwrap_or_default().as_str())
        .database(dsn.database.clone().unwrap_or_default().as_ref());

    if let Some(host) = &dsn.host {
        options = options.host(host.as_str()).port(dsn.port.unwrap_or(5432));
    } else if let Some(socket) = &dsn.socket {
        options = options.socket(socket.as_str());
    }

    options = match tls.mode {
        TlsMode::Disable => options.ssl_mode(PgSslMode::Disable),
        TlsMode::Require => options.ssl_mode(PgSslMode::Require),
        TlsMode::VerifyCA => {
            let mut opts = options.ssl_mode(PgSslMode::VerifyCa);
            if let Some(ca_path) = &tls.ca {
                opts = opts.ssl_root_cert(ca_path);
            }
            opts
        }
        TlsMode::VerifyFull => {
            let mut opts = options.ssl_mode(PgSslMode::VerifyFull);
            if let Some(ca_path) = &tls.ca {
                opts = opts.ssl_root_cert(ca_path);
            }
            opts
        }
    };

    if let (Some(cert_path), Some(key_path)) = (&tls.cert, &tls.key) {
        options = options.ssl_client_cert(cert_path).ssl_client_key(key_path);
    }

    options
}

impl PgStore {
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

        let pool = PgPoolOptions::new()
            .max_connections(MAX_CONNECTIONS)
            .acquire_timeout(ACQUIRE_TIMEOUT)
            .connect_lazy_with(options);

        let statements = Statements::new(table);
        sqlx::query(&statements.create).execute(&pool).await?;
        debug!(table, "postgres table ready");

        Ok(Self { pool, statements })
    }
}

#[async_trait]
impl RowStore for PgStore {
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
