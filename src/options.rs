//! Flat option map to typed cache options
//!
//! | option          | applies to | effect                                   |
//! |-----------------|------------|------------------------------------------|
//! | `backend`       | all        | `dir`, `sql` or `redis`                  |
//! | `path`          | dir        | directory, created if missing            |
//! | `driver`        | sql        | `mysql` or `postgres`                    |
//! | `dsn`           | sql        | connection string                        |
//! | `table`         | sql        | table name, default `autocert_cache`     |
//! | `addr`          | redis      | `host:port`                              |
//! | `password`      | redis      | optional credential                      |
//! | `db`            | redis      | logical database index, default `0`      |
//! | `usePrecaching` | all        | enables the in-memory layer              |
//! | `encryptionKey` | all        | non-empty enables at-rest encryption     |

use crate::{
    backend::{
        redis::RedisConfig,
        sql::{DEFAULT_TABLE, Dialect, SqlConfig, validate_table},
    },
    error::{Error, Result},
};
use std::{collections::HashMap, fmt, path::PathBuf};

pub const BACKEND_DIR: &str = "dir";
pub const BACKEND_SQL: &str = "sql";
pub const BACKEND_REDIS: &str = "redis";

/// Which store to build, with its validated settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendOptions {
    Dir { path: PathBuf },
    Sql(SqlConfig),
    Redis(RedisConfig),
}

/// Everything needed to construct a [`crate::Cache`]
#[derive(Clone, PartialEq, Eq)]
pub struct CacheOptions {
    pub backend: BackendOptions,
    pub use_precaching: bool,
    /// Passphrase, `None` disables encryption
    pub encryption_key: Option<String>,
}

impl fmt::Debug for CacheOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CacheOptions")
            .field("backend", &self.backend)
            .field("use_precaching", &self.use_precaching)
            .field("encryption", &self.encryption_key.is_some())
            .finish()
    }
}

impl CacheOptions {
    /// Validate the option map
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] when a required option is missing or
    /// invalid and [`Error::UnsupportedDriver`] for an unknown SQL driver
    pub fn from_map(options: &HashMap<String, String>) -> Result<Self> {
        let backend = options
            .get("backend")
            .ok_or_else(|| Error::Configuration("Missing required 'backend' parameter".into()))?;

        let use_precaching = match options.get("usePrecaching") {
            Some(value) => parse_bool(value).ok_or_else(|| {
                Error::Configuration(format!("Invalid 'usePrecaching' value: '{value}'"))
            })?,
            None => false,
        };

        let encryption_key = options
            .get("encryptionKey")
            .filter(|key| !key.is_empty())
            .cloned();

        let backend = match backend.as_str() {
            BACKEND_DIR => dir_options(options)?,
            BACKEND_SQL => sql_options(options)?,
            BACKEND_REDIS => redis_options(options)?,
            other => {
                return Err(Error::Configuration(format!(
                    "Unsupported cache backend '{other}', expected one of: dir, sql, redis"
                )));
            }
        };

        Ok(Self {
            backend,
            use_precaching,
            encryption_key,
        })
    }
}

impl TryFrom<&HashMap<String, String>> for CacheOptions {
    type Error = Error;

    fn try_from(options: &HashMap<String, String>) -> Result<Self> {
        Self::from_map(options)
    }
}

fn non_empty<'a>(options: &'a HashMap<String, String>, name: &str) -> Option<&'a String> {
    options.get(name).filter(|value| !value.is_empty())
}

fn dir_options(options: &HashMap<String, String>) -> Result<BackendOptions> {
    let path = non_empty(options, "path").ok_or_else(|| {
        Error::Configuration("Option 'path' is required for 'dir' cache backend".into())
    })?;

    Ok(BackendOptions::Dir {
        path: PathBuf::from(path),
    })
}

fn sql_options(options: &HashMap<String, String>) -> Result<BackendOptions> {
    let driver = non_empty(options, "driver")
        .ok_or_else(|| Error::Configuration("No driver specified".into()))?;

    let dsn = non_empty(options, "dsn")
        .ok_or_else(|| Error::Configuration("dsn option to backend is required".into()))?;

    let dialect = driver.parse::<Dialect>()?;

    let table = non_empty(options, "table").map_or(DEFAULT_TABLE, String::as_str);
    validate_table(table)?;

    Ok(BackendOptions::Sql(SqlConfig {
        dialect,
        dsn: dsn.clone(),
        table: table.to_string(),
    }))
}

fn redis_options(options: &HashMap<String, String>) -> Result<BackendOptions> {
    let addr = non_empty(options, "addr")
        .ok_or_else(|| Error::Configuration("No 'addr' specified for Redis cache".into()))?;

    let password = non_empty(options, "password").cloned();

    let db = options
        .get("db")
        .map_or("0", String::as_str)
        .parse::<i64>()
        .map_err(|e| Error::Configuration(format!("Error parsing db field: {e}")))?;

    Ok(BackendOptions::Redis(RedisConfig {
        addr: addr.clone(),
        password,
        db,
    }))
}

/// Boolean spellings accepted for flags
#[must_use]
pub fn parse_bool(value: &str) -> Option<bool> {
    match value {
        "1" | "t" | "T" | "true" | "TRUE" | "True" => Some(true),
        "0" | "f" | "F" | "false" | "FALSE" | "False" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

    use super::*;

    fn map(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    fn config_error(options: &[(&str, &str)]) -> String {
        match CacheOptions::from_map(&map(options)) {
            Err(Error::Configuration(msg)) => msg,
            other => panic!("expected configuration error, got {other:?}"),
        }
    }

    #[test]
    fn test_missing_backend() {
        assert_eq!(config_error(&[]), "Missing required 'backend' parameter");
    }

    #[test]
    fn test_unknown_backend() {
        assert!(config_error(&[("backend", "s3")]).contains("Unsupported cache backend 's3'"));
    }

    #[test]
    fn test_dir() {
        let options =
            CacheOptions::from_map(&map(&[("backend", "dir"), ("path", "/var/cache/certs")]))
                .unwrap();
        assert_eq!(
            options.backend,
            BackendOptions::Dir {
                path: PathBuf::from("/var/cache/certs")
            }
        );
        assert!(!options.use_precaching);
        assert_eq!(options.encryption_key, None);
    }

    #[test]
    fn test_dir_requires_path() {
        assert_eq!(
            config_error(&[("backend", "dir")]),
            "Option 'path' is required for 'dir' cache backend"
        );
        assert_eq!(
            config_error(&[("backend", "dir"), ("path", "")]),
            "Option 'path' is required for 'dir' cache backend"
        );
    }

    #[test]
    fn test_sql() {
        let options = CacheOptions::try_from(&map(&[
            ("backend", "sql"),
            ("driver", "mysql"),
            ("dsn", "root:secret@tcp(127.0.0.1:3306)/test_db"),
        ]))
        .unwrap();

        assert_eq!(
            options.backend,
            BackendOptions::Sql(SqlConfig {
                dialect: Dialect::MySql,
                dsn: "root:secret@tcp(127.0.0.1:3306)/test_db".to_string(),
                table: DEFAULT_TABLE.to_string(),
            })
        );
    }

    #[test]
    fn test_sql_requires_driver_and_dsn() {
        assert_eq!(
            config_error(&[("backend", "sql"), ("dsn", "x")]),
            "No driver specified"
        );
        assert_eq!(
            config_error(&[("backend", "sql"), ("driver", "mysql")]),
            "dsn option to backend is required"
        );
    }

    #[test]
    fn test_sql_unsupported_driver() {
        let err = CacheOptions::from_map(&map(&[
            ("backend", "sql"),
            ("driver", "sqlite3"),
            ("dsn", "file.db"),
        ]))
        .unwrap_err();
        assert!(matches!(err, Error::UnsupportedDriver(_)));
    }

    #[test]
    fn test_sql_custom_table() {
        let options = CacheOptions::from_map(&map(&[
            ("backend", "sql"),
            ("driver", "postgres"),
            ("dsn", "postgres://u:p@tcp(localhost:5432)/db"),
            ("table", "certs"),
        ]))
        .unwrap();
        let BackendOptions::Sql(sql) = options.backend else {
            panic!("expected sql backend");
        };
        assert_eq!(sql.table, "certs");
        assert_eq!(sql.dialect, Dialect::Postgres);

        assert!(
            config_error(&[
                ("backend", "sql"),
                ("driver", "postgres"),
                ("dsn", "x"),
                ("table", "certs;--"),
            ])
            .contains("Invalid table name")
        );
    }

    #[test]
    fn test_redis_defaults() {
        let options =
            CacheOptions::from_map(&map(&[("backend", "redis"), ("addr", "127.0.0.1:6379")]))
                .unwrap();
        assert_eq!(
            options.backend,
            BackendOptions::Redis(RedisConfig {
                addr: "127.0.0.1:6379".to_string(),
                password: None,
                db: 0,
            })
        );
    }

    #[test]
    fn test_redis_options() {
        let options = CacheOptions::from_map(&map(&[
            ("backend", "redis"),
            ("addr", "redis:6379"),
            ("password", "hunter2"),
            ("db", "3"),
        ]))
        .unwrap();
        let BackendOptions::Redis(redis) = options.backend else {
            panic!("expected redis backend");
        };
        assert_eq!(redis.password.as_deref(), Some("hunter2"));
        assert_eq!(redis.db, 3);
    }

    #[test]
    fn test_redis_errors() {
        assert_eq!(
            config_error(&[("backend", "redis")]),
            "No 'addr' specified for Redis cache"
        );
        assert_eq!(
            config_error(&[("backend", "redis"), ("addr", "")]),
            "No 'addr' specified for Redis cache"
        );
        assert!(
            config_error(&[("backend", "redis"), ("addr", "x:1"), ("db", "one")])
                .starts_with("Error parsing db field")
        );
    }

    #[test]
    fn test_precaching_and_encryption() {
        let options = CacheOptions::from_map(&map(&[
            ("backend", "dir"),
            ("path", "/tmp/certs"),
            ("usePrecaching", "true"),
            ("encryptionKey", "testkey"),
        ]))
        .unwrap();
        assert!(options.use_precaching);
        assert_eq!(options.encryption_key.as_deref(), Some("testkey"));
    }

    #[test]
    fn test_empty_encryption_key_disables() {
        let options = CacheOptions::from_map(&map(&[
            ("backend", "dir"),
            ("path", "/tmp/certs"),
            ("encryptionKey", ""),
        ]))
        .unwrap();
        assert_eq!(options.encryption_key, None);
    }

    #[test]
    fn test_invalid_precaching() {
        assert!(
            config_error(&[("backend", "dir"), ("path", "/tmp"), ("usePrecaching", "yes")])
                .contains("usePrecaching")
        );
    }

    #[test]
    fn test_debug_hides_key() {
        let options = CacheOptions::from_map(&map(&[
            ("backend", "dir"),
            ("path", "/tmp/certs"),
            ("encryptionKey", "supersecret"),
        ]))
        .unwrap();
        let debug = format!("{options:?}");
        assert!(!debug.contains("supersecret"));
        assert!(debug.contains("encryption: true"));
    }

    #[test]
    fn test_parse_bool() {
        for value in ["1", "t", "T", "true", "TRUE", "True"] {
            assert_eq!(parse_bool(value), Some(true));
        }
        for value in ["0", "f", "F", "false", "FALSE", "False"] {
            assert_eq!(parse_bool(value), Some(false));
        }
        assert_eq!(parse_bool("yes"), None);
        assert_eq!(parse_bool(""), None);
    }
}
