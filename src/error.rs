use thiserror::Error;

/// Errors returned by every cache layer
#[derive(Debug, Error)]
pub enum Error {
    /// The key is absent; passes through every layer unchanged
    #[error("cache miss")]
    NotFound,

    /// Missing or invalid option at construction time
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Backend unreachable (failed liveness probe)
    #[error("connectivity error: {0}")]
    Connectivity(String),

    /// Stored SQL payload is not valid base64
    #[error("encoding error: {0}")]
    Encoding(#[from] base64::DecodeError),

    /// Cipher setup failed or ciphertext is corrupted
    #[error("crypto error: {0}")]
    Crypto(String),

    /// SQL driver has no dialect implementation
    #[error("unsupported driver: {0}")]
    UnsupportedDriver(String),

    #[error("sql: {0}")]
    Sql(#[from] sqlx::Error),

    #[error("redis: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// True when the error is the cache-miss signal
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound)
    }

    /// Short label used for the `outcome` metric
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::NotFound => "miss",
            Self::Configuration(_) => "configuration",
            Self::Connectivity(_) | Self::Sql(_) | Self::Redis(_) | Self::Io(_) => "backend",
            Self::Encoding(_) => "encoding",
            Self::Crypto(_) => "crypto",
            Self::UnsupportedDriver(_) => "unsupported_driver",
        }
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found() {
        assert!(Error::NotFound.is_not_found());
        assert!(!Error::Crypto("short".into()).is_not_found());
        assert_eq!(Error::NotFound.to_string(), "cache miss");
    }

    #[test]
    fn test_kind() {
        assert_eq!(Error::NotFound.kind(), "miss");
        assert_eq!(Error::Connectivity("down".into()).kind(), "backend");
        assert_eq!(
            Error::Io(std::io::Error::other("disk")).kind(),
            "backend"
        );
        assert_eq!(Error::UnsupportedDriver("sqlite".into()).kind(), "unsupported_driver");
    }

    #[test]
    fn test_display() {
        let err = Error::Configuration("Missing required 'backend' parameter".into());
        assert_eq!(
            err.to_string(),
            "configuration error: Missing required 'backend' parameter"
        );
    }
}
