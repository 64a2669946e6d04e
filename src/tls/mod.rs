//! TLS settings for SQL backend connections
//!
//! Read from the DSN query parameters and applied to the `MySQL` and
//! `PostgreSQL` connect options.

pub mod config;

pub use config::{TlsConfig, TlsMode};
