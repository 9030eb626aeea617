//! Error types for the pg-generic crate
//!
//! Bootstrap and schema-file failures. Mapper operations return
//! [`store_object::StoreError`] directly.

use store_object::StoreError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PgGenericError {
    #[error("Database connection error: {0}")]
    DatabaseConnection(#[from] sqlx::Error),

    #[error("Database unreachable after {attempts} attempts: {source}")]
    ConnectRetriesExhausted {
        attempts: u32,
        #[source]
        source: sqlx::Error,
    },

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("Failed to write schema file {path}: {source}")]
    SchemaWrite {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid schema file {path}: {source}")]
    SchemaParse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}
