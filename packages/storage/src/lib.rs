// ABOUTME: Data layer and persistence primitives for REVV
// ABOUTME: Storage errors, SQLite pool initialization, and embedded migrations

use thiserror::Error;

pub mod pool;

pub use pool::{init_pool, MIGRATOR};

#[cfg(any(test, feature = "test-utils"))]
pub use pool::connect_in_memory;

/// Storage errors
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Database error: {0}")]
    Database(String),
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
    #[error("Sqlx error: {0}")]
    Sqlx(#[from] sqlx::Error),
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Record not found")]
    NotFound,
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Corrupt column '{column}': {value}")]
    Corrupt { column: &'static str, value: String },
}

impl StorageError {
    /// Map a missing row to `NotFound` and keep every other failure as-is
    pub fn from_fetch(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => StorageError::NotFound,
            other => StorageError::Sqlx(other),
        }
    }
}

pub type StorageResult<T> = Result<T, StorageError>;
