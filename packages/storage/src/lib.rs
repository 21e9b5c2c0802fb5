// ABOUTME: Data layer and persistence for Casebook
// ABOUTME: SQLite pool construction, embedded migrations, and the shared storage error

pub mod pool;

pub use pool::{init_pool, init_pool_with_path, run_migrations, PoolSettings};

use thiserror::Error;

/// Storage errors shared by every package that talks to SQLite
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
    #[error("Duplicate value: {0}")]
    Duplicate(String),
    #[error("Record {0} was modified by another writer")]
    VersionConflict(String),
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

pub type StorageResult<T> = Result<T, StorageError>;

impl StorageError {
    /// Map `RowNotFound` to `NotFound` and unique violations to `Duplicate`
    pub fn from_sqlx(err: sqlx::Error, what: &str) -> Self {
        match err {
            sqlx::Error::RowNotFound => StorageError::NotFound,
            sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
                StorageError::Duplicate(what.to_string())
            }
            other => StorageError::Sqlx(other),
        }
    }
}
