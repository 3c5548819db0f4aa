//! Run history database.
//!
//! Every fingerprint run can be persisted with the corpus hash, the settings
//! it used and its ranked fingerprints (feature tokens plus rendered pattern).
//! A resolver working against another build of the corpus reads patterns back
//! from here.

use thiserror::Error;

mod fingerprint_db;
mod models;

pub use fingerprint_db::{FingerprintDb, CURRENT_SCHEMA_VERSION};
pub use models::{RunRecord, SearchStrategy, StoredFingerprint};

/// Error type for run database operations.
#[derive(Debug, Error)]
pub enum DbError {
    /// Underlying SQLite error.
    #[error("SQLite error: {0}")]
    Sql(#[from] rusqlite::Error),

    /// Stored JSON column failed to encode or decode.
    #[error("Stored JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The database was created with a newer schema version than we support.
    #[error(
        "Unsupported schema version {found}; supported range is {min_supported}..={max_supported}"
    )]
    UnsupportedSchemaVersion { found: i32, min_supported: i32, max_supported: i32 },
}

/// Convenience result type for DB operations.
pub type DbResult<T> = Result<T, DbError>;
