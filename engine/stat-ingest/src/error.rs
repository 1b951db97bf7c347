//! Error types for the stat ingestion pipeline

use thiserror::Error;

/// Result type alias for ingestion operations
pub type Result<T> = std::result::Result<T, IngestError>;

/// Errors that abort an ingestion run
///
/// Rows dropped during reconciliation are not errors; they are counted as
/// [`crate::reconcile::ValidationSkip`] values instead.
#[derive(Error, Debug)]
pub enum IngestError {
    /// The source process could not be started or exited abnormally
    #[error("Source process failed: {0}")]
    ProcessFailure(String),

    /// Payload markers missing or out of order, or payload not parseable
    #[error("Malformed feed: {0}")]
    MalformedFeed(String),

    /// A bulk upsert was rejected by the store
    #[error("Failed to write {table}: {reason}")]
    StorageWriteFailure { table: &'static str, reason: String },

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O errors outside the source process itself (payload files, replays)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Connection and migration errors
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

impl IngestError {
    /// Create a new process failure
    pub fn process_failure(msg: impl Into<String>) -> Self {
        Self::ProcessFailure(msg.into())
    }

    /// Create a new malformed feed error
    pub fn malformed_feed(msg: impl Into<String>) -> Self {
        Self::MalformedFeed(msg.into())
    }

    /// Create a new storage write failure for the given table
    pub fn storage_write(table: &'static str, reason: impl ToString) -> Self {
        Self::StorageWriteFailure { table, reason: reason.to_string() }
    }

    /// Create a new configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Whether the run failed before anything was written
    pub fn aborted_before_write(&self) -> bool {
        !matches!(self, Self::StorageWriteFailure { .. })
    }
}

impl From<config::ConfigError> for IngestError {
    fn from(err: config::ConfigError) -> Self {
        IngestError::Config(err.to_string())
    }
}
