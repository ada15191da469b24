//! Error types for the contact book.
//!
//! Field validation failures live in [`crate::record::FieldError`]; this
//! module covers everything around the records: the contacts file,
//! configuration, and console I/O.

use std::path::PathBuf;
use thiserror::Error;

/// The main error type for contact book operations.
#[derive(Error, Debug)]
pub enum Error {
    // === Storage Errors ===
    /// Failed to open or create the contacts file.
    #[error("failed to open contacts file at {path}: {source}")]
    DatabaseOpen {
        /// Path to the contacts file.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: rusqlite::Error,
    },

    /// A database query failed.
    #[error("database query failed: {0}")]
    DatabaseQuery(#[from] rusqlite::Error),

    /// Failed to bring the schema up to the current version.
    #[error("database migration failed: {message}")]
    DatabaseMigration {
        /// Description of what went wrong.
        message: String,
    },

    /// A stored row could not be turned back into a record.
    #[error("corrupt record at position {position}: {message}")]
    CorruptRecord {
        /// Zero-based position of the row in the stored collection.
        position: i64,
        /// Description of what is wrong with the row.
        message: String,
    },

    // === Configuration Errors ===
    /// Failed to load configuration.
    #[error("failed to load configuration: {0}")]
    ConfigLoad(Box<figment::Error>),

    /// Configuration validation failed.
    #[error("invalid configuration: {message}")]
    ConfigValidation {
        /// Description of the validation failure.
        message: String,
    },

    // === I/O Errors ===
    /// Console or file system operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to create the directory holding the contacts file.
    #[error("failed to create directory {path}: {source}")]
    DirectoryCreate {
        /// Path that couldn't be created.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    // === Generic Errors ===
    /// An internal error occurred (bug).
    #[error("internal error: {0}")]
    Internal(String),
}

/// A specialized Result type for contact book operations.
pub type Result<T> = std::result::Result<T, Error>;

impl From<figment::Error> for Error {
    fn from(err: figment::Error) -> Self {
        Self::ConfigLoad(Box::new(err))
    }
}

impl Error {
    /// Create a corrupt record error.
    #[must_use]
    pub fn corrupt_record(position: i64, message: impl Into<String>) -> Self {
        Self::CorruptRecord {
            position,
            message: message.into(),
        }
    }

    /// Create a new internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }
}
