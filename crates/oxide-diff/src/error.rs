//! Error types for the diff engine.

use std::path::PathBuf;

/// Errors that can occur while comparing two databases.
#[derive(Debug, thiserror::Error)]
pub enum DiffError {
    /// A native column type has no ordering rule.
    #[error("Unable to compare values of native type '{0}'")]
    UnsupportedType(String),

    /// Two values cannot be ordered under the given native type.
    #[error("Cannot compare {left} with {right} as '{native_type}'")]
    IncomparableValues {
        /// Native type the values were compared as.
        native_type: String,
        /// Left-hand value, debug formatted.
        left: String,
        /// Right-hand value, debug formatted.
        right: String,
    },

    /// Introspection reported an index that cannot be classified.
    #[error("Invalid key '{key}' on table '{table}': {reason}")]
    InvalidKey {
        /// Table owning the key.
        table: String,
        /// Index name.
        key: String,
        /// What is wrong with it.
        reason: String,
    },

    /// A row or key referenced a column the table metadata does not have.
    #[error("Column '{column}' not found in table '{table}'")]
    MissingColumn {
        /// Table name.
        table: String,
        /// Column name.
        column: String,
    },

    /// Database error from the MySQL data source.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Failure reported by a non-SQL data source.
    #[error("Data source error: {0}")]
    DataSource(String),

    /// IO error (reading config or fixture files).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Config file could not be deserialized.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A `.sqltest` fixture is malformed.
    #[error("Malformed sqltest '{path}' (line {line}): {message}")]
    Fixture {
        /// Path (or name) of the fixture.
        path: PathBuf,
        /// 1-based line number, 0 when the whole file is at fault.
        line: usize,
        /// Error message.
        message: String,
    },
}

/// Result type for diff operations.
pub type Result<T> = std::result::Result<T, DiffError>;
