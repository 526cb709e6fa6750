//! Error types for curriculum scoring.

/// Errors that can occur while reading inputs or reference tables.
#[derive(Debug, thiserror::Error)]
pub enum ScoreError {
    /// The curriculum document is not well-formed XML.
    #[error("Failed to parse curriculum document: {0}")]
    Parse(String),

    /// The uploaded bundle could not be unpacked.
    #[error("Failed to read archive: {0}")]
    Archive(String),

    /// A reference table is unreadable or lacks a required column.
    #[error("Reference table '{table}': {reason}")]
    Table { table: String, reason: String },

    /// Input file is neither `.xml` nor `.zip`.
    #[error("Unsupported file format: {0} (expected a .zip or .xml file)")]
    UnsupportedFormat(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Filesystem error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Delimited text error.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

impl ScoreError {
    /// Shorthand for a [`ScoreError::Table`] error.
    pub fn table(table: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Table {
            table: table.into(),
            reason: reason.into(),
        }
    }
}

/// Convenience alias for Results using [`ScoreError`].
pub type Result<T> = std::result::Result<T, ScoreError>;
