//! Error types for the corpus crate.
//!
//! Every failure here means the input data (CSV files, serialized list
//! fields, or a persisted snapshot) cannot be trusted, so these errors are
//! propagated to the caller instead of being recovered.

use thiserror::Error;

/// Errors that can occur while loading, normalizing or persisting a corpus
#[derive(Error, Debug)]
pub enum CorpusError {
    /// File could not be found or opened
    #[error("Failed to open file: {path}")]
    FileNotFound { path: String },

    /// I/O error occurred while reading or writing a file
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// The CSV reader rejected a record
    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),

    /// A serialized structured field (genres, cast, crew, ...) was malformed
    ///
    /// This variant stores context about which field failed and why
    #[error("Parse error in field {field}: {reason}")]
    ParseError { field: String, reason: String },

    /// A required column is absent from a CSV header
    #[error("Missing column {column} in {file}")]
    MissingColumn { file: String, column: String },

    /// A snapshot file could not be decoded
    #[error("Snapshot error: {0}")]
    SnapshotError(#[from] serde_json::Error),

    /// Snapshot was written by an incompatible format version
    #[error("Unsupported snapshot format version {found} (expected {expected})")]
    SnapshotVersion { expected: u32, found: u32 },

    /// Snapshot content does not hash to the value stored alongside it
    #[error("Snapshot content hash mismatch: stored {stored}, computed {computed}")]
    SnapshotHashMismatch { stored: String, computed: String },

    /// Nothing survived ingestion
    #[error("Corpus is empty")]
    EmptyCorpus,
}

/// Convenience type alias for Results in this crate
pub type Result<T> = std::result::Result<T, CorpusError>;
