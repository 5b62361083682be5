//! Error types for vectorizing and for persisted similarity matrices.

use corpus::SimilarityFeature;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SimilarityError {
    /// No documents were given to the vectorizer
    #[error("Cannot vectorize an empty corpus")]
    EmptyCorpus,

    #[error("Vocabulary limit must be at least 1")]
    InvalidVocabularyLimit,

    /// Every token in the corpus was filtered out
    #[error("Vocabulary is empty after tokenization")]
    EmptyVocabulary,

    /// The matrix on disk was built from a different corpus snapshot
    #[error("Similarity matrix belongs to corpus {found}, expected {expected}")]
    CorpusMismatch { expected: String, found: String },

    #[error("Similarity matrix was built for feature {found}, expected {expected}")]
    FeatureMismatch {
        expected: SimilarityFeature,
        found: SimilarityFeature,
    },

    #[error("Unsupported matrix format version {found} (expected {expected})")]
    UnsupportedVersion { expected: u32, found: u32 },

    /// Header or body of a matrix file is not what the header promises
    #[error("Corrupt similarity matrix: {0}")]
    Corrupt(String),

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Matrix header error: {0}")]
    HeaderError(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, SimilarityError>;
