use corpus::CorpusError;
use similarity::SimilarityError;
use thiserror::Error;

/// Errors surfaced by recommendation queries and artifact handling
#[derive(Error, Debug)]
pub enum RecommendError {
    /// The title is not in the corpus (lookups are exact)
    #[error("Movie not found: {title}")]
    NotFound { title: String },

    /// Matrix and corpus disagree on the number of rows
    #[error("Similarity matrix has {matrix} rows but corpus has {corpus} movies")]
    DimensionMismatch { corpus: usize, matrix: usize },

    #[error(transparent)]
    Corpus(#[from] CorpusError),

    #[error(transparent)]
    Similarity(#[from] SimilarityError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, RecommendError>;
