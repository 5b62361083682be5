//! # Similarity Crate
//!
//! Bag-of-words vectorization of per-movie text and the pairwise cosine
//! similarity matrix the recommender ranks against.
//!
//! ## Components
//!
//! ### CountVectorizer
//! - Tokenizes on non-alphanumeric boundaries and drops stop words
//! - Keeps the most frequent terms up to a vocabulary limit
//! - Encodes each document as sparse term counts
//!
//! ### SimilarityMatrix
//! - N x N cosine similarity, built in parallel with rayon
//! - Persisted with the content hash of the corpus it was built from
//!
//! ## Example Usage
//!
//! ```ignore
//! use corpus::{Corpus, SimilarityFeature};
//! use similarity::{vectorize, SimilarityMatrix, DEFAULT_VOCABULARY_LIMIT};
//!
//! let texts = corpus.feature_texts(SimilarityFeature::Tags);
//! let counts = vectorize(&texts, DEFAULT_VOCABULARY_LIMIT)?;
//! let matrix = SimilarityMatrix::from_counts(&counts);
//!
//! matrix.save(path, corpus.content_hash(), SimilarityFeature::Tags)?;
//! let matrix = SimilarityMatrix::load(path, corpus.content_hash())?;
//! ```

pub mod error;
pub mod matrix;
pub mod vectorizer;

pub use error::{Result, SimilarityError};
pub use matrix::{MatrixHeader, SimilarityMatrix, MATRIX_FORMAT_VERSION};
pub use vectorizer::{vectorize, CountMatrix, CountVectorizer, DEFAULT_VOCABULARY_LIMIT};

/// File name of the persisted matrix for `feature`
pub fn matrix_file_name(feature: corpus::SimilarityFeature) -> String {
    format!("similarity-{}.bin", feature)
}

#[cfg(test)]
mod tests {
    use super::*;
    use corpus::SimilarityFeature;

    #[test]
    fn test_matrix_file_name() {
        assert_eq!(matrix_file_name(SimilarityFeature::Tags), "similarity-tags.bin");
        assert_eq!(
            matrix_file_name(SimilarityFeature::ProductionCompanies),
            "similarity-production_companies.bin"
        );
    }
}
