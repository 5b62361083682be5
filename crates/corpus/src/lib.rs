//! # Corpus Crate
//!
//! This crate turns the TMDB 5000 movies/credits export into a normalized,
//! ordered corpus of movies, each with a "tag" string describing its content.
//!
//! ## Main Components
//!
//! - **types**: Core domain types (MovieRecord, MovieIndex, Corpus, SimilarityFeature)
//! - **extract**: Typed extraction of serialized list columns (genres, cast, crew, ...)
//! - **normalize**: Tag construction (space collapsing, stemming, stop word filtering)
//! - **stopwords**: Fixed English stop word list
//! - **parser**: Read and join the two CSV files
//! - **index**: Build records, deduplicate, index and hash the corpus
//! - **snapshot**: Persist and reload the corpus with its content hash
//! - **error**: Error types for corpus loading
//!
//! ## Example Usage
//!
//! ```ignore
//! use corpus::Corpus;
//! use std::path::Path;
//!
//! let corpus = Corpus::load_from_files(
//!     Path::new("data/tmdb_5000_movies.csv"),
//!     Path::new("data/tmdb_5000_credits.csv"),
//! )?;
//!
//! let (row, avatar) = corpus.find_by_title("Avatar").unwrap();
//! println!("row {}: {}", row, avatar.tags);
//!
//! corpus.save_snapshot(Path::new("artifacts/corpus.json"))?;
//! ```

// Public modules
pub mod error;
pub mod extract;
pub mod index;
pub mod normalize;
pub mod parser;
pub mod snapshot;
pub mod stopwords;
pub mod types;

// Re-export commonly used types for convenience
pub use error::{CorpusError, Result};
pub use snapshot::SNAPSHOT_FORMAT_VERSION;
pub use types::{
    // Type aliases
    MovieId,
    PersonId,
    // Core types
    CastMember,
    Corpus,
    DisplayInfo,
    MovieIndex,
    MovieRecord,
    // Enums
    SimilarityFeature,
};
