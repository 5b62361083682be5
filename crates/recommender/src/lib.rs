//! Recommender crate for the movie recommendation engine.
//!
//! This crate ties the corpus, its similarity matrices and the media
//! lookup together: it builds the on-disk artifacts and answers
//! `recommend`, `get_details` and `search` queries over them.

pub mod artifacts;
pub mod engine;
pub mod error;
pub mod types;

pub use artifacts::{build_artifacts, ArtifactPaths, BuildSummary, CORPUS_FILE};
pub use engine::Recommender;
pub use error::{RecommendError, Result};
pub use types::{MovieDetails, Recommendation, DEFAULT_RECOMMENDATIONS};
