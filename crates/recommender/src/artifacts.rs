//! Offline build of the derived artifacts the recommender serves from.
//!
//! An artifacts directory holds one corpus snapshot and one similarity
//! matrix per feature, all tied together by the corpus content hash:
//!
//! ```text
//! artifacts/
//!   corpus.json
//!   similarity-tags.bin
//!   similarity-genres.bin
//!   ...
//! ```

use crate::error::Result;
use corpus::{Corpus, SimilarityFeature};
use similarity::{matrix_file_name, vectorize, SimilarityMatrix};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::info;

pub const CORPUS_FILE: &str = "corpus.json";

/// Locations of the files inside an artifacts directory
#[derive(Debug, Clone)]
pub struct ArtifactPaths {
    dir: PathBuf,
}

impl ArtifactPaths {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn corpus(&self) -> PathBuf {
        self.dir.join(CORPUS_FILE)
    }

    pub fn matrix(&self, feature: SimilarityFeature) -> PathBuf {
        self.dir.join(matrix_file_name(feature))
    }
}

/// What a build produced
#[derive(Debug, Clone, PartialEq)]
pub struct BuildSummary {
    pub movies: usize,
    pub corpus_hash: String,
    /// Built features with their vocabulary sizes
    pub features: Vec<(SimilarityFeature, usize)>,
}

/// Load the CSV corpus, then write its snapshot and one matrix per feature
/// into `out_dir` (created if missing). Repeated features are built once.
pub fn build_artifacts(
    movies_csv: &Path,
    credits_csv: &Path,
    out_dir: &Path,
    features: &[SimilarityFeature],
    vocabulary_limit: usize,
) -> Result<BuildSummary> {
    let start = Instant::now();
    let paths = ArtifactPaths::new(out_dir);
    fs::create_dir_all(paths.dir())?;

    let corpus = Corpus::load_from_files(movies_csv, credits_csv)?;
    corpus.save_snapshot(&paths.corpus())?;

    let mut built = Vec::new();
    for &feature in features {
        if built.iter().any(|&(f, _)| f == feature) {
            continue;
        }
        let vocabulary = build_matrix(&corpus, feature, vocabulary_limit, &paths)?;
        built.push((feature, vocabulary));
    }

    info!(
        "Built artifacts for {} movies and {} features in {:.2?}",
        corpus.len(),
        built.len(),
        start.elapsed()
    );

    Ok(BuildSummary {
        movies: corpus.len(),
        corpus_hash: corpus.content_hash().to_string(),
        features: built,
    })
}

/// Vectorize one feature and persist its matrix; returns the vocabulary size
fn build_matrix(
    corpus: &Corpus,
    feature: SimilarityFeature,
    vocabulary_limit: usize,
    paths: &ArtifactPaths,
) -> Result<usize> {
    let start = Instant::now();
    let texts = corpus.feature_texts(feature);
    let counts = vectorize(&texts, vocabulary_limit)?;
    let matrix = SimilarityMatrix::from_counts(&counts);
    matrix.save(&paths.matrix(feature), corpus.content_hash(), feature)?;

    info!(
        "Built {} matrix over {} terms in {:.2?}",
        feature,
        counts.n_terms(),
        start.elapsed()
    );
    Ok(counts.n_terms())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_artifact_paths() {
        let paths = ArtifactPaths::new("out");
        assert_eq!(paths.corpus(), Path::new("out/corpus.json"));
        assert_eq!(
            paths.matrix(SimilarityFeature::Keywords),
            Path::new("out/similarity-keywords.bin")
        );
    }
}
