//! # Recommender
//!
//! Serves queries over one loaded corpus and one similarity matrix:
//! 1. Resolve the queried title to its corpus row (exact match)
//! 2. Rank every other row by similarity, highest first
//! 3. Decorate results with artwork from the media lookup
//!
//! Rows with equal similarity keep corpus order.

use crate::artifacts::ArtifactPaths;
use crate::error::{RecommendError, Result};
use crate::types::{MovieDetails, Recommendation};
use corpus::{Corpus, MovieRecord, PersonId, SimilarityFeature};
use media::{MediaLookup, PersonProfile};
use similarity::SimilarityMatrix;
use std::path::Path;
use std::time::Instant;
use tracing::{debug, info, instrument};

pub struct Recommender {
    corpus: Corpus,
    matrix: SimilarityMatrix,
    feature: SimilarityFeature,
    media: MediaLookup,
}

impl Recommender {
    /// Pair a corpus with a matrix built over it
    pub fn new(
        corpus: Corpus,
        matrix: SimilarityMatrix,
        feature: SimilarityFeature,
        media: MediaLookup,
    ) -> Result<Self> {
        if matrix.dimension() != corpus.len() {
            return Err(RecommendError::DimensionMismatch {
                corpus: corpus.len(),
                matrix: matrix.dimension(),
            });
        }
        Ok(Self {
            corpus,
            matrix,
            feature,
            media,
        })
    }

    /// Load the corpus snapshot and the `feature` matrix from `dir`.
    ///
    /// Fails if the matrix was built from a different corpus snapshot or
    /// for a different feature.
    pub fn load(dir: &Path, feature: SimilarityFeature, media: MediaLookup) -> Result<Self> {
        let start = Instant::now();
        let paths = ArtifactPaths::new(dir);

        let corpus = Corpus::load_snapshot(&paths.corpus())?;
        let matrix =
            SimilarityMatrix::load_feature(&paths.matrix(feature), corpus.content_hash(), feature)?;
        let recommender = Self::new(corpus, matrix, feature, media)?;

        info!(
            "Recommender ready: {} movies, feature {}, loaded in {:.2?}",
            recommender.corpus.len(),
            feature,
            start.elapsed()
        );
        Ok(recommender)
    }

    pub fn corpus(&self) -> &Corpus {
        &self.corpus
    }

    pub fn feature(&self) -> SimilarityFeature {
        self.feature
    }

    pub fn media(&self) -> &MediaLookup {
        &self.media
    }

    /// Up to `k` movies most similar to `title`, most similar first.
    ///
    /// The queried movie itself is never included, so at most `N - 1`
    /// results come back.
    #[instrument(skip(self))]
    pub fn recommend(&self, title: &str, k: usize) -> Result<Vec<Recommendation>> {
        let (row, _) = self.find(title)?;
        let ranked = self.rank(row, k);

        let recommendations = ranked
            .into_iter()
            .filter_map(|(other, score)| {
                let record = self.corpus.get(other)?;
                Some(Recommendation {
                    movie_id: record.id,
                    title: record.title.clone(),
                    poster_url: self.media.fetch_poster(record.id),
                    score,
                })
            })
            .collect::<Vec<_>>();

        debug!("{} recommendations for {:?}", recommendations.len(), title);
        Ok(recommendations)
    }

    /// Detail view of `title` with its poster
    #[instrument(skip(self))]
    pub fn get_details(&self, title: &str) -> Result<MovieDetails> {
        let (_, record) = self.find(title)?;
        let display = &record.display;

        Ok(MovieDetails {
            id: record.id,
            title: record.title.clone(),
            poster_url: self.media.fetch_poster(record.id),
            overview: display.overview.clone(),
            genres: record.genres.clone(),
            release_date: display.release_date.clone(),
            runtime: display.runtime,
            budget: display.budget,
            revenue: display.revenue,
            spoken_languages: display.spoken_languages.clone(),
            status: display.status.clone(),
            vote_average: display.vote_average,
            vote_count: display.vote_count,
            director: record.director.clone(),
            cast: display.cast.iter().map(|member| member.name.clone()).collect(),
            cast_ids: display.cast.iter().map(|member| member.id).collect(),
        })
    }

    /// Profile image and biography of a cast member
    pub fn person(&self, person_id: PersonId) -> PersonProfile {
        self.media.fetch_person(person_id)
    }

    /// Movies whose title contains `query`, ignoring case; exact matches first
    pub fn search(&self, query: &str) -> Vec<&MovieRecord> {
        self.corpus.search_titles(query)
    }

    fn find(&self, title: &str) -> Result<(usize, &MovieRecord)> {
        self.corpus
            .find_by_title(title)
            .ok_or_else(|| RecommendError::NotFound {
                title: title.to_string(),
            })
    }

    /// Other rows ranked by similarity to `row`, truncated to `k`
    fn rank(&self, row: usize, k: usize) -> Vec<(usize, f32)> {
        let scores = self.matrix.row(row);
        let mut ranked: Vec<(usize, f32)> = scores
            .iter()
            .copied()
            .enumerate()
            .filter(|&(other, _)| other != row)
            .collect();

        // stable: equal scores stay in corpus order
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
        ranked.truncate(k);
        ranked
    }
}
