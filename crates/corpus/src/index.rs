//! Corpus building and indexing logic.
//!
//! This module turns joined CSV rows into a validated `Corpus`:
//! - Extract list fields and build each record's tag string (in parallel)
//! - Drop records that repeat an earlier id or end up with empty tags
//! - Build the title/id -> row `MovieIndex`
//! - Fingerprint the ordered records with a SHA-256 content hash

use crate::error::{CorpusError, Result};
use crate::extract::{
    extract_cast_members, extract_director, extract_named_list, extract_top_cast,
};
use crate::normalize::{build_tags, feature_text};
use crate::parser::{self, RawMovie};
use crate::types::*;
use rayon::prelude::*;
use sha2::{Digest, Sha256};
use std::collections::{HashMap, HashSet};
use std::path::Path;
use tracing::{debug, info, warn};

impl Corpus {
    /// Load and normalize the corpus from the movies and credits CSV files.
    ///
    /// Steps:
    /// 1. Parse both files in parallel
    /// 2. Join them on title, dropping rows with nulls
    /// 3. Extract fields and build tags for every row
    /// 4. Deduplicate, index and hash
    pub fn load_from_files(movies_path: &Path, credits_path: &Path) -> Result<Self> {
        info!(
            "Loading corpus from {:?} and {:?}",
            movies_path, credits_path
        );

        let (movies, credits) = rayon::join(
            || parser::parse_movies(movies_path),
            || parser::parse_credits(credits_path),
        );
        let movies = movies?;
        let credits = credits?;

        info!("Read {} movie rows, {} credits rows", movies.len(), credits.len());

        let joined = parser::join_on_title(movies, credits);
        let records = joined
            .into_par_iter()
            .map(MovieRecord::from_raw)
            .collect::<Result<Vec<_>>>()?;

        let corpus = Self::from_records(records)?;
        info!("Corpus built with {} recommendable movies", corpus.len());
        Ok(corpus)
    }

    /// Build a corpus from records already in corpus order.
    ///
    /// Records whose id was already seen, or whose tags are empty, are
    /// skipped with a warning. Fails with `EmptyCorpus` if nothing is left.
    pub fn from_records(records: Vec<MovieRecord>) -> Result<Self> {
        let mut seen_ids = HashSet::new();
        let mut kept = Vec::with_capacity(records.len());

        for record in records {
            if !seen_ids.insert(record.id) {
                warn!("Skipping duplicate movie id {} ({})", record.id, record.title);
                continue;
            }
            if !record.is_recommendable() {
                warn!("Skipping movie {} ({}): empty tags", record.id, record.title);
                continue;
            }
            kept.push(record);
        }

        if kept.is_empty() {
            return Err(CorpusError::EmptyCorpus);
        }

        let index = MovieIndex::build(&kept);
        let content_hash = compute_content_hash(&kept);

        Ok(Self {
            records: kept,
            index,
            content_hash,
        })
    }

    /// Per-row text for vectorizing over `feature`, in corpus order
    pub fn feature_texts(&self, feature: SimilarityFeature) -> Vec<String> {
        self.records
            .par_iter()
            .map(|record| feature_text(record, feature))
            .collect()
    }
}

impl MovieRecord {
    /// Build a normalized record from a joined CSV row.
    ///
    /// Fails if any serialized list column is malformed; the error names the
    /// column and the movie id.
    pub fn from_raw(raw: RawMovie) -> Result<Self> {
        let id = raw.id;

        let genres = extract_named_list(&raw.genres).map_err(in_column("genres", id))?;
        let keywords = extract_named_list(&raw.keywords).map_err(in_column("keywords", id))?;
        let top_cast = extract_top_cast(&raw.cast).map_err(in_column("cast", id))?;
        let cast = extract_cast_members(&raw.cast).map_err(in_column("cast", id))?;
        let director = extract_director(&raw.crew)
            .map_err(in_column("crew", id))?
            .into_iter()
            .next();
        let production_companies = extract_named_list(&raw.production_companies)
            .map_err(in_column("production_companies", id))?;
        let spoken_languages = raw
            .spoken_languages
            .as_deref()
            .map(extract_named_list)
            .transpose()
            .map_err(in_column("spoken_languages", id))?
            .unwrap_or_default();

        let overview: Vec<String> = raw.overview.split_whitespace().map(String::from).collect();
        let tags = build_tags(
            &overview,
            &genres,
            &keywords,
            &top_cast,
            director.as_slice(),
        );

        Ok(Self {
            id,
            title: raw.title,
            overview,
            genres,
            keywords,
            top_cast,
            director,
            production_companies,
            tags,
            display: DisplayInfo {
                overview: raw.overview,
                budget: raw.budget,
                revenue: raw.revenue,
                runtime: raw.runtime,
                release_date: raw.release_date,
                spoken_languages,
                status: raw.status,
                vote_average: raw.vote_average,
                vote_count: raw.vote_count,
                cast,
            },
        })
    }
}

impl MovieIndex {
    /// Build the index over records in corpus order
    pub fn build(records: &[MovieRecord]) -> Self {
        let mut title_to_row = HashMap::with_capacity(records.len());
        let mut id_to_row = HashMap::with_capacity(records.len());
        let mut row_titles = Vec::with_capacity(records.len());

        for (row, record) in records.iter().enumerate() {
            if title_to_row.contains_key(&record.title) {
                debug!(
                    "Title {:?} already indexed; row {} only reachable by id",
                    record.title, row
                );
            } else {
                title_to_row.insert(record.title.clone(), row);
            }
            id_to_row.entry(record.id).or_insert(row);
            row_titles.push(record.title.clone());
        }

        Self {
            title_to_row,
            id_to_row,
            row_titles,
        }
    }
}

/// Attach the column name and movie id to a field parse error
fn in_column(column: &'static str, id: MovieId) -> impl Fn(CorpusError) -> CorpusError {
    move |e| match e {
        CorpusError::ParseError { reason, .. } => CorpusError::ParseError {
            field: format!("{} (movie {})", column, id),
            reason,
        },
        other => other,
    }
}

/// SHA-256 over the ordered (id, title, tags) triples
pub(crate) fn compute_content_hash(records: &[MovieRecord]) -> String {
    let mut hasher = Sha256::new();
    for record in records {
        hasher.update(record.id.to_le_bytes());
        hasher.update(record.title.as_bytes());
        hasher.update([0u8]);
        hasher.update(record.tags.as_bytes());
        hasher.update([0u8]);
    }
    format!("{:x}", hasher.finalize())
}
