//! Core domain types for the movie corpus.
//!
//! This module defines the data structures shared by every other crate in
//! the workspace:
//! - `MovieRecord`: one normalized movie, including its tag string
//! - `MovieIndex`: title <-> row lookups over a corpus snapshot
//! - `Corpus`: the ordered record set plus its index and content hash
//! - `SimilarityFeature`: which text field a similarity matrix is built over

use crate::error::CorpusError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

// =============================================================================
// Type Aliases
// =============================================================================

/// TMDB identifier of a movie
pub type MovieId = u64;

/// TMDB identifier of a person (cast or crew member)
pub type PersonId = u64;

// =============================================================================
// Movie-related Types
// =============================================================================

/// A credited cast member, in billing order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CastMember {
    pub id: PersonId,
    pub name: String,
}

/// Display-only fields kept for detail views.
///
/// None of these participate in similarity; they are carried in the snapshot
/// so a detail query can be answered without re-reading the CSV files.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DisplayInfo {
    /// Untokenized overview text
    pub overview: String,
    pub budget: Option<i64>,
    pub revenue: Option<i64>,
    /// Runtime in minutes
    pub runtime: Option<f64>,
    pub release_date: String,
    pub spoken_languages: Vec<String>,
    pub status: Option<String>,
    pub vote_average: Option<f64>,
    pub vote_count: Option<u64>,
    /// Full cast list (not truncated), used for person lookups
    pub cast: Vec<CastMember>,
}

/// A normalized movie, ready to be vectorized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MovieRecord {
    pub id: MovieId,
    pub title: String,
    /// Overview split on whitespace
    pub overview: Vec<String>,
    /// Genre names in source order
    pub genres: Vec<String>,
    pub keywords: Vec<String>,
    /// First ten billed cast members
    pub top_cast: Vec<String>,
    /// First crew entry whose job is "Director"
    pub director: Option<String>,
    pub production_companies: Vec<String>,
    /// Normalized tag string (the content fingerprint)
    pub tags: String,
    pub display: DisplayInfo,
}

impl MovieRecord {
    /// A record can only take part in recommendations if it has tags
    pub fn is_recommendable(&self) -> bool {
        !self.tags.is_empty()
    }
}

// =============================================================================
// Similarity Feature
// =============================================================================

/// Text field a similarity matrix is computed over.
///
/// `Tags` is the default used by recommendations; the other variants give
/// narrower "more like this" views (same genres, same cast, ...).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SimilarityFeature {
    #[default]
    Tags,
    Genres,
    Keywords,
    Cast,
    ProductionCompanies,
}

impl SimilarityFeature {
    /// Every feature, in a fixed order
    pub const ALL: [SimilarityFeature; 5] = [
        SimilarityFeature::Tags,
        SimilarityFeature::Genres,
        SimilarityFeature::Keywords,
        SimilarityFeature::Cast,
        SimilarityFeature::ProductionCompanies,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SimilarityFeature::Tags => "tags",
            SimilarityFeature::Genres => "genres",
            SimilarityFeature::Keywords => "keywords",
            SimilarityFeature::Cast => "cast",
            SimilarityFeature::ProductionCompanies => "production_companies",
        }
    }
}

impl fmt::Display for SimilarityFeature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SimilarityFeature {
    type Err = CorpusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SimilarityFeature::ALL
            .into_iter()
            .find(|feature| feature.as_str() == s)
            .ok_or_else(|| CorpusError::ParseError {
                field: "feature".to_string(),
                reason: format!("unknown similarity feature '{}'", s),
            })
    }
}

// =============================================================================
// MovieIndex
// =============================================================================

/// Bidirectional mapping between titles and corpus rows.
///
/// Built from the same ordered record set as the similarity matrix, so row
/// `i` here is row `i` there. Titles are matched exactly; when two records
/// share a title the first row wins.
#[derive(Debug, Clone, Default)]
pub struct MovieIndex {
    pub(crate) title_to_row: HashMap<String, usize>,
    pub(crate) id_to_row: HashMap<MovieId, usize>,
    pub(crate) row_titles: Vec<String>,
}

impl MovieIndex {
    /// Row of the movie with exactly this title
    pub fn row_of(&self, title: &str) -> Option<usize> {
        self.title_to_row.get(title).copied()
    }

    /// Row of the movie with this id
    pub fn row_of_id(&self, id: MovieId) -> Option<usize> {
        self.id_to_row.get(&id).copied()
    }

    /// Title stored at a row
    pub fn title_of(&self, row: usize) -> Option<&str> {
        self.row_titles.get(row).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.row_titles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.row_titles.is_empty()
    }
}

// =============================================================================
// Corpus
// =============================================================================

/// An ordered, validated set of movie records.
///
/// Construction (see `index.rs`) guarantees unique ids and non-empty tags.
/// `content_hash` fingerprints the ordered (id, title, tags) triples and is
/// stored next to every similarity matrix derived from this corpus.
#[derive(Debug, Clone)]
pub struct Corpus {
    pub(crate) records: Vec<MovieRecord>,
    pub(crate) index: MovieIndex,
    pub(crate) content_hash: String,
}

impl Corpus {
    pub fn records(&self) -> &[MovieRecord] {
        &self.records
    }

    /// Record at a row
    pub fn get(&self, row: usize) -> Option<&MovieRecord> {
        self.records.get(row)
    }

    /// Exact-title lookup returning the row and the record
    pub fn find_by_title(&self, title: &str) -> Option<(usize, &MovieRecord)> {
        let row = self.index.row_of(title)?;
        self.records.get(row).map(|record| (row, record))
    }

    /// Records whose title contains `query`, ignoring case.
    ///
    /// Exact (case-insensitive) matches come first, then corpus order. A
    /// blank query matches nothing.
    pub fn search_titles(&self, query: &str) -> Vec<&MovieRecord> {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return Vec::new();
        }

        let mut hits: Vec<(bool, &MovieRecord)> = self
            .records
            .iter()
            .filter_map(|record| {
                let title = record.title.to_lowercase();
                title.contains(&needle).then_some((title != needle, record))
            })
            .collect();
        hits.sort_by_key(|&(inexact, _)| inexact);
        hits.into_iter().map(|(_, record)| record).collect()
    }

    pub fn index(&self) -> &MovieIndex {
        &self.index
    }

    pub fn content_hash(&self) -> &str {
        &self.content_hash
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
