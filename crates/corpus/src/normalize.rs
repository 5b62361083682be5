//! Tag normalization.
//!
//! Turns the extracted per-movie fields into the single "tag" string that
//! the vectorizer consumes:
//!
//! 1. Multi-word names are collapsed (`"Science Fiction"` -> `"ScienceFiction"`)
//!    so they survive tokenization as one term.
//! 2. Overview, genres, keywords, cast and director are concatenated in that
//!    fixed order.
//! 3. Every token is lowercased, stemmed (Snowball English), stripped of ASCII
//!    punctuation, and dropped if it is a stop word or at most two characters.
//!
//! All functions here are pure: same input, same output, token order kept,
//! no deduplication.

use crate::stopwords::is_stop_word;
use crate::types::{MovieRecord, SimilarityFeature};
use rust_stemmers::{Algorithm, Stemmer};
use std::sync::LazyLock;

static STEMMER: LazyLock<Stemmer> = LazyLock::new(|| Stemmer::create(Algorithm::English));

/// Tokens of this many characters or fewer are dropped
const MIN_TOKEN_CHARS: usize = 2;

/// Remove all whitespace inside each token.
pub fn collapse_spaces<S: AsRef<str>>(tokens: &[S]) -> Vec<String> {
    tokens
        .iter()
        .map(|token| token.as_ref().split_whitespace().collect::<String>())
        .collect()
}

/// Normalize a single token, or `None` if it should be discarded
fn normalize_token(token: &str) -> Option<String> {
    let lowered = token.to_lowercase();
    if is_stop_word(&lowered) {
        return None;
    }

    let stemmed = STEMMER.stem(&lowered);
    if is_stop_word(&stemmed) {
        return None;
    }

    let stripped: String = stemmed
        .chars()
        .filter(|c| !c.is_ascii_punctuation())
        .collect();

    // Stripping can shorten a token or expose a stop word ("it's" -> "its")
    if stripped.chars().count() <= MIN_TOKEN_CHARS || is_stop_word(&stripped) {
        return None;
    }
    Some(stripped)
}

/// Stem, lowercase and filter tokens, joining the survivors with single spaces.
///
/// # Examples
/// ```
/// use corpus::normalize::stem_and_filter;
///
/// assert_eq!(stem_and_filter(&["The", "Running", "man."]), "run man");
/// ```
pub fn stem_and_filter<S: AsRef<str>>(tokens: &[S]) -> String {
    tokens
        .iter()
        .filter_map(|token| normalize_token(token.as_ref()))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Build the tag string for one movie.
///
/// Fields are concatenated in the order overview, genres, keywords, cast,
/// director. Everything but the overview is space-collapsed first.
pub fn build_tags<S: AsRef<str>>(
    overview: &[S],
    genres: &[S],
    keywords: &[S],
    cast: &[S],
    director: &[S],
) -> String {
    let mut tokens: Vec<String> = overview
        .iter()
        .map(|token| token.as_ref().to_string())
        .collect();
    tokens.extend(collapse_spaces(genres));
    tokens.extend(collapse_spaces(keywords));
    tokens.extend(collapse_spaces(cast));
    tokens.extend(collapse_spaces(director));

    stem_and_filter(&tokens)
}

/// Collapsed, lowercased, space-joined names (no stemming)
fn joined_lowercase(names: &[String]) -> String {
    collapse_spaces(names).join(" ").to_lowercase()
}

/// Text a record contributes when vectorizing over `feature`.
pub fn feature_text(record: &MovieRecord, feature: SimilarityFeature) -> String {
    match feature {
        SimilarityFeature::Tags => record.tags.clone(),
        SimilarityFeature::Genres => joined_lowercase(&record.genres),
        SimilarityFeature::Keywords => stem_and_filter(&collapse_spaces(&record.keywords)),
        SimilarityFeature::Cast => joined_lowercase(&record.top_cast),
        SimilarityFeature::ProductionCompanies => joined_lowercase(&record.production_companies),
    }
}
