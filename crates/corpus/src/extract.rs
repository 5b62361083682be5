//! Field extraction for serialized list columns.
//!
//! The TMDB export stores genres, keywords, companies, cast and crew as JSON
//! arrays of objects inside a single CSV cell, e.g.
//! `[{"id": 28, "name": "Action"}, {"id": 12, "name": "Adventure"}]`.
//!
//! Each column is deserialized into a typed entry struct. Anything that is not
//! an array of objects carrying the expected fields is a `ParseError`: a
//! corrupt cell means corrupt input, and the corpus build stops there.

use crate::error::{CorpusError, Result};
use crate::types::{CastMember, PersonId};
use serde::Deserialize;
use serde::de::DeserializeOwned;

/// Maximum number of billed cast members kept per movie
pub const TOP_CAST_LIMIT: usize = 10;

/// Crew job that identifies a director
const DIRECTOR_JOB: &str = "Director";

#[derive(Debug, Deserialize)]
struct NamedEntry {
    name: String,
}

#[derive(Debug, Deserialize)]
struct CastEntry {
    id: PersonId,
    name: String,
}

#[derive(Debug, Deserialize)]
struct CrewEntry {
    job: String,
    name: String,
}

/// Deserialize a serialized list cell into typed entries
fn parse_entries<T: DeserializeOwned>(field: &str, serialized: &str) -> Result<Vec<T>> {
    serde_json::from_str(serialized).map_err(|e| CorpusError::ParseError {
        field: field.to_string(),
        reason: e.to_string(),
    })
}

/// Extract every `name` from a serialized list, in source order.
///
/// Example: `[{"id": 18, "name": "Drama"}]` -> `vec!["Drama"]`
pub fn extract_named_list(serialized: &str) -> Result<Vec<String>> {
    let entries: Vec<NamedEntry> = parse_entries("name list", serialized)?;
    Ok(entries.into_iter().map(|entry| entry.name).collect())
}

/// Extract the first ten cast names (billing order).
pub fn extract_top_cast(serialized_cast: &str) -> Result<Vec<String>> {
    let entries: Vec<CastEntry> = parse_entries("cast", serialized_cast)?;
    Ok(entries
        .into_iter()
        .take(TOP_CAST_LIMIT)
        .map(|entry| entry.name)
        .collect())
}

/// Extract the full cast with person ids, for detail views
pub fn extract_cast_members(serialized_cast: &str) -> Result<Vec<CastMember>> {
    let entries: Vec<CastEntry> = parse_entries("cast", serialized_cast)?;
    Ok(entries
        .into_iter()
        .map(|entry| CastMember {
            id: entry.id,
            name: entry.name,
        })
        .collect())
}

/// Extract the first director from a serialized crew list.
///
/// Returns at most one name; later directors are ignored.
pub fn extract_director(serialized_crew: &str) -> Result<Vec<String>> {
    let entries: Vec<CrewEntry> = parse_entries("crew", serialized_crew)?;
    Ok(entries
        .into_iter()
        .find(|entry| entry.job == DIRECTOR_JOB)
        .map(|entry| entry.name)
        .into_iter()
        .collect())
}
