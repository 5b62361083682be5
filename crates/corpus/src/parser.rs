//! Parser for the TMDB 5000 CSV export.
//!
//! Two files are read:
//! - `tmdb_5000_movies.csv`: budget, genres, id, keywords, overview,
//!   production_companies, release_date, revenue, runtime, spoken_languages,
//!   status, title, vote_average, vote_count (plus columns we ignore)
//! - `tmdb_5000_credits.csv`: movie_id, title, cast, crew
//!
//! The two are inner-joined on title. Rows missing any field needed to build
//! a tag string are dropped whole; there is no partial-field recommendation.

use crate::error::{CorpusError, Result};
use crate::types::MovieId;
use serde::Deserialize;
use std::collections::HashMap;
use std::fs::File;
use std::io::ErrorKind;
use std::path::Path;
use tracing::debug;

const MOVIES_REQUIRED_COLUMNS: &[&str] = &[
    "genres",
    "keywords",
    "overview",
    "production_companies",
    "release_date",
    "title",
];

const CREDITS_REQUIRED_COLUMNS: &[&str] = &["movie_id", "title", "cast", "crew"];

/// One row of the movies file.
///
/// Every field is optional at this stage: an empty cell is a null, and nulls
/// are resolved in `join_on_title`. Display-only numeric fields that fail to
/// parse become `None` instead of failing the row.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MovieRow {
    #[serde(default, deserialize_with = "csv::invalid_option")]
    pub budget: Option<i64>,
    pub genres: Option<String>,
    pub keywords: Option<String>,
    pub overview: Option<String>,
    pub production_companies: Option<String>,
    pub release_date: Option<String>,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    pub revenue: Option<i64>,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    pub runtime: Option<f64>,
    pub spoken_languages: Option<String>,
    pub status: Option<String>,
    pub title: Option<String>,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    pub vote_average: Option<f64>,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    pub vote_count: Option<u64>,
}

/// One row of the credits file
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreditsRow {
    pub movie_id: Option<MovieId>,
    pub title: Option<String>,
    pub cast: Option<String>,
    pub crew: Option<String>,
}

/// A joined row with every required field present.
///
/// List fields are still in their serialized form; extraction happens in
/// `index.rs`.
#[derive(Debug, Clone, PartialEq)]
pub struct RawMovie {
    pub id: MovieId,
    pub title: String,
    pub overview: String,
    pub genres: String,
    pub keywords: String,
    pub cast: String,
    pub crew: String,
    pub production_companies: String,
    pub release_date: String,
    pub budget: Option<i64>,
    pub revenue: Option<i64>,
    pub runtime: Option<f64>,
    pub spoken_languages: Option<String>,
    pub status: Option<String>,
    pub vote_average: Option<f64>,
    pub vote_count: Option<u64>,
}

/// Open a file, reporting a missing path as `FileNotFound`
fn open_file(path: &Path) -> Result<File> {
    File::open(path).map_err(|e| match e.kind() {
        ErrorKind::NotFound => CorpusError::FileNotFound {
            path: path.display().to_string(),
        },
        _ => CorpusError::IoError(e),
    })
}

/// Read every row of a CSV file into `T`, checking the header first
fn read_rows<T>(path: &Path, required_columns: &[&str]) -> Result<Vec<T>>
where
    T: for<'de> Deserialize<'de>,
{
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(open_file(path)?);

    let headers = reader.headers()?.clone();
    for column in required_columns {
        if !headers.iter().any(|header| header == *column) {
            return Err(CorpusError::MissingColumn {
                file: file_name,
                column: column.to_string(),
            });
        }
    }

    let mut rows = Vec::new();
    for row in reader.deserialize() {
        rows.push(row?);
    }

    debug!("Read {} rows from {}", rows.len(), file_name);
    Ok(rows)
}

/// Parse the movies CSV
pub fn parse_movies(path: &Path) -> Result<Vec<MovieRow>> {
    read_rows(path, MOVIES_REQUIRED_COLUMNS)
}

/// Parse the credits CSV
pub fn parse_credits(path: &Path) -> Result<Vec<CreditsRow>> {
    read_rows(path, CREDITS_REQUIRED_COLUMNS)
}

/// Inner-join movies and credits on title, dropping rows with nulls.
///
/// Output order is movies order, then credits order for titles that appear
/// more than once in the credits file.
pub fn join_on_title(movies: Vec<MovieRow>, credits: Vec<CreditsRow>) -> Vec<RawMovie> {
    let mut credits_by_title: HashMap<String, Vec<CreditsRow>> = HashMap::new();
    for row in credits {
        if let Some(title) = row.title.clone() {
            credits_by_title.entry(title).or_default().push(row);
        }
    }

    let mut joined = Vec::with_capacity(movies.len());
    let mut dropped = 0usize;

    for movie in movies {
        let Some(title) = movie.title.as_deref() else {
            continue;
        };
        let Some(matches) = credits_by_title.get(title) else {
            continue;
        };

        for credits in matches {
            match merge_row(&movie, credits) {
                Some(raw) => joined.push(raw),
                None => dropped += 1,
            }
        }
    }

    debug!(
        "Joined {} rows on title ({} dropped for missing fields)",
        joined.len(),
        dropped
    );
    joined
}

/// Merge a movie row with one of its credits rows, or `None` on any null
fn merge_row(movie: &MovieRow, credits: &CreditsRow) -> Option<RawMovie> {
    Some(RawMovie {
        id: credits.movie_id?,
        title: movie.title.clone()?,
        overview: movie.overview.clone()?,
        genres: movie.genres.clone()?,
        keywords: movie.keywords.clone()?,
        cast: credits.cast.clone()?,
        crew: credits.crew.clone()?,
        production_companies: movie.production_companies.clone()?,
        release_date: movie.release_date.clone()?,
        budget: movie.budget,
        revenue: movie.revenue,
        runtime: movie.runtime,
        spoken_languages: movie.spoken_languages.clone(),
        status: movie.status.clone(),
        vote_average: movie.vote_average,
        vote_count: movie.vote_count,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn movie_row(title: &str) -> MovieRow {
        MovieRow {
            genres: Some("[]".to_string()),
            keywords: Some("[]".to_string()),
            overview: Some("An overview".to_string()),
            production_companies: Some("[]".to_string()),
            release_date: Some("2009-12-10".to_string()),
            title: Some(title.to_string()),
            ..Default::default()
        }
    }

    fn credits_row(id: MovieId, title: &str) -> CreditsRow {
        CreditsRow {
            movie_id: Some(id),
            title: Some(title.to_string()),
            cast: Some("[]".to_string()),
            crew: Some("[]".to_string()),
        }
    }

    #[test]
    fn test_join_keeps_movies_order() {
        let movies = vec![movie_row("B"), movie_row("A"), movie_row("Unmatched")];
        let credits = vec![credits_row(1, "A"), credits_row(2, "B")];

        let joined = join_on_title(movies, credits);
        let titles: Vec<&str> = joined.iter().map(|raw| raw.title.as_str()).collect();
        assert_eq!(titles, vec!["B", "A"]);
        assert_eq!(joined[0].id, 2);
    }

    #[test]
    fn test_join_drops_rows_with_nulls() {
        let mut no_overview = movie_row("A");
        no_overview.overview = None;
        let mut no_crew = credits_row(2, "B");
        no_crew.crew = None;

        let joined = join_on_title(
            vec![no_overview, movie_row("B"), movie_row("C")],
            vec![credits_row(1, "A"), no_crew, credits_row(3, "C")],
        );
        assert_eq!(joined.len(), 1);
        assert_eq!(joined[0].title, "C");
    }

    #[test]
    fn test_join_duplicate_titles_multiply() {
        let joined = join_on_title(
            vec![movie_row("The Host")],
            vec![credits_row(1, "The Host"), credits_row(2, "The Host")],
        );
        let ids: Vec<MovieId> = joined.iter().map(|raw| raw.id).collect();
        assert_eq!(ids, vec![1, 2]);
    }

    #[test]
    fn test_missing_column_is_reported() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "movie_id,title,cast").unwrap();
        writeln!(file, "1,Avatar,[]").unwrap();

        let result = parse_credits(file.path());
        assert!(matches!(
            result,
            Err(CorpusError::MissingColumn { ref column, .. }) if column == "crew"
        ));
    }

    #[test]
    fn test_missing_file_is_reported() {
        let result = parse_movies(Path::new("does/not/exist.csv"));
        assert!(matches!(result, Err(CorpusError::FileNotFound { .. })));
    }

    #[test]
    fn test_invalid_display_numbers_become_none() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "budget,genres,keywords,overview,production_companies,release_date,runtime,title"
        )
        .unwrap();
        writeln!(file, "lots,[],[],Plot,[],2001-01-01,,Film").unwrap();

        let rows = parse_movies(file.path()).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].budget, None);
        assert_eq!(rows[0].runtime, None);
        assert_eq!(rows[0].title.as_deref(), Some("Film"));
    }
}
