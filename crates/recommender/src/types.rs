//! Query results returned by the recommender.

use corpus::{MovieId, PersonId};
use serde::Serialize;

/// Number of recommendations returned when the caller does not ask for more
pub const DEFAULT_RECOMMENDATIONS: usize = 25;

/// One recommended movie
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Recommendation {
    pub movie_id: MovieId,
    pub title: String,
    pub poster_url: String,
    /// Similarity to the queried movie, in [0, 1]
    pub score: f32,
}

/// Everything shown on a movie's detail view
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MovieDetails {
    pub id: MovieId,
    pub title: String,
    pub poster_url: String,
    pub overview: String,
    pub genres: Vec<String>,
    pub release_date: String,
    pub runtime: Option<f64>,
    pub budget: Option<i64>,
    pub revenue: Option<i64>,
    pub spoken_languages: Vec<String>,
    pub status: Option<String>,
    pub vote_average: Option<f64>,
    pub vote_count: Option<u64>,
    pub director: Option<String>,
    /// Cast names in billing order
    pub cast: Vec<String>,
    /// Person ids, parallel to `cast`
    pub cast_ids: Vec<PersonId>,
}
