use crate::error::Result;
use crate::retry::RetryPolicy;
use serde::Deserialize;
use std::time::Duration;

/// Media API settings loaded from environment variables
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct MediaConfig {
    /// TMDB API key; lookups run offline without one
    #[serde(default)]
    pub tmdb_api_key: Option<String>,

    #[serde(default = "default_api_url")]
    pub tmdb_api_url: String,

    #[serde(default = "default_image_url")]
    pub tmdb_image_url: String,

    /// Image shown whenever artwork cannot be resolved
    #[serde(default = "default_fallback_image_url")]
    pub fallback_image_url: String,

    /// Per-request timeout
    #[serde(default = "default_timeout_secs")]
    pub tmdb_timeout_secs: u64,

    /// Fixed delay between poster attempts
    #[serde(default = "default_retry_delay_ms")]
    pub tmdb_retry_delay_ms: u64,

    #[serde(default = "default_max_attempts")]
    pub tmdb_max_attempts: u32,
}

fn default_api_url() -> String {
    "https://api.themoviedb.org/3".to_string()
}

fn default_image_url() -> String {
    "https://image.tmdb.org/t/p".to_string()
}

fn default_fallback_image_url() -> String {
    "https://media.istockphoto.com/vectors/error-icon-vector-illustration-vector-id922024224?k=6&m=922024224&s=612x612&w=0&h=LXl8Ul7bria6auAXKIjlvb6hRHkAodTqyqBeA6K7R54=".to_string()
}

fn default_timeout_secs() -> u64 {
    5
}

fn default_retry_delay_ms() -> u64 {
    1000
}

fn default_max_attempts() -> u32 {
    3
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            tmdb_api_key: None,
            tmdb_api_url: default_api_url(),
            tmdb_image_url: default_image_url(),
            fallback_image_url: default_fallback_image_url(),
            tmdb_timeout_secs: default_timeout_secs(),
            tmdb_retry_delay_ms: default_retry_delay_ms(),
            tmdb_max_attempts: default_max_attempts(),
        }
    }
}

impl MediaConfig {
    /// Load configuration from environment variables (and `.env` if present)
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Ok(envy::from_env::<MediaConfig>()?)
    }

    /// Load configuration from explicit key/value pairs
    pub fn from_pairs<I>(pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        Ok(envy::from_iter::<_, MediaConfig>(pairs)?)
    }

    /// The API key, if one is set and non-blank
    pub fn api_key(&self) -> Option<&str> {
        self.tmdb_api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.tmdb_timeout_secs)
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.tmdb_max_attempts,
            delay: Duration::from_millis(self.tmdb_retry_delay_ms),
        }
    }
}
