//! Poster and person lookups against the TMDB API.
//!
//! Lookups never fail: any transport problem, bad status, malformed body or
//! missing image path resolves to the configured fallback image. Every
//! resolved value, fallback included, is cached for the life of the
//! `MediaLookup`, and each id is resolved at most once.

use crate::cache::{ArtworkCache, PersonProfile};
use crate::config::MediaConfig;
use crate::error::{Result, TransportError};
use crate::fetch::{HttpFetch, HttpResponse, OfflineFetcher, ReqwestFetcher};
use crate::retry::{RetryPolicy, Sleeper, ThreadSleeper};
use corpus::{MovieId, PersonId};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

const POSTER_SIZE: &str = "w780";
const PROFILE_SIZE: &str = "w220_and_h330_face";

#[derive(Deserialize)]
struct MovieResponse {
    poster_path: Option<String>,
}

#[derive(Deserialize)]
struct PersonResponse {
    profile_path: Option<String>,
    biography: Option<String>,
}

pub struct MediaLookup {
    fetcher: Arc<dyn HttpFetch>,
    sleeper: Arc<dyn Sleeper>,
    policy: RetryPolicy,
    cache: ArtworkCache,
    api_url: String,
    image_url: String,
    fallback_url: String,
    api_key: String,
}

impl MediaLookup {
    /// Lookup over `fetcher` using the URLs and retry policy in `config`
    pub fn new(config: &MediaConfig, fetcher: Arc<dyn HttpFetch>) -> Self {
        Self {
            fetcher,
            sleeper: Arc::new(ThreadSleeper),
            policy: config.retry_policy(),
            cache: ArtworkCache::new(),
            api_url: config.tmdb_api_url.trim_end_matches('/').to_string(),
            image_url: config.tmdb_image_url.trim_end_matches('/').to_string(),
            fallback_url: config.fallback_image_url.clone(),
            api_key: config.api_key().unwrap_or_default().to_string(),
        }
    }

    /// Lookup that talks to the network only when an API key is configured
    /// and `offline` is false
    pub fn from_config(config: &MediaConfig, offline: bool) -> Result<Self> {
        let fetcher: Arc<dyn HttpFetch> = match (offline, config.api_key()) {
            (false, Some(_)) => Arc::new(ReqwestFetcher::new(config.timeout())?),
            (true, _) => {
                info!("Media lookups disabled; using fallback images");
                Arc::new(OfflineFetcher)
            }
            (false, None) => {
                warn!("TMDB_API_KEY is not set; using fallback images");
                Arc::new(OfflineFetcher)
            }
        };
        Ok(Self::new(config, fetcher))
    }

    /// Lookup that never touches the network
    pub fn offline(config: &MediaConfig) -> Self {
        Self::new(config, Arc::new(OfflineFetcher))
    }

    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    pub fn fallback_url(&self) -> &str {
        &self.fallback_url
    }

    pub fn cache(&self) -> &ArtworkCache {
        &self.cache
    }

    /// Poster URL for `movie_id`, or the fallback image.
    ///
    /// Transport errors and non-2xx answers are retried up to the policy's
    /// attempt limit. A decoded response without `poster_path` resolves to
    /// the fallback right away. Concurrent callers for one id share a
    /// single request.
    #[instrument(skip(self))]
    pub fn fetch_poster(&self, movie_id: MovieId) -> String {
        self.cache.poster_or_resolve(movie_id, || self.request_poster(movie_id))
    }

    /// Profile image and biography for `person_id`.
    ///
    /// A single attempt; any failure gives the fallback image and an empty
    /// biography.
    #[instrument(skip(self))]
    pub fn fetch_person(&self, person_id: PersonId) -> PersonProfile {
        self.cache.person_or_resolve(person_id, || self.request_person(person_id))
    }

    fn request_poster(&self, movie_id: MovieId) -> String {
        let url = format!("{}/movie/{}?api_key={}", self.api_url, movie_id, self.api_key);
        let result = self.policy.run(
            self.sleeper.as_ref(),
            |attempt| {
                debug!("Poster request for movie {} (attempt {})", movie_id, attempt);
                self.get_json::<MovieResponse>(&url)
            },
            TransportError::is_retryable,
        );

        match result {
            Ok(MovieResponse {
                poster_path: Some(path),
            }) if !path.trim().is_empty() => self.poster_url(&path),
            Ok(_) => {
                debug!("Movie {} has no poster", movie_id);
                self.fallback_url.clone()
            }
            Err(TransportError::Offline) => self.fallback_url.clone(),
            Err(e) => {
                warn!("Poster lookup for movie {} failed: {}", movie_id, e);
                self.fallback_url.clone()
            }
        }
    }

    fn request_person(&self, person_id: PersonId) -> PersonProfile {
        let url = format!("{}/person/{}?api_key={}", self.api_url, person_id, self.api_key);
        match self.get_json::<PersonResponse>(&url) {
            Ok(PersonResponse {
                profile_path: Some(path),
                biography,
            }) if !path.trim().is_empty() => PersonProfile {
                profile_url: format!("{}/{}{}", self.image_url, PROFILE_SIZE, path),
                biography: biography.unwrap_or_default(),
            },
            Ok(_) => self.fallback_person(),
            Err(TransportError::Offline) => self.fallback_person(),
            Err(e) => {
                warn!("Person lookup for {} failed: {}", person_id, e);
                self.fallback_person()
            }
        }
    }

    fn poster_url(&self, poster_path: &str) -> String {
        format!(
            "{}/{}/{}",
            self.image_url,
            POSTER_SIZE,
            poster_path.trim_start_matches('/')
        )
    }

    fn fallback_person(&self) -> PersonProfile {
        PersonProfile {
            profile_url: self.fallback_url.clone(),
            biography: String::new(),
        }
    }

    fn get_json<T: DeserializeOwned>(&self, url: &str) -> std::result::Result<T, TransportError> {
        let HttpResponse { status, body } = self.fetcher.get(url)?;
        if !(200..300).contains(&status) {
            return Err(TransportError::Status(status));
        }
        serde_json::from_str(&body).map_err(|e| TransportError::Decode(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::MockHttpFetch;
    use std::sync::Mutex;
    use std::time::Duration;

    const FALLBACK: &str = "https://example.com/fallback.png";

    #[derive(Default)]
    struct CountingSleeper {
        calls: Mutex<Vec<Duration>>,
    }

    impl Sleeper for CountingSleeper {
        fn sleep(&self, duration: Duration) {
            self.calls.lock().unwrap().push(duration);
        }
    }

    fn config() -> MediaConfig {
        MediaConfig {
            tmdb_api_key: Some("key".to_string()),
            tmdb_api_url: "https://api.test/3".to_string(),
            tmdb_image_url: "https://img.test/t/p".to_string(),
            fallback_image_url: FALLBACK.to_string(),
            ..MediaConfig::default()
        }
    }

    fn ok(body: &str) -> std::result::Result<HttpResponse, TransportError> {
        Ok(HttpResponse {
            status: 200,
            body: body.to_string(),
        })
    }

    fn lookup(mock: MockHttpFetch) -> (MediaLookup, Arc<CountingSleeper>) {
        let sleeper = Arc::new(CountingSleeper::default());
        let lookup = MediaLookup::new(&config(), Arc::new(mock)).with_sleeper(sleeper.clone());
        (lookup, sleeper)
    }

    #[test]
    fn test_poster_success_is_cached() {
        let mut mock = MockHttpFetch::new();
        mock.expect_get()
            .withf(|url| url == "https://api.test/3/movie/19995?api_key=key")
            .times(1)
            .returning(|_| ok(r#"{"poster_path": "/abc.jpg", "title": "Avatar"}"#));
        let (lookup, _) = lookup(mock);

        let first = lookup.fetch_poster(19995);
        let second = lookup.fetch_poster(19995);

        assert_eq!(first, "https://img.test/t/p/w780/abc.jpg");
        assert_eq!(first, second);
    }

    #[test]
    fn test_missing_poster_path_falls_back_without_retry() {
        let mut mock = MockHttpFetch::new();
        mock.expect_get()
            .times(1)
            .returning(|_| ok(r#"{"poster_path": null}"#));
        let (lookup, sleeper) = lookup(mock);

        assert_eq!(lookup.fetch_poster(5), FALLBACK);
        assert!(sleeper.calls.lock().unwrap().is_empty());
    }

    #[test]
    fn test_transport_failures_exhaust_retries() {
        let mut mock = MockHttpFetch::new();
        mock.expect_get()
            .times(3)
            .returning(|_| Err(TransportError::Request("timed out".to_string())));
        let (lookup, sleeper) = lookup(mock);

        assert_eq!(lookup.fetch_poster(7), FALLBACK);
        assert_eq!(sleeper.calls.lock().unwrap().len(), 2);

        // fallback is cached too; no further requests
        assert_eq!(lookup.fetch_poster(7), FALLBACK);
    }

    #[test]
    fn test_server_error_then_success() {
        let mut mock = MockHttpFetch::new();
        let mut seq = mockall::Sequence::new();
        mock.expect_get()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| {
                Ok(HttpResponse {
                    status: 503,
                    body: String::new(),
                })
            });
        mock.expect_get()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| ok(r#"{"poster_path": "/late.jpg"}"#));
        let (lookup, sleeper) = lookup(mock);

        assert_eq!(lookup.fetch_poster(8), "https://img.test/t/p/w780/late.jpg");
        assert_eq!(*sleeper.calls.lock().unwrap(), vec![Duration::from_secs(1)]);
    }

    #[test]
    fn test_malformed_body_not_retried() {
        let mut mock = MockHttpFetch::new();
        mock.expect_get().times(1).returning(|_| ok("<html>oops</html>"));
        let (lookup, sleeper) = lookup(mock);

        assert_eq!(lookup.fetch_poster(9), FALLBACK);
        assert!(sleeper.calls.lock().unwrap().is_empty());
    }

    #[test]
    fn test_person_success() {
        let mut mock = MockHttpFetch::new();
        mock.expect_get()
            .withf(|url| url == "https://api.test/3/person/65731?api_key=key")
            .times(1)
            .returning(|_| ok(r#"{"profile_path": "/sam.jpg", "biography": "Actor."}"#));
        let (lookup, _) = lookup(mock);

        let profile = lookup.fetch_person(65731);
        assert_eq!(profile.profile_url, "https://img.test/t/p/w220_and_h330_face/sam.jpg");
        assert_eq!(profile.biography, "Actor.");
        assert_eq!(lookup.fetch_person(65731), profile);
    }

    #[test]
    fn test_person_failures_fall_back() {
        let mut mock = MockHttpFetch::new();
        mock.expect_get()
            .withf(|url| url.contains("/person/1?"))
            .times(1)
            .returning(|_| ok(r#"{"biography": "No photo."}"#));
        mock.expect_get()
            .withf(|url| url.contains("/person/2?"))
            .times(1)
            .returning(|_| {
                Ok(HttpResponse {
                    status: 404,
                    body: String::new(),
                })
            });
        let (lookup, sleeper) = lookup(mock);

        for id in [1, 2] {
            let profile = lookup.fetch_person(id);
            assert_eq!(profile.profile_url, FALLBACK);
            assert_eq!(profile.biography, "");
        }
        assert!(sleeper.calls.lock().unwrap().is_empty());
    }

    #[test]
    fn test_offline_lookup() {
        let lookup = MediaLookup::offline(&config());
        assert_eq!(lookup.fetch_poster(1), FALLBACK);
        assert_eq!(lookup.fetch_person(1).profile_url, FALLBACK);
        assert_eq!(lookup.cache().poster_count(), 1);
    }

    #[test]
    fn test_from_config_without_key_is_offline() {
        let config = MediaConfig {
            tmdb_api_key: None,
            ..config()
        };
        let lookup = MediaLookup::from_config(&config, false).unwrap();
        assert_eq!(lookup.fetch_poster(3), FALLBACK);
    }
}
