//! Integration tests for media lookups through the public API, with a
//! scripted fetcher standing in for the TMDB service.

use media::{
    HttpFetch, HttpResponse, MediaConfig, MediaLookup, RetryPolicy, Sleeper, TransportError,
};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier, Mutex};
use std::thread;
use std::time::Duration;

type Reply = Result<HttpResponse, TransportError>;

/// Replays queued replies in order, then answers 500
#[derive(Default)]
struct ScriptedFetcher {
    replies: Mutex<VecDeque<Reply>>,
    urls: Mutex<Vec<String>>,
    latency: Duration,
}

impl ScriptedFetcher {
    fn with(replies: Vec<Reply>) -> Arc<Self> {
        Self::slow(replies, Duration::ZERO)
    }

    /// Each request takes `latency` before answering
    fn slow(replies: Vec<Reply>, latency: Duration) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(replies.into()),
            urls: Mutex::new(Vec::new()),
            latency,
        })
    }

    fn calls(&self) -> usize {
        self.urls.lock().unwrap().len()
    }
}

impl HttpFetch for ScriptedFetcher {
    fn get(&self, url: &str) -> Reply {
        self.urls.lock().unwrap().push(url.to_string());
        thread::sleep(self.latency);
        self.replies.lock().unwrap().pop_front().unwrap_or(Ok(HttpResponse {
            status: 500,
            body: String::new(),
        }))
    }
}

#[derive(Default)]
struct CountingSleeper {
    sleeps: AtomicUsize,
}

impl Sleeper for CountingSleeper {
    fn sleep(&self, _duration: Duration) {
        self.sleeps.fetch_add(1, Ordering::SeqCst);
    }
}

fn config() -> MediaConfig {
    MediaConfig::from_pairs(vec![
        ("TMDB_API_KEY".to_string(), "k".to_string()),
        ("TMDB_IMAGE_URL".to_string(), "https://img.test/t/p/".to_string()),
        ("FALLBACK_IMAGE_URL".to_string(), "fallback.png".to_string()),
        ("TMDB_MAX_ATTEMPTS".to_string(), "4".to_string()),
    ])
    .unwrap()
}

fn poster(path: &str) -> Reply {
    Ok(HttpResponse {
        status: 200,
        body: format!(r#"{{"poster_path": "{}"}}"#, path),
    })
}

#[test]
fn test_configured_attempt_limit() {
    let fetcher = ScriptedFetcher::with(Vec::new());
    let sleeper = Arc::new(CountingSleeper::default());
    let lookup = MediaLookup::new(&config(), fetcher.clone()).with_sleeper(sleeper.clone());

    assert_eq!(config().retry_policy().max_attempts, 4);
    assert_eq!(lookup.fetch_poster(1), "fallback.png");
    assert_eq!(fetcher.calls(), 4);
    assert_eq!(sleeper.sleeps.load(Ordering::SeqCst), 3);
}

#[test]
fn test_poster_url_shape() {
    let fetcher = ScriptedFetcher::with(vec![poster("/kyeqWdyUXW608qlYkRqosgbbJyK.jpg")]);
    let lookup = MediaLookup::new(&config(), fetcher.clone())
        .with_sleeper(Arc::new(CountingSleeper::default()));

    assert_eq!(
        lookup.fetch_poster(19995),
        "https://img.test/t/p/w780/kyeqWdyUXW608qlYkRqosgbbJyK.jpg"
    );
    assert!(fetcher.urls.lock().unwrap()[0].ends_with("/movie/19995?api_key=k"));
}

#[test]
fn test_each_movie_fetched_once() {
    let fetcher = ScriptedFetcher::with(vec![poster("/a.jpg"), poster("/b.jpg")]);
    let lookup = MediaLookup::new(&config(), fetcher.clone())
        .with_sleeper(Arc::new(CountingSleeper::default()));

    for _ in 0..3 {
        lookup.fetch_poster(1);
        lookup.fetch_poster(2);
    }
    assert_eq!(fetcher.calls(), 2);
    assert_eq!(lookup.cache().poster_count(), 2);
}

#[test]
fn test_concurrent_callers_share_one_request() {
    let replies = (0..8).map(|i| poster(&format!("/{}.jpg", i))).collect();
    let fetcher = ScriptedFetcher::slow(replies, Duration::from_millis(150));
    let lookup = Arc::new(
        MediaLookup::new(&config(), fetcher.clone())
            .with_sleeper(Arc::new(CountingSleeper::default())),
    );
    let barrier = Arc::new(Barrier::new(8));

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let lookup = Arc::clone(&lookup);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                lookup.fetch_poster(42)
            })
        })
        .collect();
    let results: Vec<String> = handles.into_iter().map(|h| h.join().unwrap()).collect();

    assert_eq!(fetcher.calls(), 1);
    assert!(results.iter().all(|url| url == "https://img.test/t/p/w780/0.jpg"));
    assert_eq!(lookup.fetch_poster(42), results[0]);
    assert_eq!(fetcher.calls(), 1);
}

#[test]
fn test_concurrent_person_lookups_share_one_request() {
    let profile = Ok(HttpResponse {
        status: 200,
        body: r#"{"profile_path": "/p.jpg", "biography": "Bio"}"#.to_string(),
    });
    let fetcher = ScriptedFetcher::slow(vec![profile], Duration::from_millis(150));
    let lookup = Arc::new(MediaLookup::new(&config(), fetcher.clone()));
    let barrier = Arc::new(Barrier::new(4));

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let lookup = Arc::clone(&lookup);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                lookup.fetch_person(31)
            })
        })
        .collect();

    for handle in handles {
        let person = handle.join().unwrap();
        assert_eq!(person.profile_url, "https://img.test/t/p/w220_and_h330_face/p.jpg");
        assert_eq!(person.biography, "Bio");
    }
    assert_eq!(fetcher.calls(), 1);
}

#[test]
fn test_retry_policy_default_matches_config_default() {
    assert_eq!(RetryPolicy::default(), MediaConfig::default().retry_policy());
}
