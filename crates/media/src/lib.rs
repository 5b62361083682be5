//! # Media Crate
//!
//! Poster and person artwork from the TMDB API, for decorating
//! recommendations and detail views.
//!
//! - **config**: API settings from the environment (`TMDB_*`)
//! - **fetch**: `HttpFetch` boundary with a blocking reqwest client and an
//!   offline stand-in
//! - **retry**: bounded fixed-delay `RetryPolicy` with an injectable `Sleeper`
//! - **cache**: process-lifetime poster/person cache
//! - **lookup**: `MediaLookup`, which never fails and falls back to a
//!   placeholder image
//!
//! ```ignore
//! use media::{MediaConfig, MediaLookup};
//!
//! let config = MediaConfig::from_env()?;
//! let lookup = MediaLookup::from_config(&config, false)?;
//! let poster = lookup.fetch_poster(19995);
//! ```

pub mod cache;
pub mod config;
pub mod error;
pub mod fetch;
pub mod lookup;
pub mod retry;

pub use cache::{ArtworkCache, PersonProfile};
pub use config::MediaConfig;
pub use error::{MediaError, Result, TransportError};
pub use fetch::{HttpFetch, HttpResponse, OfflineFetcher, ReqwestFetcher};
pub use lookup::MediaLookup;
pub use retry::{RetryPolicy, Sleeper, ThreadSleeper};
