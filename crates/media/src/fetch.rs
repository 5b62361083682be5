//! HTTP boundary for media lookups.
//!
//! `HttpFetch` returns every answered request as an `HttpResponse`,
//! whatever its status; only requests that got no answer are errors.

use crate::error::{Result, TransportError};
use std::time::Duration;
use tracing::debug;

#[cfg(test)]
use mockall::automock;

/// Status and body of an answered request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

#[cfg_attr(test, automock)]
pub trait HttpFetch: Send + Sync {
    fn get(&self, url: &str) -> std::result::Result<HttpResponse, TransportError>;
}

/// Blocking reqwest client with a per-request timeout
pub struct ReqwestFetcher {
    client: reqwest::blocking::Client,
}

impl ReqwestFetcher {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()?;
        Ok(Self { client })
    }
}

impl HttpFetch for ReqwestFetcher {
    fn get(&self, url: &str) -> std::result::Result<HttpResponse, TransportError> {
        // URLs carry the API key, so errors are reported without them
        let response = self
            .client
            .get(url)
            .send()
            .map_err(|e| TransportError::Request(e.without_url().to_string()))?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .map_err(|e| TransportError::Request(e.without_url().to_string()))?;

        debug!("Media API answered {} ({} bytes)", status, body.len());
        Ok(HttpResponse { status, body })
    }
}

/// Fetcher used without an API key or with `--offline`
#[derive(Debug, Default, Clone, Copy)]
pub struct OfflineFetcher;

impl HttpFetch for OfflineFetcher {
    fn get(&self, _url: &str) -> std::result::Result<HttpResponse, TransportError> {
        Err(TransportError::Offline)
    }
}
