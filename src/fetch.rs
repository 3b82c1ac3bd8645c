//! Outbound HTTP with politeness pacing.
//!
//! # Architecture
//!
//! - [`Fetch`]: core trait, one GET bounded by a timeout
//! - [`HttpFetcher`]: `reqwest` implementation with fixed browser-like headers
//! - [`Paced`]: decorator spacing consecutive requests apart, with jitter
//!
//! There is exactly one attempt per call. Timeouts, connection errors and
//! non-2xx statuses all come back as [`ScrapeError::EndpointUnreachable`].

use crate::error::ScrapeError;
use rand::{Rng, rng};
use reqwest::header::{ACCEPT, ACCEPT_LANGUAGE, HeaderMap, HeaderValue};
use std::fmt;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::{Instant, sleep};
use tracing::{debug, instrument};

/// Default `User-Agent` header.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

const ACCEPT_VALUE: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8";
const ACCEPT_LANGUAGE_VALUE: &str = "en-US,en;q=0.5";

/// Trait for fetching a document body.
pub trait Fetch {
    /// GET `url`, giving up after `timeout`.
    async fn fetch(&self, url: &str, timeout: Duration) -> Result<Vec<u8>, ScrapeError>;
}

/// [`Fetch`] over a shared `reqwest` client.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    /// Build a client sending `user_agent` plus fixed `Accept` and `Accept-Language` headers.
    pub fn new(user_agent: &str) -> Result<Self, reqwest::Error> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static(ACCEPT_VALUE));
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static(ACCEPT_LANGUAGE_VALUE));
        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .default_headers(headers)
            .build()?;
        Ok(Self { client })
    }
}

fn describe(err: &reqwest::Error) -> String {
    if err.is_timeout() {
        "request timed out".to_string()
    } else if err.is_connect() {
        format!("connection failed: {err}")
    } else {
        err.to_string()
    }
}

impl Fetch for HttpFetcher {
    #[instrument(level = "debug", skip(self))]
    async fn fetch(&self, url: &str, timeout: Duration) -> Result<Vec<u8>, ScrapeError> {
        let t0 = Instant::now();
        let response = self
            .client
            .get(url)
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| ScrapeError::unreachable(url, describe(&e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ScrapeError::unreachable(url, format!("HTTP {status}")));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| ScrapeError::unreachable(url, describe(&e)))?;
        debug!(
            bytes = body.len(),
            elapsed_ms = t0.elapsed().as_millis() as u64,
            "Fetched"
        );
        Ok(body.to_vec())
    }
}

/// Decorator that keeps at least `min_interval` between the starts of
/// consecutive requests, plus a random jitter of up to `max_jitter`.
///
/// The first request goes out immediately.
pub struct Paced<F> {
    inner: F,
    min_interval: Duration,
    max_jitter: Duration,
    last_request: Mutex<Option<Instant>>,
}

impl<F> Paced<F>
where
    F: Fetch,
{
    pub fn new(inner: F, min_interval: Duration, max_jitter: Duration) -> Self {
        Self {
            inner,
            min_interval,
            max_jitter,
            last_request: Mutex::new(None),
        }
    }

    fn jitter(&self) -> Duration {
        let max_ms = self.max_jitter.as_millis() as u64;
        if max_ms == 0 {
            return Duration::ZERO;
        }
        Duration::from_millis(rng().random_range(0..=max_ms))
    }
}

impl<F> fmt::Debug for Paced<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Paced")
            .field("min_interval", &self.min_interval)
            .field("max_jitter", &self.max_jitter)
            .finish()
    }
}

impl<F> Fetch for Paced<F>
where
    F: Fetch,
{
    async fn fetch(&self, url: &str, timeout: Duration) -> Result<Vec<u8>, ScrapeError> {
        {
            let mut last = self.last_request.lock().await;
            if let Some(previous) = *last {
                let elapsed = previous.elapsed();
                if elapsed < self.min_interval {
                    let delay = self.min_interval - elapsed + self.jitter();
                    debug!(?delay, %url, "Pacing before request");
                    sleep(delay).await;
                }
            }
            *last = Some(Instant::now());
        }
        self.inner.fetch(url, timeout).await
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! In-memory [`Fetch`] used by tests across the crate.

    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex as StdMutex;

    /// Serves canned bodies; unknown URLs answer 404. Records every request.
    #[derive(Debug, Default)]
    pub struct StubFetcher {
        responses: HashMap<String, Result<Vec<u8>, u16>>,
        pub requests: StdMutex<Vec<String>>,
    }

    impl StubFetcher {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn ok(mut self, url: &str, body: &str) -> Self {
            self.responses
                .insert(url.to_string(), Ok(body.as_bytes().to_vec()));
            self
        }

        pub fn status(mut self, url: &str, status: u16) -> Self {
            self.responses.insert(url.to_string(), Err(status));
            self
        }

        pub fn requested(&self) -> Vec<String> {
            self.requests.lock().unwrap().clone()
        }
    }

    impl Fetch for StubFetcher {
        async fn fetch(&self, url: &str, _timeout: Duration) -> Result<Vec<u8>, ScrapeError> {
            self.requests.lock().unwrap().push(url.to_string());
            match self.responses.get(url) {
                Some(Ok(body)) => Ok(body.clone()),
                Some(Err(status)) => Err(ScrapeError::unreachable(url, format!("HTTP {status}"))),
                None => Err(ScrapeError::unreachable(url, "HTTP 404 Not Found")),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::StubFetcher;
    use super::*;

    #[tokio::test]
    async fn test_paced_passes_through() {
        let stub = StubFetcher::new().ok("https://a.test/", "body");
        let paced = Paced::new(stub, Duration::ZERO, Duration::ZERO);
        let body = paced
            .fetch("https://a.test/", Duration::from_secs(1))
            .await
            .unwrap();
        assert_eq!(body, b"body");
        let err = paced
            .fetch("https://missing.test/", Duration::from_secs(1))
            .await
            .unwrap_err();
        assert!(matches!(err, ScrapeError::EndpointUnreachable { .. }));
    }

    #[tokio::test]
    async fn test_paced_spaces_requests() {
        let stub = StubFetcher::new();
        let paced = Paced::new(stub, Duration::from_millis(40), Duration::ZERO);
        let t0 = Instant::now();
        let _ = paced.fetch("https://a.test/1", Duration::from_secs(1)).await;
        let first = t0.elapsed();
        let _ = paced.fetch("https://a.test/2", Duration::from_secs(1)).await;
        assert!(first < Duration::from_millis(40));
        assert!(t0.elapsed() >= Duration::from_millis(40));
        assert_eq!(
            paced.inner.requested(),
            vec!["https://a.test/1", "https://a.test/2"]
        );
    }

    #[test]
    fn test_http_fetcher_builds() {
        assert!(HttpFetcher::new(DEFAULT_USER_AGENT).is_ok());
    }
}
