//! Liveness/latency prober
//!
//! Each probe issues one GET with its own timeout and its own HTTP client, so
//! no connection or pooled state is shared between the hundreds of probes a
//! channel can fan out. The cost of a candidate is the elapsed wall-clock time
//! in milliseconds when the server answers exactly `200 OK`, and
//! `f64::INFINITY` for anything else. Probes never fail upward.

use futures::future::join_all;
use reqwest::{Client, StatusCode, Url};
use std::time::{Duration, Instant};

use crate::error::SiftErrorTrait;
use crate::utils::error::FetchError;

/// Cost of an unreachable candidate
pub const UNREACHABLE: f64 = f64::INFINITY;

/// Probe one URL
///
/// Returns the latency in whole milliseconds (rounded) if the response status
/// is exactly 200, otherwise [`UNREACHABLE`].
pub async fn probe(url: &str, timeout: Duration) -> f64 {
    match try_probe(url, timeout).await {
        Ok(elapsed) => elapsed,
        Err(e) => {
            tracing::debug!(
                url = %url,
                category = e.category().as_str(),
                error = %e,
                "Probe failed"
            );
            UNREACHABLE
        }
    }
}

/// Probe one URL, keeping the failure reason
///
/// # Errors
///
/// - `FetchError::InvalidUrl` if the URL does not parse
/// - `FetchError::Timeout` if no response arrives within `timeout`
/// - `FetchError::Status` for any status other than 200
/// - `FetchError::Http` for transport errors
pub async fn try_probe(url: &str, timeout: Duration) -> Result<f64, FetchError> {
    let target = Url::parse(url).map_err(|e| FetchError::InvalidUrl(format!("{url}: {e}")))?;

    // A fresh client per probe; idle connections are never kept for reuse.
    let client = Client::builder()
        .timeout(timeout)
        .pool_max_idle_per_host(0)
        .build()?;

    let start = Instant::now();
    let response = client
        .get(target)
        .send()
        .await
        .map_err(FetchError::from_reqwest)?;
    let elapsed = start.elapsed();

    let status = response.status();
    drop(response);

    if status != StatusCode::OK {
        return Err(FetchError::Status(status.as_u16()));
    }

    Ok((elapsed.as_secs_f64() * 1000.0).round())
}

/// Concurrent prober for a batch of candidate URLs
#[derive(Debug, Clone)]
pub struct Prober {
    /// Timeout applied to every probe of a batch
    timeout: Duration,
}

impl Prober {
    #[must_use]
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Probe a single URL with this prober's timeout
    pub async fn probe(&self, url: &str) -> f64 {
        probe(url, self.timeout).await
    }

    /// Probe every URL of a batch concurrently
    ///
    /// Waits until every probe has completed or timed out; the returned costs
    /// are in input order.
    pub async fn probe_all<S: AsRef<str>>(&self, urls: &[S]) -> Vec<f64> {
        let probes = urls
            .iter()
            .map(|url| probe(url.as_ref(), self.timeout));

        join_all(probes).await
    }
}

impl Default for Prober {
    fn default() -> Self {
        Self::new(Duration::from_secs(5))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_invalid_url_is_unreachable() {
        let cost = probe("not a url", Duration::from_millis(100)).await;
        assert!(cost.is_infinite());
    }

    #[tokio::test]
    async fn test_invalid_url_error_kind() {
        let err = try_probe("::", Duration::from_millis(100)).await.unwrap_err();
        assert!(matches!(err, FetchError::InvalidUrl(_)));
    }

    #[tokio::test]
    async fn test_connection_refused_is_unreachable() {
        // port 9 (discard) on loopback is closed in test environments
        let cost = probe("http://127.0.0.1:9/", Duration::from_millis(500)).await;
        assert_eq!(cost, UNREACHABLE);
    }

    #[tokio::test]
    async fn test_probe_all_empty_batch() {
        let prober = Prober::default();
        let urls: Vec<String> = Vec::new();
        assert!(prober.probe_all(&urls).await.is_empty());
    }

    #[test]
    fn test_prober_timeout() {
        let prober = Prober::new(Duration::from_millis(250));
        assert_eq!(prober.timeout(), Duration::from_millis(250));
        assert_eq!(Prober::default().timeout(), Duration::from_secs(5));
    }
}
