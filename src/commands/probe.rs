use anyhow::Result;
use std::time::Duration;

use streamsift::crawler::prober::try_probe;
use streamsift::error::SiftErrorTrait;

/// Probe a single URL and print its cost
pub async fn probe_url(url: &str, timeout_ms: u64) -> Result<()> {
    match try_probe(url, Duration::from_millis(timeout_ms)).await {
        Ok(cost) => println!("{url}: {cost}ms"),
        Err(e) => {
            tracing::debug!(url = %url, category = e.category().as_str(), "Probe failed");
            println!("{url}: unreachable ({e})");
        }
    }

    Ok(())
}
