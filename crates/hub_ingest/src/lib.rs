mod client;
mod extract;

use std::collections::HashSet;
use std::time::Duration;

use futures::{StreamExt, stream};
use hub_pool::{PoolStore, Source};
use tracing::warn;

pub use extract::extract_with_scheme;

/// Upper bound on simultaneously in-flight scrape tasks (§4.3 step 2: "≤50 total").
const FAN_OUT_CONCURRENCY: usize = 50;

/// Concurrently fetches registered sources and folds host:port matches into
/// the Pool Store.
pub struct Ingestor {
    client: reqwest::Client,
}

impl Ingestor {
    /// `timeout` bounds each individual scrape request (default 20s, §6);
    /// `proxy_url` optionally routes every scrape request through a local
    /// upstream proxy (§4.3 input flag).
    pub fn new(timeout: Duration, proxy_url: Option<&str>) -> reqwest::Result<Self> {
        Ok(Self {
            client: client::build_client(timeout, proxy_url)?,
        })
    }

    /// Resolves `ids` to Source records, fans a GET out to each, extracts
    /// `host:port` candidates, dedups, and folds the union through
    /// `PoolStore::add_upstreams`. Returns the total number of genuinely new
    /// upstreams. A single source's failure is logged and contributes zero
    /// entries; the batch always completes.
    pub async fn fetch_sources(&self, store: &PoolStore, ids: &[u64]) -> usize {
        let sources = store.sources_by_ids(ids);
        let client = &self.client;

        let results: Vec<Vec<String>> = stream::iter(sources)
            .map(|source| async move { fetch_one(client, &source).await })
            .buffer_unordered(FAN_OUT_CONCURRENCY)
            .collect()
            .await;

        let mut dedup = HashSet::new();
        for batch in results {
            dedup.extend(batch);
        }
        store.add_upstreams(dedup)
    }
}

async fn fetch_one(client: &reqwest::Client, source: &Source) -> Vec<String> {
    let resp = match client.get(&source.url).send().await {
        Ok(resp) => resp,
        Err(err) => {
            warn!(target: "hub_ingest", source_id = source.id, url = %source.url, error = %err, "scrape request failed");
            return Vec::new();
        }
    };

    if resp.status() != reqwest::StatusCode::OK {
        warn!(target: "hub_ingest", source_id = source.id, url = %source.url, status = %resp.status(), "scrape source returned non-200");
        return Vec::new();
    }

    match resp.text().await {
        Ok(body) => extract::extract_upstreams(&body, &source.url),
        Err(err) => {
            warn!(target: "hub_ingest", source_id = source.id, url = %source.url, error = %err, "failed to read scrape response body");
            Vec::new()
        }
    }
}
