use std::time::{Duration, Instant};

use futures::{StreamExt, stream};
use hub_pool::{PoolStore, Region, UNREACHABLE_LATENCY_MS, Upstream, UpstreamUpdate};
use tracing::{debug, warn};

/// Concurrency is unbounded by design (§4.4: "if the implementation requires
/// a cap, it MUST NOT be lower than 100").
const PROBE_CONCURRENCY: usize = 256;

pub struct HealthChecker {
    domestic_probe_url: String,
    foreign_probe_url: String,
    domestic_timeout: Duration,
    foreign_timeout: Duration,
}

impl HealthChecker {
    pub fn new(
        domestic_probe_url: impl Into<String>,
        foreign_probe_url: impl Into<String>,
        domestic_timeout: Duration,
        foreign_timeout: Duration,
    ) -> Self {
        Self {
            domestic_probe_url: domestic_probe_url.into(),
            foreign_probe_url: foreign_probe_url.into(),
            domestic_timeout,
            foreign_timeout,
        }
    }

    /// Probes every upstream in the inventory concurrently and writes the
    /// outcome back to the store. Emits one persistence-relevant `tracing`
    /// event once the whole batch settles (§4.4: "emit one persistence
    /// signal").
    pub async fn detect_all(&self, store: &PoolStore) {
        let upstreams = store.all_upstreams();
        let total = upstreams.len();

        stream::iter(upstreams)
            .map(|upstream| self.probe(upstream))
            .buffer_unordered(PROBE_CONCURRENCY)
            .for_each(|(url, update)| {
                store.update_upstream(&url, update);
                futures::future::ready(())
            })
            .await;

        debug!(target: "hub_health", total, "detect_all settled; pool snapshot dirty");
    }

    async fn probe(&self, upstream: Upstream) -> (String, UpstreamUpdate) {
        let url = upstream.url.clone();
        let client = match build_proxied_client(&url, self.domestic_timeout) {
            Ok(c) => c,
            Err(err) => {
                warn!(target: "hub_health", %url, error = %err, "failed to build probe client");
                return (url, dead_update());
            }
        };

        let started = Instant::now();
        let domestic_ok = match client.get(&self.domestic_probe_url).send().await {
            Ok(resp) if resp.status().is_success() => true,
            Ok(resp) => {
                warn!(target: "hub_health", %url, status = %resp.status(), "domestic probe non-200");
                false
            }
            Err(err) => {
                warn!(target: "hub_health", %url, error = %err, "domestic probe failed");
                false
            }
        };

        if !domestic_ok {
            return (url, dead_update());
        }

        let latency_ms = started.elapsed().as_millis().min(u128::from(u32::MAX)) as u32;
        let mut region = Region::Domestic;

        let foreign_client = match build_proxied_client(&url, self.foreign_timeout) {
            Ok(c) => c,
            Err(_) => {
                return (
                    url,
                    UpstreamUpdate {
                        alive: Some(true),
                        latency_ms: Some(latency_ms),
                        region: Some(region),
                    },
                );
            }
        };

        if let Ok(resp) = foreign_client.get(&self.foreign_probe_url).send().await {
            if resp.status().is_success() {
                region = Region::Foreign;
            }
        }

        (
            url,
            UpstreamUpdate {
                alive: Some(true),
                latency_ms: Some(latency_ms),
                region: Some(region),
            },
        )
    }
}

fn dead_update() -> UpstreamUpdate {
    UpstreamUpdate {
        alive: Some(false),
        latency_ms: Some(UNREACHABLE_LATENCY_MS),
        region: Some(Region::Unknown),
    }
}

/// An HTTP client that routes both http and https requests through upstream
/// `url` (§4.4 step 1).
fn build_proxied_client(url: &str, timeout: Duration) -> reqwest::Result<reqwest::Client> {
    reqwest::Client::builder()
        .proxy(reqwest::Proxy::all(url)?)
        .timeout(timeout)
        .build()
}
