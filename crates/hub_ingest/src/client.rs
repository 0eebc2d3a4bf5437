use std::time::Duration;

use reqwest::Client;

/// Bounded-concurrency scrape client (§4.3 step 2): ≤20 idle keep-alive
/// connections per host, TLS verification disabled because these endpoints
/// are commonly self-signed, optionally routed through a local upstream
/// proxy while fetching.
pub fn build_client(timeout: Duration, proxy_url: Option<&str>) -> reqwest::Result<Client> {
    let mut builder = Client::builder()
        .timeout(timeout)
        .pool_max_idle_per_host(20)
        .danger_accept_invalid_certs(true);

    if let Some(proxy_url) = proxy_url {
        builder = builder.proxy(reqwest::Proxy::all(proxy_url)?);
    }

    builder.build()
}
