mod error;

use std::path::Path;
use std::time::Duration;

pub use error::AdminError;

use hub_dispatch::Dispatcher;
use hub_health::HealthChecker;
use hub_ingest::{Ingestor, extract_with_scheme};
use hub_pool::{Mode, PoolStats, PoolStore, PresetProvider, Source, Upstream, load_preset};

/// In-process facade implementing every row of the out-of-scope admin HTTP
/// surface's operation table (§4.7, §6). Performs no network I/O of its own;
/// a future control-plane binary is a thin transport wrapper around this.
pub struct AdminApi<'a> {
    store: &'a PoolStore,
    dispatcher: &'a Dispatcher,
    health_checker: &'a HealthChecker,
    preset_provider: &'a dyn PresetProvider,
    scrape_timeout: Duration,
    scrape_proxy_url: Option<String>,
}

impl<'a> AdminApi<'a> {
    pub fn new(
        store: &'a PoolStore,
        dispatcher: &'a Dispatcher,
        health_checker: &'a HealthChecker,
        preset_provider: &'a dyn PresetProvider,
        scrape_timeout: Duration,
        scrape_proxy_url: Option<String>,
    ) -> Self {
        Self {
            store,
            dispatcher,
            health_checker,
            preset_provider,
            scrape_timeout,
            scrape_proxy_url,
        }
    }

    /// "get stats" — {total, alive, domestic, foreign, blacklist} counts.
    pub fn get_stats(&self) -> PoolStats {
        self.store.stats()
    }

    /// "load preset sources" — bulk `add_source` from a configured preset.
    pub fn load_preset_sources(&self, preset: &str) -> usize {
        load_preset(self.store, self.preset_provider, preset)
    }

    /// "fetch selected sources {ids, use_proxy}" — runs the Ingestor over the
    /// given source ids, returning the number of newly added upstreams.
    pub async fn fetch_selected_sources(&self, ids: &[u64], use_proxy: bool) -> Result<usize, AdminError> {
        let proxy_url = if use_proxy { self.scrape_proxy_url.as_deref() } else { None };
        let ingestor = Ingestor::new(self.scrape_timeout, proxy_url)?;
        Ok(ingestor.fetch_sources(self.store, ids).await)
    }

    /// "add source".
    pub fn add_source(&self, url: impl Into<String>, tag: impl Into<String>) -> bool {
        self.store.add_source(url, tag)
    }

    /// "remove source".
    pub fn remove_source(&self, id: u64) -> Result<(), AdminError> {
        if self.store.remove_source(id) {
            Ok(())
        } else {
            Err(AdminError::UnknownSourceId(id))
        }
    }

    /// "clear sources".
    pub fn clear_sources(&self) {
        self.store.clear_sources();
    }

    /// "list sources".
    pub fn list_sources(&self) -> Vec<Source> {
        self.store.list_sources()
    }

    /// "list upstreams" — sorted (alive desc, blacklisted last), capped at 100.
    pub fn list_upstreams(&self) -> Vec<Upstream> {
        self.store.list_upstreams()
    }

    /// "detect all" — runs the Health Checker over the entire inventory.
    pub async fn detect_all(&self) {
        self.health_checker.detect_all(self.store).await;
    }

    /// "manual switch" — `cursor += 1`, skipping the upstream it currently points at.
    pub fn manual_switch(&self) {
        self.dispatcher.manual_switch();
    }

    /// "clear blacklist" — §4.6.
    pub fn clear_blacklist(&self) {
        self.store.clear_blacklist();
    }

    /// "set hub mode {all,domestic,foreign}" — Dispatcher rotation filter.
    pub fn set_hub_mode(&self, mode: Mode) {
        self.dispatcher.set_mode(mode);
    }

    /// "save persistence" — force a snapshot write.
    pub fn save_persistence(&self, path: impl AsRef<Path>) -> Result<(), AdminError> {
        hub_persistence::save_snapshot(path, &self.store.export_snapshot())?;
        Ok(())
    }

    /// "import upstreams {protocol, text}" — regex-extract host:port tokens,
    /// prepend the chosen scheme, fold through `add_upstreams`.
    pub fn import_upstreams(&self, protocol: &str, text: &str) -> Result<usize, AdminError> {
        if protocol != "http" && protocol != "socks5" {
            return Err(AdminError::UnsupportedProtocol(protocol.to_string()));
        }
        let scheme = format!("{protocol}://");
        let tokens = extract_with_scheme(text, &scheme);
        Ok(self.store.add_upstreams(tokens))
    }

    /// "clear dead" — delete all upstreams with `alive == false`.
    pub fn clear_dead(&self) {
        self.store.clear_dead();
    }
}
