use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use hub_admin::AdminApi;
use hub_config::HubConfig;
use hub_dispatch::{DispatchSettings, Dispatcher};
use hub_health::{HealthChecker, spawn_scheduler};
use hub_pool::{PoolStore, PresetProvider};
use tokio::net::TcpListener;
use tracing::{info, instrument, warn};

/// The out-of-scope source-preset file format has no parser here; this
/// collaborator always reports an empty preset until that format exists.
struct NullPresetProvider;

impl PresetProvider for NullPresetProvider {
    fn sources_for(&self, _preset: &str) -> Vec<(String, String)> {
        Vec::new()
    }
}

#[derive(Parser, Debug)]
#[command(name = "proxyhub", about = "Rotating HTTP/CONNECT proxy hub")]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(long, default_value = "proxyhub.toml")]
    config: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let cfg = HubConfig::from_file_or_default(&cli.config);

    utils::init_tracing();
    cfg.print();

    let store = Arc::new(PoolStore::new());
    load_persisted_pool(&store, cfg.persistence().data_file());

    let dispatcher = Dispatcher::new(
        store.clone(),
        DispatchSettings {
            prologue_timeout: Duration::from_secs(cfg.timeouts().prologue_read_secs()),
            connect_timeout: Duration::from_secs(cfg.timeouts().upstream_connect_secs()),
            sniff_timeout: Duration::from_secs(cfg.timeouts().sniff_read_secs()),
            max_retries: cfg.dispatch().max_retries(),
            fail_threshold: cfg.dispatch().fail_threshold(),
            switch_status_codes: cfg.dispatch().switch_status_codes().to_vec(),
            switch_keywords: cfg.dispatch().switch_keywords().to_vec(),
        },
        cfg.global().max_connections(),
    );

    let health_checker = Arc::new(HealthChecker::new(
        cfg.health().domestic_probe_url().to_string(),
        cfg.health().foreign_probe_url().to_string(),
        Duration::from_secs(cfg.timeouts().health_probe_domestic_secs()),
        Duration::from_secs(cfg.timeouts().health_probe_foreign_secs()),
    ));
    spawn_scheduler(
        health_checker.clone(),
        store.clone(),
        Duration::from_secs(cfg.health().scheduler_interval_secs()),
    );

    // Constructed here to prove the facade wires up against live handles; a
    // future control-plane binary would hold this for the lifetime of the process.
    {
        let preset_provider = NullPresetProvider;
        let _admin = AdminApi::new(
            &store,
            &dispatcher,
            &health_checker,
            &preset_provider,
            Duration::from_secs(cfg.timeouts().scrape_secs()),
            cfg.ingest().proxy_url().map(str::to_string),
        );
    }

    let listener = TcpListener::bind(cfg.network().hub_listen()).await?;
    info!(target: "proxyhub", addr = %cfg.network().hub_listen(), "hub listening");

    let data_file = cfg.persistence().data_file().to_string();
    let shutdown_store = store.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!(target: "proxyhub", "shutdown signal received; saving pool snapshot");
            save_pool_on_shutdown(&shutdown_store, &data_file);
            std::process::exit(0);
        }
    });

    dispatcher.accept_loop(listener).await
}

#[instrument(skip(store))]
fn load_persisted_pool(store: &PoolStore, data_file: &str) {
    match hub_persistence::load_snapshot(data_file) {
        Some(snapshot) => {
            let upstream_count = snapshot.upstreams.len();
            let source_count = snapshot.sources.len();
            store.import_snapshot(snapshot);
            info!(target: "proxyhub", upstream_count, source_count, "loaded persisted pool snapshot");
        }
        None => {
            info!(target: "proxyhub", data_file, "no persisted pool snapshot found; starting empty");
        }
    }
}

fn save_pool_on_shutdown(store: &PoolStore, data_file: &str) {
    if let Err(err) = hub_persistence::save_snapshot(data_file, &store.export_snapshot()) {
        warn!(target: "proxyhub", error = %err, "failed to save pool snapshot on shutdown");
    }
}
