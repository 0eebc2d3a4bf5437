use serde::Deserialize;

use crate::validation::{ConfigReport, validate};
use crate::{DispatchConfig, GlobalConfig, HealthConfig, IngestConfig, NetworkConfig, PersistenceConfig, TimeoutsConfig};

// =======================================================
// HUB CONFIG — main config
// =======================================================
#[derive(Debug, Deserialize)]
pub struct HubConfig {
    #[serde(default)]
    pub global: GlobalConfig,

    #[serde(default)]
    pub network: NetworkConfig,

    #[serde(default)]
    pub timeouts: TimeoutsConfig,

    #[serde(default)]
    pub dispatch: DispatchConfig,

    #[serde(default)]
    pub health: HealthConfig,

    #[serde(default)]
    pub ingest: IngestConfig,

    #[serde(default)]
    pub persistence: PersistenceConfig,
}

impl Default for HubConfig {
    fn default() -> Self {
        let mut cfg = Self {
            global: GlobalConfig::default(),
            network: NetworkConfig::default(),
            timeouts: TimeoutsConfig::default(),
            dispatch: DispatchConfig::default(),
            health: HealthConfig::default(),
            ingest: IngestConfig::default(),
            persistence: PersistenceConfig::default(),
        };
        cfg.apply_defaults();
        cfg
    }
}

impl HubConfig {
    pub fn global(&self) -> &GlobalConfig {
        &self.global
    }

    pub fn network(&self) -> &NetworkConfig {
        &self.network
    }

    pub fn timeouts(&self) -> &TimeoutsConfig {
        &self.timeouts
    }

    pub fn dispatch(&self) -> &DispatchConfig {
        &self.dispatch
    }

    pub fn health(&self) -> &HealthConfig {
        &self.health
    }

    pub fn ingest(&self) -> &IngestConfig {
        &self.ingest
    }

    pub fn persistence(&self) -> &PersistenceConfig {
        &self.persistence
    }

    /// Validate the configuration and return a report of warnings and errors.
    pub fn validate(&self) -> ConfigReport {
        validate(self)
    }

    pub fn from_file(file_name: &str) -> Result<Self, config::ConfigError> {
        let built = config::Config::builder()
            .add_source(config::File::new(file_name, config::FileFormat::Toml).required(false))
            .add_source(config::Environment::with_prefix("PROXYHUB").separator("__"))
            .build()?;

        let mut cfg: HubConfig = built.try_deserialize()?;

        cfg.apply_defaults();
        Ok(cfg)
    }

    pub fn from_file_or_default(file_name: &str) -> Self {
        match Self::from_file(file_name) {
            Ok(cfg) => {
                let report = cfg.validate();
                if report.has_errors() {
                    eprintln!("invalid config in '{file_name}':");
                    eprintln!("{}", report.format());
                    eprintln!("falling back to default config (in-memory)");
                    HubConfig::default()
                } else {
                    if !report.warnings().is_empty() {
                        eprintln!("config warnings in '{file_name}':");
                        eprintln!("{}", report.format());
                    }
                    cfg
                }
            }
            Err(e) => {
                eprintln!("error reading config '{file_name}': {e}");
                eprintln!("falling back to default config (in-memory)");
                HubConfig::default()
            }
        }
    }

    fn apply_defaults(&mut self) {
        let def_global = GlobalConfig::default();
        self.global.apply_defaults_from(&def_global);

        let def_network = NetworkConfig::default();
        self.network.apply_defaults_from(&def_network);

        let def_timeouts = TimeoutsConfig::default();
        self.timeouts.apply_defaults_from(&def_timeouts);

        let def_dispatch = DispatchConfig::default();
        self.dispatch.apply_defaults_from(&def_dispatch);

        let def_health = HealthConfig::default();
        self.health.apply_defaults_from(&def_health);

        let def_ingest = IngestConfig::default();
        self.ingest.apply_defaults_from(&def_ingest);

        let def_persistence = PersistenceConfig::default();
        self.persistence.apply_defaults_from(&def_persistence);
    }

    pub fn print(&self) {
        println!("================ PROXYHUB CONFIG ================");
        println!("\n[global]");
        println!("  log_level       = {}", self.global.log_level);
        println!("  max_connections = {}", self.global.max_connections);
        println!("\n[network]");
        println!("  hub_listen      = {}", self.network.hub_listen);
        println!("  control_listen  = {:?}", self.network.control_listen);
        println!("\n[timeouts]");
        println!("  prologue_read_secs          = {}", self.timeouts.prologue_read_secs);
        println!("  upstream_connect_secs       = {}", self.timeouts.upstream_connect_secs);
        println!("  sniff_read_secs             = {}", self.timeouts.sniff_read_secs);
        println!("  scrape_secs                 = {}", self.timeouts.scrape_secs);
        println!("  health_probe_domestic_secs  = {}", self.timeouts.health_probe_domestic_secs);
        println!("  health_probe_foreign_secs   = {}", self.timeouts.health_probe_foreign_secs);
        println!("\n[dispatch]");
        println!("  max_retries          = {}", self.dispatch.max_retries);
        println!("  fail_threshold       = {}", self.dispatch.fail_threshold);
        println!("  switch_status_codes  = {:?}", self.dispatch.switch_status_codes);
        println!("  switch_keywords      = {:?}", self.dispatch.switch_keywords);
        println!("\n[health]");
        println!("  domestic_probe_url      = {}", self.health.domestic_probe_url);
        println!("  foreign_probe_url       = {}", self.health.foreign_probe_url);
        println!("  scheduler_interval_secs = {}", self.health.scheduler_interval_secs);
        println!("\n[ingest]");
        println!("  source_preset_file = {}", self.ingest.source_preset_file);
        println!("  use_proxy          = {}", self.ingest.use_proxy);
        println!("  proxy_url          = {:?}", self.ingest.proxy_url);
        println!("\n[persistence]");
        println!("  data_file = {}", self.persistence.data_file);
        println!("===================================================");
    }
}
