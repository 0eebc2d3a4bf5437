use serde::Deserialize;

// =======================================================
// TIMEOUTS CONFIG + DEFAULTS (all in seconds)
// =======================================================
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct TimeoutsConfig {
    pub prologue_read_secs: u64,
    pub upstream_connect_secs: u64,
    pub sniff_read_secs: u64,
    pub scrape_secs: u64,
    pub health_probe_domestic_secs: u64,
    pub health_probe_foreign_secs: u64,
}

impl Default for TimeoutsConfig {
    fn default() -> Self {
        Self {
            prologue_read_secs: 3,
            upstream_connect_secs: 3,
            sniff_read_secs: 5,
            scrape_secs: 20,
            health_probe_domestic_secs: 3,
            health_probe_foreign_secs: 2,
        }
    }
}

impl TimeoutsConfig {
    pub fn prologue_read_secs(&self) -> u64 {
        self.prologue_read_secs
    }

    pub fn upstream_connect_secs(&self) -> u64 {
        self.upstream_connect_secs
    }

    pub fn sniff_read_secs(&self) -> u64 {
        self.sniff_read_secs
    }

    pub fn scrape_secs(&self) -> u64 {
        self.scrape_secs
    }

    pub fn health_probe_domestic_secs(&self) -> u64 {
        self.health_probe_domestic_secs
    }

    pub fn health_probe_foreign_secs(&self) -> u64 {
        self.health_probe_foreign_secs
    }

    pub(crate) fn apply_defaults_from(&mut self, defaults: &TimeoutsConfig) {
        if self.prologue_read_secs == 0 {
            self.prologue_read_secs = defaults.prologue_read_secs;
        }
        if self.upstream_connect_secs == 0 {
            self.upstream_connect_secs = defaults.upstream_connect_secs;
        }
        if self.sniff_read_secs == 0 {
            self.sniff_read_secs = defaults.sniff_read_secs;
        }
        if self.scrape_secs == 0 {
            self.scrape_secs = defaults.scrape_secs;
        }
        if self.health_probe_domestic_secs == 0 {
            self.health_probe_domestic_secs = defaults.health_probe_domestic_secs;
        }
        if self.health_probe_foreign_secs == 0 {
            self.health_probe_foreign_secs = defaults.health_probe_foreign_secs;
        }
    }
}
