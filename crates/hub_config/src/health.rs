use serde::Deserialize;

// =======================================================
// HEALTH CONFIG + DEFAULTS
// =======================================================
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct HealthConfig {
    pub domestic_probe_url: String,
    pub foreign_probe_url: String,
    pub scheduler_interval_secs: u64,
}

impl Default for HealthConfig {
    fn default() -> Self {
        Self {
            domestic_probe_url: "http://www.baidu.com".into(),
            foreign_probe_url: "http://www.google.com".into(),
            scheduler_interval_secs: 300,
        }
    }
}

impl HealthConfig {
    pub fn domestic_probe_url(&self) -> &str {
        &self.domestic_probe_url
    }

    pub fn foreign_probe_url(&self) -> &str {
        &self.foreign_probe_url
    }

    pub fn scheduler_interval_secs(&self) -> u64 {
        self.scheduler_interval_secs
    }

    pub(crate) fn apply_defaults_from(&mut self, defaults: &HealthConfig) {
        if self.domestic_probe_url.is_empty() {
            self.domestic_probe_url = defaults.domestic_probe_url.clone();
        }
        if self.foreign_probe_url.is_empty() {
            self.foreign_probe_url = defaults.foreign_probe_url.clone();
        }
        if self.scheduler_interval_secs == 0 {
            self.scheduler_interval_secs = defaults.scheduler_interval_secs;
        }
    }
}
