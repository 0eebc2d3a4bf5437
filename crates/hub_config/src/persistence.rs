use serde::Deserialize;

// =======================================================
// PERSISTENCE CONFIG + DEFAULTS
// =======================================================
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct PersistenceConfig {
    pub data_file: String,
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        Self {
            data_file: "proxyhub_data.json".into(),
        }
    }
}

impl PersistenceConfig {
    pub fn data_file(&self) -> &str {
        &self.data_file
    }

    pub(crate) fn apply_defaults_from(&mut self, defaults: &PersistenceConfig) {
        if self.data_file.is_empty() {
            self.data_file = defaults.data_file.clone();
        }
    }
}
