use serde::Deserialize;

// =======================================================
// NETWORK CONFIG + DEFAULTS
// =======================================================
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    /// Client-facing listen address for the hub's proxy port.
    pub hub_listen: String,
    /// Reserved for the out-of-scope admin HTTP surface; accepted but unused by the core.
    pub control_listen: Option<String>,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            hub_listen: "127.0.0.1:8888".into(),
            control_listen: None,
        }
    }
}

impl NetworkConfig {
    pub fn hub_listen(&self) -> &str {
        &self.hub_listen
    }

    pub fn control_listen(&self) -> Option<&str> {
        self.control_listen.as_deref()
    }

    pub(crate) fn apply_defaults_from(&mut self, defaults: &NetworkConfig) {
        if self.hub_listen.is_empty() {
            self.hub_listen = defaults.hub_listen.clone();
        }
    }
}
