use serde::Deserialize;

// =======================================================
// INGEST CONFIG + DEFAULTS
// =======================================================
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct IngestConfig {
    /// Path to the source-preset collaborator file (out of scope format;
    /// only the "load a named preset" operation is in scope).
    pub source_preset_file: String,
    /// Route scrape requests through a local upstream proxy.
    pub use_proxy: bool,
    /// The local proxy URL to route scrape requests through, when enabled.
    pub proxy_url: Option<String>,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            source_preset_file: "sources.toml".into(),
            use_proxy: false,
            proxy_url: None,
        }
    }
}

impl IngestConfig {
    pub fn source_preset_file(&self) -> &str {
        &self.source_preset_file
    }

    pub fn use_proxy(&self) -> bool {
        self.use_proxy
    }

    pub fn proxy_url(&self) -> Option<&str> {
        self.proxy_url.as_deref()
    }

    pub(crate) fn apply_defaults_from(&mut self, defaults: &IngestConfig) {
        if self.source_preset_file.is_empty() {
            self.source_preset_file = defaults.source_preset_file.clone();
        }
    }
}
