use crate::HubConfig;

/// Validation output for a loaded hub configuration.
#[derive(Debug, Default)]
pub struct ConfigReport {
    warnings: Vec<String>,
    errors: Vec<String>,
}

impl ConfigReport {
    /// Returns true when no errors were found.
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }

    /// Returns true when at least one error was found.
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Returns the collected warning messages.
    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    /// Returns the collected error messages.
    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    /// Render warnings and errors into a readable, multi-line string.
    pub fn format(&self) -> String {
        let mut out = String::new();
        if !self.errors.is_empty() {
            out.push_str("Errors:\n");
            for err in &self.errors {
                out.push_str("  - ");
                out.push_str(err);
                out.push('\n');
            }
        }
        if !self.warnings.is_empty() {
            if !out.is_empty() {
                out.push('\n');
            }
            out.push_str("Warnings:\n");
            for warn in &self.warnings {
                out.push_str("  - ");
                out.push_str(warn);
                out.push('\n');
            }
        }
        out
    }

    fn warn(&mut self, message: impl Into<String>) {
        self.warnings.push(message.into());
    }

    fn error(&mut self, message: impl Into<String>) {
        self.errors.push(message.into());
    }
}

/// Validate a hub configuration and return a report of issues.
pub fn validate(cfg: &HubConfig) -> ConfigReport {
    let mut report = ConfigReport::default();

    if cfg.network.hub_listen.trim().is_empty() {
        report.error("network.hub_listen must not be empty");
    } else if cfg.network.hub_listen.parse::<std::net::SocketAddr>().is_err() {
        report.error(format!(
            "network.hub_listen '{}' is not a valid socket address",
            cfg.network.hub_listen
        ));
    }

    if let Some(control) = cfg.network.control_listen.as_deref() {
        if control.parse::<std::net::SocketAddr>().is_err() {
            report.warn(format!(
                "network.control_listen '{control}' is not a valid socket address"
            ));
        }
    }

    if cfg.dispatch.max_retries == 0 {
        report.warn("dispatch.max_retries is 0; every connection will close after a single failed attempt");
    }

    if cfg.dispatch.fail_threshold == 0 {
        report.error("dispatch.fail_threshold must be at least 1");
    }

    if cfg.dispatch.switch_status_codes.is_empty() && cfg.dispatch.switch_keywords.is_empty() {
        report.warn("dispatch has no switch_status_codes or switch_keywords configured; rotation will never trigger on a sniffed response");
    }

    if cfg.ingest.use_proxy && cfg.ingest.proxy_url.is_none() {
        report.error("ingest.use_proxy is true but ingest.proxy_url is not set");
    }

    if cfg.health.domestic_probe_url.trim().is_empty() {
        report.error("health.domestic_probe_url must not be empty");
    }

    if cfg.persistence.data_file.trim().is_empty() {
        report.error("persistence.data_file must not be empty");
    }

    if cfg.global.max_connections == 0 {
        report.error("global.max_connections must be at least 1");
    }

    report
}
