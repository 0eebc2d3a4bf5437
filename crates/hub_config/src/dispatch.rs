use serde::Deserialize;

// =======================================================
// DISPATCH CONFIG + DEFAULTS
// =======================================================
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct DispatchConfig {
    pub max_retries: u32,
    pub fail_threshold: u32,
    pub switch_status_codes: Vec<u16>,
    pub switch_keywords: Vec<String>,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            max_retries: 5,
            fail_threshold: 3,
            switch_status_codes: vec![403, 429, 502, 503, 504],
            switch_keywords: vec![
                "验证码".into(),
                "访问被拒绝".into(),
                "Forbidden".into(),
                "CAPTCHA".into(),
                "IP限制".into(),
                "安全验证".into(),
            ],
        }
    }
}

impl DispatchConfig {
    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    pub fn fail_threshold(&self) -> u32 {
        self.fail_threshold
    }

    pub fn switch_status_codes(&self) -> &[u16] {
        &self.switch_status_codes
    }

    pub fn switch_keywords(&self) -> &[String] {
        &self.switch_keywords
    }

    pub(crate) fn apply_defaults_from(&mut self, defaults: &DispatchConfig) {
        if self.max_retries == 0 {
            self.max_retries = defaults.max_retries;
        }
        if self.fail_threshold == 0 {
            self.fail_threshold = defaults.fail_threshold;
        }
        if self.switch_status_codes.is_empty() {
            self.switch_status_codes = defaults.switch_status_codes.clone();
        }
        if self.switch_keywords.is_empty() {
            self.switch_keywords = defaults.switch_keywords.clone();
        }
    }
}
