use serde::{Deserialize, Serialize};

/// Latency sentinel used when an upstream is unreachable.
pub const UNREACHABLE_LATENCY_MS: u32 = 9999;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Region {
    Domestic,
    Foreign,
    Unknown,
}

impl Default for Region {
    fn default() -> Self {
        Region::Unknown
    }
}

/// One candidate exit proxy. `url` (`scheme://host:port`) is the primary key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Upstream {
    pub url: String,
    pub alive: bool,
    pub latency_ms: u32,
    pub region: Region,
    pub fail_count: u32,
}

impl Upstream {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            alive: false,
            latency_ms: UNREACHABLE_LATENCY_MS,
            region: Region::Unknown,
            fail_count: 0,
        }
    }
}
