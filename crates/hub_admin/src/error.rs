use thiserror::Error;

/// Structured rejection for admin-supplied malformed input (§7: "reject with
/// structured `AdminError` ... out of core scope to transport, in scope to
/// define").
#[derive(Debug, Error)]
pub enum AdminError {
    #[error("unknown source id {0}")]
    UnknownSourceId(u64),

    #[error("unsupported upstream protocol {0:?}")]
    UnsupportedProtocol(String),

    #[error("failed to build scrape client: {0}")]
    ClientBuild(#[from] reqwest::Error),

    #[error("failed to save persisted snapshot: {0}")]
    Persistence(#[from] std::io::Error),
}
