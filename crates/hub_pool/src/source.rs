use serde::{Deserialize, Serialize};

/// One scrape endpoint registered with the Source Registry.
///
/// `id` is assigned by the store, monotonic and never reused, so it stays
/// stable across restarts once persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Source {
    pub id: u64,
    pub url: String,
    pub tag: String,
}
