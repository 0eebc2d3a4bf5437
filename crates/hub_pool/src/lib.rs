mod snapshot;
mod source;
mod source_registry;
mod store;
mod upstream;

pub use snapshot::PoolSnapshot;
pub use source::Source;
pub use source_registry::{PresetProvider, load_preset};
pub use store::{Mode, PoolStats, PoolStore, UpstreamUpdate};
pub use upstream::{Region, UNREACHABLE_LATENCY_MS, Upstream};
