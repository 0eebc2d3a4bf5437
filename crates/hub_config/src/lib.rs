mod dispatch;
mod global;
mod health;
mod hub;
mod ingest;
mod network;
mod persistence;
mod timeouts;
mod validation;

pub use dispatch::DispatchConfig;
pub use global::GlobalConfig;
pub use health::HealthConfig;
pub use hub::HubConfig;
pub use ingest::IngestConfig;
pub use network::NetworkConfig;
pub use persistence::PersistenceConfig;
pub use timeouts::TimeoutsConfig;
pub use validation::ConfigReport;
