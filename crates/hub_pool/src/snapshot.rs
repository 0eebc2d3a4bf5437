use serde::{Deserialize, Serialize};

use crate::source::Source;
use crate::upstream::Upstream;

/// Whole-state transfer object for the persistence collaborator (§4.8).
///
/// Blacklist membership and the rotation cursor are deliberately excluded:
/// a restart gives every upstream a second chance and rotation restarts at 0.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PoolSnapshot {
    pub sources: Vec<Source>,
    pub source_id_counter: u64,
    pub upstreams: Vec<Upstream>,
}
