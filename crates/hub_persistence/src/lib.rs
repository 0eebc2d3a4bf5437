use std::path::Path;

use hub_pool::PoolSnapshot;
use tracing::warn;

/// Serializes `snapshot` as pretty JSON and writes it to `path`.
///
/// Errors are returned rather than logged here: callers (the admin facade,
/// shutdown hook) decide whether a failed save is worth surfacing.
pub fn save_snapshot(path: impl AsRef<Path>, snapshot: &PoolSnapshot) -> std::io::Result<()> {
    let body = serde_json::to_string_pretty(snapshot)
        .map_err(|err| std::io::Error::new(std::io::ErrorKind::InvalidData, err))?;
    std::fs::write(path, body)
}

/// Best-effort load: a missing file, unreadable file, or malformed JSON all
/// log a warning and fall back to `None` rather than panicking. Callers
/// import an empty `PoolSnapshot::default()` when this returns `None`.
pub fn load_snapshot(path: impl AsRef<Path>) -> Option<PoolSnapshot> {
    let path = path.as_ref();
    let body = match std::fs::read_to_string(path) {
        Ok(body) => body,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return None,
        Err(err) => {
            warn!(target: "hub_persistence", path = %path.display(), error = %err, "failed to read persisted pool snapshot");
            return None;
        }
    };

    match serde_json::from_str(&body) {
        Ok(snapshot) => Some(snapshot),
        Err(err) => {
            warn!(target: "hub_persistence", path = %path.display(), error = %err, "failed to parse persisted pool snapshot");
            None
        }
    }
}
