use std::collections::HashSet;
use std::sync::Mutex;

use tracing::debug;

use crate::snapshot::PoolSnapshot;
use crate::source::Source;
use crate::upstream::{Region, Upstream};

/// Region filter applied to a live-pool snapshot (§4.5.1).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    All,
    Domestic,
    Foreign,
}

impl Mode {
    fn matches(self, region: Region) -> bool {
        match self {
            Mode::All => true,
            Mode::Domestic => region == Region::Domestic,
            Mode::Foreign => region == Region::Foreign,
        }
    }
}

/// Partial update applied to an existing upstream by `update_upstream`.
#[derive(Debug, Default, Clone)]
pub struct UpstreamUpdate {
    pub alive: Option<bool>,
    pub latency_ms: Option<u32>,
    pub region: Option<Region>,
}

/// {total, alive, domestic, foreign, blacklist} counts for the admin "get stats" op.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PoolStats {
    pub total: usize,
    pub alive: usize,
    pub domestic: usize,
    pub foreign: usize,
    pub blacklist: usize,
}

struct Inner {
    sources: Vec<Source>,
    next_source_id: u64,
    // insertion order preserved so `live()` snapshots are reproducible for round-robin.
    upstreams: Vec<Upstream>,
    blacklist: HashSet<String>,
    cursor: usize,
    dirty_count: u64,
}

impl Inner {
    fn new() -> Self {
        Self {
            sources: Vec::new(),
            next_source_id: 0,
            upstreams: Vec::new(),
            blacklist: HashSet::new(),
            cursor: 0,
            dirty_count: 0,
        }
    }

    fn mark_dirty(&mut self) {
        self.dirty_count += 1;
        debug!(target: "hub_pool", dirty_count = self.dirty_count, "pool store mutated");
    }

    fn find_upstream_mut(&mut self, url: &str) -> Option<&mut Upstream> {
        self.upstreams.iter_mut().find(|u| u.url == url)
    }
}

/// Authoritative upstream inventory, source registry and rotation cursor.
///
/// A single mutex, not a sharded concurrent map: rotation needs a
/// deterministic, insertion-ordered live snapshot, which one critical
/// section guarantees trivially. Sections never perform I/O.
pub struct PoolStore {
    inner: Mutex<Inner>,
}

impl Default for PoolStore {
    fn default() -> Self {
        Self::new()
    }
}

impl PoolStore {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner::new()),
        }
    }

    // ---------------------------------------------------------------
    // Source Registry (§4.1 sources portion / §4.2)
    // ---------------------------------------------------------------

    /// Rejects duplicates by url; assigns the next id; returns whether inserted.
    pub fn add_source(&self, url: impl Into<String>, tag: impl Into<String>) -> bool {
        let url = url.into();
        let mut inner = self.inner.lock().unwrap();
        if inner.sources.iter().any(|s| s.url == url) {
            return false;
        }
        let id = inner.next_source_id;
        inner.next_source_id += 1;
        inner.sources.push(Source {
            id,
            url,
            tag: tag.into(),
        });
        inner.mark_dirty();
        true
    }

    pub fn remove_source(&self, id: u64) -> bool {
        let mut inner = self.inner.lock().unwrap();
        let before = inner.sources.len();
        inner.sources.retain(|s| s.id != id);
        let removed = inner.sources.len() != before;
        if removed {
            inner.mark_dirty();
        }
        removed
    }

    pub fn clear_sources(&self) {
        let mut inner = self.inner.lock().unwrap();
        inner.sources.clear();
        inner.mark_dirty();
    }

    pub fn list_sources(&self) -> Vec<Source> {
        self.inner.lock().unwrap().sources.clone()
    }

    pub fn sources_by_ids(&self, ids: &[u64]) -> Vec<Source> {
        let inner = self.inner.lock().unwrap();
        ids.iter()
            .filter_map(|id| inner.sources.iter().find(|s| s.id == *id).cloned())
            .collect()
    }

    // ---------------------------------------------------------------
    // Upstream inventory (§4.1)
    // ---------------------------------------------------------------

    /// Set-union on `url`; preserves existing metadata for already-known urls.
    /// Returns the number of genuinely new entries.
    pub fn add_upstreams(&self, urls: impl IntoIterator<Item = String>) -> usize {
        let mut inner = self.inner.lock().unwrap();
        let mut added = 0;
        for url in urls {
            if inner.upstreams.iter().any(|u| u.url == url) {
                continue;
            }
            inner.upstreams.push(Upstream::new(url));
            added += 1;
        }
        if added > 0 {
            inner.mark_dirty();
        }
        added
    }

    /// Partial update; `fields.alive == Some(true)` also discards the url from
    /// the blacklist (§4.1, §4.6 "health check flips alive true").
    pub fn update_upstream(&self, url: &str, fields: UpstreamUpdate) -> bool {
        let mut inner = self.inner.lock().unwrap();
        let found = if let Some(u) = inner.find_upstream_mut(url) {
            if let Some(alive) = fields.alive {
                u.alive = alive;
            }
            if let Some(latency_ms) = fields.latency_ms {
                u.latency_ms = latency_ms;
            }
            if let Some(region) = fields.region {
                u.region = region;
            }
            true
        } else {
            false
        };
        if found {
            if fields.alive == Some(true) {
                inner.blacklist.remove(url);
            }
            inner.mark_dirty();
        }
        found
    }

    /// Stable ordered list of live, non-blacklisted upstreams, optionally
    /// filtered by region. Ordering is insertion order so rotation is
    /// reproducible.
    pub fn live(&self, mode: Mode) -> Vec<Upstream> {
        let inner = self.inner.lock().unwrap();
        inner
            .upstreams
            .iter()
            .filter(|u| u.alive && !inner.blacklist.contains(&u.url) && mode.matches(u.region))
            .cloned()
            .collect()
    }

    /// The full, uncapped upstream inventory in insertion order (used by the
    /// Health Checker, which probes every entry regardless of the admin
    /// listing's 100-row cap).
    pub fn all_upstreams(&self) -> Vec<Upstream> {
        self.inner.lock().unwrap().upstreams.clone()
    }

    /// Upstream listing sorted by (alive desc, blacklisted last), capped at 100.
    pub fn list_upstreams(&self) -> Vec<Upstream> {
        let inner = self.inner.lock().unwrap();
        let mut list: Vec<Upstream> = inner.upstreams.clone();
        list.sort_by(|a, b| {
            let a_blacklisted = inner.blacklist.contains(&a.url);
            let b_blacklisted = inner.blacklist.contains(&b.url);
            b.alive
                .cmp(&a.alive)
                .then(a_blacklisted.cmp(&b_blacklisted))
        });
        list.truncate(100);
        list
    }

    pub fn is_blacklisted(&self, url: &str) -> bool {
        self.inner.lock().unwrap().blacklist.contains(url)
    }

    // ---------------------------------------------------------------
    // Failure accounting (§4.6)
    // ---------------------------------------------------------------

    /// Increments `fail_count`; if `fail_threshold` is reached, blacklists the
    /// url. Returns the new count, or `None` if the url isn't in the pool.
    pub fn mark_failure(&self, url: &str, fail_threshold: u32) -> Option<u32> {
        let mut inner = self.inner.lock().unwrap();
        let new_count = {
            let u = inner.find_upstream_mut(url)?;
            u.fail_count += 1;
            u.fail_count
        };
        if new_count >= fail_threshold {
            inner.blacklist.insert(url.to_string());
        }
        inner.mark_dirty();
        Some(new_count)
    }

    pub fn mark_success(&self, url: &str) {
        let mut inner = self.inner.lock().unwrap();
        if let Some(u) = inner.find_upstream_mut(url) {
            u.fail_count = 0;
        }
        inner.blacklist.remove(url);
        inner.mark_dirty();
    }

    /// blacklist := ∅, and fail_counts := 0 (§4.6 "clear blacklist").
    pub fn clear_blacklist(&self) {
        let mut inner = self.inner.lock().unwrap();
        inner.blacklist.clear();
        for u in inner.upstreams.iter_mut() {
            u.fail_count = 0;
        }
        inner.mark_dirty();
    }

    /// Deletes all upstreams with `alive == false`; their blacklist entries
    /// (if any) are dropped along with them.
    pub fn clear_dead(&self) {
        let mut inner = self.inner.lock().unwrap();
        let dead: Vec<String> = inner
            .upstreams
            .iter()
            .filter(|u| !u.alive)
            .map(|u| u.url.clone())
            .collect();
        inner.upstreams.retain(|u| u.alive);
        for url in dead {
            inner.blacklist.remove(&url);
        }
        inner.mark_dirty();
    }

    // ---------------------------------------------------------------
    // Rotation cursor (§4.5.1)
    // ---------------------------------------------------------------

    /// Atomically advances and returns the pre-increment rotation cursor.
    pub fn next_cursor(&self) -> usize {
        let mut inner = self.inner.lock().unwrap();
        let cur = inner.cursor;
        inner.cursor = inner.cursor.wrapping_add(1);
        cur
    }

    // ---------------------------------------------------------------
    // Stats + persistence
    // ---------------------------------------------------------------

    pub fn stats(&self) -> PoolStats {
        let inner = self.inner.lock().unwrap();
        let mut stats = PoolStats {
            total: inner.upstreams.len(),
            blacklist: inner.blacklist.len(),
            ..Default::default()
        };
        for u in &inner.upstreams {
            if u.alive {
                stats.alive += 1;
            }
            match u.region {
                Region::Domestic => stats.domestic += 1,
                Region::Foreign => stats.foreign += 1,
                Region::Unknown => {}
            }
        }
        stats
    }

    pub fn export_snapshot(&self) -> PoolSnapshot {
        let inner = self.inner.lock().unwrap();
        PoolSnapshot {
            sources: inner.sources.clone(),
            source_id_counter: inner.next_source_id,
            upstreams: inner.upstreams.clone(),
        }
    }

    /// Replaces sources and upstreams wholesale; blacklist and cursor are
    /// untouched by design (they are never part of a snapshot).
    pub fn import_snapshot(&self, snapshot: PoolSnapshot) {
        let mut inner = self.inner.lock().unwrap();
        inner.sources = snapshot.sources;
        inner.next_source_id = snapshot.source_id_counter;
        inner.upstreams = snapshot.upstreams;
        inner.mark_dirty();
    }

    #[cfg(test)]
    pub(crate) fn dirty_count(&self) -> u64 {
        self.inner.lock().unwrap().dirty_count
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_source_rejects_duplicates() {
        let store = PoolStore::new();
        assert!(store.add_source("http://a.example", "basic"));
        assert!(!store.add_source("http://a.example", "basic"));
        assert_eq!(store.list_sources().len(), 1);
    }

    #[test]
    fn source_ids_are_monotonic_and_not_reused() {
        let store = PoolStore::new();
        store.add_source("http://a.example", "basic");
        store.add_source("http://b.example", "basic");
        let ids: Vec<u64> = store.list_sources().iter().map(|s| s.id).collect();
        assert_eq!(ids, vec![0, 1]);

        store.remove_source(0);
        store.add_source("http://c.example", "basic");
        let ids: Vec<u64> = store.list_sources().iter().map(|s| s.id).collect();
        assert_eq!(ids, vec![1, 2]);
    }

    #[test]
    fn add_upstreams_is_idempotent_and_preserves_metadata() {
        let store = PoolStore::new();
        store.add_upstreams(vec!["http://1.1.1.1:80".to_string()]);
        store.update_upstream(
            "http://1.1.1.1:80",
            UpstreamUpdate {
                alive: Some(true),
                latency_ms: Some(12),
                region: Some(Region::Domestic),
            },
        );
        let added_again = store.add_upstreams(vec!["http://1.1.1.1:80".to_string()]);
        assert_eq!(added_again, 0);

        let live = store.live(Mode::All);
        assert_eq!(live.len(), 1);
        assert_eq!(live[0].latency_ms, 12);
        assert_eq!(live[0].region, Region::Domestic);
    }

    #[test]
    fn live_excludes_blacklisted_and_dead() {
        let store = PoolStore::new();
        store.add_upstreams(vec![
            "http://a".to_string(),
            "http://b".to_string(),
            "http://c".to_string(),
        ]);
        store.update_upstream("http://a", UpstreamUpdate { alive: Some(true), ..Default::default() });
        store.update_upstream("http://b", UpstreamUpdate { alive: Some(true), ..Default::default() });
        // c stays dead.

        for _ in 0..3 {
            store.mark_failure("http://a", 3);
        }
        let live: Vec<String> = store.live(Mode::All).into_iter().map(|u| u.url).collect();
        assert_eq!(live, vec!["http://b".to_string()]);
        assert!(store.is_blacklisted("http://a"));
    }

    #[test]
    fn mark_failure_blacklists_at_threshold() {
        let store = PoolStore::new();
        store.add_upstreams(vec!["http://a".to_string()]);
        store.update_upstream("http://a", UpstreamUpdate { alive: Some(true), ..Default::default() });

        assert_eq!(store.mark_failure("http://a", 3), Some(1));
        assert!(!store.is_blacklisted("http://a"));
        assert_eq!(store.mark_failure("http://a", 3), Some(2));
        assert_eq!(store.mark_failure("http://a", 3), Some(3));
        assert!(store.is_blacklisted("http://a"));
    }

    #[test]
    fn mark_success_resets_fail_count_and_clears_blacklist() {
        let store = PoolStore::new();
        store.add_upstreams(vec!["http://a".to_string()]);
        for _ in 0..3 {
            store.mark_failure("http://a", 3);
        }
        assert!(store.is_blacklisted("http://a"));

        store.mark_success("http://a");
        assert!(!store.is_blacklisted("http://a"));
        assert_eq!(store.mark_failure("http://a", 3), Some(1));
    }

    #[test]
    fn health_recovery_removes_from_blacklist() {
        let store = PoolStore::new();
        store.add_upstreams(vec!["http://a".to_string()]);
        for _ in 0..3 {
            store.mark_failure("http://a", 3);
        }
        assert!(store.is_blacklisted("http://a"));

        store.update_upstream("http://a", UpstreamUpdate { alive: Some(true), ..Default::default() });
        assert!(!store.is_blacklisted("http://a"));
    }

    #[test]
    fn clear_blacklist_resets_everything() {
        let store = PoolStore::new();
        store.add_upstreams(vec!["http://a".to_string(), "http://b".to_string()]);
        for _ in 0..3 {
            store.mark_failure("http://a", 3);
        }
        store.mark_failure("http://b", 3);
        store.clear_blacklist();

        assert_eq!(store.stats().blacklist, 0);
        let live_after_alive = {
            store.update_upstream("http://a", UpstreamUpdate { alive: Some(true), ..Default::default() });
            store.live(Mode::All)
        };
        assert_eq!(live_after_alive[0].fail_count, 0);
    }

    #[test]
    fn clear_dead_deletes_only_dead_upstreams() {
        let store = PoolStore::new();
        store.add_upstreams(vec!["http://a".to_string(), "http://b".to_string()]);
        store.update_upstream("http://a", UpstreamUpdate { alive: Some(true), ..Default::default() });
        store.clear_dead();

        let urls: Vec<String> = store.list_upstreams().into_iter().map(|u| u.url).collect();
        assert_eq!(urls, vec!["http://a".to_string()]);
    }

    #[test]
    fn rotation_cursor_is_monotonic() {
        let store = PoolStore::new();
        assert_eq!(store.next_cursor(), 0);
        assert_eq!(store.next_cursor(), 1);
        assert_eq!(store.next_cursor(), 2);
    }

    #[test]
    fn live_on_empty_pool_is_empty() {
        let store = PoolStore::new();
        assert!(store.live(Mode::All).is_empty());
    }

    #[test]
    fn snapshot_round_trip_is_identical() {
        let store = PoolStore::new();
        store.add_source("http://sources.example/list", "basic");
        store.add_upstreams(vec!["http://a".to_string()]);
        store.update_upstream("http://a", UpstreamUpdate { alive: Some(true), ..Default::default() });

        let snap1 = store.export_snapshot();
        let store2 = PoolStore::new();
        store2.import_snapshot(snap1.clone());
        let snap2 = store2.export_snapshot();

        assert_eq!(snap1.source_id_counter, snap2.source_id_counter);
        assert_eq!(snap1.sources.len(), snap2.sources.len());
        assert_eq!(snap1.upstreams.len(), snap2.upstreams.len());
    }

    #[test]
    fn mutations_bump_dirty_counter() {
        let store = PoolStore::new();
        assert_eq!(store.dirty_count(), 0);
        store.add_source("http://a.example", "basic");
        assert_eq!(store.dirty_count(), 1);
    }

    #[test]
    fn mode_filters_by_region() {
        let store = PoolStore::new();
        store.add_upstreams(vec!["http://a".to_string(), "http://b".to_string()]);
        store.update_upstream(
            "http://a",
            UpstreamUpdate { alive: Some(true), region: Some(Region::Domestic), ..Default::default() },
        );
        store.update_upstream(
            "http://b",
            UpstreamUpdate { alive: Some(true), region: Some(Region::Foreign), ..Default::default() },
        );

        assert_eq!(store.live(Mode::Domestic).len(), 1);
        assert_eq!(store.live(Mode::Foreign).len(), 1);
        assert_eq!(store.live(Mode::All).len(), 2);
    }
}
