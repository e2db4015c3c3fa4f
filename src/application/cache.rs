//! Time-expiring snapshot cache for composite content reads.
//!
//! One key per composite entity (`news:<id>`, `project:<id>`), holding the
//! canonical JSON the endpoint serves. Writers refresh entries proactively so
//! the reader arriving right after a write still hits. Correctness comes from
//! the age check at `get` time; the periodic sweep only reclaims memory.

use std::time::{Duration, Instant};

use dashmap::DashMap;
use metrics::counter;
use serde_json::Value;

pub const DEFAULT_TTL: Duration = Duration::from_secs(60);
pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(120);

pub fn news_key(id: i64) -> String {
    format!("news:{id}")
}

pub fn project_key(id: i64) -> String {
    format!("project:{id}")
}

struct CacheEntry {
    value: Value,
    refreshed_at: Instant,
}

/// Process-wide snapshot cache, injected from the composition root.
pub struct ContentCache {
    entries: DashMap<String, CacheEntry>,
    ttl: Duration,
}

impl ContentCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            ttl,
        }
    }

    /// Returns the snapshot only while it is younger than the TTL. Expired
    /// entries are dropped on observation and reported as a miss.
    pub fn get(&self, key: &str) -> Option<Value> {
        if let Some(entry) = self.entries.get(key) {
            if entry.refreshed_at.elapsed() < self.ttl {
                counter!("alexpetro_cache_hit_total").increment(1);
                return Some(entry.value.clone());
            }
        } else {
            counter!("alexpetro_cache_miss_total").increment(1);
            return None;
        }

        // Present but stale.
        self.entries
            .remove_if(key, |_, entry| entry.refreshed_at.elapsed() >= self.ttl);
        counter!("alexpetro_cache_miss_total").increment(1);
        None
    }

    /// Stores the snapshot unconditionally; the TTL clock restarts.
    pub fn set(&self, key: impl Into<String>, value: Value) {
        self.entries.insert(
            key.into(),
            CacheEntry {
                value,
                refreshed_at: Instant::now(),
            },
        );
    }

    /// Idempotent removal.
    pub fn delete(&self, key: &str) {
        self.entries.remove(key);
    }

    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop every expired entry; returns how many were reclaimed.
    pub fn sweep_expired(&self) -> usize {
        let before = self.entries.len();
        self.entries
            .retain(|_, entry| entry.refreshed_at.elapsed() < self.ttl);
        before - self.entries.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn get_returns_fresh_entries() {
        let cache = ContentCache::new(Duration::from_secs(60));
        assert!(cache.get("news:1").is_none());

        cache.set(news_key(1), json!({"id": 1, "title": "Refinery"}));
        let hit = cache.get("news:1").expect("fresh entry");
        assert_eq!(hit["title"], "Refinery");
    }

    #[test]
    fn expired_entries_read_as_absent() {
        let cache = ContentCache::new(Duration::from_millis(20));
        cache.set(news_key(1), json!({"id": 1}));
        assert!(cache.get("news:1").is_some());

        std::thread::sleep(Duration::from_millis(30));
        assert!(cache.get("news:1").is_none());
        // The stale entry was dropped, not just hidden.
        assert_eq!(cache.len(), 0);
    }

    #[test]
    fn set_resets_the_ttl_clock() {
        let cache = ContentCache::new(Duration::from_millis(40));
        cache.set(project_key(2), json!({"v": 1}));
        std::thread::sleep(Duration::from_millis(25));

        cache.set(project_key(2), json!({"v": 2}));
        std::thread::sleep(Duration::from_millis(25));

        // 50ms after the first set but only 25ms after the refresh.
        let hit = cache.get("project:2").expect("refreshed entry");
        assert_eq!(hit["v"], 2);
    }

    #[test]
    fn set_overwrites_unconditionally() {
        let cache = ContentCache::new(Duration::from_secs(60));
        cache.set(news_key(3), json!({"title": "old"}));
        cache.set(news_key(3), json!({"title": "new"}));
        assert_eq!(cache.get("news:3").unwrap()["title"], "new");
    }

    #[test]
    fn delete_is_idempotent() {
        let cache = ContentCache::new(Duration::from_secs(60));
        cache.set(news_key(4), json!({}));
        cache.delete("news:4");
        cache.delete("news:4");
        assert!(cache.get("news:4").is_none());
    }

    #[test]
    fn sweep_reclaims_only_expired_entries() {
        let cache = ContentCache::new(Duration::from_millis(20));
        cache.set(news_key(1), json!({}));
        std::thread::sleep(Duration::from_millis(30));
        cache.set(news_key(2), json!({}));

        assert_eq!(cache.sweep_expired(), 1);
        assert_eq!(cache.len(), 1);
        assert!(cache.get("news:2").is_some());
    }

    #[test]
    fn keys_are_scoped_by_entity_kind() {
        assert_eq!(news_key(7), "news:7");
        assert_eq!(project_key(7), "project:7");
        assert_ne!(news_key(7), project_key(7));
    }
}
