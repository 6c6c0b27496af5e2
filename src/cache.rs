//! TTL cache for schema introspection results.
//!
//! Expiration is enforced lazily at read time: a lookup that finds an
//! expired entry evicts it and reports a miss, so the periodic [`sweep`]
//! task is an optimization rather than a correctness requirement. Every
//! method locks the whole map for its duration, which keeps each call
//! atomic for concurrent tool handlers.
//!
//! [`sweep`]: SchemaCache::sweep

use parking_lot::Mutex;
use regex::Regex;
use serde_json::Value;
use std::collections::HashMap;
use std::time::{Duration, Instant};

struct CacheEntry {
    data: Value,
    expires_at: Instant,
}

struct CacheState {
    entries: HashMap<String, CacheEntry>,
    ttl: Duration,
    enabled: bool,
}

/// Snapshot of the cache for introspection and logging.
#[derive(Debug, Clone)]
pub struct CacheStats {
    pub size: usize,
    pub enabled: bool,
    pub ttl: Duration,
    pub keys: Vec<String>,
}

/// In-memory cache with per-entry expiration and pattern invalidation.
pub struct SchemaCache {
    state: Mutex<CacheState>,
}

impl SchemaCache {
    pub fn new(ttl: Duration, enabled: bool) -> Self {
        Self {
            state: Mutex::new(CacheState {
                entries: HashMap::new(),
                ttl,
                enabled,
            }),
        }
    }

    /// Store a value under `key`, replacing any previous entry and resetting
    /// its expiration. No-op while the cache is disabled.
    pub fn set(&self, key: &str, data: Value) {
        let mut state = self.state.lock();
        if !state.enabled {
            return;
        }
        let expires_at = Instant::now() + state.ttl;
        state
            .entries
            .insert(key.to_string(), CacheEntry { data, expires_at });
    }

    /// Fetch a fresh value. A found-but-expired entry is evicted on the spot
    /// and reported as a miss — stale data is never returned.
    pub fn get(&self, key: &str) -> Option<Value> {
        let mut state = self.state.lock();
        if !state.enabled {
            return None;
        }
        match state.entries.get(key) {
            Some(entry) if entry.expires_at >= Instant::now() => Some(entry.data.clone()),
            Some(_) => {
                state.entries.remove(key);
                None
            }
            None => None,
        }
    }

    /// Freshness check with the same eviction semantics as [`get`].
    ///
    /// [`get`]: SchemaCache::get
    pub fn has(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Evict every key matching `pattern`, or everything when no pattern is
    /// given.
    pub fn invalidate(&self, pattern: Option<&Regex>) {
        let mut state = self.state.lock();
        match pattern {
            Some(re) => state.entries.retain(|key, _| !re.is_match(key)),
            None => state.entries.clear(),
        }
    }

    /// Evict all currently-expired entries. Returns the eviction count for
    /// logging.
    pub fn sweep(&self) -> usize {
        let mut state = self.state.lock();
        let now = Instant::now();
        let before = state.entries.len();
        state.entries.retain(|_, entry| entry.expires_at >= now);
        before - state.entries.len()
    }

    /// Enable or disable caching. Disabling clears all entries; re-enabling
    /// starts from an empty cache.
    pub fn set_enabled(&self, enabled: bool) {
        let mut state = self.state.lock();
        state.enabled = enabled;
        if !enabled {
            state.entries.clear();
        }
    }

    /// Change the TTL for entries created after this call. Already-stored
    /// entries keep their original expiration.
    pub fn set_ttl(&self, ttl: Duration) {
        self.state.lock().ttl = ttl;
    }

    pub fn stats(&self) -> CacheStats {
        let state = self.state.lock();
        CacheStats {
            size: state.entries.len(),
            enabled: state.enabled,
            ttl: state.ttl,
            keys: state.entries.keys().cloned().collect(),
        }
    }
}

/// Derive a cache key from an operation name and its parameters, in order.
///
/// Identical operation and parameters always collide; a different operation
/// or a different parameter order never does. Parameters are not normalized.
pub fn cache_key(operation: &str, params: &[&str]) -> String {
    let mut key = String::from(operation);
    for param in params {
        key.push(':');
        key.push_str(param);
    }
    key
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::thread::sleep;

    #[test]
    fn returns_value_before_expiry_and_misses_after() {
        let cache = SchemaCache::new(Duration::from_millis(40), true);
        cache.set("k", json!({"a": 1}));

        assert_eq!(cache.get("k"), Some(json!({"a": 1})));
        sleep(Duration::from_millis(60));
        assert_eq!(cache.get("k"), None);
        // Lazy eviction removed the entry, not just hid it.
        assert_eq!(cache.stats().size, 0);
    }

    #[test]
    fn set_overwrites_and_resets_expiration() {
        let cache = SchemaCache::new(Duration::from_millis(50), true);
        cache.set("k", json!(1));
        sleep(Duration::from_millis(30));
        cache.set("k", json!(2));
        sleep(Duration::from_millis(30));
        // 60ms after the first set, but only 30ms after the overwrite.
        assert_eq!(cache.get("k"), Some(json!(2)));
    }

    #[test]
    fn disabling_clears_all_entries() {
        let cache = SchemaCache::new(Duration::from_secs(60), true);
        cache.set("a", json!(1));
        cache.set("b", json!(2));

        cache.set_enabled(false);
        assert_eq!(cache.stats().size, 0);
        assert_eq!(cache.get("a"), None);

        // Re-enabling starts empty; no resurrection.
        cache.set_enabled(true);
        assert_eq!(cache.get("a"), None);
        assert_eq!(cache.get("b"), None);
    }

    #[test]
    fn disabled_cache_ignores_set() {
        let cache = SchemaCache::new(Duration::from_secs(60), false);
        cache.set("a", json!(1));
        assert_eq!(cache.stats().size, 0);
        assert!(!cache.has("a"));
    }

    #[test]
    fn pattern_invalidation_leaves_other_keys() {
        let cache = SchemaCache::new(Duration::from_secs(60), true);
        cache.set("list_tables:Sales", json!(1));
        cache.set("list_tables:Inventory", json!(2));
        cache.set("list_views:Sales", json!(3));

        let pattern = Regex::new("^list_tables:").unwrap();
        cache.invalidate(Some(&pattern));

        assert!(!cache.has("list_tables:Sales"));
        assert!(!cache.has("list_tables:Inventory"));
        assert!(cache.has("list_views:Sales"));
    }

    #[test]
    fn full_invalidation_clears_everything() {
        let cache = SchemaCache::new(Duration::from_secs(60), true);
        cache.set("a", json!(1));
        cache.set("b", json!(2));
        cache.invalidate(None);
        assert_eq!(cache.stats().size, 0);
    }

    #[test]
    fn ttl_change_affects_only_new_entries() {
        let cache = SchemaCache::new(Duration::from_secs(60), true);
        cache.set("old", json!(1));

        cache.set_ttl(Duration::from_millis(20));
        cache.set("new", json!(2));
        sleep(Duration::from_millis(40));

        assert!(cache.has("old"), "entry stored before set_ttl keeps its expiration");
        assert!(!cache.has("new"));
    }

    #[test]
    fn sweep_evicts_only_expired_entries() {
        let cache = SchemaCache::new(Duration::from_millis(20), true);
        cache.set("short", json!(1));
        cache.set_ttl(Duration::from_secs(60));
        cache.set("long", json!(2));

        sleep(Duration::from_millis(40));
        let evicted = cache.sweep();

        assert_eq!(evicted, 1);
        assert!(cache.has("long"));
    }

    #[test]
    fn cache_key_is_deterministic_and_order_sensitive() {
        assert_eq!(
            cache_key("describe_table", &["Sales", "dbo.Orders"]),
            cache_key("describe_table", &["Sales", "dbo.Orders"]),
        );
        assert_ne!(
            cache_key("describe_table", &["Sales", "dbo.Orders"]),
            cache_key("describe_table", &["dbo.Orders", "Sales"]),
        );
        assert_ne!(
            cache_key("list_tables", &["Sales"]),
            cache_key("list_views", &["Sales"]),
        );
        assert_eq!(cache_key("list_databases", &["true"]), "list_databases:true");
    }
}
