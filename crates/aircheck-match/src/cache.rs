//! In-process bridge lookup cache.
//!
//! An explicit, injected LRU over signature key → recording id. One
//! instance per resolver; nothing process-wide, so parallel catalog
//! instances (tests especially) never leak state into each other.
//! Revocation must call [`BridgeCache::invalidate`] before the next
//! lookup, which the resolver does.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use aircheck_core::defaults;

struct CacheState {
    map: HashMap<String, i64>,
    /// Recency order, least-recent at the front.
    order: VecDeque<String>,
}

/// Bounded LRU cache of confirmed signature → recording mappings.
pub struct BridgeCache {
    capacity: usize,
    state: Mutex<CacheState>,
}

impl Default for BridgeCache {
    fn default() -> Self {
        Self::new(defaults::BRIDGE_CACHE_CAPACITY)
    }
}

impl BridgeCache {
    /// Create a cache holding at most `capacity` entries. A zero
    /// capacity disables caching entirely.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            state: Mutex::new(CacheState {
                map: HashMap::new(),
                order: VecDeque::new(),
            }),
        }
    }

    /// Look up a cached mapping, refreshing its recency.
    pub fn get(&self, signature: &str) -> Option<i64> {
        let mut state = self.state.lock().unwrap();
        let recording_id = *state.map.get(signature)?;
        promote(&mut state.order, signature);
        Some(recording_id)
    }

    /// Insert or refresh a mapping, evicting the least-recently-used
    /// entry when full.
    pub fn put(&self, signature: &str, recording_id: i64) {
        if self.capacity == 0 {
            return;
        }
        let mut state = self.state.lock().unwrap();
        if state.map.insert(signature.to_string(), recording_id).is_some() {
            promote(&mut state.order, signature);
            return;
        }
        state.order.push_back(signature.to_string());
        if state.map.len() > self.capacity {
            if let Some(evicted) = state.order.pop_front() {
                state.map.remove(&evicted);
            }
        }
    }

    /// Drop a mapping (bridge revoked).
    pub fn invalidate(&self, signature: &str) {
        let mut state = self.state.lock().unwrap();
        if state.map.remove(signature).is_some() {
            state.order.retain(|k| k != signature);
        }
    }

    /// Current entry count.
    pub fn len(&self) -> usize {
        self.state.lock().unwrap().map.len()
    }

    /// Whether the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn promote(order: &mut VecDeque<String>, signature: &str) {
    if let Some(pos) = order.iter().position(|k| k == signature) {
        order.remove(pos);
        order.push_back(signature.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_put_get_roundtrip() {
        let cache = BridgeCache::new(4);
        cache.put("sig-a", 1);
        assert_eq!(cache.get("sig-a"), Some(1));
        assert_eq!(cache.get("sig-b"), None);
    }

    #[test]
    fn test_evicts_least_recently_used() {
        let cache = BridgeCache::new(2);
        cache.put("a", 1);
        cache.put("b", 2);
        // Touch "a" so "b" becomes the eviction victim.
        cache.get("a");
        cache.put("c", 3);

        assert_eq!(cache.get("a"), Some(1));
        assert_eq!(cache.get("b"), None);
        assert_eq!(cache.get("c"), Some(3));
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_invalidate_removes_entry() {
        let cache = BridgeCache::new(4);
        cache.put("a", 1);
        cache.invalidate("a");
        assert_eq!(cache.get("a"), None);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_overwrite_updates_value() {
        let cache = BridgeCache::new(4);
        cache.put("a", 1);
        cache.put("a", 9);
        assert_eq!(cache.get("a"), Some(9));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_zero_capacity_disables() {
        let cache = BridgeCache::new(0);
        cache.put("a", 1);
        assert_eq!(cache.get("a"), None);
    }
}
