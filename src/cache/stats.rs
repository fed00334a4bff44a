//! Cache counters

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Default)]
pub(crate) struct StatsCounters {
    hits: AtomicU64,
    creations: AtomicU64,
    evictions: AtomicU64,
    eviction_failures: AtomicU64,
}

impl StatsCounters {
    pub(crate) fn snapshot(&self, live: usize) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            creations: self.creations.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
            eviction_failures: self.eviction_failures.load(Ordering::Relaxed),
            live,
        }
    }

    pub(crate) fn inc_hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn inc_creation(&self) {
        self.creations.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn inc_eviction(&self) {
        self.evictions.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn inc_eviction_failure(&self) {
        self.eviction_failures.fetch_add(1, Ordering::Relaxed);
    }
}

/// Point-in-time view of cache activity
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheStats {
    /// Loads served by an already-live handle
    pub hits: u64,
    /// Handles created (resources opened)
    pub creations: u64,
    /// Handles evicted after their last release
    pub evictions: u64,
    /// Evictions whose resource failed to close
    pub eviction_failures: u64,
    /// Handles currently in the cache
    pub live: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_reflects_counters() {
        let counters = StatsCounters::default();
        counters.inc_hit();
        counters.inc_hit();
        counters.inc_creation();
        counters.inc_eviction_failure();

        let stats = counters.snapshot(3);
        assert_eq!(stats.hits, 2);
        assert_eq!(stats.creations, 1);
        assert_eq!(stats.evictions, 0);
        assert_eq!(stats.eviction_failures, 1);
        assert_eq!(stats.live, 3);
    }

    #[test]
    fn stats_serialize_to_json() {
        let json = serde_json::to_value(CacheStats::default()).unwrap();
        assert_eq!(json["eviction_failures"], 0);
        assert_eq!(json["live"], 0);
    }
}
