//! Cache statistics tracking and reporting.

use std::sync::atomic::{AtomicU64, Ordering};

/// Monotonic cache counters.
///
/// Updated with relaxed atomics independently of the cache lock, so
/// diagnostics can read them without synchronizing against in-flight
/// operations; they are eventually consistent, never load-bearing.
#[derive(Debug, Default)]
pub(crate) struct CacheCounters {
    hits: AtomicU64,
    misses: AtomicU64,
    evictions: AtomicU64,
    prefetches: AtomicU64,
}

impl CacheCounters {
    pub(crate) fn record_hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_evictions(&self, count: u64) {
        self.evictions.fetch_add(count, Ordering::Relaxed);
    }

    pub(crate) fn record_prefetch(&self) {
        self.prefetches.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn hits(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }

    pub(crate) fn misses(&self) -> u64 {
        self.misses.load(Ordering::Relaxed)
    }

    pub(crate) fn evictions(&self) -> u64 {
        self.evictions.load(Ordering::Relaxed)
    }

    pub(crate) fn prefetches(&self) -> u64 {
        self.prefetches.load(Ordering::Relaxed)
    }
}

/// Point-in-time snapshot of cache statistics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    pub prefetches: u64,
    pub entry_count: usize,
    pub current_size_bytes: usize,
    pub max_size_bytes: usize,
}

impl CacheStats {
    /// Fraction of lookups that hit, 0.0 before any lookup.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }

    /// Human-readable report block for logs.
    pub fn report(&self) -> String {
        const MB: f64 = 1024.0 * 1024.0;
        format!(
            r#"Image Cache Statistics
  Entries:    {}
  Size:       {:.2} MB / {:.2} MB
  Hits:       {}
  Misses:     {}
  Hit Rate:   {:.1}%
  Evictions:  {}
  Prefetches: {}
"#,
            self.entry_count,
            self.current_size_bytes as f64 / MB,
            self.max_size_bytes as f64 / MB,
            self.hits,
            self.misses,
            self.hit_rate() * 100.0,
            self.evictions,
            self.prefetches,
        )
    }
}
