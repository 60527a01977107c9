//! In-memory LRU cache of decoded images.

use std::collections::{HashMap, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};
use std::time::Instant;

use dashmap::DashMap;
use tracing::{debug, trace};

use super::stats::{CacheCounters, CacheStats};
use crate::decode::DecodedImage;

/// Default capacity: 512 MB of decoded pixels.
pub const DEFAULT_MAX_SIZE_BYTES: usize = 512 * 1024 * 1024;

/// One cached image plus its bookkeeping.
#[derive(Debug)]
struct CacheEntry {
    image: Arc<DecodedImage>,
    last_access: Instant,
    access_count: u64,
    size_bytes: usize,
    prefetched: bool,
    prefetch_time: Option<Instant>,
}

/// Metadata snapshot for one cached entry, for diagnostics.
#[derive(Debug, Clone, Copy)]
pub struct EntryMetadata {
    pub last_access: Instant,
    pub access_count: u64,
    pub size_bytes: usize,
    pub prefetched: bool,
    pub prefetch_time: Option<Instant>,
}

/// Index plus recency order, guarded together by one lock.
///
/// Invariants while the lock is held: every key in `entries` appears in
/// `order` exactly once, and `current_size` equals the sum of all entry
/// sizes.
struct CacheState {
    entries: HashMap<PathBuf, CacheEntry>,
    /// Recency order, most recently used at the front.
    order: VecDeque<PathBuf>,
    current_size: usize,
    max_size: usize,
}

impl CacheState {
    /// Remove the least-recently-used entry. Returns its size.
    fn evict_lru(&mut self) -> Option<usize> {
        let victim = self.order.pop_back()?;
        let entry = self.entries.remove(&victim)?;
        self.current_size -= entry.size_bytes;
        trace!(path = %victim.display(), bytes = entry.size_bytes, "evicted LRU entry");
        Some(entry.size_bytes)
    }

    /// Move a present path to the most-recently-used position.
    fn promote(&mut self, path: &Path) {
        if let Some(pos) = self.order.iter().position(|p| p == path) {
            if pos != 0 {
                if let Some(promoted) = self.order.remove(pos) {
                    self.order.push_front(promoted);
                }
            }
        }
    }
}

/// Thread-safe, byte-bounded LRU cache of decoded images.
///
/// Eviction is size-driven, not count-driven: one insert may evict zero,
/// one, or many older entries depending on relative sizes. A single entry
/// larger than the whole capacity is still accepted; the cache simply
/// exceeds its nominal bound until later inserts evict it. Capacity
/// pressure is never an error.
pub struct ImageCache {
    state: RwLock<CacheState>,
    counters: CacheCounters,
    /// Per-path access frequency, feeding predictive prefetch policies.
    access_history: DashMap<PathBuf, u64>,
}

impl ImageCache {
    /// Create a cache bounded to `max_size_bytes` of decoded pixels.
    pub fn new(max_size_bytes: usize) -> Self {
        Self {
            state: RwLock::new(CacheState {
                entries: HashMap::new(),
                order: VecDeque::new(),
                current_size: 0,
                max_size: max_size_bytes,
            }),
            counters: CacheCounters::default(),
            access_history: DashMap::new(),
        }
    }

    /// Look up a decoded image, returning a shared handle on a hit.
    ///
    /// A hit rewrites the recency order and per-entry access metadata, so
    /// lookups take the exclusive side of the lock — a shared lock here
    /// would need upgrading on every hit. The hit/miss counters are
    /// atomics and stay readable without this lock.
    ///
    /// A miss has no side effect beyond the counter; scheduling the decode
    /// is the caller's job.
    pub fn get(&self, path: &Path) -> Option<Arc<DecodedImage>> {
        let mut guard = self.state.write().unwrap();
        let state = &mut *guard;

        let Some(entry) = state.entries.get_mut(path) else {
            self.counters.record_miss();
            return None;
        };

        entry.last_access = Instant::now();
        entry.access_count += 1;
        let image = Arc::clone(&entry.image);

        state.promote(path);
        self.counters.record_hit();
        Some(image)
    }

    /// Insert a decoded image, evicting LRU entries to make room.
    ///
    /// A path that is already cached is silently ignored — there is no
    /// refresh-on-put; callers that want to replace an entry `remove` it
    /// first.
    pub fn put(&self, path: &Path, image: Arc<DecodedImage>) {
        self.insert(path, image, false);
    }

    /// Insert an image produced by the prefetcher.
    ///
    /// Same semantics as [`put`](Self::put), plus the prefetched flag,
    /// prefetch timestamp, and prefetch counter.
    pub fn put_prefetched(&self, path: &Path, image: Arc<DecodedImage>) {
        self.insert(path, image, true);
    }

    fn insert(&self, path: &Path, image: Arc<DecodedImage>, prefetched: bool) {
        let mut guard = self.state.write().unwrap();
        let state = &mut *guard;

        if state.entries.contains_key(path) {
            trace!(path = %path.display(), "put ignored, path already cached");
            return;
        }

        let size_bytes = image.byte_len();
        let mut evicted = 0u64;
        while state.current_size + size_bytes > state.max_size && !state.order.is_empty() {
            if state.evict_lru().is_none() {
                break;
            }
            evicted += 1;
        }
        if evicted > 0 {
            self.counters.record_evictions(evicted);
        }

        let now = Instant::now();
        state.order.push_front(path.to_path_buf());
        state.entries.insert(
            path.to_path_buf(),
            CacheEntry {
                image,
                last_access: now,
                access_count: 1,
                size_bytes,
                prefetched,
                prefetch_time: prefetched.then_some(now),
            },
        );
        state.current_size += size_bytes;

        if prefetched {
            self.counters.record_prefetch();
        }
    }

    /// Remove an entry if present; no-op otherwise.
    pub fn remove(&self, path: &Path) {
        let mut guard = self.state.write().unwrap();
        let state = &mut *guard;
        if let Some(entry) = state.entries.remove(path) {
            state.current_size -= entry.size_bytes;
            if let Some(pos) = state.order.iter().position(|p| p == path) {
                state.order.remove(pos);
            }
        }
    }

    /// Drop every entry. Cumulative statistics counters are kept.
    pub fn clear(&self) {
        let mut guard = self.state.write().unwrap();
        let state = &mut *guard;
        let dropped = state.entries.len();
        state.entries.clear();
        state.order.clear();
        state.current_size = 0;
        debug!(entries = dropped, "cache cleared");
    }

    /// Change the capacity, evicting from the LRU tail until it fits.
    pub fn resize(&self, new_max_size_bytes: usize) {
        let mut guard = self.state.write().unwrap();
        let state = &mut *guard;
        state.max_size = new_max_size_bytes;

        let mut evicted = 0u64;
        while state.current_size > state.max_size && !state.order.is_empty() {
            if state.evict_lru().is_none() {
                break;
            }
            evicted += 1;
        }
        if evicted > 0 {
            self.counters.record_evictions(evicted);
            debug!(
                evicted,
                new_max = new_max_size_bytes,
                "cache resized below contents"
            );
        }
    }

    /// Whether a path is currently cached. Does not touch recency.
    pub fn contains(&self, path: &Path) -> bool {
        self.state.read().unwrap().entries.contains_key(path)
    }

    /// Number of cached entries.
    pub fn entry_count(&self) -> usize {
        self.state.read().unwrap().entries.len()
    }

    /// Total decoded bytes currently held.
    pub fn size_bytes(&self) -> usize {
        self.state.read().unwrap().current_size
    }

    /// Configured capacity in bytes.
    pub fn max_size_bytes(&self) -> usize {
        self.state.read().unwrap().max_size
    }

    /// Consistent snapshot of the statistics.
    pub fn stats(&self) -> CacheStats {
        let state = self.state.read().unwrap();
        CacheStats {
            hits: self.counters.hits(),
            misses: self.counters.misses(),
            evictions: self.counters.evictions(),
            prefetches: self.counters.prefetches(),
            entry_count: state.entries.len(),
            current_size_bytes: state.current_size,
            max_size_bytes: state.max_size,
        }
    }

    /// Metadata for a cached entry, or `None` if absent. Does not touch
    /// recency.
    pub fn entry_metadata(&self, path: &Path) -> Option<EntryMetadata> {
        let state = self.state.read().unwrap();
        state.entries.get(path).map(|entry| EntryMetadata {
            last_access: entry.last_access,
            access_count: entry.access_count,
            size_bytes: entry.size_bytes,
            prefetched: entry.prefetched,
            prefetch_time: entry.prefetch_time,
        })
    }

    /// Record a user access for predictive prefetch policies.
    ///
    /// Independent of the cache contents: the history survives eviction.
    pub fn record_access(&self, path: &Path) {
        *self.access_history.entry(path.to_path_buf()).or_insert(0) += 1;
    }

    /// How many times a path has been recorded via
    /// [`record_access`](Self::record_access).
    pub fn access_frequency(&self, path: &Path) -> u64 {
        self.access_history.get(path).map(|count| *count).unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decode::{ImageInfo, PixelFormat};

    /// Image whose decoded length is exactly `size_bytes` (must be a
    /// multiple of 4).
    fn test_image(size_bytes: usize) -> Arc<DecodedImage> {
        assert_eq!(size_bytes % 4, 0);
        Arc::new(DecodedImage {
            info: ImageInfo {
                width: (size_bytes / 4) as u32,
                height: 1,
                format: PixelFormat::Bgra8,
                has_alpha: true,
            },
            source_path: PathBuf::from("synthetic"),
            pixels: vec![0u8; size_bytes],
        })
    }

    fn path(name: &str) -> PathBuf {
        PathBuf::from(format!("/gallery/{name}.png"))
    }

    #[test]
    fn new_cache_is_empty() {
        let cache = ImageCache::new(1_000_000);
        assert_eq!(cache.entry_count(), 0);
        assert_eq!(cache.size_bytes(), 0);
        assert_eq!(cache.max_size_bytes(), 1_000_000);
    }

    #[test]
    fn put_then_get_returns_the_same_image() {
        let cache = ImageCache::new(1_000_000);
        let image = test_image(64);
        cache.put(&path("a"), image.clone());

        let hit = cache.get(&path("a")).expect("should hit");
        assert!(Arc::ptr_eq(&hit, &image));

        let stats = cache.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 0);
    }

    #[test]
    fn get_on_absent_path_misses() {
        let cache = ImageCache::new(1_000_000);
        assert!(cache.get(&path("ghost")).is_none());

        let stats = cache.stats();
        assert_eq!(stats.hits, 0);
        assert_eq!(stats.misses, 1);
    }

    #[test]
    fn duplicate_put_is_ignored() {
        let cache = ImageCache::new(1_000_000);
        let first = test_image(64);
        let second = test_image(128);

        cache.put(&path("a"), first.clone());
        cache.put(&path("a"), second);

        assert_eq!(cache.entry_count(), 1);
        assert_eq!(cache.size_bytes(), 64);
        let hit = cache.get(&path("a")).unwrap();
        assert!(Arc::ptr_eq(&hit, &first));
    }

    #[test]
    fn size_accounting_tracks_every_entry() {
        let cache = ImageCache::new(1_000_000);
        cache.put(&path("a"), test_image(1000));
        assert_eq!(cache.size_bytes(), 1000);
        cache.put(&path("b"), test_image(2000));
        assert_eq!(cache.size_bytes(), 3000);

        cache.remove(&path("a"));
        assert_eq!(cache.size_bytes(), 2000);
        assert_eq!(cache.entry_count(), 1);
    }

    #[test]
    fn insert_evicts_least_recently_used_first() {
        // Capacity 100: three 40-byte entries cannot all fit.
        let cache = ImageCache::new(100);
        cache.put(&path("a"), test_image(40));
        cache.put(&path("b"), test_image(40));
        cache.put(&path("c"), test_image(40));

        assert!(!cache.contains(&path("a")), "oldest entry evicted");
        assert!(cache.contains(&path("b")));
        assert!(cache.contains(&path("c")));
        assert_eq!(cache.size_bytes(), 80);
        assert_eq!(cache.stats().evictions, 1);
    }

    #[test]
    fn get_refreshes_recency_and_changes_the_victim() {
        let cache = ImageCache::new(100);
        cache.put(&path("a"), test_image(40));
        cache.put(&path("b"), test_image(40));

        // Touch "a" so "b" becomes the LRU entry.
        cache.get(&path("a")).unwrap();
        cache.put(&path("c"), test_image(40));

        assert!(cache.contains(&path("a")), "recently read entry survives");
        assert!(!cache.contains(&path("b")), "unread entry is the victim");
        assert!(cache.contains(&path("c")));
    }

    #[test]
    fn one_insert_may_evict_many_entries() {
        let cache = ImageCache::new(100);
        cache.put(&path("a"), test_image(40));
        cache.put(&path("b"), test_image(40));
        cache.put(&path("big"), test_image(100));

        assert!(!cache.contains(&path("a")));
        assert!(!cache.contains(&path("b")));
        assert!(cache.contains(&path("big")));
        assert_eq!(cache.stats().evictions, 2);
    }

    #[test]
    fn oversized_entry_is_accepted() {
        let cache = ImageCache::new(1000);
        cache.put(&path("huge"), test_image(5000));

        assert!(cache.contains(&path("huge")));
        assert!(cache.size_bytes() > cache.max_size_bytes());

        // The next insert evicts it back under the bound.
        cache.put(&path("small"), test_image(400));
        assert!(!cache.contains(&path("huge")));
        assert!(cache.size_bytes() <= cache.max_size_bytes());
    }

    #[test]
    fn remove_then_get_always_misses() {
        let cache = ImageCache::new(1_000_000);
        cache.put(&path("a"), test_image(64));
        cache.remove(&path("a"));

        assert!(cache.get(&path("a")).is_none());
        assert_eq!(cache.stats().misses, 1);
    }

    #[test]
    fn remove_of_absent_path_is_a_noop() {
        let cache = ImageCache::new(1_000_000);
        cache.remove(&path("ghost"));
        assert_eq!(cache.entry_count(), 0);
    }

    #[test]
    fn clear_empties_but_keeps_counters() {
        let cache = ImageCache::new(1_000_000);
        cache.put(&path("a"), test_image(64));
        cache.get(&path("a"));
        cache.get(&path("ghost"));

        cache.clear();

        let stats = cache.stats();
        assert_eq!(stats.entry_count, 0);
        assert_eq!(stats.current_size_bytes, 0);
        assert_eq!(stats.hits, 1, "hit counter survives clear");
        assert_eq!(stats.misses, 1, "miss counter survives clear");
        assert!(!cache.contains(&path("a")));
    }

    #[test]
    fn resize_evicts_down_to_the_new_capacity() {
        let cache = ImageCache::new(300);
        cache.put(&path("a"), test_image(100));
        cache.put(&path("b"), test_image(100));
        cache.put(&path("c"), test_image(100));

        cache.resize(150);

        assert_eq!(cache.size_bytes(), 100);
        assert_eq!(cache.max_size_bytes(), 150);
        assert!(!cache.contains(&path("a")));
        assert!(!cache.contains(&path("b")));
        assert!(cache.contains(&path("c")));
        assert_eq!(cache.stats().evictions, 2);
    }

    #[test]
    fn shared_handle_outlives_eviction() {
        let cache = ImageCache::new(100);
        cache.put(&path("a"), test_image(80));
        let handle = cache.get(&path("a")).unwrap();

        // Force "a" out.
        cache.put(&path("b"), test_image(80));
        assert!(!cache.contains(&path("a")));

        // The reader's snapshot is still intact.
        assert_eq!(handle.byte_len(), 80);
    }

    #[test]
    fn prefetched_insert_marks_and_counts() {
        let cache = ImageCache::new(1_000_000);
        cache.put_prefetched(&path("a"), test_image(64));
        cache.put(&path("b"), test_image(64));

        let stats = cache.stats();
        assert_eq!(stats.prefetches, 1);
        assert_eq!(stats.entry_count, 2);

        let prefetched = cache.entry_metadata(&path("a")).unwrap();
        assert!(prefetched.prefetched);
        assert!(prefetched.prefetch_time.is_some());
        let direct = cache.entry_metadata(&path("b")).unwrap();
        assert!(!direct.prefetched);
        assert!(direct.prefetch_time.is_none());
    }

    #[test]
    fn entry_metadata_tracks_accesses() {
        let cache = ImageCache::new(1_000_000);
        cache.put(&path("a"), test_image(64));

        let before = cache.entry_metadata(&path("a")).unwrap();
        assert_eq!(before.access_count, 1);
        assert_eq!(before.size_bytes, 64);

        cache.get(&path("a"));
        cache.get(&path("a"));

        let after = cache.entry_metadata(&path("a")).unwrap();
        assert_eq!(after.access_count, 3);
        assert!(after.last_access >= before.last_access);
        assert!(cache.entry_metadata(&path("ghost")).is_none());
    }

    #[test]
    fn hit_rate_reflects_lookups() {
        let cache = ImageCache::new(1_000_000);
        cache.put(&path("a"), test_image(64));
        cache.get(&path("a"));
        cache.get(&path("a"));
        cache.get(&path("a"));
        cache.get(&path("ghost"));

        let stats = cache.stats();
        assert_eq!(stats.hits, 3);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.hit_rate(), 0.75);
    }

    #[test]
    fn access_history_is_independent_of_contents() {
        let cache = ImageCache::new(1_000_000);
        cache.record_access(&path("a"));
        cache.record_access(&path("a"));
        cache.record_access(&path("b"));

        assert_eq!(cache.access_frequency(&path("a")), 2);
        assert_eq!(cache.access_frequency(&path("b")), 1);
        assert_eq!(cache.access_frequency(&path("ghost")), 0);

        cache.clear();
        assert_eq!(cache.access_frequency(&path("a")), 2);
    }
}
