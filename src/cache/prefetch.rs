//! Asynchronous cache warming.
//!
//! The prefetcher never blocks its caller and never decodes a path twice:
//! requests for paths already cached or already in flight are silently
//! dropped, as are decode failures — warming the cache is best-effort.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use dashmap::DashMap;
use tracing::debug;

use super::memory::ImageCache;
use crate::decode::ImageLoader;
use crate::pool::{Priority, Task, ThreadPool};

/// Speculative cache population on the thread pool's prefetch lane.
pub struct Prefetcher {
    cache: Arc<ImageCache>,
    pool: Arc<ThreadPool>,
    loader: Arc<dyn ImageLoader>,
    /// Paths with a decode task queued or running.
    in_flight: Arc<DashMap<PathBuf, ()>>,
    enabled: AtomicBool,
}

impl Prefetcher {
    pub fn new(cache: Arc<ImageCache>, pool: Arc<ThreadPool>, loader: Arc<dyn ImageLoader>) -> Self {
        Self {
            cache,
            pool,
            loader,
            in_flight: Arc::new(DashMap::new()),
            enabled: AtomicBool::new(true),
        }
    }

    /// Turn prefetching on or off. When off, requests are dropped.
    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::Relaxed);
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Relaxed)
    }

    /// Queue a speculative decode for one path.
    pub fn prefetch(&self, path: &Path) {
        if let Some(task) = self.make_task(path) {
            self.pool.submit(Priority::Prefetch, task);
        }
    }

    /// Queue speculative decodes for a batch of paths in one submission.
    pub fn prefetch_batch(&self, paths: &[PathBuf]) {
        let tasks: Vec<Task> = paths.iter().filter_map(|path| self.make_task(path)).collect();
        self.pool.submit_batch(Priority::Prefetch, tasks);
    }

    /// Paths currently queued or decoding.
    pub fn in_flight_count(&self) -> usize {
        self.in_flight.len()
    }

    /// Build the decode task, or `None` when the request should be
    /// dropped (disabled, already cached, or already in flight).
    fn make_task(&self, path: &Path) -> Option<Task> {
        if !self.is_enabled() || self.cache.contains(path) {
            return None;
        }
        // insert-if-absent is the dedup point for concurrent requests.
        if self.in_flight.insert(path.to_path_buf(), ()).is_some() {
            return None;
        }

        let cache = Arc::clone(&self.cache);
        let loader = Arc::clone(&self.loader);
        let in_flight = Arc::clone(&self.in_flight);
        let path = path.to_path_buf();

        Some(Box::new(move || {
            match loader.load(&path) {
                Ok(image) => cache.put_prefetched(&path, Arc::new(image)),
                // Best-effort: a failed prefetch is not an error.
                Err(err) => debug!(path = %path.display(), error = %err, "prefetch dropped"),
            }
            in_flight.remove(&path);
        }))
    }
}
