//! Request and prefetch orchestration.
//!
//! The pipeline is the seam the UI talks to: it resolves a path against
//! the cache, schedules decodes on the thread pool when it must, and keeps
//! the cache warm around the user's position. Everything it needs is
//! injected at construction — no process-wide singletons — so tests can
//! wire fakes for any piece.

use std::path::Path;
use std::sync::Arc;

use tracing::{info, warn};

use crate::cache::{AccessPredictor, CacheStats, ImageCache, Prefetcher, SequentialPredictor};
use crate::config::Settings;
use crate::decode::{DecodedImage, ImageDecoder, ImageLoader};
use crate::pool::{PoolConfig, Priority, ThreadPool};

pub use crate::decode::scan_directory;

/// Orchestrates cache lookups, on-demand decodes, and prefetch.
pub struct ImagePipeline {
    cache: Arc<ImageCache>,
    pool: Arc<ThreadPool>,
    loader: Arc<dyn ImageLoader>,
    prefetcher: Prefetcher,
    predictor: Arc<dyn AccessPredictor>,
}

impl ImagePipeline {
    /// Wire a pipeline with sequential-neighbor prefetch prediction.
    pub fn new(cache: Arc<ImageCache>, pool: Arc<ThreadPool>, loader: Arc<dyn ImageLoader>) -> Self {
        Self::with_predictor(cache, pool, loader, Arc::new(SequentialPredictor::default()))
    }

    /// Wire a pipeline with an explicit prediction policy.
    pub fn with_predictor(
        cache: Arc<ImageCache>,
        pool: Arc<ThreadPool>,
        loader: Arc<dyn ImageLoader>,
        predictor: Arc<dyn AccessPredictor>,
    ) -> Self {
        let prefetcher = Prefetcher::new(cache.clone(), pool.clone(), loader.clone());
        Self {
            cache,
            pool,
            loader,
            prefetcher,
            predictor,
        }
    }

    /// Build a fully wired pipeline from loaded settings.
    pub fn from_settings(settings: &Settings) -> Self {
        let cache = Arc::new(ImageCache::new(settings.cache.max_size_bytes()));
        let pool = Arc::new(ThreadPool::new(PoolConfig::from(&settings.pool)));
        let loader: Arc<dyn ImageLoader> = Arc::new(ImageDecoder::new());
        let predictor = Arc::new(SequentialPredictor::new(settings.prefetch.lookahead));
        let pipeline = Self::with_predictor(cache, pool, loader, predictor);
        pipeline.prefetcher.set_enabled(settings.prefetch.enabled);
        pipeline
    }

    /// Resolve `path`, invoking `on_ready` with a shared handle to the
    /// decoded image.
    ///
    /// A cache hit runs the callback on the calling thread. A miss
    /// schedules the decode at the *front* of the on-demand lane — the
    /// image the user just scrolled to jumps everything already queued —
    /// and runs the callback on the worker. A failed decode drops the
    /// request with a warning; nothing is cached.
    ///
    /// Concurrent requests for the same missing path each schedule their
    /// own decode (the cache keeps only the first result); coalescing
    /// them is the caller's concern.
    pub fn request<F>(&self, path: &Path, on_ready: F)
    where
        F: FnOnce(Arc<DecodedImage>) + Send + 'static,
    {
        self.cache.record_access(path);
        self.predictor.record(path);

        if let Some(image) = self.cache.get(path) {
            on_ready(image);
            return;
        }

        let cache = Arc::clone(&self.cache);
        let loader = Arc::clone(&self.loader);
        let path = path.to_path_buf();
        self.pool.submit_front(Priority::OnDemand, move || match loader.load(&path) {
            Ok(image) => {
                let image = Arc::new(image);
                cache.put(&path, Arc::clone(&image));
                on_ready(image);
            }
            Err(err) => warn!(path = %path.display(), error = %err, "on-demand decode failed"),
        });
    }

    /// Warm the cache around `path` using the prediction policy.
    pub fn prefetch_around(&self, path: &Path) {
        let predicted = self.predictor.predict(path);
        if !predicted.is_empty() {
            self.prefetcher.prefetch_batch(&predicted);
        }
    }

    /// The prefetcher, for direct warming and the enabled toggle.
    pub fn prefetcher(&self) -> &Prefetcher {
        &self.prefetcher
    }

    /// Snapshot of the cache statistics.
    pub fn stats(&self) -> CacheStats {
        self.cache.stats()
    }

    /// Block until no decode or prefetch work remains.
    pub fn wait_idle(&self) {
        self.pool.wait_idle();
    }

    /// Drain outstanding work, stop the pool, and log the final cache
    /// statistics.
    pub fn shutdown(&self) {
        self.pool.wait_idle();
        self.pool.shutdown();
        info!("{}", self.cache.stats().report());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decode::{DecodeError, ImageInfo, PixelFormat};
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::mpsc;
    use std::time::Duration;
    use tempfile::TempDir;

    struct CountingLoader {
        loads: AtomicUsize,
    }

    impl ImageLoader for CountingLoader {
        fn load(&self, path: &Path) -> Result<DecodedImage, DecodeError> {
            self.loads.fetch_add(1, Ordering::SeqCst);
            Ok(DecodedImage {
                info: ImageInfo {
                    width: 2,
                    height: 2,
                    format: PixelFormat::Bgra8,
                    has_alpha: true,
                },
                source_path: path.to_path_buf(),
                pixels: vec![7u8; 16],
            })
        }
    }

    struct FailingLoader;

    impl ImageLoader for FailingLoader {
        fn load(&self, path: &Path) -> Result<DecodedImage, DecodeError> {
            Err(DecodeError::UnsupportedFormat {
                path: path.to_path_buf(),
            })
        }
    }

    fn fixture(loader: Arc<dyn ImageLoader>) -> (ImagePipeline, Arc<ImageCache>) {
        let cache = Arc::new(ImageCache::new(10_000_000));
        let pool = Arc::new(ThreadPool::new(PoolConfig::default().with_workers(2)));
        let pipeline = ImagePipeline::new(cache.clone(), pool, loader);
        (pipeline, cache)
    }

    #[test]
    fn miss_decodes_then_subsequent_requests_hit() {
        let loader = Arc::new(CountingLoader {
            loads: AtomicUsize::new(0),
        });
        let (pipeline, cache) = fixture(loader.clone());
        let path = PathBuf::from("/gallery/photo.png");

        let (tx, rx) = mpsc::channel();
        pipeline.request(&path, move |image| {
            tx.send(image).unwrap();
        });
        let decoded = rx.recv_timeout(Duration::from_secs(5)).unwrap();
        assert_eq!(decoded.byte_len(), 16);
        assert_eq!(loader.loads.load(Ordering::SeqCst), 1);
        assert!(cache.contains(&path));

        // Now a hit: callback fires synchronously, no second decode.
        let (tx, rx) = mpsc::channel();
        pipeline.request(&path, move |image| {
            tx.send(image).unwrap();
        });
        assert!(rx.try_recv().is_ok(), "hit callback runs on the caller");
        assert_eq!(loader.loads.load(Ordering::SeqCst), 1);

        let stats = pipeline.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert_eq!(cache.access_frequency(&path), 2);
    }

    #[test]
    fn failed_decode_caches_nothing() {
        let (pipeline, cache) = fixture(Arc::new(FailingLoader));
        let path = PathBuf::from("/gallery/broken.png");

        let (tx, rx) = mpsc::channel::<Arc<DecodedImage>>();
        pipeline.request(&path, move |image| {
            tx.send(image).unwrap();
        });
        pipeline.wait_idle();

        assert!(rx.try_recv().is_err(), "callback never fires on failure");
        assert!(!cache.contains(&path));
    }

    #[test]
    fn prefetch_around_warms_the_neighbors() {
        let dir = TempDir::new().unwrap();
        let mut paths = Vec::new();
        for name in ["a.png", "b.png", "c.png", "d.png"] {
            let path = dir.path().join(name);
            std::fs::write(&path, b"").unwrap();
            paths.push(path);
        }

        let loader = Arc::new(CountingLoader {
            loads: AtomicUsize::new(0),
        });
        let (pipeline, cache) = fixture(loader.clone());

        // Default lookahead 2 from "b": predicts c, d, and a.
        pipeline.prefetch_around(&paths[1]);
        pipeline.wait_idle();

        assert!(cache.contains(&paths[0]));
        assert!(cache.contains(&paths[2]));
        assert!(cache.contains(&paths[3]));
        assert!(!cache.contains(&paths[1]), "current image is not prefetched");
        assert_eq!(pipeline.stats().prefetches, 3);
    }

    #[test]
    fn from_settings_wires_the_prefetch_toggle() {
        let mut settings = Settings::default();
        settings.pool.worker_threads = 1;
        settings.prefetch.enabled = false;

        let pipeline = ImagePipeline::from_settings(&settings);
        assert!(!pipeline.prefetcher().is_enabled());
        assert_eq!(pipeline.stats().max_size_bytes, settings.cache.max_size_bytes());
        pipeline.shutdown();
    }

    #[test]
    fn shutdown_drains_and_reports() {
        let loader = Arc::new(CountingLoader {
            loads: AtomicUsize::new(0),
        });
        let (pipeline, _cache) = fixture(loader);
        let (tx, rx) = mpsc::channel();
        pipeline.request(Path::new("/gallery/z.png"), move |image| {
            tx.send(image).unwrap();
        });
        pipeline.shutdown();
        assert!(rx.recv_timeout(Duration::from_secs(5)).is_ok());
    }
}
