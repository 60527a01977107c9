//! Thread pool configuration.
//!
//! The spin and yield attempt counts trade wakeup latency against idle CPU
//! burn and are platform-tunable, so they live here rather than as
//! hard-coded constants in the worker loop.

/// Phase-one dequeue attempts before a worker starts inserting pause hints.
pub const DEFAULT_SPIN_ATTEMPTS: usize = 64;

/// Phase-two dequeue attempts (with a pause hint between tries) before a
/// worker parks on the condition variable.
pub const DEFAULT_YIELD_ATTEMPTS: usize = 32;

/// Fallback CPU count when detection fails.
pub const FALLBACK_CPU_COUNT: usize = 4;

/// Default worker count: all cores but one, minimum two.
///
/// One core stays free for the UI/render thread.
pub fn default_worker_count() -> usize {
    let cpus = std::thread::available_parallelism()
        .map(|p| p.get())
        .unwrap_or(FALLBACK_CPU_COUNT);
    if cpus > 2 {
        cpus - 1
    } else {
        2
    }
}

/// Configuration for [`ThreadPool`](super::ThreadPool).
#[derive(Debug, Clone)]
pub struct PoolConfig {
    /// Worker thread count; 0 selects [`default_worker_count`].
    pub worker_threads: usize,
    /// Phase-one dequeue attempts with no backoff.
    pub spin_attempts: usize,
    /// Phase-two dequeue attempts with a CPU pause hint between tries.
    pub yield_attempts: usize,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            worker_threads: 0,
            spin_attempts: DEFAULT_SPIN_ATTEMPTS,
            yield_attempts: DEFAULT_YIELD_ATTEMPTS,
        }
    }
}

impl PoolConfig {
    /// Set an explicit worker count.
    pub fn with_workers(mut self, count: usize) -> Self {
        self.worker_threads = count;
        self
    }

    /// Set the phase-one spin attempt count.
    pub fn with_spin_attempts(mut self, attempts: usize) -> Self {
        self.spin_attempts = attempts;
        self
    }

    /// Set the phase-two yield attempt count.
    pub fn with_yield_attempts(mut self, attempts: usize) -> Self {
        self.yield_attempts = attempts;
        self
    }

    /// Worker count after applying the CPU-based default.
    pub(crate) fn effective_worker_count(&self) -> usize {
        if self.worker_threads == 0 {
            default_worker_count()
        } else {
            self.worker_threads
        }
    }
}

impl From<&crate::config::PoolSettings> for PoolConfig {
    fn from(settings: &crate::config::PoolSettings) -> Self {
        Self {
            worker_threads: settings.worker_threads,
            spin_attempts: settings.spin_attempts,
            yield_attempts: settings.yield_attempts,
        }
    }
}
