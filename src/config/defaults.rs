//! Default values and validation bounds for all settings.

use std::path::PathBuf;

use super::settings::{CacheSettings, LoggingSettings, PoolSettings, PrefetchSettings, Settings};
use crate::pool::{DEFAULT_SPIN_ATTEMPTS, DEFAULT_YIELD_ATTEMPTS};

/// Default decoded-image budget in megabytes.
pub const DEFAULT_CACHE_SIZE_MB: usize = 512;

/// Smallest accepted cache budget.
pub const MIN_CACHE_SIZE_MB: usize = 1;

/// Largest accepted cache budget.
pub const MAX_CACHE_SIZE_MB: usize = 8192;

/// Largest accepted explicit worker count.
pub const MAX_WORKER_THREADS: usize = 64;

/// Default forward prefetch lookahead.
pub const DEFAULT_PREFETCH_LOOKAHEAD: usize = crate::cache::DEFAULT_LOOKAHEAD;

/// Default log directory, relative to the working directory.
pub const DEFAULT_LOG_DIR: &str = "logs";

/// Default log file name.
pub const DEFAULT_LOG_FILE: &str = "lumenview.log";

impl Default for Settings {
    fn default() -> Self {
        Self {
            cache: CacheSettings::default(),
            pool: PoolSettings::default(),
            prefetch: PrefetchSettings::default(),
            logging: LoggingSettings::default(),
        }
    }
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            max_size_mb: DEFAULT_CACHE_SIZE_MB,
        }
    }
}

impl Default for PoolSettings {
    fn default() -> Self {
        Self {
            worker_threads: 0,
            spin_attempts: DEFAULT_SPIN_ATTEMPTS,
            yield_attempts: DEFAULT_YIELD_ATTEMPTS,
        }
    }
}

impl Default for PrefetchSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            lookahead: DEFAULT_PREFETCH_LOOKAHEAD,
        }
    }
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            directory: PathBuf::from(DEFAULT_LOG_DIR),
            file_name: DEFAULT_LOG_FILE.to_string(),
        }
    }
}
