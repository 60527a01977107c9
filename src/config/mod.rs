//! Application configuration.
//!
//! Settings load from `~/.lumenview/config.ini` with sensible defaults
//! for anything missing. Section structs live in [`settings`], constants
//! and `Default` impls in [`defaults`], file I/O and validation in
//! [`file`].

mod defaults;
mod file;
mod settings;

pub use defaults::{
    DEFAULT_CACHE_SIZE_MB, DEFAULT_LOG_DIR, DEFAULT_LOG_FILE, DEFAULT_PREFETCH_LOOKAHEAD,
    MAX_CACHE_SIZE_MB, MAX_WORKER_THREADS, MIN_CACHE_SIZE_MB,
};
pub use file::{config_directory, config_file_path, ConfigFileError};
pub use settings::{CacheSettings, LoggingSettings, PoolSettings, PrefetchSettings, Settings};
