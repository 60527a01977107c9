//! Settings structs for all configuration sections.
//!
//! Each struct represents one `[section]` of the INI config file. These
//! are pure data types; parsing and validation live in [`super::file`],
//! defaults in [`super::defaults`].

use std::path::PathBuf;

/// Complete application configuration loaded from `config.ini`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub cache: CacheSettings,
    pub pool: PoolSettings,
    pub prefetch: PrefetchSettings,
    pub logging: LoggingSettings,
}

/// `[cache]` section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheSettings {
    /// Decoded-image budget in megabytes.
    pub max_size_mb: usize,
}

impl CacheSettings {
    /// The budget in bytes, as the cache consumes it.
    pub fn max_size_bytes(&self) -> usize {
        self.max_size_mb * 1024 * 1024
    }
}

/// `[pool]` section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolSettings {
    /// Worker thread count; 0 selects all cores but one.
    pub worker_threads: usize,
    /// Idle-phase spin attempts before pause hints start.
    pub spin_attempts: usize,
    /// Pause-hint attempts before a worker parks.
    pub yield_attempts: usize,
}

/// `[prefetch]` section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrefetchSettings {
    pub enabled: bool,
    /// Forward neighbors predicted per request.
    pub lookahead: usize,
}

/// `[logging]` section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingSettings {
    /// Directory for log files.
    pub directory: PathBuf,
    /// Log file name within the directory.
    pub file_name: String,
}
