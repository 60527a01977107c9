//! Configuration file handling for `~/.lumenview/config.ini`.
//!
//! A missing file yields defaults; unknown sections and keys are ignored
//! so older binaries tolerate newer files. Values are range-checked on
//! load.

use std::path::{Path, PathBuf};

use ini::Ini;
use thiserror::Error;

use super::defaults::{MAX_CACHE_SIZE_MB, MAX_WORKER_THREADS, MIN_CACHE_SIZE_MB};
use super::settings::Settings;

/// Configuration file errors.
#[derive(Debug, Error)]
pub enum ConfigFileError {
    /// Failed to read or parse the config file
    #[error("failed to read config file: {0}")]
    Read(#[from] ini::Error),

    /// Failed to write the config file
    #[error("failed to write config file: {0}")]
    Write(String),

    /// A value failed parsing or validation
    #[error("invalid configuration: {section}.{key} = '{value}' - {reason}")]
    InvalidValue {
        section: String,
        key: String,
        value: String,
        reason: String,
    },

    /// Failed to create the config directory
    #[error("failed to create config directory: {0}")]
    Directory(std::io::Error),
}

fn invalid(section: &str, key: &str, value: &str, reason: &str) -> ConfigFileError {
    ConfigFileError::InvalidValue {
        section: section.to_string(),
        key: key.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

fn parse_usize(section: &str, key: &str, value: &str) -> Result<usize, ConfigFileError> {
    value
        .trim()
        .parse()
        .map_err(|_| invalid(section, key, value, "expected a non-negative integer"))
}

fn parse_bool(section: &str, key: &str, value: &str) -> Result<bool, ConfigFileError> {
    match value.trim() {
        "true" | "1" => Ok(true),
        "false" | "0" => Ok(false),
        _ => Err(invalid(section, key, value, "expected true or false")),
    }
}

impl Settings {
    /// Load from the default path (`~/.lumenview/config.ini`).
    pub fn load() -> Result<Self, ConfigFileError> {
        Self::load_from(&config_file_path())
    }

    /// Load from a specific path; a missing file returns defaults.
    pub fn load_from(path: &Path) -> Result<Self, ConfigFileError> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let ini = Ini::load_from_file(path)?;
        let mut settings = Self::default();

        if let Some(section) = ini.section(Some("cache")) {
            if let Some(value) = section.get("max_size_mb") {
                settings.cache.max_size_mb = parse_usize("cache", "max_size_mb", value)?;
            }
        }

        if let Some(section) = ini.section(Some("pool")) {
            if let Some(value) = section.get("worker_threads") {
                settings.pool.worker_threads = parse_usize("pool", "worker_threads", value)?;
            }
            if let Some(value) = section.get("spin_attempts") {
                settings.pool.spin_attempts = parse_usize("pool", "spin_attempts", value)?;
            }
            if let Some(value) = section.get("yield_attempts") {
                settings.pool.yield_attempts = parse_usize("pool", "yield_attempts", value)?;
            }
        }

        if let Some(section) = ini.section(Some("prefetch")) {
            if let Some(value) = section.get("enabled") {
                settings.prefetch.enabled = parse_bool("prefetch", "enabled", value)?;
            }
            if let Some(value) = section.get("lookahead") {
                settings.prefetch.lookahead = parse_usize("prefetch", "lookahead", value)?;
            }
        }

        if let Some(section) = ini.section(Some("logging")) {
            if let Some(value) = section.get("directory") {
                settings.logging.directory = PathBuf::from(value);
            }
            if let Some(value) = section.get("file") {
                settings.logging.file_name = value.to_string();
            }
        }

        settings.validate()?;
        Ok(settings)
    }

    /// Save to the default path.
    pub fn save(&self) -> Result<(), ConfigFileError> {
        self.save_to(&config_file_path())
    }

    /// Save to a specific path, creating parent directories as needed.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigFileError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(ConfigFileError::Directory)?;
        }

        let mut ini = Ini::new();
        ini.with_section(Some("cache"))
            .set("max_size_mb", self.cache.max_size_mb.to_string());
        ini.with_section(Some("pool"))
            .set("worker_threads", self.pool.worker_threads.to_string())
            .set("spin_attempts", self.pool.spin_attempts.to_string())
            .set("yield_attempts", self.pool.yield_attempts.to_string());
        ini.with_section(Some("prefetch"))
            .set("enabled", self.prefetch.enabled.to_string())
            .set("lookahead", self.prefetch.lookahead.to_string());
        ini.with_section(Some("logging"))
            .set("directory", self.logging.directory.display().to_string())
            .set("file", self.logging.file_name.clone());

        ini.write_to_file(path)
            .map_err(|e| ConfigFileError::Write(e.to_string()))
    }

    /// Range-check the loaded values.
    pub fn validate(&self) -> Result<(), ConfigFileError> {
        if !(MIN_CACHE_SIZE_MB..=MAX_CACHE_SIZE_MB).contains(&self.cache.max_size_mb) {
            return Err(invalid(
                "cache",
                "max_size_mb",
                &self.cache.max_size_mb.to_string(),
                &format!("must be between {MIN_CACHE_SIZE_MB} and {MAX_CACHE_SIZE_MB}"),
            ));
        }
        if self.pool.worker_threads > MAX_WORKER_THREADS {
            return Err(invalid(
                "pool",
                "worker_threads",
                &self.pool.worker_threads.to_string(),
                &format!("must be at most {MAX_WORKER_THREADS}"),
            ));
        }
        Ok(())
    }
}

/// Path to the config directory (`~/.lumenview`).
pub fn config_directory() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".lumenview")
}

/// Path to the config file (`~/.lumenview/config.ini`).
pub fn config_file_path() -> PathBuf {
    config_directory().join("config.ini")
}
