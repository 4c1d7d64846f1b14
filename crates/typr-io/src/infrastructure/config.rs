//! TOML-based configuration for the Sender, the Listener and the consumer
//! binary.
//!
//! Reads and writes [`TyprConfig`] at the platform-appropriate path:
//! - Windows:  `%APPDATA%\typr-io\config.toml`
//! - Linux:    `$XDG_CONFIG_HOME/typr-io/config.toml` (or `~/.config/…`)
//! - macOS:    `~/Library/Application Support/typr-io/config.toml`
//!
//! ```toml
//! [sender]
//! key_delay_us = 1000
//! device_name = "Virtual Keyboard"
//!
//! [listener]
//! poll_interval_ms = 100
//!
//! [logging]
//! level = "info"
//! ```
//!
//! Every field has a serde default, so a missing file, a missing section,
//! or a missing key all fall back to the built-in values.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error type for configuration file operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The platform config directory could not be determined.
    #[error("could not determine platform config directory")]
    NoPlatformConfigDir,

    #[error("I/O error accessing config at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
}

// ── Config schema types ───────────────────────────────────────────────────────

/// Top-level configuration stored on disk.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct TyprConfig {
    #[serde(default)]
    pub sender: SenderConfig,
    #[serde(default)]
    pub listener: ListenerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Settings for the keyboard driver behind a `Sender`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SenderConfig {
    /// Pause between synthesized transitions, in microseconds.  `0`
    /// disables the pause, at the risk of events being dropped downstream.
    #[serde(default = "default_key_delay_us")]
    pub key_delay_us: u32,
    /// Name of the Linux virtual keyboard as shown by `libinput list-devices`.
    #[serde(default = "default_device_name")]
    pub device_name: String,
    #[serde(default = "default_vendor_id")]
    pub vendor_id: u16,
    #[serde(default = "default_product_id")]
    pub product_id: u16,
    /// Time allowed for udev to publish a freshly created device node
    /// before the first event is written.
    #[serde(default = "default_settle_ms")]
    pub settle_ms: u64,
}

/// Settings for the capture backend behind a `Listener`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ListenerConfig {
    /// Upper bound on how long a polling capture loop waits before
    /// re-checking its stop flag.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    /// Directory scanned for `event*` nodes (Linux only).
    #[serde(default = "default_device_dir")]
    pub device_dir: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LoggingConfig {
    /// `tracing` filter used when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl ListenerConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(1))
    }
}

// ── Default helpers ───────────────────────────────────────────────────────────

fn default_key_delay_us() -> u32 {
    typr_core::KeyDelay::DEFAULT_MICROS
}
fn default_device_name() -> String {
    "Virtual Keyboard".to_string()
}
fn default_vendor_id() -> u16 {
    0x1234
}
fn default_product_id() -> u16 {
    0x5678
}
fn default_settle_ms() -> u64 {
    100
}
fn default_poll_interval_ms() -> u64 {
    100
}
fn default_device_dir() -> PathBuf {
    PathBuf::from("/dev/input")
}
fn default_log_level() -> String {
    "info".to_string()
}

impl Default for SenderConfig {
    fn default() -> Self {
        Self {
            key_delay_us: default_key_delay_us(),
            device_name: default_device_name(),
            vendor_id: default_vendor_id(),
            product_id: default_product_id(),
            settle_ms: default_settle_ms(),
        }
    }
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval_ms(),
            device_dir: default_device_dir(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

// ── Config repository ─────────────────────────────────────────────────────────

/// Determines the platform-appropriate directory for the config file.
///
/// # Errors
///
/// Returns [`ConfigError::NoPlatformConfigDir`] when the base directory
/// cannot be determined from the environment.
pub fn config_dir() -> Result<PathBuf, ConfigError> {
    platform_config_dir().ok_or(ConfigError::NoPlatformConfigDir)
}

/// # Errors
///
/// Returns [`ConfigError::NoPlatformConfigDir`] if the base directory cannot
/// be determined.
pub fn config_file_path() -> Result<PathBuf, ConfigError> {
    Ok(config_dir()?.join("config.toml"))
}

/// Loads the config from the platform path.  A missing file yields
/// [`TyprConfig::default()`].
///
/// # Errors
///
/// [`ConfigError::Io`] for file-system errors other than "not found",
/// [`ConfigError::Parse`] for malformed TOML.
pub fn load_config() -> Result<TyprConfig, ConfigError> {
    load_config_from(&config_file_path()?)
}

/// Like [`load_config`], from an explicit path.
///
/// # Errors
///
/// Same as [`load_config`].
pub fn load_config_from(path: &Path) -> Result<TyprConfig, ConfigError> {
    match std::fs::read_to_string(path) {
        Ok(content) => Ok(toml::from_str(&content)?),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(TyprConfig::default()),
        Err(source) => Err(ConfigError::Io {
            path: path.to_path_buf(),
            source,
        }),
    }
}

/// Persists `config` to the platform path, creating the directory.
///
/// # Errors
///
/// [`ConfigError::Io`] for file-system failures or
/// [`ConfigError::Serialize`] if serialization fails.
pub fn save_config(config: &TyprConfig) -> Result<(), ConfigError> {
    save_config_to(config, &config_file_path()?)
}

/// Like [`save_config`], to an explicit path.
///
/// # Errors
///
/// Same as [`save_config`].
pub fn save_config_to(config: &TyprConfig, path: &Path) -> Result<(), ConfigError> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir).map_err(|source| ConfigError::Io {
            path: dir.to_path_buf(),
            source,
        })?;
    }

    let content = toml::to_string_pretty(config)?;
    std::fs::write(path, content).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn platform_config_dir() -> Option<PathBuf> {
    #[cfg(target_os = "windows")]
    {
        std::env::var_os("APPDATA").map(|p| PathBuf::from(p).join("typr-io"))
    }

    #[cfg(target_os = "linux")]
    {
        let base = std::env::var_os("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .or_else(|| std::env::var_os("HOME").map(|h| PathBuf::from(h).join(".config")))?;
        Some(base.join("typr-io"))
    }

    #[cfg(target_os = "macos")]
    {
        std::env::var_os("HOME").map(|h| {
            PathBuf::from(h)
                .join("Library")
                .join("Application Support")
                .join("typr-io")
        })
    }

    #[cfg(not(any(target_os = "windows", target_os = "linux", target_os = "macos")))]
    {
        None
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
