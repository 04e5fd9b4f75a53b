//! Configuration system for the `Tasklist` client.
//!
//! Supports layered configuration with the following priority (highest first):
//! 1. CLI arguments
//! 2. Environment variables (via clap `env` attribute)
//! 3. TOML config file (`~/.config/tasklist/config.toml`)
//! 4. Compiled defaults
//!
//! Missing config file is not an error (defaults are used). An explicit
//! `--config` path that doesn't exist is an error.

use std::path::PathBuf;
use std::time::Duration;

use crate::cli::Command;
use crate::storage::FileStore;

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file.
    #[error("failed to read config file {path}: {source}")]
    ReadFile {
        /// Path that was attempted.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// Failed to parse the TOML configuration.
    #[error("failed to parse config file: {0}")]
    ParseToml(#[from] toml::de::Error),
}

// ---------------------------------------------------------------------------
// TOML file structs (all fields Option for partial overrides)
// ---------------------------------------------------------------------------

/// Top-level TOML config file structure.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct ConfigFile {
    storage: StorageFileConfig,
    ui: UiFileConfig,
}

/// `[storage]` section of the config file.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct StorageFileConfig {
    data_dir: Option<PathBuf>,
    quota_bytes: Option<u64>,
}

/// `[ui]` section of the config file.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct UiFileConfig {
    poll_timeout_ms: Option<u64>,
    timestamp_format: Option<String>,
    notice_ticks: Option<u32>,
    max_text_len: Option<usize>,
}

// ---------------------------------------------------------------------------
// Resolved configuration (concrete types, all fields populated)
// ---------------------------------------------------------------------------

/// Default storage quota: 5 MiB, the usual browser local-storage allowance.
pub const DEFAULT_QUOTA_BYTES: u64 = 5 * 1024 * 1024;

/// Fully resolved client configuration.
#[derive(Debug, Clone)]
pub struct TasklistConfig {
    // -- Storage --
    /// Directory holding the persisted task collection.
    pub data_dir: PathBuf,
    /// Byte quota for the data directory (`None` = unlimited).
    pub quota_bytes: Option<u64>,

    // -- UI --
    /// Poll timeout for the TUI event loop.
    pub poll_timeout: Duration,
    /// Timestamp display format string (chrono).
    pub timestamp_format: String,
    /// How many event-loop ticks a notice stays on screen.
    pub notice_ticks: u32,
    /// Maximum task text length in characters accepted by the input form.
    pub max_text_len: usize,
}

impl Default for TasklistConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            quota_bytes: Some(DEFAULT_QUOTA_BYTES),
            poll_timeout: Duration::from_millis(50),
            timestamp_format: "%b %-d, %-I:%M %p".to_string(),
            notice_ticks: 60,
            max_text_len: 256,
        }
    }
}

impl TasklistConfig {
    /// Load configuration by merging CLI args, env vars, and a TOML file.
    ///
    /// CLI args and env vars are parsed via `clap`. If `--config` is given
    /// and the file does not exist, returns an error. If no `--config` is
    /// given, the default path (`~/.config/tasklist/config.toml`) is tried
    /// and silently ignored if missing.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the config file cannot be read or parsed.
    pub fn load(cli: &CliArgs) -> Result<Self, ConfigError> {
        let file = load_config_file(cli.config.as_deref())?;
        Ok(Self::resolve(cli, &file))
    }

    /// Like [`load`](Self::load), but a config file that cannot be read or
    /// parsed is skipped instead of failing: CLI args, env vars and defaults
    /// still apply. The file error is returned alongside for reporting.
    #[must_use]
    pub fn load_or_cli_only(cli: &CliArgs) -> (Self, Option<ConfigError>) {
        match Self::load(cli) {
            Ok(config) => (config, None),
            Err(e) => (Self::resolve(cli, &ConfigFile::default()), Some(e)),
        }
    }

    /// Resolve a `TasklistConfig` from CLI args and a parsed config file.
    ///
    /// Priority: CLI > file > default. Separated from `load()` so it can be
    /// tested without touching the file system.
    #[must_use]
    fn resolve(cli: &CliArgs, file: &ConfigFile) -> Self {
        let defaults = Self::default();

        Self {
            data_dir: cli
                .data_dir
                .clone()
                .or_else(|| file.storage.data_dir.clone())
                .unwrap_or(defaults.data_dir),
            quota_bytes: match file.storage.quota_bytes {
                Some(0) => None,
                Some(q) => Some(q),
                None => defaults.quota_bytes,
            },
            poll_timeout: file
                .ui
                .poll_timeout_ms
                .map_or(defaults.poll_timeout, Duration::from_millis),
            timestamp_format: cli
                .timestamp_format
                .clone()
                .or_else(|| file.ui.timestamp_format.clone())
                .unwrap_or(defaults.timestamp_format),
            notice_ticks: file.ui.notice_ticks.unwrap_or(defaults.notice_ticks),
            max_text_len: file.ui.max_text_len.unwrap_or(defaults.max_text_len),
        }
    }

    /// Build the [`FileStore`] described by the storage settings.
    #[must_use]
    pub fn file_store(&self) -> FileStore {
        FileStore::new(&self.data_dir).with_quota(self.quota_bytes)
    }
}

/// CLI arguments parsed by clap.
///
/// Without a subcommand the interactive TUI is started.
#[derive(clap::Parser, Debug, Default)]
#[command(version, about = "Terminal task tracker with local persistence")]
pub struct CliArgs {
    /// Path to config file (default: `~/.config/tasklist/config.toml`).
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Directory holding saved tasks.
    #[arg(long, env = "TASKLIST_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    /// Timestamp display format (chrono format string).
    #[arg(long)]
    pub timestamp_format: Option<String>,

    /// Log level filter (trace, debug, info, warn, error).
    #[arg(long, default_value = "info", env = "TASKLIST_LOG")]
    pub log_level: String,

    /// Path to log file (default: `$TMPDIR/tasklist.log`).
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// Run a single command instead of the interactive UI.
    #[command(subcommand)]
    pub command: Option<Command>,
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

/// `~/.local/share/tasklist` (or the platform equivalent), falling back to
/// `$TMPDIR/tasklist` when no data directory is known.
fn default_data_dir() -> PathBuf {
    dirs::data_dir().map_or_else(
        || std::env::temp_dir().join("tasklist"),
        |dir| dir.join("tasklist"),
    )
}

/// Load and parse a TOML config file.
///
/// If `explicit_path` is `Some`, the file must exist (error if not).
/// If `explicit_path` is `None`, the default path is tried and missing file
/// is treated as empty config.
fn load_config_file(explicit_path: Option<&std::path::Path>) -> Result<ConfigFile, ConfigError> {
    let path = if let Some(p) = explicit_path {
        let contents = std::fs::read_to_string(p).map_err(|e| ConfigError::ReadFile {
            path: p.to_path_buf(),
            source: e,
        })?;
        return Ok(toml::from_str(&contents)?);
    } else {
        let Some(config_dir) = dirs::config_dir() else {
            return Ok(ConfigFile::default());
        };
        config_dir.join("tasklist").join("config.toml")
    };

    match std::fs::read_to_string(&path) {
        Ok(contents) => Ok(toml::from_str(&contents)?),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(ConfigFile::default()),
        Err(e) => Err(ConfigError::ReadFile { path, source: e }),
    }
}
