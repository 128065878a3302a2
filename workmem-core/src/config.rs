//! Configuration loading and management
//!
//! Configuration is loaded from `~/.config/workmem/config.toml`
//!
//! This module follows the XDG Base Directory Specification for workmem's own files:
//! - Config: `$XDG_CONFIG_HOME/workmem/` (~/.config/workmem/)
//! - State/Logs: `$XDG_STATE_HOME/workmem/` (~/.local/state/workmem/)
//!
//! Activity streams and the session descriptor live under the base directory
//! (normally `$HOME`), shared with the session hooks that write the descriptor.

use crate::error::{Error, Result};
use chrono::NaiveDate;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Scratch path used when no home directory can be found.
const SCRATCH_BASE: &str = "/tmp";

/// Returns the base directory for session data.
///
/// Tries `$HOME`, then the OS home-directory API, then `/tmp`, so a usable
/// path is always returned.
pub fn base_dir() -> PathBuf {
    std::env::var_os("HOME")
        .filter(|home| !home.is_empty())
        .map(PathBuf::from)
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from(SCRATCH_BASE))
}

/// Returns XDG_CONFIG_HOME or ~/.config
fn xdg_config_home() -> PathBuf {
    std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| base_dir().join(".config"))
}

/// Returns XDG_STATE_HOME or ~/.local/state
fn xdg_state_home() -> PathBuf {
    std::env::var("XDG_STATE_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| base_dir().join(".local/state"))
}

/// Main configuration struct
#[derive(Debug, Deserialize, Default, Clone)]
pub struct Config {
    /// Where the session descriptor and activity streams live
    #[serde(default)]
    pub paths: PathsConfig,

    /// Diagnostic side-channel selection
    #[serde(default)]
    pub diagnostics: DiagnosticsConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Privacy sanitization
    #[serde(default)]
    pub privacy: PrivacyConfig,
}

/// Layout of session data relative to the base directory
#[derive(Debug, Deserialize, Clone)]
pub struct PathsConfig {
    /// Explicit base directory; when unset the base is resolved per call
    #[serde(default)]
    pub base_dir: Option<PathBuf>,

    /// Session data directory, relative to the base directory
    #[serde(default = "default_session_dir")]
    pub session_dir: PathBuf,

    /// Session descriptor file name inside `session_dir`
    #[serde(default = "default_descriptor_file")]
    pub descriptor_file: String,

    /// Activity stream directory name inside `session_dir`
    #[serde(default = "default_activity_subdir")]
    pub activity_subdir: String,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            base_dir: None,
            session_dir: default_session_dir(),
            descriptor_file: default_descriptor_file(),
            activity_subdir: default_activity_subdir(),
        }
    }
}

fn default_session_dir() -> PathBuf {
    PathBuf::from(".claude/cpi-si/system/data/session")
}

fn default_descriptor_file() -> String {
    "current-log.json".to_string()
}

fn default_activity_subdir() -> String {
    "activity".to_string()
}

/// Resolved filesystem locations for one logging call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivityPaths {
    /// Base directory everything else hangs off
    pub base_dir: PathBuf,
    /// Session descriptor JSON file
    pub descriptor_path: PathBuf,
    /// Directory holding one `{session_id}.jsonl` per session
    pub activity_dir: PathBuf,
}

impl ActivityPaths {
    /// Lay out paths under a given base directory.
    pub fn under(base: &Path, paths: &PathsConfig) -> Self {
        let session_dir = base.join(&paths.session_dir);
        Self {
            base_dir: base.to_path_buf(),
            descriptor_path: session_dir.join(&paths.descriptor_file),
            activity_dir: session_dir.join(&paths.activity_subdir),
        }
    }
}

/// Which diagnostic sink the logger reports to
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum SinkKind {
    /// Discard diagnostics
    #[default]
    None,
    /// Plain-text scratch files (success and error logs)
    Scratch,
    /// Forward to `tracing`
    Tracing,
}

/// Diagnostic side-channel configuration
#[derive(Debug, Deserialize, Clone, Default)]
pub struct DiagnosticsConfig {
    /// Sink to use
    #[serde(default)]
    pub sink: SinkKind,

    /// Directory for scratch files (defaults to the system temp dir)
    #[serde(default)]
    pub scratch_dir: Option<PathBuf>,
}

impl DiagnosticsConfig {
    /// Directory scratch diagnostics are written to
    pub fn scratch_dir(&self) -> PathBuf {
        self.scratch_dir.clone().unwrap_or_else(std::env::temp_dir)
    }
}

/// Logging configuration
#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Maximum number of log files to keep
    #[serde(default = "default_max_log_files")]
    pub max_files: usize,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            max_files: default_max_log_files(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_max_log_files() -> usize {
    5
}

/// How much of a path survives sanitization
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum PathMode {
    /// Final component only
    #[default]
    Basename,
    /// Whole path (home directory still replaced by the home token)
    Full,
}

/// How much of a shell command survives sanitization
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum CommandCapture {
    /// Program name only
    #[default]
    NameOnly,
    /// Program name and first argument
    NameAndSubcommand,
    /// Entire command line
    FullCommand,
}

/// Privacy sanitization configuration
#[derive(Debug, Deserialize, Clone)]
pub struct PrivacyConfig {
    /// Disable to record paths and commands verbatim
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Replacement for anything matching a sensitive keyword
    #[serde(default = "default_redaction_label")]
    pub redaction_label: String,

    /// Match keywords case-sensitively
    #[serde(default)]
    pub case_sensitive: bool,

    #[serde(default)]
    pub path_mode: PathMode,

    /// Replace the home directory prefix with `home_token`
    #[serde(default = "default_true")]
    pub sanitize_home: bool,

    #[serde(default = "default_home_token")]
    pub home_token: String,

    #[serde(default)]
    pub command_capture: CommandCapture,

    /// Honor `with_subcommand` patterns from the filters file
    #[serde(default)]
    pub capture_subcommands: bool,

    /// Upper bound on arguments captured for `with_subcommand` patterns
    #[serde(default)]
    pub max_args_capture: usize,

    /// Match `sensitive_path_patterns` from the filters file
    #[serde(default)]
    pub glob_patterns: bool,

    /// JSON-with-comments filters file (keywords, path and command patterns)
    #[serde(default)]
    pub filters_file: Option<PathBuf>,
}

impl Default for PrivacyConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            redaction_label: default_redaction_label(),
            case_sensitive: false,
            path_mode: PathMode::default(),
            sanitize_home: true,
            home_token: default_home_token(),
            command_capture: CommandCapture::default(),
            capture_subcommands: false,
            max_args_capture: 0,
            glob_patterns: false,
            filters_file: None,
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_redaction_label() -> String {
    "[PRIVATE]".to_string()
}

fn default_home_token() -> String {
    "~".to_string()
}

impl Config {
    /// Load configuration from the default path
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path();

        if !config_path.exists() {
            tracing::info!("No config file found at {:?}, using defaults", config_path);
            return Ok(Config::default());
        }

        Self::load_from(&config_path)
    }

    /// Load configuration, falling back to defaults on any error.
    ///
    /// Used by the zero-setup entry points, which must never fail on config.
    pub fn load_or_default() -> Self {
        Self::load().unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Invalid config, using defaults");
            Config::default()
        })
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("failed to read config file {:?}: {}", path, e)))?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| Error::Config(format!("failed to parse config: {}", e)))?;

        Ok(config)
    }

    /// Resolve where the descriptor and activity streams live right now.
    ///
    /// The base directory is looked up on every call unless pinned by
    /// `paths.base_dir`.
    pub fn resolve_paths(&self) -> ActivityPaths {
        let base = self.paths.base_dir.clone().unwrap_or_else(base_dir);
        ActivityPaths::under(&base, &self.paths)
    }

    /// Returns the default config file path
    ///
    /// `$XDG_CONFIG_HOME/workmem/config.toml` (~/.config/workmem/config.toml)
    pub fn config_path() -> PathBuf {
        xdg_config_home().join("workmem").join("config.toml")
    }

    /// Returns the state directory path (for logs)
    ///
    /// `$XDG_STATE_HOME/workmem/` (~/.local/state/workmem/)
    pub fn state_dir() -> PathBuf {
        xdg_state_home().join("workmem")
    }

    /// Returns the log file path for a given day
    ///
    /// Logs rotate daily: `$XDG_STATE_HOME/workmem/workmem.YYYY-MM-DD.log`
    pub fn log_path(date: NaiveDate) -> PathBuf {
        Self::state_dir().join(format!("workmem.{}.log", date.format("%Y-%m-%d")))
    }
}
