//! Softcore Redux Settings
//!
//! Settings shared by the editor front end and the file-access daemon:
//! daemon connection and IPC limits, editor behavior (autosave delay, default
//! config document, allowed extensions) and logging.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs;

/// Env var naming an alternative settings file
pub const ENV_SETTINGS: &str = "REDUX_SETTINGS";
/// Env var overriding the daemon socket address
pub const ENV_SOCKET: &str = "REDUXD_SOCKET";
/// Env var overriding the per-connection in-flight limit
pub const ENV_MAX_INFLIGHT: &str = "REDUXD_IPC_MAX_INFLIGHT";
/// Env var overriding the auto-load document path
pub const ENV_CONFIG_PATH: &str = "REDUX_CONFIG_PATH";

/// Location of the mod's config relative to the editor executable.
pub const DEFAULT_CONFIG_PATH: &str = "../Kynexis-SoftcoreRedux/config/config.json5";

/// Settings loading and parsing errors
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("JSON parsing error: {0}")]
    JsonError(#[from] serde_json::Error),
    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),
    #[error("Invalid settings: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub daemon: DaemonSettings,
    pub editor: EditorSettings,
    pub logging: LoggingSettings,
}

/// Daemon connection and process settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DaemonSettings {
    /// Socket address for IPC connection
    pub daemon_socket: String,
    /// Start the daemon from the editor if it is not running
    pub auto_start: bool,
    /// Daemon executable path; looked up next to the editor when unset
    pub executable_path: Option<PathBuf>,
    /// Connection timeout in seconds
    pub connection_timeout: u64,
    /// Maximum frame size in bytes
    pub ipc_max_frame_bytes: u32,
    /// Default request timeout in milliseconds
    pub ipc_request_timeout_ms: u64,
    /// Concurrent requests allowed per connection before backpressure
    pub ipc_max_inflight_per_conn: usize,
}

/// Editor behavior settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorSettings {
    /// Debounce between the last accepted edit and the autosave
    pub autosave_delay_ms: u64,
    /// Document opened by auto-load; relative paths are resolved against the
    /// directory of the running executable
    pub config_path: PathBuf,
    /// File extensions the daemon agrees to read and write
    pub allowed_extensions: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// Default filter directive; `RUST_LOG` takes precedence
    pub level: String,
    /// Emit JSON lines instead of human-readable output
    pub json: bool,
    /// Directory for daily-rolling log files; none disables file output
    pub directory: Option<PathBuf>,
}

impl Default for DaemonSettings {
    fn default() -> Self {
        Self {
            daemon_socket: "127.0.0.1:8878".to_string(),
            auto_start: true,
            executable_path: None,
            connection_timeout: 5,
            ipc_max_frame_bytes: 1024 * 1024, // 1 MiB
            ipc_request_timeout_ms: 30_000,
            ipc_max_inflight_per_conn: 64,
        }
    }
}

impl Default for EditorSettings {
    fn default() -> Self {
        Self {
            autosave_delay_ms: 5_000,
            config_path: PathBuf::from(DEFAULT_CONFIG_PATH),
            allowed_extensions: vec!["json5".to_string(), "json".to_string()],
        }
    }
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
            directory: None,
        }
    }
}

impl EditorSettings {
    /// `config_path` made absolute against `base` when it is relative.
    pub fn config_path_from(&self, base: &Path) -> PathBuf {
        if self.config_path.is_absolute() {
            self.config_path.clone()
        } else {
            base.join(&self.config_path)
        }
    }

    /// `config_path` resolved against the running executable's directory.
    pub fn resolved_config_path(&self) -> Result<PathBuf, SettingsError> {
        let exe = std::env::current_exe()?;
        let base = exe.parent().unwrap_or_else(|| Path::new("."));
        Ok(self.config_path_from(base))
    }
}

impl Settings {
    /// Load from `REDUX_SETTINGS` or the default location, then apply
    /// environment overrides and validate.
    pub async fn load() -> Result<Self, SettingsError> {
        let mut settings = Self::load_from_path(Self::settings_path()).await?;
        settings.apply_overrides(|key| std::env::var(key).ok())?;
        settings.validate()?;
        Ok(settings)
    }

    /// Load settings from a specific path; a missing file yields defaults.
    pub async fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self, SettingsError> {
        let path = path.as_ref();

        if !fs::try_exists(path).await.unwrap_or(false) {
            tracing::info!("Settings file not found at {:?}, using defaults", path);
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path).await?;
        Self::from_str_any(&content)
    }

    /// JSON first, then TOML. The TOML error is reported when both fail.
    pub fn from_str_any(content: &str) -> Result<Self, SettingsError> {
        if let Ok(settings) = serde_json::from_str::<Self>(content) {
            Ok(settings)
        } else {
            Ok(toml::from_str::<Self>(content)?)
        }
    }

    /// Save as pretty JSON, creating parent directories.
    pub async fn save_to_path<P: AsRef<Path>>(&self, path: P) -> Result<(), SettingsError> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }

        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content).await?;

        tracing::info!("Settings saved to {:?}", path);
        Ok(())
    }

    /// Settings file in use: `REDUX_SETTINGS` when set, else the default.
    pub fn settings_path() -> PathBuf {
        std::env::var_os(ENV_SETTINGS)
            .map(PathBuf::from)
            .unwrap_or_else(Self::default_config_path)
    }

    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from(".softcore-redux"))
            .join("softcore-redux")
            .join("settings.json")
    }

    /// Apply overrides from a variable lookup (the process environment in
    /// production).
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), SettingsError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(socket) = lookup(ENV_SOCKET) {
            self.daemon.daemon_socket = socket;
        }
        if let Some(raw) = lookup(ENV_MAX_INFLIGHT) {
            self.daemon.ipc_max_inflight_per_conn = raw.trim().parse().map_err(|_| {
                SettingsError::Invalid(format!("{} must be a positive integer, got '{}'", ENV_MAX_INFLIGHT, raw))
            })?;
        }
        if let Some(path) = lookup(ENV_CONFIG_PATH) {
            self.editor.config_path = PathBuf::from(path);
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.daemon.daemon_socket.trim().is_empty() {
            return Err(SettingsError::Invalid(
                "daemon_socket cannot be empty".to_string(),
            ));
        }
        if self.daemon.ipc_max_frame_bytes == 0 {
            return Err(SettingsError::Invalid(
                "ipc_max_frame_bytes must be greater than 0".to_string(),
            ));
        }
        if self.daemon.ipc_max_inflight_per_conn == 0 {
            return Err(SettingsError::Invalid(
                "ipc_max_inflight_per_conn must be greater than 0".to_string(),
            ));
        }
        if self.editor.autosave_delay_ms == 0 {
            return Err(SettingsError::Invalid(
                "autosave_delay_ms must be greater than 0".to_string(),
            ));
        }
        if self.editor.allowed_extensions.is_empty() {
            return Err(SettingsError::Invalid(
                "allowed_extensions cannot be empty".to_string(),
            ));
        }
        Ok(())
    }
}
