//! TOML configuration file for the command server.
//!
//! Looked up at `--config <PATH>` when given, otherwise at the
//! platform-appropriate default location:
//! - Windows:  `%APPDATA%\vListener\config.toml`
//! - Linux:    `$XDG_CONFIG_HOME/vlistener/config.toml` (or `~/.config/...`)
//! - macOS:    `~/Library/Application Support/vListener/config.toml`
//!
//! ```toml
//! [server]
//! host = "0.0.0.0"
//! port = 12345
//! pre_action_delay_ms = 2500
//! secret = "d41d8cd98f00b204e9800998ecf8427e"
//! response_mode = "fire_and_forget"
//!
//! [logging]
//! level = "debug"
//! ```
//!
//! Every field is optional; absent fields take the defaults below, and
//! command-line arguments or environment variables override the file.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;
use vlistener_core::domain::config::{DEFAULT_BACKLOG, DEFAULT_PRE_ACTION_DELAY};
use vlistener_core::protocol::framing::DEFAULT_READ_BUFFER_SIZE;
use vlistener_core::ResponseMode;

/// Error type for configuration file operations.
#[derive(Debug, Error)]
pub enum FileConfigError {
    /// A file system I/O error occurred.
    #[error("I/O error accessing config at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The TOML content could not be parsed.
    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),
}

// ── Config schema types ───────────────────────────────────────────────────────

/// Top-level contents of the config file.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct FileConfig {
    #[serde(default)]
    pub server: ServerSection,
    #[serde(default)]
    pub logging: LoggingSection,
}

/// `[server]` table.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct ServerSection {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_delay_ms")]
    pub pre_action_delay_ms: u64,
    /// Shared secret; there is deliberately no default.
    #[serde(default)]
    pub secret: Option<String>,
    #[serde(default)]
    pub response_mode: ResponseMode,
    #[serde(default = "default_read_buffer_size")]
    pub read_buffer_size: usize,
    #[serde(default = "default_backlog")]
    pub backlog: u32,
}

/// `[logging]` table.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct LoggingSection {
    /// `tracing` level used when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub level: String,
}

// ── Default helpers ───────────────────────────────────────────────────────────

fn default_host() -> String {
    "127.0.0.1".to_string()
}
fn default_port() -> u16 {
    12345
}
fn default_delay_ms() -> u64 {
    DEFAULT_PRE_ACTION_DELAY.as_millis() as u64
}
fn default_read_buffer_size() -> usize {
    DEFAULT_READ_BUFFER_SIZE
}
fn default_backlog() -> u32 {
    DEFAULT_BACKLOG
}
fn default_log_level() -> String {
    "info".to_string()
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            pre_action_delay_ms: default_delay_ms(),
            secret: None,
            response_mode: ResponseMode::default(),
            read_buffer_size: default_read_buffer_size(),
            backlog: default_backlog(),
        }
    }
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

// ── Loading ───────────────────────────────────────────────────────────────────

/// Resolves the default config file path for this platform.
///
/// Returns `None` when the platform base directory cannot be determined.
pub fn default_config_path() -> Option<PathBuf> {
    platform_config_dir().map(|dir| dir.join("config.toml"))
}

/// Loads and parses the config file at `path`.
///
/// # Errors
///
/// Returns [`FileConfigError::Io`] if the file cannot be read (including when
/// it does not exist) and [`FileConfigError::Parse`] if the TOML is malformed.
pub fn load_config(path: &Path) -> Result<FileConfig, FileConfigError> {
    let content = std::fs::read_to_string(path).map_err(|source| FileConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(toml::from_str(&content)?)
}

/// Like [`load_config`], but a missing file yields `Ok(None)`.
///
/// # Errors
///
/// Returns [`FileConfigError::Io`] for file-system errors other than "not
/// found", and [`FileConfigError::Parse`] if the TOML is malformed.
pub fn load_optional_config(path: &Path) -> Result<Option<FileConfig>, FileConfigError> {
    match load_config(path) {
        Ok(cfg) => Ok(Some(cfg)),
        Err(FileConfigError::Io { source, .. })
            if source.kind() == std::io::ErrorKind::NotFound =>
        {
            Ok(None)
        }
        Err(e) => Err(e),
    }
}

fn platform_config_dir() -> Option<PathBuf> {
    #[cfg(target_os = "windows")]
    {
        std::env::var_os("APPDATA").map(|p| PathBuf::from(p).join("vListener"))
    }

    #[cfg(target_os = "linux")]
    {
        let base = std::env::var_os("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .or_else(|| std::env::var_os("HOME").map(|h| PathBuf::from(h).join(".config")))?;
        Some(base.join("vlistener"))
    }

    #[cfg(target_os = "macos")]
    {
        std::env::var_os("HOME").map(|h| {
            PathBuf::from(h)
                .join("Library")
                .join("Application Support")
                .join("vListener")
        })
    }

    #[cfg(not(any(target_os = "windows", target_os = "linux", target_os = "macos")))]
    {
        None
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_file(name: &str, contents: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!(
            "vlistener-{}-{name}.toml",
            uuid::Uuid::new_v4()
        ));
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn test_empty_file_yields_defaults() {
        let cfg: FileConfig = toml::from_str("").unwrap();

        assert_eq!(cfg, FileConfig::default());
        assert_eq!(cfg.server.port, 12345);
        assert_eq!(cfg.server.pre_action_delay_ms, 2000);
        assert_eq!(cfg.server.secret, None);
        assert_eq!(cfg.server.response_mode, ResponseMode::Respond);
        assert_eq!(cfg.logging.level, "info");
    }

    #[test]
    fn test_partial_server_table_keeps_other_defaults() {
        // Arrange
        let text = r#"
            [server]
            port = 9000
            pre_action_delay_ms = 2500
            secret = "abc"
            response_mode = "fire_and_forget"
        "#;

        // Act
        let cfg: FileConfig = toml::from_str(text).unwrap();

        // Assert
        assert_eq!(cfg.server.port, 9000);
        assert_eq!(cfg.server.pre_action_delay_ms, 2500);
        assert_eq!(cfg.server.secret.as_deref(), Some("abc"));
        assert_eq!(cfg.server.response_mode, ResponseMode::FireAndForget);
        assert_eq!(cfg.server.host, "127.0.0.1");
        assert_eq!(cfg.server.read_buffer_size, 1024);
        assert_eq!(cfg.server.backlog, 5);
    }

    #[test]
    fn test_unknown_response_mode_is_parse_error() {
        let result: Result<FileConfig, _> = toml::from_str("[server]\nresponse_mode = \"shout\"");
        assert!(result.is_err());
    }

    #[test]
    fn test_load_config_reads_file() {
        let path = temp_file("load", "[logging]\nlevel = \"debug\"\n");

        let cfg = load_config(&path).unwrap();

        assert_eq!(cfg.logging.level, "debug");
        std::fs::remove_file(path).ok();
    }

    #[test]
    fn test_load_config_missing_file_is_io_error() {
        let path = std::env::temp_dir().join("vlistener-definitely-missing.toml");
        assert!(matches!(
            load_config(&path),
            Err(FileConfigError::Io { .. })
        ));
    }

    #[test]
    fn test_load_optional_config_missing_file_is_none() {
        let path = std::env::temp_dir().join("vlistener-definitely-missing.toml");
        assert!(load_optional_config(&path).unwrap().is_none());
    }

    #[test]
    fn test_load_config_malformed_toml_is_parse_error() {
        let path = temp_file("bad", "[server\nport = ");

        let result = load_config(&path);

        assert!(matches!(result, Err(FileConfigError::Parse(_))));
        std::fs::remove_file(path).ok();
    }
}
