//! Server configuration snapshot.
//!
//! [`ServerConfig`] is built once (from CLI arguments, environment variables,
//! and an optional config file) and handed to the server at start.  Changing
//! any value requires stopping the server and starting a new one with a fresh
//! snapshot.

use std::net::SocketAddr;
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

use crate::protocol::framing::{DEFAULT_READ_BUFFER_SIZE, MAX_READ_BUFFER_SIZE};

/// Default listen address: loopback on the historical port.
pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:12345";

/// Default wait inserted before every simulated action.
pub const DEFAULT_PRE_ACTION_DELAY: Duration = Duration::from_millis(2000);

/// Default listen backlog.
pub const DEFAULT_BACKLOG: u32 = 5;

/// Errors found while validating a [`ServerConfig`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// No shared secret was supplied.
    #[error("no shared secret configured; set --secret, VLISTENER_SECRET, or [server].secret")]
    MissingSecret,

    /// The per-read buffer would be empty.
    #[error("read buffer size must be greater than zero")]
    ZeroReadBuffer,

    /// Each connection allocates this many bytes up front.
    #[error("read buffer size {size} exceeds the maximum of {max} bytes")]
    ReadBufferTooLarge { size: usize, max: usize },
}

/// Whether results are written back to the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseMode {
    /// Write each result string back on the same connection.
    #[default]
    Respond,
    /// Only log results; never write to the client.
    FireAndForget,
}

/// All runtime configuration for the command server.
#[derive(Clone)]
pub struct ServerConfig {
    /// Address and port the listener binds to.
    pub bind_addr: SocketAddr,
    /// Wait applied before every simulated action, after authentication.
    pub pre_action_delay: Duration,
    /// Shared secret compared verbatim against each command's `password`.
    pub secret: String,
    /// Whether results are echoed to the client.
    pub response_mode: ResponseMode,
    /// Maximum bytes requested per socket read.
    pub read_buffer_size: usize,
    /// Pending-connection backlog passed to `listen`.
    pub backlog: u32,
}

impl ServerConfig {
    /// Creates a config with defaults for everything except the secret.
    pub fn with_secret(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
            ..Self::default()
        }
    }

    /// Checks the invariants the server relies on.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingSecret`] for an empty secret,
    /// [`ConfigError::ZeroReadBuffer`] for a zero read buffer, and
    /// [`ConfigError::ReadBufferTooLarge`] above [`MAX_READ_BUFFER_SIZE`].
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.secret.is_empty() {
            return Err(ConfigError::MissingSecret);
        }
        if self.read_buffer_size == 0 {
            return Err(ConfigError::ZeroReadBuffer);
        }
        if self.read_buffer_size > MAX_READ_BUFFER_SIZE {
            return Err(ConfigError::ReadBufferTooLarge {
                size: self.read_buffer_size,
                max: MAX_READ_BUFFER_SIZE,
            });
        }
        Ok(())
    }
}

impl Default for ServerConfig {
    /// Defaults match the historical deployment, minus the secret, which must
    /// always be supplied.
    ///
    /// | Field            | Default           |
    /// |------------------|-------------------|
    /// | bind_addr        | `127.0.0.1:12345` |
    /// | pre_action_delay | 2000 ms           |
    /// | secret           | empty (invalid)   |
    /// | response_mode    | `Respond`         |
    /// | read_buffer_size | 1024              |
    /// | backlog          | 5                 |
    fn default() -> Self {
        Self {
            // Compile-time constant; always parses.
            bind_addr: DEFAULT_BIND_ADDR.parse().unwrap(),
            pre_action_delay: DEFAULT_PRE_ACTION_DELAY,
            secret: String::new(),
            response_mode: ResponseMode::default(),
            read_buffer_size: DEFAULT_READ_BUFFER_SIZE,
            backlog: DEFAULT_BACKLOG,
        }
    }
}

impl std::fmt::Debug for ServerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerConfig")
            .field("bind_addr", &self.bind_addr)
            .field("pre_action_delay", &self.pre_action_delay)
            .field("secret", &"<redacted>")
            .field("response_mode", &self.response_mode)
            .field("read_buffer_size", &self.read_buffer_size)
            .field("backlog", &self.backlog)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_bind_addr_is_loopback_12345() {
        let cfg = ServerConfig::default();
        assert_eq!(cfg.bind_addr.to_string(), "127.0.0.1:12345");
    }

    #[test]
    fn test_default_delay_is_two_seconds() {
        assert_eq!(
            ServerConfig::default().pre_action_delay,
            Duration::from_millis(2000)
        );
    }

    #[test]
    fn test_default_response_mode_is_respond() {
        assert_eq!(ServerConfig::default().response_mode, ResponseMode::Respond);
    }

    #[test]
    fn test_default_read_buffer_and_backlog() {
        let cfg = ServerConfig::default();
        assert_eq!(cfg.read_buffer_size, 1024);
        assert_eq!(cfg.backlog, 5);
    }

    #[test]
    fn test_default_config_fails_validation_without_secret() {
        assert_eq!(
            ServerConfig::default().validate(),
            Err(ConfigError::MissingSecret)
        );
    }

    #[test]
    fn test_with_secret_validates() {
        assert_eq!(ServerConfig::with_secret("pw").validate(), Ok(()));
    }

    #[test]
    fn test_zero_read_buffer_fails_validation() {
        let cfg = ServerConfig {
            read_buffer_size: 0,
            ..ServerConfig::with_secret("pw")
        };
        assert_eq!(cfg.validate(), Err(ConfigError::ZeroReadBuffer));
    }

    #[test]
    fn test_oversized_read_buffer_fails_validation() {
        // Arrange
        let at_limit = ServerConfig {
            read_buffer_size: MAX_READ_BUFFER_SIZE,
            ..ServerConfig::with_secret("pw")
        };
        let over_limit = ServerConfig {
            read_buffer_size: MAX_READ_BUFFER_SIZE + 1,
            ..ServerConfig::with_secret("pw")
        };

        // Act / Assert
        assert_eq!(at_limit.validate(), Ok(()));
        assert_eq!(
            over_limit.validate(),
            Err(ConfigError::ReadBufferTooLarge {
                size: MAX_READ_BUFFER_SIZE + 1,
                max: MAX_READ_BUFFER_SIZE,
            })
        );
    }

    #[test]
    fn test_debug_redacts_secret() {
        let rendered = format!("{:?}", ServerConfig::with_secret("topsecret"));
        assert!(!rendered.contains("topsecret"));
    }

    #[test]
    fn test_response_mode_serde_names() {
        #[derive(Deserialize)]
        struct Wrapper {
            mode: ResponseMode,
        }
        let parsed: Wrapper = serde_json::from_str(r#"{"mode":"fire_and_forget"}"#).unwrap();
        assert_eq!(parsed.mode, ResponseMode::FireAndForget);
    }
}
