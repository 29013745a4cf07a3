//! vListener command server entry point.
//!
//! Accepts TCP connections from clients on the local network and simulates
//! the key presses they request, after checking a shared secret.
//!
//! # Usage
//!
//! ```text
//! vlistener [OPTIONS]
//!
//! Options:
//!   --config <PATH>       TOML config file [default: platform config dir]
//!   --host <IP>           Listen address [default: 127.0.0.1]
//!   --port <PORT>         Listen port [default: 12345]
//!   --delay-ms <MS>       Delay before each simulated action [default: 2000]
//!   --secret <TOKEN>      Shared secret clients send as "password"
//!   --fire-and-forget     Log results instead of replying to clients
//!   --log-level <LEVEL>   Log level when RUST_LOG is unset [default: info]
//! ```
//!
//! # Configuration precedence
//!
//! Command-line arguments and environment variables win over the config
//! file, which wins over built-in defaults.
//!
//! | Variable                    | Option              |
//! |-----------------------------|---------------------|
//! | `VLISTENER_CONFIG`          | `--config`          |
//! | `VLISTENER_HOST`            | `--host`            |
//! | `VLISTENER_PORT`            | `--port`            |
//! | `VLISTENER_DELAY_MS`        | `--delay-ms`        |
//! | `VLISTENER_SECRET`          | `--secret`          |
//! | `VLISTENER_FIRE_AND_FORGET` | `--fire-and-forget` |
//! | `VLISTENER_LOG_LEVEL`       | `--log-level`       |
//!
//! # Input backend
//!
//! This binary links the [`DryRunSimulator`], which logs each requested
//! action.  Deployments that inject real input embed the library and pass
//! their own [`InputSimulator`] to [`Server::start`].

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use vlistener_core::{ResponseMode, ServerConfig};
use vlistener_server::application::dispatch::InputSimulator;
use vlistener_server::infrastructure::input_simulation::DryRunSimulator;
use vlistener_server::infrastructure::storage::{
    default_config_path, load_config, load_optional_config, FileConfig,
};
use vlistener_server::infrastructure::Server;

// ── CLI argument definitions ──────────────────────────────────────────────────

/// vListener remote key-press server.
#[derive(Debug, Parser)]
#[command(
    name = "vlistener",
    about = "Simulates authenticated key presses requested over TCP",
    version
)]
struct Cli {
    /// Path to a TOML config file.
    ///
    /// When omitted, the platform config directory is checked and a missing
    /// file is not an error.
    #[arg(long, env = "VLISTENER_CONFIG")]
    config: Option<PathBuf>,

    /// IP address to listen on.
    ///
    /// Use `0.0.0.0` to accept clients from the LAN, `127.0.0.1` for local only.
    #[arg(long, env = "VLISTENER_HOST")]
    host: Option<String>,

    /// TCP port to listen on.
    #[arg(long, env = "VLISTENER_PORT")]
    port: Option<u16>,

    /// Milliseconds to wait before each simulated action.
    #[arg(long, env = "VLISTENER_DELAY_MS")]
    delay_ms: Option<u64>,

    /// Shared secret compared against each command's `password` field.
    #[arg(long, env = "VLISTENER_SECRET", hide_env_values = true)]
    secret: Option<String>,

    /// Only log results; never write responses back to clients.
    #[arg(long, env = "VLISTENER_FIRE_AND_FORGET")]
    fire_and_forget: bool,

    /// Log level used when `RUST_LOG` is not set.
    #[arg(long, env = "VLISTENER_LOG_LEVEL")]
    log_level: Option<String>,
}

impl Cli {
    /// Reads the config file named by `--config`, or the platform default.
    ///
    /// # Errors
    ///
    /// Fails if an explicitly named file cannot be read, or if any config
    /// file that exists is malformed.
    fn load_file_config(&self) -> anyhow::Result<FileConfig> {
        if let Some(path) = &self.config {
            return load_config(path)
                .with_context(|| format!("failed to load config file {}", path.display()));
        }

        match default_config_path() {
            Some(path) => Ok(load_optional_config(&path)
                .with_context(|| format!("failed to load config file {}", path.display()))?
                .unwrap_or_default()),
            None => Ok(FileConfig::default()),
        }
    }

    /// The log level to use when `RUST_LOG` is unset.
    fn log_level(&self, file: &FileConfig) -> String {
        self.log_level
            .clone()
            .unwrap_or_else(|| file.logging.level.clone())
    }

    /// Merges the CLI arguments over the file config into a [`ServerConfig`].
    ///
    /// # Errors
    ///
    /// Returns an error if the host is not a valid IP address.
    fn into_server_config(self, file: FileConfig) -> anyhow::Result<ServerConfig> {
        let server = file.server;

        let host = self.host.unwrap_or(server.host);
        let ip: IpAddr = host
            .parse()
            .with_context(|| format!("invalid listen host: '{host}'"))?;
        let port = self.port.unwrap_or(server.port);

        let response_mode = if self.fire_and_forget {
            ResponseMode::FireAndForget
        } else {
            server.response_mode
        };

        Ok(ServerConfig {
            bind_addr: SocketAddr::new(ip, port),
            pre_action_delay: Duration::from_millis(
                self.delay_ms.unwrap_or(server.pre_action_delay_ms),
            ),
            secret: self.secret.or(server.secret).unwrap_or_default(),
            response_mode,
            read_buffer_size: server.read_buffer_size,
            backlog: server.backlog,
        })
    }
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let file = cli.load_file_config()?;

    // ── Logging setup ─────────────────────────────────────────────────────────
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(cli.log_level(&file))),
        )
        .init();

    let config = cli.into_server_config(file)?;
    config.validate().context("refusing to start")?;

    info!("vListener starting: {config:?}");

    let simulator: Arc<dyn InputSimulator> = Arc::new(DryRunSimulator::new());
    let server = Server::start(config, simulator)
        .await
        .context("failed to start command server")?;

    let outcome = tokio::select! {
        result = server.wait() => result.context("command server stopped"),
        signal = tokio::signal::ctrl_c() => {
            match signal {
                Ok(()) => info!("received Ctrl+C, shutting down"),
                Err(e) => error!("failed to listen for Ctrl+C signal: {e}"),
            }
            Ok(())
        }
    };

    server.stop().await;
    info!("vListener stopped");
    outcome
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn cli(args: &[&str]) -> Cli {
        let mut argv = vec!["vlistener"];
        argv.extend_from_slice(args);
        Cli::parse_from(argv)
    }

    #[test]
    fn test_cli_defaults_fall_back_to_file_config() {
        // Arrange
        let mut file = FileConfig::default();
        file.server.port = 4000;
        file.server.secret = Some("from-file".into());

        // Act
        let config = cli(&[]).into_server_config(file).unwrap();

        // Assert
        assert_eq!(config.bind_addr.to_string(), "127.0.0.1:4000");
        assert_eq!(config.secret, "from-file");
        assert_eq!(config.pre_action_delay, Duration::from_millis(2000));
        assert_eq!(config.response_mode, ResponseMode::Respond);
    }

    #[test]
    fn test_cli_overrides_file_values() {
        let mut file = FileConfig::default();
        file.server.secret = Some("from-file".into());
        file.server.pre_action_delay_ms = 2500;

        let config = cli(&[
            "--host",
            "0.0.0.0",
            "--port",
            "9999",
            "--delay-ms",
            "10",
            "--secret",
            "from-cli",
        ])
        .into_server_config(file)
        .unwrap();

        assert_eq!(config.bind_addr.to_string(), "0.0.0.0:9999");
        assert_eq!(config.pre_action_delay, Duration::from_millis(10));
        assert_eq!(config.secret, "from-cli");
    }

    #[test]
    fn test_fire_and_forget_flag_sets_response_mode() {
        let config = cli(&["--fire-and-forget", "--secret", "x"])
            .into_server_config(FileConfig::default())
            .unwrap();
        assert_eq!(config.response_mode, ResponseMode::FireAndForget);
    }

    #[test]
    fn test_file_response_mode_used_without_flag() {
        let mut file = FileConfig::default();
        file.server.response_mode = ResponseMode::FireAndForget;

        let config = cli(&[]).into_server_config(file).unwrap();

        assert_eq!(config.response_mode, ResponseMode::FireAndForget);
    }

    #[test]
    fn test_missing_secret_produces_invalid_config() {
        let config = cli(&[]).into_server_config(FileConfig::default()).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_host_returns_error() {
        let result = cli(&["--host", "not.an.ip"]).into_server_config(FileConfig::default());
        assert!(result.is_err());
    }

    #[test]
    fn test_ipv6_host_is_accepted() {
        let config = cli(&["--host", "::1", "--port", "7000"])
            .into_server_config(FileConfig::default())
            .unwrap();
        assert_eq!(config.bind_addr.to_string(), "[::1]:7000");
    }

    #[test]
    fn test_log_level_prefers_cli() {
        let mut file = FileConfig::default();
        file.logging.level = "warn".into();

        assert_eq!(cli(&[]).log_level(&file), "warn");
        assert_eq!(cli(&["--log-level", "trace"]).log_level(&file), "trace");
    }
}
