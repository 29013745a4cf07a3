//! Domain layer: credential checking and the server configuration snapshot.
//!
//! Nothing in this module performs I/O.  The infrastructure layer of
//! `vlistener-server` populates [`ServerConfig`] from the CLI, environment,
//! and an optional TOML file, then hands it to the server at start.

pub mod auth;
pub mod config;

pub use auth::Authenticator;
pub use config::{ConfigError, ResponseMode, ServerConfig};
