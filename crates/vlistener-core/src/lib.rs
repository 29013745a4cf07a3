//! # vlistener-core
//!
//! Shared library for vListener containing the wire command parser, the
//! shared-secret authenticator, and the server configuration snapshot.
//!
//! This crate has no dependencies on sockets, async runtimes, or OS input APIs.
//! Everything here is a pure function or a plain data type, which keeps the
//! protocol rules testable without a network.
//!
//! # Architecture overview
//!
//! vListener is a remote key-press service: a client on the local network
//! sends small JSON objects over TCP, and the host simulates the requested
//! keyboard action.  The flow for one payload is:
//!
//! ```text
//! bytes ──▶ protocol::framing ──▶ protocol::command::parse_command
//!                                        │
//!                                        ▼
//!                           domain::auth::Authenticator
//!                                        │
//!                                        ▼
//!                 (vlistener-server) CommandDispatcher ──▶ InputSimulator
//! ```
//!
//! - **`protocol`** – How payloads look on the wire and how they become typed
//!   [`Command`] values, plus the literal response strings sent back.
//! - **`domain`** – Authentication and configuration.

pub mod domain;
pub mod protocol;

pub use domain::auth::Authenticator;
pub use domain::config::{ConfigError, ResponseMode, ServerConfig};
pub use protocol::command::{parse_command, Command, CommandKind, ParseError};
