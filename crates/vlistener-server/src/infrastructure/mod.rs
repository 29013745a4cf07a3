//! Infrastructure layer for the command server.
//!
//! Contains everything that touches the outside world: the TCP listener and
//! connection tasks, the input simulator backends, and config-file loading.
//!
//! **Dependency rule**: this layer may depend on `application` and
//! `vlistener_core`, but MUST NOT be imported by the `application` layer.
//!
//! # Sub-modules
//!
//! - **`server`** – binds the listener, runs the accept loop, and coordinates
//!   shutdown of every open connection.
//! - **`connection`** – the per-connection read/dispatch/respond loop and the
//!   registry of open connections.
//! - **`input_simulation`** – [`InputSimulator`](crate::application::dispatch::InputSimulator)
//!   backends.  The OS-level backend is supplied by the embedding application;
//!   this crate ships a recording backend for tests and a dry-run backend
//!   that only logs.
//! - **`storage`** – read-only TOML configuration file.

pub mod connection;
pub mod input_simulation;
pub mod server;
pub mod storage;

pub use server::{Server, ServerError};
