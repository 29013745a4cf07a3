//! vlistener-server library entry point.
//!
//! Re-exports all public modules so that integration tests in `tests/` and
//! the binary entry point in `main.rs` share the same module tree.
//!
//! # What does the server do?
//!
//! It listens on a TCP port for JSON key-press commands from a phone or
//! another machine on the local network.  For each payload it:
//!
//! 1. Parses the JSON into a typed command (`vlistener_core`).
//! 2. Checks the shared-secret `password`.
//! 3. Waits the configured pre-action delay.
//! 4. Asks an [`InputSimulator`](application::dispatch::InputSimulator) to
//!    perform the key action on the host.
//! 5. Writes the result line back to the client (unless running in
//!    fire-and-forget mode).

/// Application layer: dispatching authenticated commands to the simulator.
pub mod application;

/// Infrastructure layer: TCP server, connection handling, simulator backends,
/// and config-file loading.
pub mod infrastructure;
