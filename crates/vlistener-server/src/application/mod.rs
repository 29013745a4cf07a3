//! Application layer use cases for the command server.
//!
//! - **`dispatch`** – Turns an authenticated [`Command`](vlistener_core::Command)
//!   into exactly one [`InputSimulator`](dispatch::InputSimulator) call after
//!   the pre-action delay, and produces the result message.
//!
//! - **`handle_payload`** – The full per-payload pipeline: parse, authenticate,
//!   dispatch.  The connection handler calls this once per received payload.

pub mod dispatch;
pub mod handle_payload;
