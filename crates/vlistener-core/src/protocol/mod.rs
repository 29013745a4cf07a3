//! Wire protocol: command parsing, payload framing, and response literals.

pub mod command;
pub mod framing;
pub mod response;
