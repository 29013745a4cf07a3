//! CommandService: the per-payload pipeline.
//!
//! ```text
//! payload ──parse──▶ Command ──authenticate──▶ CommandDispatcher ──▶ result
//!    │                  │
//!    └─ ParseError      └─ "Unauthorized access: Incorrect password"
//! ```
//!
//! Every outcome is a result string; nothing here can end a connection.

use std::sync::Arc;

use tracing::{debug, warn};
use vlistener_core::protocol::response::UNAUTHORIZED;
use vlistener_core::{parse_command, Authenticator, ServerConfig};

use crate::application::dispatch::{CommandDispatcher, InputSimulator};

/// Parses, authenticates, and dispatches payloads.
///
/// One instance is shared (behind an `Arc`) by every connection of a server.
pub struct CommandService {
    authenticator: Authenticator,
    dispatcher: CommandDispatcher,
}

impl CommandService {
    pub fn new(authenticator: Authenticator, dispatcher: CommandDispatcher) -> Self {
        Self {
            authenticator,
            dispatcher,
        }
    }

    /// Builds the service described by `config` on top of `simulator`.
    pub fn from_config(config: &ServerConfig, simulator: Arc<dyn InputSimulator>) -> Self {
        Self::new(
            Authenticator::new(config.secret.clone()),
            CommandDispatcher::new(simulator, config.pre_action_delay),
        )
    }

    /// Handles one trimmed payload and returns the message for the client.
    ///
    /// Structural validation happens before the credential is examined, and
    /// the pre-action delay only applies once authentication has succeeded.
    pub async fn handle(&self, payload: &str) -> String {
        let command = match parse_command(payload) {
            Ok(command) => command,
            Err(e) => {
                warn!("rejected payload: {e}");
                return e.to_string();
            }
        };

        debug!("received {command:?}");

        if !self.authenticator.authenticate(&command) {
            warn!("unauthorized {} command", command.kind());
            return UNAUTHORIZED.to_string();
        }

        self.dispatcher.dispatch(&command).await
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
