//! Shared-secret authentication.
//!
//! The `password` field of a command is compared verbatim against the secret
//! configured at server start.  Clients are expected to send an already
//! hashed token; no hashing happens here.
//!
//! The comparison runs over every byte of the longer input regardless of
//! where the first mismatch is, so response timing does not reveal how much
//! of a guess was correct.  Failed attempts are not throttled or locked out.

use crate::protocol::command::Command;

/// Checks command credentials against the configured shared secret.
#[derive(Clone)]
pub struct Authenticator {
    secret: String,
}

impl Authenticator {
    /// Creates an authenticator for `secret`.
    ///
    /// An empty secret never authenticates anything, including an empty
    /// credential.
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
        }
    }

    /// Returns `true` iff the command's credential equals the secret.
    ///
    /// A missing credential is always rejected.
    pub fn authenticate(&self, command: &Command) -> bool {
        match command.credential() {
            Some(credential) if !self.secret.is_empty() => {
                constant_time_eq(credential.as_bytes(), self.secret.as_bytes())
            }
            _ => false,
        }
    }
}

impl std::fmt::Debug for Authenticator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Authenticator")
            .field("secret", &"<redacted>")
            .finish()
    }
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    let len = a.len().max(b.len());
    let mut diff = a.len() ^ b.len();
    for i in 0..len {
        let x = a.get(i).copied().unwrap_or(0);
        let y = b.get(i).copied().unwrap_or(0);
        diff |= usize::from(x ^ y);
    }
    diff == 0
}
