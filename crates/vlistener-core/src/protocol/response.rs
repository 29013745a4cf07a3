//! Response strings written back to clients.
//!
//! Parse failures use the `Display` text of
//! [`ParseError`](crate::protocol::command::ParseError); everything else is
//! built here so the wire wording lives in one place.

use crate::protocol::command::{Command, CommandKind};

/// Sent when the credential is missing or does not match the configured secret.
pub const UNAUTHORIZED: &str = "Unauthorized access: Incorrect password";

/// Line terminator appended to every response in response mode.
pub const RESPONSE_TERMINATOR: &str = "\n";

/// The success message for a dispatched command.
///
/// Single and special presses report the key; combinations and trios report
/// the joined combo token.
pub fn simulated(command: &Command) -> String {
    match command.kind() {
        CommandKind::SinglePress => format!("Key press simulated: {}", command.key()),
        CommandKind::SpecialPress => format!("Special key press simulated: {}", command.key()),
        CommandKind::Combination => {
            format!("Key combination simulated: {}", command.combo_token())
        }
        CommandKind::Trio => format!("Key trio simulated: {}", command.combo_token()),
    }
}

/// The message reported when the input backend refuses an action.
pub fn simulation_failed(reason: impl std::fmt::Display) -> String {
    format!("Simulation failed: {reason}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::command::parse_command;

    #[test]
    fn test_simulated_press_message() {
        let cmd = parse_command(r#"{"type":"press","key":"a"}"#).unwrap();
        assert_eq!(simulated(&cmd), "Key press simulated: a");
    }

    #[test]
    fn test_simulated_special_message() {
        let cmd = parse_command(r#"{"type":"pressSpecial","key":"play/pause media"}"#).unwrap();
        assert_eq!(simulated(&cmd), "Special key press simulated: play/pause media");
    }

    #[test]
    fn test_simulated_combination_message_uses_combo_token() {
        let cmd =
            parse_command(r#"{"type":"combination","key":"t","modifiers":["ctrl","alt"]}"#).unwrap();
        assert_eq!(simulated(&cmd), "Key combination simulated: ctrl+alt+t");
    }

    #[test]
    fn test_simulated_trio_message_uses_combo_token() {
        let cmd = parse_command(r#"{"type":"trio","key":"esc","modifiers":["ctrl","shift"]}"#)
            .unwrap();
        assert_eq!(simulated(&cmd), "Key trio simulated: ctrl+shift+esc");
    }

    #[test]
    fn test_simulation_failed_message() {
        assert_eq!(
            simulation_failed("no display"),
            "Simulation failed: no display"
        );
    }
}
