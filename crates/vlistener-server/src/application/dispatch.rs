//! CommandDispatcher: performs an authenticated command through an [`InputSimulator`].
//!
//! The dispatcher sits at the application layer and delegates to an
//! [`InputSimulator`] trait object for the actual OS-level key injection.
//! Concrete simulators live in the infrastructure layer.
//!
//! Every dispatch waits `pre_action_delay` before acting.  The wait only
//! suspends the connection task that owns the command; the accept loop and
//! other connections keep running.

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tracing::{info, warn};
use vlistener_core::protocol::response;
use vlistener_core::{Command, CommandKind};

/// Error type for input simulation operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SimulationError {
    #[error("backend error: {0}")]
    Backend(String),
    #[error("unknown key: {0}")]
    UnknownKey(String),
}

/// Host keyboard capability the dispatcher drives.
///
/// Key names are the logical names clients send (`"a"`, `"enter"`,
/// `"volume up"`); combo tokens join modifiers and key with `+`
/// (`"ctrl+alt+t"`).  Implementations decide how names map to OS key codes.
#[cfg_attr(test, mockall::automock)]
pub trait InputSimulator: Send + Sync {
    /// Presses `key` down.
    fn key_down(&self, key: &str) -> Result<(), SimulationError>;

    /// Releases `key`.
    fn key_up(&self, key: &str) -> Result<(), SimulationError>;

    /// Presses and releases `combo` as one logical action.
    ///
    /// Used for special keys and for modifier combinations, where every key
    /// in the combo goes down in order and comes back up in reverse.
    fn press_and_release(&self, combo: &str) -> Result<(), SimulationError>;
}

/// Dispatches authenticated commands.
///
/// Callers must only pass commands that already passed authentication;
/// the dispatcher does not look at the credential.
pub struct CommandDispatcher {
    simulator: Arc<dyn InputSimulator>,
    pre_action_delay: Duration,
}

impl CommandDispatcher {
    pub fn new(simulator: Arc<dyn InputSimulator>, pre_action_delay: Duration) -> Self {
        Self {
            simulator,
            pre_action_delay,
        }
    }

    /// Waits the pre-action delay, performs `command`, and returns the result message.
    ///
    /// A simulator failure is reported as a `"Simulation failed: …"` message
    /// rather than an error, so the connection stays usable.
    pub async fn dispatch(&self, command: &Command) -> String {
        tokio::time::sleep(self.pre_action_delay).await;

        match self.perform(command) {
            Ok(()) => response::simulated(command),
            Err(e) => {
                warn!("{} '{}' failed: {e}", command.kind(), command.combo_token());
                response::simulation_failed(e)
            }
        }
    }

    fn perform(&self, command: &Command) -> Result<(), SimulationError> {
        match command.kind() {
            CommandKind::SinglePress => {
                info!("simulating key press: {}", command.key());
                self.simulator.key_down(command.key())?;
                self.simulator.key_up(command.key())
            }
            CommandKind::SpecialPress => {
                info!("simulating special key press: {}", command.key());
                self.simulator.press_and_release(command.key())
            }
            CommandKind::Combination | CommandKind::Trio => {
                let combo = command.combo_token();
                info!("simulating key {}: {combo}", command.kind());
                self.simulator.press_and_release(&combo)
            }
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use mockall::predicate::eq;
    use mockall::Sequence;
    use std::time::Instant;
    use vlistener_core::parse_command;

    fn command(payload: &str) -> Command {
        parse_command(payload).unwrap()
    }

    fn dispatcher(mock: MockInputSimulator, delay: Duration) -> CommandDispatcher {
        CommandDispatcher::new(Arc::new(mock), delay)
    }

    #[tokio::test]
    async fn test_single_press_calls_down_then_up() {
        // Arrange
        let mut mock = MockInputSimulator::new();
        let mut seq = Sequence::new();
        mock.expect_key_down()
            .with(eq("a"))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(()));
        mock.expect_key_up()
            .with(eq("a"))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(()));
        mock.expect_press_and_release().never();
        let d = dispatcher(mock, Duration::ZERO);

        // Act
        let result = d.dispatch(&command(r#"{"type":"press","key":"a"}"#)).await;

        // Assert
        assert_eq!(result, "Key press simulated: a");
    }

    #[tokio::test]
    async fn test_special_press_uses_press_and_release() {
        let mut mock = MockInputSimulator::new();
        mock.expect_press_and_release()
            .with(eq("volume up"))
            .times(1)
            .returning(|_| Ok(()));
        mock.expect_key_down().never();
        let d = dispatcher(mock, Duration::ZERO);

        let result = d
            .dispatch(&command(r#"{"type":"pressSpecial","key":"volume up"}"#))
            .await;

        assert_eq!(result, "Special key press simulated: volume up");
    }

    #[tokio::test]
    async fn test_combination_passes_joined_combo_token() {
        // Arrange
        let mut mock = MockInputSimulator::new();
        mock.expect_press_and_release()
            .with(eq("ctrl+alt+t"))
            .times(1)
            .returning(|_| Ok(()));
        let d = dispatcher(mock, Duration::ZERO);

        // Act
        let result = d
            .dispatch(&command(
                r#"{"type":"combination","key":"t","modifiers":["ctrl","alt"]}"#,
            ))
            .await;

        // Assert
        assert_eq!(result, "Key combination simulated: ctrl+alt+t");
    }

    #[tokio::test]
    async fn test_trio_passes_joined_combo_token() {
        let mut mock = MockInputSimulator::new();
        mock.expect_press_and_release()
            .with(eq("ctrl+shift+esc"))
            .times(1)
            .returning(|_| Ok(()));
        let d = dispatcher(mock, Duration::ZERO);

        let result = d
            .dispatch(&command(
                r#"{"type":"trio","key":"esc","modifiers":["ctrl","shift"]}"#,
            ))
            .await;

        assert_eq!(result, "Key trio simulated: ctrl+shift+esc");
    }

    #[tokio::test]
    async fn test_simulator_failure_becomes_result_message() {
        let mut mock = MockInputSimulator::new();
        mock.expect_press_and_release()
            .returning(|_| Err(SimulationError::Backend("no display".into())));
        let d = dispatcher(mock, Duration::ZERO);

        let result = d
            .dispatch(&command(r#"{"type":"pressSpecial","key":"f13"}"#))
            .await;

        assert_eq!(result, "Simulation failed: backend error: no display");
    }

    #[tokio::test]
    async fn test_key_down_failure_skips_key_up() {
        let mut mock = MockInputSimulator::new();
        mock.expect_key_down()
            .returning(|k| Err(SimulationError::UnknownKey(k.to_string())));
        mock.expect_key_up().never();
        let d = dispatcher(mock, Duration::ZERO);

        let result = d.dispatch(&command(r#"{"type":"press","key":"???"}"#)).await;

        assert_eq!(result, "Simulation failed: unknown key: ???");
    }

    #[tokio::test]
    async fn test_dispatch_waits_pre_action_delay_before_acting() {
        // Arrange: record when the simulator is reached.
        let reached = Arc::new(std::sync::Mutex::new(None::<Instant>));
        let reached_in_mock = Arc::clone(&reached);
        let mut mock = MockInputSimulator::new();
        mock.expect_key_down().returning(move |_| {
            *reached_in_mock.lock().unwrap() = Some(Instant::now());
            Ok(())
        });
        mock.expect_key_up().returning(|_| Ok(()));
        let delay = Duration::from_millis(80);
        let d = dispatcher(mock, delay);

        // Act
        let start = Instant::now();
        d.dispatch(&command(r#"{"type":"press","key":"a"}"#)).await;

        // Assert
        let reached_at = reached.lock().unwrap().expect("simulator was called");
        assert!(
            reached_at.duration_since(start) >= delay,
            "simulator reached after {:?}, expected at least {delay:?}",
            reached_at.duration_since(start)
        );
    }
}
