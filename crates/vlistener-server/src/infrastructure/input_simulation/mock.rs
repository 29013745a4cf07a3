//! Recording input simulator for tests.
//!
//! Real simulators press keys on the machine running the tests, which is
//! neither observable nor welcome.  [`RecordingSimulator`] instead appends
//! every requested action to an in-memory list that assertions can inspect
//! in order.
//!
//! # Usage in tests
//!
//! ```ignore
//! let simulator = Arc::new(RecordingSimulator::new());
//! let server = Server::start(config, Arc::clone(&simulator) as Arc<dyn InputSimulator>).await?;
//! // ... drive the server ...
//! assert_eq!(simulator.actions(), vec![SimulatedAction::KeyDown("a".into()), ...]);
//! ```

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use crate::application::dispatch::{InputSimulator, SimulationError};

/// One call received by a [`RecordingSimulator`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SimulatedAction {
    KeyDown(String),
    KeyUp(String),
    PressAndRelease(String),
}

/// A simulator that records all calls without touching the OS.
#[derive(Default)]
pub struct RecordingSimulator {
    actions: Mutex<Vec<SimulatedAction>>,
    /// When set, every method fails with `SimulationError::Backend`.
    should_fail: AtomicBool,
}

impl RecordingSimulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// A simulator whose every call fails.
    pub fn failing() -> Self {
        let sim = Self::default();
        sim.set_should_fail(true);
        sim
    }

    pub fn set_should_fail(&self, fail: bool) {
        self.should_fail.store(fail, Ordering::SeqCst);
    }

    /// Snapshot of every recorded action, oldest first.
    pub fn actions(&self) -> Vec<SimulatedAction> {
        self.lock().clone()
    }

    fn record(&self, action: SimulatedAction) -> Result<(), SimulationError> {
        if self.should_fail.load(Ordering::SeqCst) {
            return Err(SimulationError::Backend("mock failure".into()));
        }
        self.lock().push(action);
        Ok(())
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<SimulatedAction>> {
        // A poisoned lock only means another test thread panicked mid-push.
        self.actions
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

impl InputSimulator for RecordingSimulator {
    fn key_down(&self, key: &str) -> Result<(), SimulationError> {
        self.record(SimulatedAction::KeyDown(key.to_string()))
    }

    fn key_up(&self, key: &str) -> Result<(), SimulationError> {
        self.record(SimulatedAction::KeyUp(key.to_string()))
    }

    fn press_and_release(&self, combo: &str) -> Result<(), SimulationError> {
        self.record(SimulatedAction::PressAndRelease(combo.to_string()))
    }
}
