//! Input simulator backends.

pub mod dry_run;
pub mod mock;

pub use dry_run::DryRunSimulator;
pub use mock::{RecordingSimulator, SimulatedAction};
