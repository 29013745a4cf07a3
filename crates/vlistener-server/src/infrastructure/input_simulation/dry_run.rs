//! Dry-run input simulator.
//!
//! Logs every requested key action at `info` level and reports success.
//! The binary uses it when no OS injection backend is linked in, which makes
//! it possible to exercise the full network path (clients, secrets, delays)
//! on a headless machine.

use tracing::info;

use crate::application::dispatch::{InputSimulator, SimulationError};

/// Simulator that logs instead of injecting input.
#[derive(Debug, Default, Clone, Copy)]
pub struct DryRunSimulator;

impl DryRunSimulator {
    pub fn new() -> Self {
        Self
    }
}

impl InputSimulator for DryRunSimulator {
    fn key_down(&self, key: &str) -> Result<(), SimulationError> {
        info!(target: "vlistener::dry_run", "key down: {key}");
        Ok(())
    }

    fn key_up(&self, key: &str) -> Result<(), SimulationError> {
        info!(target: "vlistener::dry_run", "key up: {key}");
        Ok(())
    }

    fn press_and_release(&self, combo: &str) -> Result<(), SimulationError> {
        info!(target: "vlistener::dry_run", "press and release: {combo}");
        Ok(())
    }
}
