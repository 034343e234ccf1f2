//! Thin driving loop over [`Rover::tick`].

use crate::error::Result;
use crate::util::period_us;
use crate::{Rover, TickStatus};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

/// Runner knobs. Everything is optional; the defaults reproduce the
/// reference firmware's free-running, never-ending loop.
#[derive(Debug, Clone, Copy, Default)]
pub struct RunParams {
    /// Loop pacing in Hz. None free-runs as fast as the host allows.
    pub rate_hz: Option<u32>,
    /// Tick cap for demos and tests. None runs until shutdown.
    pub max_ticks: Option<u64>,
}

/// Drive the engine until the shutdown flag is raised or the tick cap is
/// reached. The loop itself never terminates on its own otherwise; any
/// sensor error bubbles out via `?`.
pub fn run(mut rover: Rover, shutdown: &AtomicBool, params: RunParams) -> Result<()> {
    let period = params
        .rate_hz
        .map(|hz| Duration::from_micros(period_us(hz)));
    let mut ticks: u64 = 0;

    tracing::info!(rate_hz = ?params.rate_hz, max_ticks = ?params.max_ticks, "control loop start");

    loop {
        if shutdown.load(Ordering::Relaxed) {
            tracing::info!(ticks, "control loop stopped by shutdown signal");
            return Ok(());
        }
        if let Some(cap) = params.max_ticks
            && ticks >= cap
        {
            tracing::info!(ticks, "tick cap reached");
            return Ok(());
        }

        if rover.tick()? == TickStatus::CalibrationComplete {
            tracing::info!(ticks, "entering running phase");
        }
        ticks += 1;

        if let Some(p) = period {
            rover.clock.sleep(p);
        }
    }
}
