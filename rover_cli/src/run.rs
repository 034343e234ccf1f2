//! Hardware assembly and control loop execution.

use rover_core::Rover;
use rover_core::error::Result as CoreResult;
use rover_core::runner::{self, RunParams};
use rover_hardware::{
    MatrixDisplay, SimulatedAccelerometer, SimulatedMotors, SimulatedSonar, StdoutTelemetry,
    TimedButton,
};
use std::sync::Arc;
use std::sync::atomic::AtomicBool;

/// Run subcommand options after CLI parsing.
pub struct RunOpts {
    pub max_ticks: Option<u64>,
    pub rate_hz: Option<u32>,
    pub drive: bool,
    pub press_after: u32,
}

pub fn run_rover(
    cfg: &rover_config::Config,
    opts: &RunOpts,
    shutdown: Arc<AtomicBool>,
) -> CoreResult<()> {
    let mut avoidance = cfg.avoidance;
    if opts.drive {
        avoidance.drive_enabled = true;
    }

    let rover = Rover::builder()
        .with_accelerometer(SimulatedAccelerometer::new())
        .with_range_sensor(SimulatedSonar::new())
        .with_motors(SimulatedMotors::new())
        .with_display(MatrixDisplay::new())
        .with_button(TimedButton::new(opts.press_after))
        .with_telemetry(StdoutTelemetry)
        .with_filter(cfg.filter)
        .with_calibration(cfg.calibration)
        .with_avoidance(avoidance)
        .build()?;

    // CLI overrides win over config; a configured rate of 0 free-runs.
    let params = RunParams {
        rate_hz: opts.rate_hz.or(cfg.runner.rate_hz).filter(|hz| *hz > 0),
        max_ticks: opts.max_ticks.or(cfg.runner.max_ticks),
    };
    runner::run(rover, &shutdown, params)
}

pub fn self_check(cfg: &rover_config::Config) -> CoreResult<()> {
    // Building the engine exercises config validation and collaborator
    // assembly without ticking the loop.
    let _rover = Rover::builder()
        .with_accelerometer(SimulatedAccelerometer::new())
        .with_range_sensor(SimulatedSonar::new())
        .with_motors(SimulatedMotors::new())
        .with_filter(cfg.filter)
        .with_calibration(cfg.calibration)
        .with_avoidance(cfg.avoidance)
        .build()?;
    tracing::info!("self-check passed");
    println!("self-check: ok");
    Ok(())
}
