#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
//! Core rover control loop (hardware-agnostic).
//!
//! This crate provides the hardware-independent control engine. All hardware
//! interactions go through the `rover_traits` contracts.
//!
//! ## Architecture
//!
//! - **Filtering**: accelerometer fusion with a rolling window (`filter`)
//! - **Calibration**: countdown-then-sample bias nulling (`calib`)
//! - **Phases**: Calibrating -> Running state machine (`Rover::tick`)
//! - **Avoidance**: range-driven turn/forward policy (`avoidance`)
//! - **Drive**: signed speed to motor percent encoding (`drive`)
//!
//! The engine advances one tick at a time via [`Rover::tick`]; `runner::run`
//! is the thin loop that drives it on real time.

pub mod avoidance;
pub mod calib;
pub mod drive;
pub mod error;
pub mod filter;
pub mod mocks;
pub mod runner;
pub mod util;

use crate::avoidance::{DrivePolicy, Steer, decide, normalize_range};
use crate::calib::{CalibStep, Calibrator};
use crate::error::{BuildError, Result, RoverError};
use crate::filter::{Offset, SignalFilter, VectorSample};
use crate::mocks::{NullButton, NullDisplay, NullTelemetry};
use eyre::WrapErr;
use rover_config::{AvoidanceCfg, CalibrationCfg, FilterCfg};
use rover_traits::clock::{Clock, MonotonicClock};
use rover_traits::{Accelerometer, Button, Display, Motors, RangeSensor, Telemetry};
use std::sync::Arc;
use std::time::Instant;

// For typed hardware error mapping
#[cfg(feature = "hardware-errors")]
use rover_hardware::error::HwError;

/// Top-level operating mode. Monotonic: Calibrating -> Running, no way back
/// short of restarting the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Calibrating,
    Running,
}

/// Public outcome of a single control-loop tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickStatus {
    /// Calibrating phase, waiting for the operator to press start.
    Waiting,
    /// Calibration countdown in progress.
    CountingDown,
    /// Accumulating calibration samples.
    Sampling,
    /// Calibration finished on this tick; Running dispatch starts next tick.
    CalibrationComplete,
    /// Autonomous phase, with this tick's steering decision.
    Running(Steer),
}

/// The rover control engine. One instance owns all loop state; every
/// collaborator is injected, so ticks are fully deterministic given a
/// deterministic clock and sensors.
pub struct Rover {
    accel: Box<dyn Accelerometer>,
    range: Box<dyn RangeSensor>,
    motors: Box<dyn Motors>,
    display: Box<dyn Display>,
    button: Box<dyn Button>,
    telemetry: Box<dyn Telemetry>,
    clock: Arc<dyn Clock + Send + Sync>,
    epoch: Instant,

    filter: SignalFilter,
    calibrator: Calibrator,
    avoidance: AvoidanceCfg,
    policy: DrivePolicy,

    phase: Phase,
    offset: Offset,
    // Signed wheel speeds in [-1, 1]; the avoidance policy may leave them
    // untouched, in which case the previous command keeps driving.
    left_speed: f32,
    right_speed: f32,
    last_time: f64,
    last_range: f32,
}

impl core::fmt::Debug for Rover {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Rover")
            .field("phase", &self.phase)
            .field("offset", &self.offset)
            .field("last_range", &self.last_range)
            .finish()
    }
}

impl Rover {
    /// Start building a Rover.
    pub fn builder() -> RoverBuilder<Missing, Missing, Missing> {
        RoverBuilder::default()
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Offset currently applied to every fused sample (zero before
    /// calibration completes).
    pub fn offset(&self) -> Offset {
        self.offset
    }

    /// Rolling average over the filter window.
    pub fn average(&self) -> VectorSample {
        self.filter.average()
    }

    /// Last normalized range reading.
    pub fn last_range(&self) -> f32 {
        self.last_range
    }

    /// Current signed wheel speeds, before drive encoding.
    pub fn drive_speeds(&self) -> (f32, f32) {
        (self.left_speed, self.right_speed)
    }

    /// One iteration of the control loop.
    ///
    /// Strict per-tick order: time sample, filter update from the
    /// accelerometer, range read and sentinel normalization, phase dispatch
    /// (including display effects), telemetry line, drive command. Later
    /// steps consume values computed earlier in the same tick, so the order
    /// is not negotiable.
    pub fn tick(&mut self) -> Result<TickStatus> {
        let now = self.clock.secs_since(self.epoch);
        let dt = now - self.last_time;

        let raw = self
            .accel
            .read()
            .map_err(|e| eyre::Report::new(map_hw_error_dyn(&*e)))
            .wrap_err("reading accelerometer")?;
        let sample = self.filter.update(raw, &self.offset);

        let raw_range = self
            .range
            .distance()
            .map_err(|e| eyre::Report::new(map_hw_error_dyn(&*e)))
            .wrap_err("reading range sensor")?;
        let range = normalize_range(raw_range, self.avoidance.max_range);
        self.last_range = range;

        let status = match self.phase {
            Phase::Calibrating => self.calibrating_tick(dt as f32, now, sample),
            Phase::Running => self.running_tick(range),
        };

        let fps = util::fps(dt);
        self.telemetry.write_line(&format!("{fps:.2}fps, {range}"));

        let (left_pct, right_pct) = drive::to_percent(self.left_speed, self.right_speed);
        self.motors
            .drive(left_pct, right_pct)
            .map_err(|e| eyre::Report::new(map_hw_error_dyn(&*e)))
            .wrap_err("motor drive")?;

        self.last_time = now;
        Ok(status)
    }

    fn calibrating_tick(&mut self, dt: f32, now: f64, sample: VectorSample) -> TickStatus {
        // Level-triggered start: "idle AND pressed". A held button cannot
        // restart calibration once it has begun.
        if self.calibrator.is_idle() && self.button.is_pressed() {
            tracing::info!("calibration start requested");
            self.calibrator.start();
        }

        match self.calibrator.tick(dt, now, sample) {
            CalibStep::Idle => {
                // Steady dot while waiting for the operator.
                self.display.plot(0, 0);
                TickStatus::Waiting
            }
            CalibStep::CountingDown { dot_column } => {
                if (0..=4).contains(&dot_column) {
                    self.display.plot(dot_column as u8, 0);
                }
                TickStatus::CountingDown
            }
            CalibStep::Sampling { blink_on } => {
                if blink_on {
                    self.display.plot(1, 0);
                } else {
                    self.display.unplot(1, 0);
                }
                TickStatus::Sampling
            }
            CalibStep::Complete(offset) => {
                self.offset = offset;
                self.phase = Phase::Running;
                // Steady dot to show calibration is done.
                self.display.plot(1, 0);
                tracing::info!(
                    forward = offset.forward,
                    up = offset.up,
                    lateral = offset.lateral,
                    "calibration complete"
                );
                TickStatus::CalibrationComplete
            }
            // The phase flips to Running on Complete, so a Done calibrator
            // is never ticked again.
            CalibStep::Done => unreachable!("calibrator ticked after completion"),
        }
    }

    fn running_tick(&mut self, range: f32) -> TickStatus {
        let steer = decide(range, self.avoidance.obstacle_threshold);
        match steer {
            Steer::Turn => {
                self.display.plot(4, 2);
                self.display.unplot(2, 2);
            }
            Steer::Forward => {
                self.display.plot(2, 2);
                self.display.unplot(4, 2);
            }
        }
        if let Some((left, right)) = self.policy.speeds(steer) {
            self.left_speed = left;
            self.right_speed = right;
        }
        tracing::trace!(range, ?steer, "steer");
        TickStatus::Running(steer)
    }
}

// Map any error to a typed RoverError, with special handling for hardware
// errors when the hardware crate is linked in.
fn map_hw_error_dyn(e: &(dyn std::error::Error + 'static)) -> RoverError {
    #[cfg(feature = "hardware-errors")]
    if let Some(hw) = e.downcast_ref::<HwError>() {
        return RoverError::HardwareFault(hw.to_string());
    }
    RoverError::Hardware(e.to_string())
}

// Type-state markers for the builder
pub struct Missing;
pub struct Set;

use std::marker::PhantomData;

/// Builder for [`Rover`]. Accelerometer, range sensor, and motors are
/// mandatory (enforced by type-state); display, button, telemetry, and clock
/// fall back to no-op / monotonic defaults. Configuration is validated on
/// `build()`.
pub struct RoverBuilder<A, R, M> {
    accel: Option<Box<dyn Accelerometer>>,
    range: Option<Box<dyn RangeSensor>>,
    motors: Option<Box<dyn Motors>>,
    display: Option<Box<dyn Display>>,
    button: Option<Box<dyn Button>>,
    telemetry: Option<Box<dyn Telemetry>>,
    clock: Option<Box<dyn Clock + Send + Sync>>,
    filter: Option<FilterCfg>,
    calibration: Option<CalibrationCfg>,
    avoidance: Option<AvoidanceCfg>,
    _a: PhantomData<A>,
    _r: PhantomData<R>,
    _m: PhantomData<M>,
}

impl Default for RoverBuilder<Missing, Missing, Missing> {
    fn default() -> Self {
        Self {
            accel: None,
            range: None,
            motors: None,
            display: None,
            button: None,
            telemetry: None,
            clock: None,
            filter: None,
            calibration: None,
            avoidance: None,
            _a: PhantomData,
            _r: PhantomData,
            _m: PhantomData,
        }
    }
}

impl<A, R, M> RoverBuilder<A, R, M> {
    /// Fallible build available in any type-state; returns a detailed
    /// BuildError for missing pieces.
    pub fn try_build(self) -> Result<Rover> {
        let RoverBuilder {
            accel,
            range,
            motors,
            display,
            button,
            telemetry,
            clock,
            filter,
            calibration,
            avoidance,
            _a: _,
            _r: _,
            _m: _,
        } = self;

        let accel = accel.ok_or_else(|| eyre::Report::new(BuildError::MissingAccelerometer))?;
        let range = range.ok_or_else(|| eyre::Report::new(BuildError::MissingRangeSensor))?;
        let motors = motors.ok_or_else(|| eyre::Report::new(BuildError::MissingMotors))?;

        let filter = filter.unwrap_or_default();
        let calibration = calibration.unwrap_or_default();
        let avoidance = avoidance.unwrap_or_default();

        // Validate configs (non-panicking; return typed errors)
        if !filter.mount_angle_deg.is_finite() {
            return Err(eyre::Report::new(BuildError::InvalidConfig(
                "mount_angle_deg must be finite",
            )));
        }
        if !filter.gravity_bias.is_finite() {
            return Err(eyre::Report::new(BuildError::InvalidConfig(
                "gravity_bias must be finite",
            )));
        }
        if calibration.samples == 0 {
            return Err(eyre::Report::new(BuildError::InvalidConfig(
                "calibration samples must be > 0",
            )));
        }
        if !(calibration.countdown_s.is_finite() && calibration.countdown_s >= 0.0) {
            return Err(eyre::Report::new(BuildError::InvalidConfig(
                "countdown_s must be >= 0",
            )));
        }
        if !(calibration.blink_half_period_s.is_finite() && calibration.blink_half_period_s > 0.0) {
            return Err(eyre::Report::new(BuildError::InvalidConfig(
                "blink_half_period_s must be > 0",
            )));
        }
        if !(avoidance.max_range.is_finite() && avoidance.max_range > 0.0) {
            return Err(eyre::Report::new(BuildError::InvalidConfig(
                "max_range must be > 0",
            )));
        }
        if !(avoidance.obstacle_threshold.is_finite() && avoidance.obstacle_threshold > 0.0) {
            return Err(eyre::Report::new(BuildError::InvalidConfig(
                "obstacle_threshold must be > 0",
            )));
        }
        if avoidance.obstacle_threshold > avoidance.max_range {
            return Err(eyre::Report::new(BuildError::InvalidConfig(
                "obstacle_threshold must be <= max_range",
            )));
        }

        let clock: Arc<dyn Clock + Send + Sync> = match clock {
            Some(b) => Arc::from(b),
            None => Arc::new(MonotonicClock::new()),
        };
        let epoch = clock.now();

        Ok(Rover {
            accel,
            range,
            motors,
            display: display.unwrap_or_else(|| Box::new(NullDisplay)),
            button: button.unwrap_or_else(|| Box::new(NullButton)),
            telemetry: telemetry.unwrap_or_else(|| Box::new(NullTelemetry)),
            clock,
            epoch,
            filter: SignalFilter::new(&filter),
            calibrator: Calibrator::new(calibration),
            policy: DrivePolicy::from_cfg(&avoidance),
            avoidance,
            phase: Phase::Calibrating,
            offset: Offset::ZERO,
            left_speed: 0.0,
            right_speed: 0.0,
            last_time: 0.0,
            last_range: 0.0,
        })
    }
}

/// Chainable setters that do not affect type-state
impl<A, R, M> RoverBuilder<A, R, M> {
    pub fn with_filter(mut self, filter: FilterCfg) -> Self {
        self.filter = Some(filter);
        self
    }
    pub fn with_calibration(mut self, calibration: CalibrationCfg) -> Self {
        self.calibration = Some(calibration);
        self
    }
    pub fn with_avoidance(mut self, avoidance: AvoidanceCfg) -> Self {
        self.avoidance = Some(avoidance);
        self
    }
    pub fn with_display(mut self, display: impl Display + 'static) -> Self {
        self.display = Some(Box::new(display));
        self
    }
    pub fn with_button(mut self, button: impl Button + 'static) -> Self {
        self.button = Some(Box::new(button));
        self
    }
    pub fn with_telemetry(mut self, telemetry: impl Telemetry + 'static) -> Self {
        self.telemetry = Some(Box::new(telemetry));
        self
    }
    /// Provide a custom clock implementation; defaults to MonotonicClock
    /// when not provided.
    pub fn with_clock(mut self, clock: impl Clock + Send + Sync + 'static) -> Self {
        self.clock = Some(Box::new(clock));
        self
    }
}

// Setters that advance type-state when providing mandatory components
impl<R, M> RoverBuilder<Missing, R, M> {
    pub fn with_accelerometer(self, accel: impl Accelerometer + 'static) -> RoverBuilder<Set, R, M> {
        RoverBuilder {
            accel: Some(Box::new(accel)),
            range: self.range,
            motors: self.motors,
            display: self.display,
            button: self.button,
            telemetry: self.telemetry,
            clock: self.clock,
            filter: self.filter,
            calibration: self.calibration,
            avoidance: self.avoidance,
            _a: PhantomData,
            _r: PhantomData,
            _m: PhantomData,
        }
    }
}

impl<A, M> RoverBuilder<A, Missing, M> {
    pub fn with_range_sensor(self, range: impl RangeSensor + 'static) -> RoverBuilder<A, Set, M> {
        RoverBuilder {
            accel: self.accel,
            range: Some(Box::new(range)),
            motors: self.motors,
            display: self.display,
            button: self.button,
            telemetry: self.telemetry,
            clock: self.clock,
            filter: self.filter,
            calibration: self.calibration,
            avoidance: self.avoidance,
            _a: PhantomData,
            _r: PhantomData,
            _m: PhantomData,
        }
    }
}

impl<A, R> RoverBuilder<A, R, Missing> {
    pub fn with_motors(self, motors: impl Motors + 'static) -> RoverBuilder<A, R, Set> {
        RoverBuilder {
            accel: self.accel,
            range: self.range,
            motors: Some(Box::new(motors)),
            display: self.display,
            button: self.button,
            telemetry: self.telemetry,
            clock: self.clock,
            filter: self.filter,
            calibration: self.calibration,
            avoidance: self.avoidance,
            _a: PhantomData,
            _r: PhantomData,
            _m: PhantomData,
        }
    }
}

impl RoverBuilder<Set, Set, Set> {
    /// Validate and build the Rover. Only available when all mandatory
    /// collaborators are set.
    pub fn build(self) -> Result<Rover> {
        self.try_build()
    }
}
