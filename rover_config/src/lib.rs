#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
//! Config schemas for the rover control loop.
//!
//! `Config` and sub-structs are deserialized from TOML and validated. Every
//! section has defaults matching the reference robot, so an empty TOML file is
//! a valid configuration.
use serde::Deserialize;

/// Sensor geometry and smoothing parameters.
#[derive(Debug, Deserialize, Clone, Copy)]
#[serde(default)]
pub struct FilterCfg {
    /// Accelerometer mounting angle in degrees. The sine of this angle
    /// projects the y/z axes onto the forward/up channels.
    pub mount_angle_deg: f32,
    /// Constant added to the up channel to cancel gravity, in sensor counts.
    pub gravity_bias: f32,
}

impl Default for FilterCfg {
    fn default() -> Self {
        Self {
            mount_angle_deg: 135.0,
            gravity_bias: 1024.0,
        }
    }
}

/// Calibration procedure parameters.
#[derive(Debug, Deserialize, Clone, Copy)]
#[serde(default)]
pub struct CalibrationCfg {
    /// Number of samples accumulated before the offset is derived.
    pub samples: u32,
    /// Seconds of countdown shown before sampling starts.
    pub countdown_s: f32,
    /// Half-period of the sampling blink indicator, in seconds.
    pub blink_half_period_s: f32,
}

impl Default for CalibrationCfg {
    fn default() -> Self {
        Self {
            samples: 50,
            countdown_s: 3.0,
            blink_half_period_s: 0.5,
        }
    }
}

/// Obstacle-avoidance policy parameters.
#[derive(Debug, Deserialize, Clone, Copy)]
#[serde(default)]
pub struct AvoidanceCfg {
    /// Readings strictly below this select the turn branch.
    pub obstacle_threshold: f32,
    /// Sensor ceiling; a raw reading of 0 ("no echo") normalizes to this.
    pub max_range: f32,
    /// When false (reference behavior) the policy only updates the display
    /// and motor speeds keep their last value. When true the documented
    /// intent speeds below are applied.
    pub drive_enabled: bool,
    /// Left wheel speed in [-1, 1] for the turn branch.
    pub turn_left_speed: f32,
    /// Right wheel speed in [-1, 1] for the turn branch.
    pub turn_right_speed: f32,
    /// Both wheel speeds in [-1, 1] for the forward branch.
    pub forward_speed: f32,
}

impl Default for AvoidanceCfg {
    fn default() -> Self {
        Self {
            obstacle_threshold: 50.0,
            max_range: 150.0,
            drive_enabled: false,
            turn_left_speed: -0.3,
            turn_right_speed: 0.3,
            forward_speed: 0.3,
        }
    }
}

/// Runner/orchestration defaults.
#[derive(Debug, Deserialize, Clone, Copy, Default)]
#[serde(default)]
pub struct RunnerCfg {
    /// Optional loop pacing in Hz. Absent or 0 means free-running, matching
    /// the reference firmware.
    pub rate_hz: Option<u32>,
    /// Optional tick cap; absent means run until externally stopped.
    pub max_ticks: Option<u64>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct Logging {
    pub file: Option<String>,  // path to .log (JSON lines)
    pub level: Option<String>, // "info","debug"
    /// Log rotation policy: "never" | "daily" | "hourly" (default: never)
    pub rotation: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub filter: FilterCfg,
    pub calibration: CalibrationCfg,
    pub avoidance: AvoidanceCfg,
    pub runner: RunnerCfg,
    pub logging: Logging,
}

pub fn load_toml(s: &str) -> Result<Config, toml::de::Error> {
    toml::from_str::<Config>(s)
}

impl Config {
    pub fn validate(&self) -> eyre::Result<()> {
        if !self.filter.mount_angle_deg.is_finite() {
            eyre::bail!("mount_angle_deg must be finite");
        }
        if !self.filter.gravity_bias.is_finite() {
            eyre::bail!("gravity_bias must be finite");
        }
        if self.calibration.samples == 0 {
            eyre::bail!("calibration samples must be > 0");
        }
        if !(self.calibration.countdown_s.is_finite() && self.calibration.countdown_s >= 0.0) {
            eyre::bail!("countdown_s must be >= 0");
        }
        if !(self.calibration.blink_half_period_s.is_finite()
            && self.calibration.blink_half_period_s > 0.0)
        {
            eyre::bail!("blink_half_period_s must be > 0");
        }
        if !(self.avoidance.max_range.is_finite() && self.avoidance.max_range > 0.0) {
            eyre::bail!("max_range must be > 0");
        }
        if !(self.avoidance.obstacle_threshold.is_finite()
            && self.avoidance.obstacle_threshold > 0.0)
        {
            eyre::bail!("obstacle_threshold must be > 0");
        }
        if self.avoidance.obstacle_threshold > self.avoidance.max_range {
            eyre::bail!("obstacle_threshold must be <= max_range");
        }
        for (name, v) in [
            ("turn_left_speed", self.avoidance.turn_left_speed),
            ("turn_right_speed", self.avoidance.turn_right_speed),
            ("forward_speed", self.avoidance.forward_speed),
        ] {
            if !(v.is_finite() && (-1.0..=1.0).contains(&v)) {
                eyre::bail!("{name} must be within [-1, 1]");
            }
        }
        if self.runner.rate_hz == Some(0) {
            eyre::bail!("rate_hz must be > 0 when set");
        }
        Ok(())
    }
}
