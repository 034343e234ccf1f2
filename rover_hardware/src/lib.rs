//! Simulated collaborator implementations for the rover control loop.
//!
//! Everything here is deterministic so demo runs and CLI tests are
//! reproducible. Real hardware (I2C accelerometer, ultrasonic sonar, PWM
//! motor driver, LED matrix) would implement the same `rover_traits`
//! contracts behind a board-specific crate.

pub mod error;

use rover_traits::{Accelerometer, Button, Display, Motors, RangeSensor, Telemetry};

/// Resting accelerometer pose: zero lateral, y/z chosen so the fused forward
/// and up channels sit near zero after the gravity bias is applied.
const REST_X: f32 = 0.0;
const REST_Y: f32 = 724.0;
const REST_Z: f32 = -724.0;

/// Accelerometer that reports the resting pose plus a slow deterministic
/// wobble, standing in for sensor noise.
pub struct SimulatedAccelerometer {
    tick: u32,
    wobble: f32,
}

impl SimulatedAccelerometer {
    pub fn new() -> Self {
        Self {
            tick: 0,
            wobble: 4.0,
        }
    }

    /// Amplitude of the wobble in sensor counts (default 4.0).
    pub fn with_wobble(mut self, amplitude: f32) -> Self {
        self.wobble = amplitude;
        self
    }
}

impl Default for SimulatedAccelerometer {
    fn default() -> Self {
        Self::new()
    }
}

impl Accelerometer for SimulatedAccelerometer {
    fn read(&mut self) -> Result<(f32, f32, f32), Box<dyn std::error::Error + Send + Sync>> {
        let phase = self.tick as f32 * 0.1;
        self.tick = self.tick.wrapping_add(1);
        let x = REST_X + self.wobble * phase.sin();
        let y = REST_Y + self.wobble * (phase * 1.3).cos();
        let z = REST_Z + self.wobble * (phase * 0.7).sin();
        Ok((x, y, z))
    }
}

/// Sonar that walks an obstacle toward the robot, with a periodic missed
/// echo (raw 0) to exercise sentinel normalization downstream.
pub struct SimulatedSonar {
    distance: f32,
    reads: u32,
}

impl SimulatedSonar {
    pub fn new() -> Self {
        Self {
            distance: 120.0,
            reads: 0,
        }
    }
}

impl Default for SimulatedSonar {
    fn default() -> Self {
        Self::new()
    }
}

impl RangeSensor for SimulatedSonar {
    fn distance(&mut self) -> Result<f32, Box<dyn std::error::Error + Send + Sync>> {
        self.reads = self.reads.wrapping_add(1);
        // Every 16th ping misses; the core treats 0 as "clear".
        if self.reads % 16 == 0 {
            return Ok(0.0);
        }
        let d = self.distance;
        self.distance -= 1.0;
        if self.distance < 10.0 {
            self.distance = 120.0;
        }
        Ok(d)
    }
}

/// Motor pair that records the last command and logs it.
#[derive(Debug, Default)]
pub struct SimulatedMotors {
    last: Option<(f32, f32)>,
}

impl SimulatedMotors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Last (left, right) percentages issued, if any.
    pub fn last_command(&self) -> Option<(f32, f32)> {
        self.last
    }
}

impl Motors for SimulatedMotors {
    fn drive(
        &mut self,
        left_percent: f32,
        right_percent: f32,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        if self.last != Some((left_percent, right_percent)) {
            tracing::debug!(left_percent, right_percent, "motor command");
        }
        self.last = Some((left_percent, right_percent));
        Ok(())
    }
}

/// 5x5 LED matrix kept as an in-memory buffer; changes are logged.
#[derive(Debug, Default)]
pub struct MatrixDisplay {
    cells: [[bool; 5]; 5],
}

impl MatrixDisplay {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_lit(&self, x: u8, y: u8) -> bool {
        self.cells
            .get(y as usize)
            .and_then(|row| row.get(x as usize))
            .copied()
            .unwrap_or(false)
    }
}

impl Display for MatrixDisplay {
    fn plot(&mut self, x: u8, y: u8) {
        if let Some(cell) = self
            .cells
            .get_mut(y as usize)
            .and_then(|row| row.get_mut(x as usize))
            && !*cell
        {
            *cell = true;
            tracing::debug!(x, y, "led on");
        }
    }

    fn unplot(&mut self, x: u8, y: u8) {
        if let Some(cell) = self
            .cells
            .get_mut(y as usize)
            .and_then(|row| row.get_mut(x as usize))
            && *cell
        {
            *cell = false;
            tracing::debug!(x, y, "led off");
        }
    }
}

/// Telemetry sink writing one line per tick to stdout, like the serial
/// console on the reference hardware.
#[derive(Debug, Default)]
pub struct StdoutTelemetry;

impl Telemetry for StdoutTelemetry {
    fn write_line(&mut self, line: &str) {
        println!("{line}");
    }
}

/// Button that reads released for the first `presses_after` polls, then
/// pressed forever. Simulates the operator starting calibration.
#[derive(Debug)]
pub struct TimedButton {
    presses_after: u32,
    polls: u32,
}

impl TimedButton {
    pub fn new(presses_after: u32) -> Self {
        Self {
            presses_after,
            polls: 0,
        }
    }
}

impl Button for TimedButton {
    fn is_pressed(&mut self) -> bool {
        self.polls = self.polls.saturating_add(1);
        self.polls > self.presses_after
    }
}
