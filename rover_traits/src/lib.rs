pub mod clock;

pub use clock::{Clock, MonotonicClock};

/// Three-axis accelerometer. Units are sensor-native; no bounds guaranteed.
pub trait Accelerometer {
    fn read(&mut self) -> Result<(f32, f32, f32), Box<dyn std::error::Error + Send + Sync>>;
}

/// Distance sensor. A reading of exactly 0 means "no echo"; otherwise the
/// value is bounded by the sensor's ceiling (150 in the reference hardware).
pub trait RangeSensor {
    fn distance(&mut self) -> Result<f32, Box<dyn std::error::Error + Send + Sync>>;
}

/// Differential drive pair. Speeds are percentages in the motor driver's
/// magnitude-plus-direction encoding; the call is fire-and-forget.
pub trait Motors {
    fn drive(
        &mut self,
        left_percent: f32,
        right_percent: f32,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;
}

/// Small fixed-size pixel grid (5x5 on the reference hardware).
/// plot/unplot are idempotent set/clear of a single cell.
pub trait Display {
    fn plot(&mut self, x: u8, y: u8);
    fn unplot(&mut self, x: u8, y: u8);
}

/// Polled button input. Level-triggered: callers that need edges must detect
/// them themselves.
pub trait Button {
    fn is_pressed(&mut self) -> bool;
}

/// Line-oriented diagnostic sink (serial console, stdout, test buffer).
pub trait Telemetry {
    fn write_line(&mut self, line: &str);
}
