//! No-op collaborators used as builder defaults and in tests that only care
//! about part of the loop.

use rover_traits::{Button, Display, Telemetry};

/// Display that drops every pixel write.
pub struct NullDisplay;

impl Display for NullDisplay {
    fn plot(&mut self, _x: u8, _y: u8) {}
    fn unplot(&mut self, _x: u8, _y: u8) {}
}

/// Button that is never pressed; the rover waits forever.
pub struct NullButton;

impl Button for NullButton {
    fn is_pressed(&mut self) -> bool {
        false
    }
}

/// Telemetry sink that discards every line.
pub struct NullTelemetry;

impl Telemetry for NullTelemetry {
    fn write_line(&mut self, _line: &str) {}
}
