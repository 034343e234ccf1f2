//! Accelerometer fusion: raw 3-axis samples become forward/up/lateral
//! channels, smoothed over a short rolling window.

use rover_config::FilterCfg;

/// Depth of the rolling history. The window is a structural invariant of the
/// filter (callers and calibration assume it), not a tuning knob.
pub const SMOOTHING_WINDOW: usize = 4;

const FORWARD: usize = 0;
const UP: usize = 1;
const LATERAL: usize = 2;

/// One fused, offset-corrected reading.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct VectorSample {
    /// Positive = acceleration forward.
    pub forward: f32,
    /// Vertical channel, gravity-compensated.
    pub up: f32,
    /// Side-to-side channel (positive = right).
    pub lateral: f32,
}

/// Additive per-channel bias learned during calibration. Zero until the
/// calibration phase completes.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Offset {
    pub forward: f32,
    pub up: f32,
    pub lateral: f32,
}

impl Offset {
    pub const ZERO: Offset = Offset {
        forward: 0.0,
        up: 0.0,
        lateral: 0.0,
    };
}

/// Converts raw acceleration into semantic channels and keeps a
/// most-recent-first history of the last [`SMOOTHING_WINDOW`] ticks.
///
/// The lateral slot of the history stores the *raw* x axis value, not the
/// offset-corrected one. That asymmetry is inherited from the reference
/// firmware and is load-bearing for behavioral parity.
#[derive(Debug, Clone)]
pub struct SignalFilter {
    /// sin(mount angle); projects y/z onto the forward/up channels.
    tilt_factor: f32,
    /// Counts added to the up channel to cancel gravity.
    gravity_bias: f32,
    /// history[channel][0] is the newest sample.
    history: [[f32; SMOOTHING_WINDOW]; 3],
    current: VectorSample,
    average: VectorSample,
}

impl SignalFilter {
    pub fn new(cfg: &FilterCfg) -> Self {
        Self {
            tilt_factor: cfg.mount_angle_deg.to_radians().sin(),
            gravity_bias: cfg.gravity_bias,
            history: [[0.0; SMOOTHING_WINDOW]; 3],
            current: VectorSample::default(),
            average: VectorSample::default(),
        }
    }

    /// Fuse one raw (x, y, z) reading. Total over finite inputs; NaN and
    /// infinities propagate untouched, no clamping.
    pub fn update(&mut self, raw: (f32, f32, f32), offset: &Offset) -> VectorSample {
        let (x, y, z) = raw;

        let up = self.tilt_factor * (-y + z) + self.gravity_bias + offset.up;
        let forward = self.tilt_factor * (-y - z) + offset.forward;
        let lateral = x + offset.lateral;
        self.current = VectorSample {
            forward,
            up,
            lateral,
        };

        // Shift each channel one slot toward the back, dropping the oldest.
        for channel in &mut self.history {
            for i in (1..SMOOTHING_WINDOW).rev() {
                channel[i] = channel[i - 1];
            }
        }
        self.history[FORWARD][0] = forward;
        self.history[UP][0] = up;
        self.history[LATERAL][0] = x; // raw axis value, pre-offset

        self.average = VectorSample {
            forward: mean(&self.history[FORWARD]),
            up: mean(&self.history[UP]),
            lateral: mean(&self.history[LATERAL]),
        };

        self.current
    }

    /// The instantaneous sample from the latest `update`.
    pub fn current(&self) -> VectorSample {
        self.current
    }

    /// Mean of the last [`SMOOTHING_WINDOW`] ticks; untouched slots read as
    /// their initial zero before the window fills.
    pub fn average(&self) -> VectorSample {
        self.average
    }
}

#[inline]
fn mean(window: &[f32; SMOOTHING_WINDOW]) -> f32 {
    window.iter().sum::<f32>() / SMOOTHING_WINDOW as f32
}
