//! Guided calibration: countdown, sample accumulation, and offset derivation.

use crate::filter::{Offset, VectorSample};
use crate::util::round_half_up;
use rover_config::CalibrationCfg;

/// Calibrator state. Strictly forward: Idle -> CountingDown -> Sampling ->
/// Done. There is no cancel transition; once started, calibration runs to
/// completion (a known limitation of the reference behavior, kept on
/// purpose).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CalibState {
    Idle,
    CountingDown,
    Sampling,
    Done,
}

/// What one calibrator tick decided, including the indicator the phase
/// controller should show.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CalibStep {
    /// Waiting for the operator; nothing to do.
    Idle,
    /// Countdown in progress; show a dot at this column of row 0.
    CountingDown { dot_column: i32 },
    /// Accumulating samples; blink the status dot.
    Sampling { blink_on: bool },
    /// Final sample taken this tick; the derived offset applies from the
    /// next filter update onward.
    Complete(Offset),
    /// Calibration already finished.
    Done,
}

#[derive(Debug, Clone)]
pub struct Calibrator {
    cfg: CalibrationCfg,
    state: CalibState,
    countdown_remaining: f32,
    sums: [f32; 3],
    samples_done: u32,
}

impl Calibrator {
    pub fn new(cfg: CalibrationCfg) -> Self {
        Self {
            countdown_remaining: cfg.countdown_s,
            cfg,
            state: CalibState::Idle,
            sums: [0.0; 3],
            samples_done: 0,
        }
    }

    pub fn state(&self) -> CalibState {
        self.state
    }

    pub fn is_idle(&self) -> bool {
        self.state == CalibState::Idle
    }

    /// Begin the countdown. Only meaningful while Idle; later calls are
    /// ignored, which is what makes the level-triggered button safe after
    /// the first registered press.
    pub fn start(&mut self) {
        if self.state == CalibState::Idle {
            self.state = CalibState::CountingDown;
        }
    }

    /// Advance one tick.
    ///
    /// `dt` is the frame time in seconds (a stalled loop simply pauses the
    /// countdown), `now_s` is wall-clock seconds driving the blink phase,
    /// and `sample` is the *instantaneous* fused sample from this tick, not
    /// the rolling average.
    pub fn tick(&mut self, dt: f32, now_s: f64, sample: VectorSample) -> CalibStep {
        match self.state {
            CalibState::Idle => CalibStep::Idle,
            CalibState::Done => CalibStep::Done,
            CalibState::CountingDown => {
                if self.countdown_remaining > 0.0 {
                    self.countdown_remaining -= dt;
                    // 3 dots for a 3 second countdown: columns 2, 3, 4.
                    // The +0.5 bias inside the round is part of the
                    // reference formula.
                    let dot =
                        3.0 - round_half_up(self.countdown_remaining + 0.5) + 2.0;
                    CalibStep::CountingDown {
                        dot_column: dot as i32,
                    }
                } else {
                    self.state = CalibState::Sampling;
                    self.sample(now_s, sample)
                }
            }
            CalibState::Sampling => self.sample(now_s, sample),
        }
    }

    fn sample(&mut self, now_s: f64, sample: VectorSample) -> CalibStep {
        self.sums[0] += sample.forward;
        self.sums[1] += sample.up;
        self.sums[2] += sample.lateral;
        self.samples_done += 1;

        if self.samples_done >= self.cfg.samples {
            let n = self.samples_done as f32;
            let offset = Offset {
                forward: -(self.sums[0] / n),
                up: -(self.sums[1] / n),
                lateral: -(self.sums[2] / n),
            };
            self.state = CalibState::Done;
            return CalibStep::Complete(offset);
        }

        // Blink with a fixed half-period, phased off wall-clock time.
        let phase = round_half_up((now_s / f64::from(self.cfg.blink_half_period_s)) as f32);
        CalibStep::Sampling {
            blink_on: (phase as i64) % 2 != 0,
        }
    }
}
