use std::error::Error;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use rover_config::{AvoidanceCfg, CalibrationCfg};
use rover_core::avoidance::Steer;
use rover_core::{Phase, Rover, TickStatus};
use rover_traits::clock::Clock;
use rover_traits::{Accelerometer, Button, Display, Motors, RangeSensor, Telemetry};

/// Accelerometer that always reports the same raw triple.
struct ConstAccel(f32, f32, f32);
impl Accelerometer for ConstAccel {
    fn read(&mut self) -> Result<(f32, f32, f32), Box<dyn Error + Send + Sync>> {
        Ok((self.0, self.1, self.2))
    }
}

/// Range sensor that returns a fixed sequence, then repeats the last value.
struct SeqRange {
    seq: Vec<f32>,
    idx: usize,
}
impl SeqRange {
    fn new(seq: impl Into<Vec<f32>>) -> Self {
        Self {
            seq: seq.into(),
            idx: 0,
        }
    }
}
impl RangeSensor for SeqRange {
    fn distance(&mut self) -> Result<f32, Box<dyn Error + Send + Sync>> {
        let v = if self.idx < self.seq.len() {
            let x = self.seq[self.idx];
            self.idx += 1;
            x
        } else {
            self.seq.last().copied().unwrap_or(0.0)
        };
        Ok(v)
    }
}

/// Motor spy recording every issued command.
#[derive(Clone, Default)]
struct SpyMotors(Arc<Mutex<Vec<(f32, f32)>>>);
impl SpyMotors {
    fn commands(&self) -> Vec<(f32, f32)> {
        self.0.lock().unwrap().clone()
    }
}
impl Motors for SpyMotors {
    fn drive(&mut self, left: f32, right: f32) -> Result<(), Box<dyn Error + Send + Sync>> {
        self.0.lock().unwrap().push((left, right));
        Ok(())
    }
}

/// Display fake tracking lit cells and redundant writes (for idempotence).
#[derive(Clone, Default)]
struct GridDisplay {
    cells: Arc<Mutex<[[bool; 5]; 5]>>,
    redundant_plots: Arc<Mutex<u32>>,
}
impl GridDisplay {
    fn is_lit(&self, x: u8, y: u8) -> bool {
        self.cells.lock().unwrap()[y as usize][x as usize]
    }
    fn redundant_plots(&self) -> u32 {
        *self.redundant_plots.lock().unwrap()
    }
}
impl Display for GridDisplay {
    fn plot(&mut self, x: u8, y: u8) {
        let mut cells = self.cells.lock().unwrap();
        if let Some(cell) = cells
            .get_mut(y as usize)
            .and_then(|row| row.get_mut(x as usize))
        {
            if *cell {
                *self.redundant_plots.lock().unwrap() += 1;
            }
            *cell = true;
        }
    }
    fn unplot(&mut self, x: u8, y: u8) {
        if let Some(cell) = self
            .cells
            .lock()
            .unwrap()
            .get_mut(y as usize)
            .and_then(|row| row.get_mut(x as usize))
        {
            *cell = false;
        }
    }
}

struct HeldButton;
impl Button for HeldButton {
    fn is_pressed(&mut self) -> bool {
        true
    }
}

#[derive(Clone, Default)]
struct VecTelemetry(Arc<Mutex<Vec<String>>>);
impl VecTelemetry {
    fn lines(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }
}
impl Telemetry for VecTelemetry {
    fn write_line(&mut self, line: &str) {
        self.0.lock().unwrap().push(line.to_string());
    }
}

/// Deterministic test clock advanced manually.
#[derive(Clone)]
struct TestClock {
    origin: Instant,
    offset: Arc<Mutex<Duration>>,
}
impl TestClock {
    fn new() -> Self {
        Self {
            origin: Instant::now(),
            offset: Arc::new(Mutex::new(Duration::ZERO)),
        }
    }
    fn advance(&self, d: Duration) {
        *self.offset.lock().unwrap() += d;
    }
}
impl Clock for TestClock {
    fn now(&self) -> Instant {
        self.origin + *self.offset.lock().unwrap()
    }
    fn sleep(&self, d: Duration) {
        self.advance(d);
    }
}

/// Calibration config that skips the countdown so sampling starts on the
/// first tick after the button press.
fn instant_calibration() -> CalibrationCfg {
    CalibrationCfg {
        countdown_s: 0.0,
        ..CalibrationCfg::default()
    }
}

#[test]
fn waits_for_button_and_shows_waiting_dot() {
    let display = GridDisplay::default();
    let mut rover = Rover::builder()
        .with_accelerometer(ConstAccel(0.0, 0.0, 0.0))
        .with_range_sensor(SeqRange::new([0.0]))
        .with_motors(SpyMotors::default())
        .with_display(display.clone())
        .build()
        .expect("build rover");

    for _ in 0..5 {
        assert_eq!(rover.tick().expect("tick"), TickStatus::Waiting);
    }
    assert_eq!(rover.phase(), Phase::Calibrating);
    assert!(display.is_lit(0, 0));
}

#[test]
fn countdown_takes_three_seconds_of_ticks() {
    let clock = TestClock::new();
    let mut rover = Rover::builder()
        .with_accelerometer(ConstAccel(0.0, 0.0, 0.0))
        .with_range_sensor(SeqRange::new([0.0]))
        .with_motors(SpyMotors::default())
        .with_button(HeldButton)
        .with_clock(clock.clone())
        .build()
        .expect("build rover");

    // One tick per second: three CountingDown ticks, then Sampling.
    for _ in 0..3 {
        clock.advance(Duration::from_secs(1));
        assert_eq!(rover.tick().expect("tick"), TickStatus::CountingDown);
    }
    clock.advance(Duration::from_secs(1));
    assert_eq!(rover.tick().expect("tick"), TickStatus::Sampling);
}

#[test]
fn calibration_offsets_null_the_fused_channels() {
    let display = GridDisplay::default();
    let mut rover = Rover::builder()
        .with_accelerometer(ConstAccel(12.0, 100.0, -50.0))
        .with_range_sensor(SeqRange::new([0.0]))
        .with_motors(SpyMotors::default())
        .with_button(HeldButton)
        .with_display(display.clone())
        .with_calibration(instant_calibration())
        .build()
        .expect("build rover");

    let mut statuses = Vec::new();
    for _ in 0..50 {
        statuses.push(rover.tick().expect("tick"));
    }
    assert_eq!(statuses[48], TickStatus::Sampling);
    assert_eq!(statuses[49], TickStatus::CalibrationComplete);
    assert_eq!(rover.phase(), Phase::Running);
    // Completion indicator is lit steady.
    assert!(display.is_lit(1, 0));

    // The offset is the negated mean of 50 identical samples, so the next
    // fused samples sit at (numerically) zero; flush the 4-slot window.
    for _ in 0..4 {
        rover.tick().expect("tick");
    }
    let avg = rover.average();
    assert!(avg.forward.abs() < 1e-3, "forward {}", avg.forward);
    assert!(avg.up.abs() < 1e-3, "up {}", avg.up);
    // The lateral history stores the raw axis value, so its average stays at
    // the raw x reading rather than being nulled.
    assert!((avg.lateral - 12.0).abs() < 1e-3, "lateral {}", avg.lateral);
}

#[test]
fn running_phase_steers_by_threshold_and_updates_display() {
    let display = GridDisplay::default();
    let mut rover = Rover::builder()
        .with_accelerometer(ConstAccel(0.0, 0.0, 0.0))
        // 50 readings during calibration, then 49 / 50 / 0.
        .with_range_sensor(SeqRange::new(
            std::iter::repeat(150.0)
                .take(50)
                .chain([49.0, 50.0, 0.0])
                .collect::<Vec<_>>(),
        ))
        .with_motors(SpyMotors::default())
        .with_button(HeldButton)
        .with_display(display.clone())
        .with_calibration(instant_calibration())
        .build()
        .expect("build rover");

    for _ in 0..50 {
        rover.tick().expect("tick");
    }
    assert_eq!(rover.phase(), Phase::Running);

    // 49 is strictly below the threshold: turn.
    assert_eq!(rover.tick().expect("tick"), TickStatus::Running(Steer::Turn));
    assert!(display.is_lit(4, 2));
    assert!(!display.is_lit(2, 2));

    // 50 is the boundary: forward.
    assert_eq!(
        rover.tick().expect("tick"),
        TickStatus::Running(Steer::Forward)
    );
    assert!(display.is_lit(2, 2));
    assert!(!display.is_lit(4, 2));

    // 0 is "no echo", normalized to the 150 ceiling: forward.
    assert_eq!(
        rover.tick().expect("tick"),
        TickStatus::Running(Steer::Forward)
    );
    assert_eq!(rover.last_range(), 150.0);
}

#[test]
fn display_only_policy_leaves_motors_at_last_command() {
    let motors = SpyMotors::default();
    let mut rover = Rover::builder()
        .with_accelerometer(ConstAccel(0.0, 0.0, 0.0))
        .with_range_sensor(SeqRange::new([10.0]))
        .with_motors(motors.clone())
        .with_button(HeldButton)
        .with_calibration(instant_calibration())
        .build()
        .expect("build rover");

    for _ in 0..55 {
        rover.tick().expect("tick");
    }
    // Obstacle at 10 units the whole time, but the default policy only
    // touches the display; the command stays at its initial zero.
    assert!(motors.commands().iter().all(|&c| c == (0.0, 0.0)));
}

#[test]
fn drive_enabled_policy_issues_encoded_commands() {
    let motors = SpyMotors::default();
    let avoidance = AvoidanceCfg {
        drive_enabled: true,
        ..AvoidanceCfg::default()
    };
    let mut rover = Rover::builder()
        .with_accelerometer(ConstAccel(0.0, 0.0, 0.0))
        .with_range_sensor(SeqRange::new(
            std::iter::repeat(150.0)
                .take(50)
                .chain([49.0, 150.0])
                .collect::<Vec<_>>(),
        ))
        .with_motors(motors.clone())
        .with_button(HeldButton)
        .with_calibration(instant_calibration())
        .with_avoidance(avoidance)
        .build()
        .expect("build rover");

    for _ in 0..50 {
        rover.tick().expect("tick");
    }
    // Turn: left -0.3 encodes to -1 - (-0.3) = -0.7, scaled to -70. The
    // right side lands a hair off 30 because 0.3 is not exact in f32.
    rover.tick().expect("tick");
    let (left, right) = motors.commands().last().copied().expect("turn command");
    assert_eq!(left, -70.0);
    assert!((right - 30.0).abs() < 1e-4, "right {right}");
    // Forward: 0.3 / 0.3 scale to 30 / 30.
    rover.tick().expect("tick");
    let (left, right) = motors.commands().last().copied().expect("forward command");
    assert!((left - 30.0).abs() < 1e-4, "left {left}");
    assert!((right - 30.0).abs() < 1e-4, "right {right}");
}

#[test]
fn telemetry_reports_guarded_fps_and_range() {
    let clock = TestClock::new();
    let telemetry = VecTelemetry::default();
    let mut rover = Rover::builder()
        .with_accelerometer(ConstAccel(0.0, 0.0, 0.0))
        .with_range_sensor(SeqRange::new([0.0]))
        .with_motors(SpyMotors::default())
        .with_telemetry(telemetry.clone())
        .with_clock(clock.clone())
        .build()
        .expect("build rover");

    // First tick has a zero dt; the guard reports 0.00 instead of dividing
    // by zero.
    rover.tick().expect("tick");
    clock.advance(Duration::from_millis(500));
    rover.tick().expect("tick");

    let lines = telemetry.lines();
    assert_eq!(lines[0], "0.00fps, 150");
    assert_eq!(lines[1], "2.00fps, 150");
}

#[test]
fn repeated_waiting_plots_are_idempotent() {
    let display = GridDisplay::default();
    let mut rover = Rover::builder()
        .with_accelerometer(ConstAccel(0.0, 0.0, 0.0))
        .with_range_sensor(SeqRange::new([0.0]))
        .with_motors(SpyMotors::default())
        .with_display(display.clone())
        .build()
        .expect("build rover");

    for _ in 0..10 {
        rover.tick().expect("tick");
    }
    // The waiting dot is plotted every tick; the cell just stays lit.
    assert!(display.is_lit(0, 0));
    assert_eq!(display.redundant_plots(), 9);
}

#[test]
fn accelerometer_error_propagates() {
    struct ErrAccel;
    impl Accelerometer for ErrAccel {
        fn read(&mut self) -> Result<(f32, f32, f32), Box<dyn Error + Send + Sync>> {
            Err("boom".into())
        }
    }

    let mut rover = Rover::builder()
        .with_accelerometer(ErrAccel)
        .with_range_sensor(SeqRange::new([0.0]))
        .with_motors(SpyMotors::default())
        .build()
        .expect("build rover");

    let err = rover.tick().expect_err("tick should fail");
    let msg = format!("{err}");
    assert!(msg.contains("accelerometer"), "unexpected error: {msg}");
}

#[cfg(feature = "hardware-errors")]
#[test]
fn typed_hardware_faults_survive_the_error_chain() {
    use rover_core::error::RoverError;
    use rover_hardware::error::HwError;

    struct FaultyAccel;
    impl Accelerometer for FaultyAccel {
        fn read(&mut self) -> Result<(f32, f32, f32), Box<dyn Error + Send + Sync>> {
            Err(Box::new(HwError::Sensor("i2c bus stuck".into())))
        }
    }

    let mut rover = Rover::builder()
        .with_accelerometer(FaultyAccel)
        .with_range_sensor(SeqRange::new([0.0]))
        .with_motors(SpyMotors::default())
        .build()
        .expect("build rover");

    let err = rover.tick().expect_err("tick should fail");
    match err.downcast_ref::<RoverError>() {
        Some(RoverError::HardwareFault(detail)) => {
            assert!(detail.contains("i2c bus stuck"), "detail: {detail}");
        }
        other => panic!("expected HardwareFault, got {other:?}"),
    }
}

#[test]
fn rejects_invalid_calibration_config() {
    let err = Rover::builder()
        .with_accelerometer(ConstAccel(0.0, 0.0, 0.0))
        .with_range_sensor(SeqRange::new([0.0]))
        .with_motors(SpyMotors::default())
        .with_calibration(CalibrationCfg {
            samples: 0,
            ..CalibrationCfg::default()
        })
        .build()
        .expect_err("samples=0 must be rejected");
    assert!(format!("{err}").contains("samples"));
}
