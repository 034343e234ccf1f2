//! Human-readable error descriptions and structured JSON error formatting.

use rover_core::error::{BuildError, RoverError};

/// Map an eyre::Report to a human-readable explanation with likely causes and fix hints.
pub fn humanize(err: &eyre::Report) -> String {
    // Typed matches first
    if let Some(be) = err.downcast_ref::<BuildError>() {
        return match be {
            BuildError::MissingAccelerometer => {
                "What happened: No accelerometer was provided to the control engine.\nLikely causes: The sensor failed to initialize or was not wired into the builder.\nHow to fix: Ensure the accelerometer is created successfully and passed via with_accelerometer(...).".to_string()
            }
            BuildError::MissingRangeSensor => {
                "What happened: No range sensor was provided to the control engine.\nLikely causes: The sonar failed to initialize or was not wired into the builder.\nHow to fix: Ensure the range sensor is created successfully and passed via with_range_sensor(...).".to_string()
            }
            BuildError::MissingMotors => {
                "What happened: No motor driver was provided to the control engine.\nLikely causes: The driver failed to initialize or was not wired into the builder.\nHow to fix: Ensure the motors are created successfully and passed via with_motors(...).".to_string()
            }
            BuildError::InvalidConfig(msg) => format!(
                "What happened: Invalid configuration ({msg}).\nLikely causes: Missing or out-of-range values in the TOML.\nHow to fix: Edit the config file, then rerun. See README for a sample."
            ),
        };
    }

    if let Some(re) = err.downcast_ref::<RoverError>() {
        if let RoverError::HardwareFault(detail) = re {
            return format!(
                "What happened: A hardware collaborator faulted ({detail}).\nLikely causes: Sensor disconnected, bus error, or driver failure mid-run.\nHow to fix: Check wiring and power, then restart the run."
            );
        }
        return format!(
            "What happened: {re}.\nLikely causes: See logs.\nHow to fix: Re-run with --log-level=debug or set RUST_LOG for more detail."
        );
    }

    // String-based heuristics for errors coming from init or config
    let msg = err.to_string();
    let lower = msg.to_ascii_lowercase();

    if lower.contains("reading accelerometer") || lower.contains("reading range sensor") {
        return "What happened: A sensor read failed mid-run.\nLikely causes: Loose wiring, power brownout, or a sensor fault.\nHow to fix: Check connections and power, then restart the run.".to_string();
    }

    if lower.contains("invalid configuration") || lower.contains("must be") {
        return "What happened: Configuration is invalid or incomplete.\nLikely causes: Out-of-range values in [filter], [calibration], [avoidance], or [runner].\nHow to fix: Edit the TOML config and try again.".to_string();
    }

    // Generic fallback
    let mut cause = String::new();
    if let Some(src) = err.source() {
        cause = format!(" Cause: {src}");
    }
    format!(
        "Something went wrong.{cause}\nHow to fix: Re-run with --log-level=debug for details. Original: {msg}"
    )
}

/// Map typed errors to stable exit codes; everything else returns 1.
pub fn exit_code_for_error(err: &eyre::Report) -> i32 {
    if err.downcast_ref::<BuildError>().is_some() {
        return 2;
    }
    if let Some(RoverError::HardwareFault(_)) = err.downcast_ref::<RoverError>() {
        return 3;
    }
    1
}

/// Structured JSON for errors when --json is enabled.
pub fn format_error_json(err: &eyre::Report) -> String {
    use serde_json::json;

    let reason = if let Some(be) = err.downcast_ref::<BuildError>() {
        match be {
            BuildError::MissingAccelerometer => "MissingAccelerometer",
            BuildError::MissingRangeSensor => "MissingRangeSensor",
            BuildError::MissingMotors => "MissingMotors",
            BuildError::InvalidConfig(_) => "InvalidConfig",
        }
    } else if let Some(re) = err.downcast_ref::<RoverError>() {
        match re {
            RoverError::Hardware(_) => "Hardware",
            RoverError::HardwareFault(_) => "HardwareFault",
            RoverError::Config(_) => "Config",
            RoverError::State(_) => "State",
            RoverError::Io(_) => "Io",
        }
    } else {
        "Error"
    };

    json!({ "reason": reason, "message": humanize(err) }).to_string()
}
