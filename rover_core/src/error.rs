use thiserror::Error;

#[derive(Debug, Error, Clone)]
pub enum RoverError {
    #[error("hardware error: {0}")]
    Hardware(String),
    #[error("hardware fault: {0}")]
    HardwareFault(String),
    #[error("configuration error: {0}")]
    Config(String),
    #[error("invalid state: {0}")]
    State(String),
    #[error("io error: {0}")]
    Io(String),
}

#[derive(Debug, Error, Clone)]
pub enum BuildError {
    #[error("missing accelerometer")]
    MissingAccelerometer,
    #[error("missing range sensor")]
    MissingRangeSensor,
    #[error("missing motors")]
    MissingMotors,
    #[error("invalid config: {0}")]
    InvalidConfig(&'static str),
}

pub type Result<T> = eyre::Result<T>;
pub use eyre::Report;
