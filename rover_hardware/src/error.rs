use thiserror::Error;

#[derive(Debug, Error)]
pub enum HwError {
    #[error("sensor fault: {0}")]
    Sensor(String),
    #[error("motor fault: {0}")]
    Motor(String),
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, HwError>;
