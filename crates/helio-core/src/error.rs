use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum HelioError {
    #[error("GPU device error: {0}")]
    GpuDeviceError(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("Out of memory: {0}")]
    OutOfMemory(String),

    #[error("Invalid state: {0}")]
    InvalidState(String),
}

impl HelioError {
    /// Configuration errors are caught at settings validation time and never
    /// surface from the per-frame path.
    pub fn is_configuration(&self) -> bool {
        matches!(self, HelioError::InvalidConfiguration(_))
    }
}

pub type Result<T> = std::result::Result<T, HelioError>;
