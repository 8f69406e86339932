//! # Error Types
//!
//! Custom error types for DS4 Motion using `thiserror`.

use thiserror::Error;

use crate::motion::protocol::Axis;

/// Main error type for DS4 Motion
#[derive(Debug, Error)]
pub enum MotionError {
    /// Calibration or input report shorter than the layout requires
    #[error("{context} too short: expected at least {expected} bytes, got {actual}")]
    BufferTooShort {
        context: &'static str,
        expected: usize,
        actual: usize,
    },

    /// A calibration range of zero width (or a zero gyro scale) for an axis
    #[error("Degenerate calibration range on {axis} axis")]
    DegenerateRange { axis: Axis },

    /// Gyro or accelerometer resolution outside the supported range
    #[error("Invalid resolution: {0}")]
    InvalidResolution(String),

    /// Receiving end of a subscriber channel was dropped
    #[error("Subscriber channel closed")]
    ChannelClosed,

    /// Malformed capture file
    #[error("Capture error: {0}")]
    Capture(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] toml::de::Error),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for DS4 Motion
pub type Result<T> = std::result::Result<T, MotionError>;
