//! # Motion Module
//!
//! DualShock 4 motion sensor decoding.
//!
//! This module handles:
//! - Parsing the factory calibration feature report (USB and Bluetooth layouts)
//! - Applying bias/scale calibration to the six raw motion fields
//! - Unwrapping the 16-bit report tick counter into microseconds
//! - Building physically-scaled motion samples and notifying subscribers

pub mod protocol;
pub mod calibration;
pub mod calibrator;
pub mod timestamp;
pub mod sample;
pub mod subscriber;
pub mod session;

pub use calibration::{parse_calibration, AxisCalibration, CalibrationSet};
pub use calibrator::{apply_calibration, calibrate_motion};
pub use sample::MotionSample;
pub use session::{process_report, MotionSession};
pub use timestamp::TimestampState;
