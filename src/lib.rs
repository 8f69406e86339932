//! # DS4 Motion Library
//!
//! Calibrated motion sensor decoding for DualShock 4 controllers.
//!
//! This library turns the raw gyro and accelerometer fields of controller input
//! reports into physical units (deg/s and g) using the factory calibration the
//! controller reports once per connection, and reconstructs a monotonic
//! microsecond timestamp from the report's wrapping tick counter.

pub mod config;
pub mod error;
pub mod motion;
pub mod capture;
pub mod telemetry;
