//! # Telemetry Module
//!
//! Handles motion telemetry logging to JSONL files with rotation.
//!
//! This module handles:
//! - Receiving motion events from a session's channel subscriber
//! - Formatting as JSONL (JSON Lines)
//! - Writing to rotating log files
//! - Managing file rotation (max N records per file)
//! - Retaining only last M files

pub mod logger;

pub use logger::{drain_blocking, TelemetryLogger};
