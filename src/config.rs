//! # Configuration Module
//!
//! Handles loading and validating configuration from TOML files.

use serde::Deserialize;
use serde::de::Error;
use std::fs;
use std::path::Path;

use crate::error::Result;
use crate::motion::protocol::{
    Resolution, ACC_RESOLUTION_PER_G, GYRO_RESOLUTION_IN_DEG_SEC, INPUT_REPORT_MIN_LEN,
};

/// Main configuration structure
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    #[serde(default)]
    pub motion: MotionConfig,
    pub capture: CaptureConfig,
    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

/// Motion decoding configuration
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct MotionConfig {
    #[serde(default = "default_gyro_resolution")]
    pub gyro_resolution: i32,

    #[serde(default = "default_accel_resolution")]
    pub accel_resolution: i32,

    #[serde(default)]
    pub report_offset: usize,

    #[serde(default = "default_history_depth")]
    pub history_depth: usize,
}

/// Capture replay configuration
#[derive(Debug, Deserialize, Clone)]
pub struct CaptureConfig {
    #[serde(default = "default_device_id")]
    pub device_id: String,

    /// Empty means the reports are decoded without calibration
    #[serde(default)]
    pub calibration_path: String,

    pub report_path: String,

    #[serde(default = "default_report_size")]
    pub report_size: usize,

    #[serde(default = "default_replay_rate_hz")]
    pub replay_rate_hz: u32,
}

/// Telemetry configuration
#[derive(Debug, Deserialize, Clone)]
pub struct TelemetryConfig {
    #[serde(default = "default_telemetry_enabled")]
    pub enabled: bool,

    #[serde(default = "default_log_dir")]
    pub log_dir: String,

    #[serde(default = "default_max_records_per_file")]
    pub max_records_per_file: usize,

    #[serde(default = "default_max_files_to_keep")]
    pub max_files_to_keep: usize,

    #[serde(default = "default_log_format")]
    pub format: String,
}

// Default value functions
fn default_gyro_resolution() -> i32 { GYRO_RESOLUTION_IN_DEG_SEC }
fn default_accel_resolution() -> i32 { ACC_RESOLUTION_PER_G }
fn default_history_depth() -> usize { 32 }

fn default_device_id() -> String { "ds4".to_string() }
fn default_report_size() -> usize { 64 }
fn default_replay_rate_hz() -> u32 { 250 }

fn default_telemetry_enabled() -> bool { true }
fn default_log_dir() -> String { "./logs".to_string() }
fn default_max_records_per_file() -> usize { 10000 }
fn default_max_files_to_keep() -> usize { 10 }
fn default_log_format() -> String { "jsonl".to_string() }

impl Default for MotionConfig {
    fn default() -> Self {
        Self {
            gyro_resolution: default_gyro_resolution(),
            accel_resolution: default_accel_resolution(),
            report_offset: 0,
            history_depth: default_history_depth(),
        }
    }
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            enabled: default_telemetry_enabled(),
            log_dir: default_log_dir(),
            max_records_per_file: default_max_records_per_file(),
            max_files_to_keep: default_max_files_to_keep(),
            format: default_log_format(),
        }
    }
}

impl MotionConfig {
    /// Resolutions used to scale raw counts
    ///
    /// # Errors
    ///
    /// Returns `InvalidResolution` if either value is out of range.
    pub fn resolution(&self) -> Result<Resolution> {
        Resolution::new(self.gyro_resolution, self.accel_resolution)
    }
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the configuration file
    ///
    /// # Returns
    ///
    /// * `Result<Config>` - Loaded and validated configuration
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - File cannot be read
    /// - TOML parsing fails
    /// - Validation fails
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use ds4_motion::config::Config;
    ///
    /// let config = Config::load("config/default.toml")?;
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values
    ///
    /// # Errors
    ///
    /// Returns error if any configuration value is out of valid range
    fn validate(&self) -> Result<()> {
        if let Err(e) = self.motion.resolution() {
            return Err(crate::error::MotionError::Config(
                toml::de::Error::custom(e)
            ));
        }

        if self.motion.history_depth == 0 || self.motion.history_depth > 4096 {
            return Err(crate::error::MotionError::Config(
                toml::de::Error::custom("history_depth must be between 1 and 4096")
            ));
        }

        if self.capture.device_id.is_empty() {
            return Err(crate::error::MotionError::Config(
                toml::de::Error::custom("device_id cannot be empty")
            ));
        }

        if self.capture.report_path.is_empty() {
            return Err(crate::error::MotionError::Config(
                toml::de::Error::custom("report_path cannot be empty")
            ));
        }

        // Every record must hold the tick counter and the motion block
        if self.capture.report_size < self.motion.report_offset.saturating_add(INPUT_REPORT_MIN_LEN) {
            return Err(crate::error::MotionError::Config(
                toml::de::Error::custom(format!(
                    "report_size must be at least report_offset + {}",
                    INPUT_REPORT_MIN_LEN
                ))
            ));
        }

        if self.capture.replay_rate_hz == 0 || self.capture.replay_rate_hz > 1000 {
            return Err(crate::error::MotionError::Config(
                toml::de::Error::custom("replay_rate_hz must be between 1 and 1000")
            ));
        }

        // Validate telemetry configuration
        if self.telemetry.enabled && self.telemetry.log_dir.is_empty() {
            return Err(crate::error::MotionError::Config(
                toml::de::Error::custom("telemetry log_dir cannot be empty when enabled")
            ));
        }

        if self.telemetry.max_records_per_file == 0 {
            return Err(crate::error::MotionError::Config(
                toml::de::Error::custom("max_records_per_file must be greater than 0")
            ));
        }

        if self.telemetry.max_files_to_keep == 0 {
            return Err(crate::error::MotionError::Config(
                toml::de::Error::custom("max_files_to_keep must be greater than 0")
            ));
        }

        if self.telemetry.format != "jsonl" {
            return Err(crate::error::MotionError::Config(
                toml::de::Error::custom("log format must be 'jsonl' (only supported format)")
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_valid_config() -> Config {
        Config {
            motion: MotionConfig::default(),
            capture: CaptureConfig {
                device_id: default_device_id(),
                calibration_path: String::new(),
                report_path: "capture.bin".to_string(),
                report_size: default_report_size(),
                replay_rate_hz: default_replay_rate_hz(),
            },
            telemetry: TelemetryConfig::default(),
        }
    }

    #[test]
    fn test_default_config() {
        assert!(create_valid_config().validate().is_ok());
    }

    #[test]
    fn test_load_config_from_file() {
        use std::io::Write;
        use tempfile::NamedTempFile;

        let toml_content = r#"
[motion]
history_depth = 8

[capture]
report_path = "captures/session.bin"
calibration_path = "captures/calibration.bin"
"#;

        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(toml_content.as_bytes()).unwrap();
        temp_file.flush().unwrap();

        let config = Config::load(temp_file.path()).unwrap();
        assert_eq!(config.motion.history_depth, 8);
        assert_eq!(config.motion.gyro_resolution, 16);
        assert_eq!(config.capture.report_size, 64);
        assert_eq!(config.capture.calibration_path, "captures/calibration.bin");
        assert!(config.telemetry.enabled);
    }

    #[test]
    fn test_load_missing_capture_section() {
        use std::io::Write;
        use tempfile::NamedTempFile;

        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(b"[motion]\n").unwrap();
        temp_file.flush().unwrap();

        assert!(Config::load(temp_file.path()).is_err());
    }

    #[test]
    fn test_load_nonexistent_file() {
        let result = Config::load("/nonexistent/ds4-motion.toml");
        assert!(matches!(result, Err(crate::error::MotionError::Io(_))));
    }

    #[test]
    fn test_resolution_from_config() {
        let config = create_valid_config();
        assert_eq!(config.motion.resolution().unwrap(), Resolution::DS4);
    }

    #[test]
    fn test_gyro_resolution_zero() {
        let mut config = create_valid_config();
        config.motion.gyro_resolution = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_gyro_resolution_too_high() {
        let mut config = create_valid_config();
        config.motion.gyro_resolution = 257;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_accel_resolution_too_low() {
        let mut config = create_valid_config();
        config.motion.accel_resolution = 63;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_accel_resolution_too_high() {
        let mut config = create_valid_config();
        config.motion.accel_resolution = 32769;
        assert!(config.validate().is_err());

        config.motion.accel_resolution = 2_000_000_000;
        assert!(config.validate().is_err());

        config.motion.accel_resolution = 32768;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_rejects_oversized_accel_resolution() {
        use std::io::Write;
        use tempfile::NamedTempFile;

        let toml_content = r#"
[motion]
accel_resolution = 2000000000

[capture]
report_path = "captures/session.bin"
"#;

        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(toml_content.as_bytes()).unwrap();
        temp_file.flush().unwrap();

        let result = Config::load(temp_file.path());
        assert!(matches!(result, Err(crate::error::MotionError::Config(_))));
    }

    #[test]
    fn test_report_offset_overflow() {
        let mut config = create_valid_config();
        config.motion.report_offset = usize::MAX;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_history_depth_zero() {
        let mut config = create_valid_config();
        config.motion.history_depth = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_history_depth_too_high() {
        let mut config = create_valid_config();
        config.motion.history_depth = 4097;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_empty_device_id() {
        let mut config = create_valid_config();
        config.capture.device_id = String::new();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_empty_report_path() {
        let mut config = create_valid_config();
        config.capture.report_path = String::new();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_report_size_too_small() {
        let mut config = create_valid_config();
        config.capture.report_size = 24;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_report_size_accounts_for_offset() {
        let mut config = create_valid_config();
        config.capture.report_size = 25;
        assert!(config.validate().is_ok());

        config.motion.report_offset = 2;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_replay_rate_zero() {
        let mut config = create_valid_config();
        config.capture.replay_rate_hz = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_replay_rate_too_high() {
        let mut config = create_valid_config();
        config.capture.replay_rate_hz = 1001;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_empty_log_dir_when_enabled() {
        let mut config = create_valid_config();
        config.telemetry.enabled = true;
        config.telemetry.log_dir = String::new();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_empty_log_dir_when_disabled() {
        let mut config = create_valid_config();
        config.telemetry.enabled = false;
        config.telemetry.log_dir = String::new();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_max_records_per_file_zero() {
        let mut config = create_valid_config();
        config.telemetry.max_records_per_file = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_max_files_to_keep_zero() {
        let mut config = create_valid_config();
        config.telemetry.max_files_to_keep = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_log_format() {
        let mut config = create_valid_config();
        config.telemetry.format = "csv".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_default_functions() {
        assert_eq!(default_gyro_resolution(), 16);
        assert_eq!(default_accel_resolution(), 8192);
        assert_eq!(default_history_depth(), 32);
        assert_eq!(default_device_id(), "ds4");
        assert_eq!(default_report_size(), 64);
        assert_eq!(default_replay_rate_hz(), 250);
        assert_eq!(default_telemetry_enabled(), true);
        assert_eq!(default_log_dir(), "./logs");
        assert_eq!(default_max_records_per_file(), 10000);
        assert_eq!(default_max_files_to_keep(), 10);
        assert_eq!(default_log_format(), "jsonl");
    }
}
