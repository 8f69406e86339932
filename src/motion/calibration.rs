//! # Factory Calibration Module
//!
//! Parses the calibration feature report into per-axis bias and multiplier
//! pairs.
//!
//! ## Feature Report Layout
//!
//! Byte 0 is the report id, followed by 17 little-endian i16 fields:
//!
//! | Fields | Content |
//! |--------|---------|
//! | 0-2    | Gyro bias: pitch, yaw, roll |
//! | 3-8    | Gyro ranges (ordering depends on transport, see below) |
//! | 9-10   | Gyro scale: positive, negative |
//! | 11-16  | Accel ranges: x+, x-, y+, y-, z+, z- |
//!
//! The controller reports the gyro ranges differently depending on whether its
//! USB or Bluetooth stack answered the request:
//!
//! - Bluetooth (report id 5): pitch+, yaw+, roll+, pitch-, yaw-, roll-
//! - USB (any other id): pitch+, pitch-, yaw+, yaw-, roll+, roll-
//!
//! ## Usage
//!
//! ```
//! use ds4_motion::motion::calibration::parse_calibration;
//!
//! let mut report = [0u8; 35];
//! report[0] = 0x05;
//! let fields: [i16; 17] = [
//!     0, 0, 0,
//!     100, 100, 100, -100, -100, -100,
//!     1, 1,
//!     8192, -8192, 8192, -8192, 8192, -8192,
//! ];
//! for (i, f) in fields.iter().enumerate() {
//!     report[1 + i * 2..3 + i * 2].copy_from_slice(&f.to_le_bytes());
//! }
//!
//! let cal = parse_calibration(&report)?;
//! assert!((cal.pitch.multiplier - 0.16).abs() < 1e-9);
//! assert_eq!(cal.x.bias, 0);
//! # Ok::<(), ds4_motion::error::MotionError>(())
//! ```

use bytes::Buf;
use tracing::debug;

use super::protocol::{
    ensure_len, Axis, MotionAxes, Resolution, BLUETOOTH_CALIBRATION_REPORT_ID,
    CALIBRATION_FIELDS_OFFSET, CALIBRATION_REPORT_MIN_LEN,
};
use crate::error::{MotionError, Result};

/// Bias and scale for a single motion axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AxisCalibration {
    /// Raw reading corresponding to a true zero
    pub bias: i16,
    /// Scale from bias-corrected counts to calibrated counts
    pub multiplier: f64,
}

impl Default for AxisCalibration {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl AxisCalibration {
    /// Calibration that leaves raw values unchanged.
    pub const IDENTITY: AxisCalibration = AxisCalibration {
        bias: 0,
        multiplier: 1.0,
    };

    /// Applies bias and multiplier to a raw reading.
    ///
    /// The result is rounded half-to-even and saturated to the i16 range.
    ///
    /// # Examples
    ///
    /// ```
    /// use ds4_motion::motion::calibration::AxisCalibration;
    ///
    /// let cal = AxisCalibration { bias: 10, multiplier: 2.0 };
    /// assert_eq!(cal.apply(20), 20);
    /// assert_eq!(cal.apply(i16::MAX), i16::MAX);
    /// ```
    #[must_use]
    pub fn apply(&self, raw: i16) -> i16 {
        let biased = i32::from(raw) - i32::from(self.bias);
        let scaled = (f64::from(biased) * self.multiplier).round_ties_even();
        scaled.clamp(f64::from(i16::MIN), f64::from(i16::MAX)) as i16
    }
}

/// Transport whose stack produced a calibration feature report
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CalibrationLayout {
    Bluetooth,
    Usb,
}

impl CalibrationLayout {
    /// Detects the layout from the report id in byte 0.
    #[must_use]
    pub fn from_report_id(report_id: u8) -> Self {
        if report_id == BLUETOOTH_CALIBRATION_REPORT_ID {
            CalibrationLayout::Bluetooth
        } else {
            CalibrationLayout::Usb
        }
    }
}

/// Calibration for all six motion axes of one controller.
///
/// Immutable once parsed. A new set replaces the old one wholesale when the
/// controller reconnects and reports fresh calibration bytes.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CalibrationSet {
    pub pitch: AxisCalibration,
    pub yaw: AxisCalibration,
    pub roll: AxisCalibration,
    pub x: AxisCalibration,
    pub y: AxisCalibration,
    pub z: AxisCalibration,
}

impl CalibrationSet {
    /// Parses a calibration feature report using the given resolutions.
    ///
    /// # Errors
    ///
    /// - `BufferTooShort` if the report holds fewer than 35 bytes
    /// - `DegenerateRange` if any axis range has zero width or the gyro
    ///   scale fields sum to zero
    pub fn parse(report: &[u8], resolution: Resolution) -> Result<Self> {
        ensure_len(report, CALIBRATION_REPORT_MIN_LEN, "Calibration report")?;

        let layout = CalibrationLayout::from_report_id(report[0]);
        let mut fields = &report[CALIBRATION_FIELDS_OFFSET..CALIBRATION_REPORT_MIN_LEN];

        let pitch_bias = fields.get_i16_le();
        let yaw_bias = fields.get_i16_le();
        let roll_bias = fields.get_i16_le();

        let (pitch_pos, pitch_neg, yaw_pos, yaw_neg, roll_pos, roll_neg) = match layout {
            CalibrationLayout::Bluetooth => {
                let pitch_pos = fields.get_i16_le();
                let yaw_pos = fields.get_i16_le();
                let roll_pos = fields.get_i16_le();
                let pitch_neg = fields.get_i16_le();
                let yaw_neg = fields.get_i16_le();
                let roll_neg = fields.get_i16_le();
                (pitch_pos, pitch_neg, yaw_pos, yaw_neg, roll_pos, roll_neg)
            }
            CalibrationLayout::Usb => {
                let pitch_pos = fields.get_i16_le();
                let pitch_neg = fields.get_i16_le();
                let yaw_pos = fields.get_i16_le();
                let yaw_neg = fields.get_i16_le();
                let roll_pos = fields.get_i16_le();
                let roll_neg = fields.get_i16_le();
                (pitch_pos, pitch_neg, yaw_pos, yaw_neg, roll_pos, roll_neg)
            }
        };

        let gyro_pos_scale = fields.get_i16_le();
        let gyro_neg_scale = fields.get_i16_le();
        let gyro_numer = (i64::from(gyro_pos_scale) + i64::from(gyro_neg_scale))
            * i64::from(resolution.gyro_per_deg_s());

        let x_pos = fields.get_i16_le();
        let x_neg = fields.get_i16_le();
        let y_pos = fields.get_i16_le();
        let y_neg = fields.get_i16_le();
        let z_pos = fields.get_i16_le();
        let z_neg = fields.get_i16_le();

        let acc_dbl_range = 2 * i64::from(resolution.accel_per_g());

        let set = CalibrationSet {
            pitch: gyro_axis(Axis::Pitch, pitch_bias, pitch_pos, pitch_neg, gyro_numer)?,
            yaw: gyro_axis(Axis::Yaw, yaw_bias, yaw_pos, yaw_neg, gyro_numer)?,
            roll: gyro_axis(Axis::Roll, roll_bias, roll_pos, roll_neg, gyro_numer)?,
            x: accel_axis(Axis::X, x_pos, x_neg, acc_dbl_range)?,
            y: accel_axis(Axis::Y, y_pos, y_neg, acc_dbl_range)?,
            z: accel_axis(Axis::Z, z_pos, z_neg, acc_dbl_range)?,
        };

        debug!("Parsed {:?} calibration: {:?}", layout, set);
        Ok(set)
    }

    /// Returns the calibration for one axis.
    #[must_use]
    pub fn axis(&self, axis: Axis) -> &AxisCalibration {
        match axis {
            Axis::Pitch => &self.pitch,
            Axis::Yaw => &self.yaw,
            Axis::Roll => &self.roll,
            Axis::X => &self.x,
            Axis::Y => &self.y,
            Axis::Z => &self.z,
        }
    }

    /// Calibrates six raw values in report order.
    #[must_use]
    pub fn apply_axes(&self, raw: &MotionAxes) -> MotionAxes {
        let mut calibrated = *raw;
        for (value, axis) in calibrated.iter_mut().zip(Axis::ALL) {
            *value = self.axis(axis).apply(*value);
        }
        calibrated
    }
}

/// Parses a calibration feature report with the DS4 factory resolutions.
///
/// # Errors
///
/// See [`CalibrationSet::parse`].
pub fn parse_calibration(report: &[u8]) -> Result<CalibrationSet> {
    CalibrationSet::parse(report, Resolution::DS4)
}

fn gyro_axis(axis: Axis, bias: i16, pos: i16, neg: i16, numer: i64) -> Result<AxisCalibration> {
    let range = i32::from(pos) - i32::from(neg);
    if range == 0 || numer == 0 {
        return Err(MotionError::DegenerateRange { axis });
    }

    Ok(AxisCalibration {
        bias,
        multiplier: numer as f64 / f64::from(range),
    })
}

fn accel_axis(axis: Axis, pos: i16, neg: i16, acc_dbl_range: i64) -> Result<AxisCalibration> {
    let range = i32::from(pos) - i32::from(neg);
    if range == 0 {
        return Err(MotionError::DegenerateRange { axis });
    }

    // Midpoint lies between neg and pos, so it always fits an i16
    let bias = (i32::from(pos) - range / 2) as i16;

    Ok(AxisCalibration {
        bias,
        multiplier: acc_dbl_range as f64 / f64::from(range),
    })
}
