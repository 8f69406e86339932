//! # DS4 Report Layout Constants and Types
//!
//! Byte offsets, axis identifiers and fixed-point resolutions shared by the
//! calibration parser, the report calibrator and the sample builder.
//!
//! All multi-byte fields are little-endian.

use std::fmt;
use std::ops::RangeInclusive;

use bytes::{Buf, BufMut};

use crate::error::{MotionError, Result};

/// Report id of a calibration feature report requested over Bluetooth.
///
/// Any other id means the report came through the USB stack, which uses a
/// different ordering of the gyro range fields.
pub const BLUETOOTH_CALIBRATION_REPORT_ID: u8 = 0x05;

/// Number of 16-bit fields in the calibration feature report
pub const CALIBRATION_FIELD_COUNT: usize = 17;

/// Offset of the first calibration field (byte 0 is the report id)
pub const CALIBRATION_FIELDS_OFFSET: usize = 1;

/// Minimum calibration report length: id(1) + 17 × i16
pub const CALIBRATION_REPORT_MIN_LEN: usize =
    CALIBRATION_FIELDS_OFFSET + CALIBRATION_FIELD_COUNT * 2; // 35 bytes

/// Offset of the wrapping 16-bit tick counter within an input report
pub const TICK_OFFSET: usize = 10;

/// Offset of the first motion field (gyro pitch) within an input report
pub const MOTION_OFFSET: usize = 13;

/// Number of motion axes carried by an input report
pub const MOTION_AXIS_COUNT: usize = 6;

/// Size of the motion block (6 × i16)
pub const MOTION_BLOCK_LEN: usize = MOTION_AXIS_COUNT * 2;

/// Minimum input report length, relative to the report start offset
pub const INPUT_REPORT_MIN_LEN: usize = MOTION_OFFSET + MOTION_BLOCK_LEN; // 25 bytes

/// Gyro LSBs per deg/s at the reporting resolution
pub const GYRO_RESOLUTION_IN_DEG_SEC: i32 = 16;

/// Accelerometer LSBs per g
pub const ACC_RESOLUTION_PER_G: i32 = 8192;

/// Tick counter to microseconds: `ticks * 16 / 3`
pub const TICK_US_NUMERATOR: u64 = 16;
pub const TICK_US_DENOMINATOR: u64 = 3;

/// Six raw or calibrated motion values in report order
/// (pitch, yaw, roll, accel X, accel Y, accel Z)
pub type MotionAxes = [i16; MOTION_AXIS_COUNT];

/// Motion axis in report order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Axis {
    Pitch,
    Yaw,
    Roll,
    X,
    Y,
    Z,
}

impl Axis {
    /// All axes in the order they appear in an input report
    pub const ALL: [Axis; MOTION_AXIS_COUNT] =
        [Axis::Pitch, Axis::Yaw, Axis::Roll, Axis::X, Axis::Y, Axis::Z];

    /// Lower-case axis name used in logs and error messages.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Axis::Pitch => "pitch",
            Axis::Yaw => "yaw",
            Axis::Roll => "roll",
            Axis::X => "x",
            Axis::Y => "y",
            Axis::Z => "z",
        }
    }
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Supported gyro resolutions in LSB per deg/s.
///
/// The legacy gyro mirror divides 256 by the resolution, so it must not
/// exceed 256.
pub const GYRO_RESOLUTION_RANGE: RangeInclusive<i32> = 1..=256;

/// Supported accelerometer resolutions in LSB per g
pub const ACCEL_RESOLUTION_RANGE: RangeInclusive<i32> = 64..=32768;

/// Fixed-point resolutions used to scale raw counts into physical units.
///
/// Only constructible through [`Resolution::new`] or [`Resolution::DS4`], so
/// every value is inside the supported ranges.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolution {
    gyro_per_deg_s: i32,
    accel_per_g: i32,
}

impl Default for Resolution {
    fn default() -> Self {
        Self::DS4
    }
}

impl Resolution {
    /// Factory resolution of the DualShock 4 motion sensor
    pub const DS4: Resolution = Resolution {
        gyro_per_deg_s: GYRO_RESOLUTION_IN_DEG_SEC,
        accel_per_g: ACC_RESOLUTION_PER_G,
    };

    /// Creates a resolution after checking both values.
    ///
    /// # Errors
    ///
    /// Returns `InvalidResolution` if `gyro_per_deg_s` is outside 1..=256 or
    /// `accel_per_g` is outside 64..=32768.
    ///
    /// # Examples
    ///
    /// ```
    /// use ds4_motion::motion::protocol::Resolution;
    ///
    /// assert_eq!(Resolution::new(16, 8192)?, Resolution::DS4);
    /// assert!(Resolution::new(0, 8192).is_err());
    /// # Ok::<(), ds4_motion::error::MotionError>(())
    /// ```
    pub fn new(gyro_per_deg_s: i32, accel_per_g: i32) -> Result<Self> {
        if !GYRO_RESOLUTION_RANGE.contains(&gyro_per_deg_s) {
            return Err(MotionError::InvalidResolution(format!(
                "gyro resolution {} must be between {} and {}",
                gyro_per_deg_s,
                GYRO_RESOLUTION_RANGE.start(),
                GYRO_RESOLUTION_RANGE.end()
            )));
        }
        if !ACCEL_RESOLUTION_RANGE.contains(&accel_per_g) {
            return Err(MotionError::InvalidResolution(format!(
                "accel resolution {} must be between {} and {}",
                accel_per_g,
                ACCEL_RESOLUTION_RANGE.start(),
                ACCEL_RESOLUTION_RANGE.end()
            )));
        }

        Ok(Self {
            gyro_per_deg_s,
            accel_per_g,
        })
    }

    /// Gyro LSBs per deg/s
    #[must_use]
    pub fn gyro_per_deg_s(&self) -> i32 {
        self.gyro_per_deg_s
    }

    /// Accelerometer LSBs per g
    #[must_use]
    pub fn accel_per_g(&self) -> i32 {
        self.accel_per_g
    }

    /// Divisor turning deg/s into the older 1/256-range gyro representation.
    #[must_use]
    pub fn legacy_gyro_divisor(&self) -> i32 {
        256 / self.gyro_per_deg_s
    }

    /// Factor turning g into the older 0..128 accelerometer representation.
    #[must_use]
    pub fn legacy_accel_factor(&self) -> i32 {
        self.accel_per_g / 64
    }
}

/// Fails with `BufferTooShort` unless `buf` holds at least `required` bytes.
pub fn ensure_len(buf: &[u8], required: usize, context: &'static str) -> Result<()> {
    if buf.len() < required {
        return Err(MotionError::BufferTooShort {
            context,
            expected: required,
            actual: buf.len(),
        });
    }
    Ok(())
}

/// Like [`ensure_len`] for a region of `len` bytes starting at `offset`.
///
/// An `offset + len` that overflows `usize` can never fit and is reported as
/// `BufferTooShort` with `expected` saturated to `usize::MAX`.
pub fn ensure_len_at(buf: &[u8], offset: usize, len: usize, context: &'static str) -> Result<()> {
    ensure_len(buf, offset.checked_add(len).unwrap_or(usize::MAX), context)
}

/// Reads a little-endian i16. The caller guarantees `offset + 2 <= buf.len()`.
#[inline]
pub fn read_i16_le(buf: &[u8], offset: usize) -> i16 {
    (&buf[offset..offset + 2]).get_i16_le()
}

/// Reads a little-endian u16. The caller guarantees `offset + 2 <= buf.len()`.
#[inline]
pub fn read_u16_le(buf: &[u8], offset: usize) -> u16 {
    (&buf[offset..offset + 2]).get_u16_le()
}

/// Writes a little-endian i16. The caller guarantees `offset + 2 <= buf.len()`.
#[inline]
pub fn write_i16_le(buf: &mut [u8], offset: usize, value: i16) {
    (&mut buf[offset..offset + 2]).put_i16_le(value);
}

/// Reads the six motion fields starting at `offset + MOTION_OFFSET`.
pub fn read_motion_axes(report: &[u8], offset: usize) -> Result<MotionAxes> {
    ensure_len_at(report, offset, INPUT_REPORT_MIN_LEN, "Input report")?;

    let base = offset + MOTION_OFFSET;
    let mut axes = [0i16; MOTION_AXIS_COUNT];
    for (i, value) in axes.iter_mut().enumerate() {
        *value = read_i16_le(report, base + i * 2);
    }
    Ok(axes)
}

/// Writes six motion fields back starting at `offset + MOTION_OFFSET`.
pub fn write_motion_axes(report: &mut [u8], offset: usize, axes: &MotionAxes) -> Result<()> {
    ensure_len_at(report, offset, INPUT_REPORT_MIN_LEN, "Input report")?;

    let base = offset + MOTION_OFFSET;
    for (i, &value) in axes.iter().enumerate() {
        write_i16_le(report, base + i * 2, value);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout_constants() {
        assert_eq!(CALIBRATION_REPORT_MIN_LEN, 35);
        assert_eq!(INPUT_REPORT_MIN_LEN, 25);
        assert_eq!(MOTION_BLOCK_LEN, 12);
    }

    #[test]
    fn test_ds4_resolution() {
        let res = Resolution::default();
        assert_eq!(res.gyro_per_deg_s(), 16);
        assert_eq!(res.accel_per_g(), 8192);
        assert_eq!(res.legacy_gyro_divisor(), 16);
        assert_eq!(res.legacy_accel_factor(), 128);
    }

    #[test]
    fn test_resolution_new_accepts_range_limits() {
        assert_eq!(Resolution::new(16, 8192).unwrap(), Resolution::DS4);
        assert!(Resolution::new(1, 64).is_ok());

        let res = Resolution::new(256, 32768).unwrap();
        assert_eq!(res.legacy_gyro_divisor(), 1);
        assert_eq!(res.legacy_accel_factor(), 512);
    }

    #[test]
    fn test_resolution_new_rejects_out_of_range() {
        let rejected = [
            (0, 8192),
            (-16, 8192),
            (257, 8192),
            (16, 63),
            (16, 0),
            (16, -8192),
            (16, 32769),
        ];
        for (gyro, accel) in rejected {
            match Resolution::new(gyro, accel) {
                Err(MotionError::InvalidResolution(_)) => {}
                other => panic!("Expected InvalidResolution for ({}, {}): {:?}", gyro, accel, other),
            }
        }
    }

    #[test]
    fn test_axis_order_and_names() {
        let names: Vec<_> = Axis::ALL.iter().map(|a| a.to_string()).collect();
        assert_eq!(names, ["pitch", "yaw", "roll", "x", "y", "z"]);
    }

    #[test]
    fn test_read_little_endian() {
        let buf = [0x00, 0x34, 0x12, 0xFF, 0xFF];
        assert_eq!(read_i16_le(&buf, 1), 0x1234);
        assert_eq!(read_i16_le(&buf, 3), -1);
        assert_eq!(read_u16_le(&buf, 3), 0xFFFF);
    }

    #[test]
    fn test_write_little_endian() {
        let mut buf = [0u8; 4];
        write_i16_le(&mut buf, 1, -2);
        assert_eq!(buf, [0x00, 0xFE, 0xFF, 0x00]);
    }

    #[test]
    fn test_read_motion_axes() {
        let mut report = [0u8; 30];
        let values: MotionAxes = [1, -2, 300, -400, 8192, i16::MIN];
        write_motion_axes(&mut report, 2, &values).unwrap();

        assert_eq!(read_motion_axes(&report, 2).unwrap(), values);
        // Bytes before the motion block are untouched
        assert!(report[..15].iter().all(|&b| b == 0));
    }

    #[test]
    fn test_read_motion_axes_too_short() {
        let report = [0u8; 24];
        match read_motion_axes(&report, 0) {
            Err(MotionError::BufferTooShort { expected, actual, .. }) => {
                assert_eq!(expected, 25);
                assert_eq!(actual, 24);
            }
            other => panic!("Expected BufferTooShort, got: {:?}", other),
        }
    }

    #[test]
    fn test_offset_overflow_is_too_short() {
        let mut report = [0u8; 30];
        match read_motion_axes(&report, usize::MAX) {
            Err(MotionError::BufferTooShort { expected, actual, .. }) => {
                assert_eq!(expected, usize::MAX);
                assert_eq!(actual, 30);
            }
            other => panic!("Expected BufferTooShort, got: {:?}", other),
        }
        assert!(write_motion_axes(&mut report, usize::MAX - 5, &[0; 6]).is_err());
        assert!(report.iter().all(|&b| b == 0));
    }

    #[test]
    fn test_offset_shifts_required_length() {
        let report = [0u8; 25];
        assert!(read_motion_axes(&report, 0).is_ok());
        assert!(read_motion_axes(&report, 1).is_err());
    }
}
