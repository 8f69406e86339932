//! # Report Calibrator
//!
//! Applies a [`CalibrationSet`] to the six motion fields of an input report.
//!
//! [`calibrate_motion`] is the pure form used by the sample builder; it leaves
//! the report untouched. [`apply_calibration`] additionally writes the
//! calibrated values back into the report for callers that forward the
//! buffer downstream.

use tracing::trace;

use super::calibration::CalibrationSet;
use super::protocol::{read_motion_axes, write_motion_axes, MotionAxes, MOTION_AXIS_COUNT};
use crate::error::Result;

/// Motion fields of one report before and after calibration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CalibratedMotion {
    /// Values as read from the report
    pub raw: MotionAxes,
    /// Values after bias, multiplier and saturation
    pub calibrated: MotionAxes,
}

impl CalibratedMotion {
    /// Per-axis change introduced by calibration, in hardware sign convention.
    ///
    /// Axes other than pitch are reported sign-inverted by the hardware, so
    /// they are flipped here to read the same way as the decoded sample.
    #[must_use]
    pub fn delta(&self) -> [i32; MOTION_AXIS_COUNT] {
        let mut delta = [0i32; MOTION_AXIS_COUNT];
        for (i, d) in delta.iter_mut().enumerate() {
            let change = i32::from(self.calibrated[i]) - i32::from(self.raw[i]);
            *d = if i == 0 { change } else { -change };
        }
        delta
    }
}

/// Calibrates the motion fields of `report` without modifying it.
///
/// # Arguments
///
/// * `report` - Input report bytes
/// * `calibration` - Factory calibration of the reporting controller
/// * `offset` - Start of the report within `report` (motion fields are at
///   `offset + 13`)
///
/// # Errors
///
/// Returns `BufferTooShort` if the report cannot hold all six fields.
pub fn calibrate_motion(
    report: &[u8],
    calibration: &CalibrationSet,
    offset: usize,
) -> Result<CalibratedMotion> {
    let raw = read_motion_axes(report, offset)?;
    let calibrated = calibration.apply_axes(&raw);

    let motion = CalibratedMotion { raw, calibrated };
    trace!(
        "Calibration applied: pre {:?} post {:?} delta {:?}",
        motion.raw,
        motion.calibrated,
        motion.delta()
    );
    Ok(motion)
}

/// Calibrates the motion fields of `report` in place.
///
/// Returns the raw and calibrated six-tuples. On error the report is left
/// unmodified.
///
/// # Examples
///
/// ```
/// use ds4_motion::motion::calibration::{AxisCalibration, CalibrationSet};
/// use ds4_motion::motion::calibrator::apply_calibration;
///
/// let cal = CalibrationSet {
///     pitch: AxisCalibration { bias: 100, multiplier: 1.0 },
///     ..CalibrationSet::default()
/// };
/// let mut report = [0u8; 64];
/// report[13..15].copy_from_slice(&150i16.to_le_bytes());
///
/// let (raw, calibrated) = apply_calibration(&mut report, &cal, 0)?;
/// assert_eq!(raw[0], 150);
/// assert_eq!(calibrated[0], 50);
/// assert_eq!(i16::from_le_bytes([report[13], report[14]]), 50);
/// # Ok::<(), ds4_motion::error::MotionError>(())
/// ```
pub fn apply_calibration(
    report: &mut [u8],
    calibration: &CalibrationSet,
    offset: usize,
) -> Result<(MotionAxes, MotionAxes)> {
    let motion = calibrate_motion(report, calibration, offset)?;
    write_motion_axes(report, offset, &motion.calibrated)?;
    Ok((motion.raw, motion.calibrated))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MotionError;
    use crate::motion::calibration::AxisCalibration;
    use crate::motion::protocol::{read_motion_axes, write_motion_axes};

    fn report_with(offset: usize, axes: MotionAxes) -> Vec<u8> {
        let mut report = vec![0u8; 64 + offset];
        write_motion_axes(&mut report, offset, &axes).unwrap();
        report
    }

    fn scaled_set() -> CalibrationSet {
        CalibrationSet {
            pitch: AxisCalibration { bias: 10, multiplier: 0.5 },
            yaw: AxisCalibration { bias: -10, multiplier: 2.0 },
            roll: AxisCalibration { bias: 0, multiplier: 1.0 },
            x: AxisCalibration { bias: 100, multiplier: 1.0 },
            y: AxisCalibration { bias: 0, multiplier: 4.0 },
            z: AxisCalibration { bias: 0, multiplier: -1.0 },
        }
    }

    #[test]
    fn test_calibrate_motion_is_pure() {
        let report = report_with(0, [110, 0, 5, 100, 10, 7]);
        let before = report.clone();

        let motion = calibrate_motion(&report, &scaled_set(), 0).unwrap();
        assert_eq!(motion.raw, [110, 0, 5, 100, 10, 7]);
        assert_eq!(motion.calibrated, [50, 20, 5, 0, 40, -7]);
        assert_eq!(report, before);
    }

    #[test]
    fn test_apply_calibration_writes_back() {
        let mut report = report_with(0, [110, 0, 5, 100, 10, 7]);

        let (raw, calibrated) = apply_calibration(&mut report, &scaled_set(), 0).unwrap();
        assert_eq!(raw, [110, 0, 5, 100, 10, 7]);
        assert_eq!(calibrated, [50, 20, 5, 0, 40, -7]);
        assert_eq!(read_motion_axes(&report, 0).unwrap(), calibrated);
    }

    #[test]
    fn test_apply_calibration_saturates() {
        let mut report = report_with(0, [0, 0, 0, 0, 20000, -20000]);
        let (_, calibrated) = apply_calibration(&mut report, &scaled_set(), 0).unwrap();
        assert_eq!(calibrated[4], i16::MAX);
        assert_eq!(calibrated[5], 20000);

        let mut report = report_with(0, [0, 0, 0, 0, -20000, 0]);
        let (_, calibrated) = apply_calibration(&mut report, &scaled_set(), 0).unwrap();
        assert_eq!(calibrated[4], i16::MIN);
    }

    #[test]
    fn test_apply_calibration_with_offset() {
        let mut report = report_with(3, [110, 0, 0, 0, 0, 0]);
        let (raw, calibrated) = apply_calibration(&mut report, &scaled_set(), 3).unwrap();
        assert_eq!(raw[0], 110);
        assert_eq!(calibrated[0], 50);
        assert_eq!(i16::from_le_bytes([report[16], report[17]]), 50);
    }

    #[test]
    fn test_identity_calibration_leaves_report() {
        let mut report = report_with(0, [1, -2, 3, -4, 5, -6]);
        let before = report.clone();
        apply_calibration(&mut report, &CalibrationSet::default(), 0).unwrap();
        assert_eq!(report, before);
    }

    #[test]
    fn test_short_report_is_untouched() {
        let mut report = vec![0xAAu8; 24];
        let result = apply_calibration(&mut report, &scaled_set(), 0);
        assert!(matches!(result, Err(MotionError::BufferTooShort { .. })));
        assert!(report.iter().all(|&b| b == 0xAA));
    }

    #[test]
    fn test_delta_uses_hardware_sign_convention() {
        let motion = CalibratedMotion {
            raw: [10, 10, 10, 10, 10, 10],
            calibrated: [15, 15, 5, 10, 20, 0],
        };
        assert_eq!(motion.delta(), [5, -5, 5, 0, -10, 10]);
    }
}
