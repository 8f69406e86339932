//! # Motion Samples
//!
//! Physically-scaled motion values decoded from one input report, and the
//! bounded history a session keeps of them.

use std::collections::VecDeque;

use serde::Serialize;

use super::protocol::{MotionAxes, Resolution};

/// Immutable snapshot of the motion sensor at one report.
///
/// Angular rates are in deg/s, accelerations in g. The `fake_*` fields mirror
/// the values in the older fixed-point representation some consumers expect;
/// they are derived once at construction.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct MotionSample {
    timestamp_us: u64,

    gyro_pitch: f32,
    gyro_yaw: f32,
    gyro_roll: f32,

    accel_x: f32,
    accel_y: f32,
    accel_z: f32,

    fake_gyro_pitch: i32,
    fake_gyro_yaw: i32,
    fake_gyro_roll: i32,

    fake_accel_x: i32,
    fake_accel_y: i32,
    fake_accel_z: i32,

    #[serde(skip)]
    resolution: Resolution,
}

impl MotionSample {
    /// Builds a sample from scaled values.
    ///
    /// # Arguments
    ///
    /// * `timestamp_us` - Reconstructed controller time in microseconds
    /// * `gyro` - Pitch, yaw, roll in deg/s
    /// * `accel` - X, Y, Z in g
    /// * `resolution` - Resolution used for the legacy mirrors and raw counts
    #[must_use]
    pub fn new(timestamp_us: u64, gyro: [f32; 3], accel: [f32; 3], resolution: Resolution) -> Self {
        let accel_factor = resolution.legacy_accel_factor() as f32;
        let gyro_divisor = resolution.legacy_gyro_divisor() as f32;
        let [gyro_pitch, gyro_yaw, gyro_roll] = gyro;
        let [accel_x, accel_y, accel_z] = accel;

        Self {
            timestamp_us,
            gyro_pitch,
            gyro_yaw,
            gyro_roll,
            accel_x,
            accel_y,
            accel_z,
            fake_gyro_pitch: (gyro_pitch / gyro_divisor).round_ties_even() as i32,
            fake_gyro_yaw: (gyro_yaw / gyro_divisor).round_ties_even() as i32,
            fake_gyro_roll: (gyro_roll / gyro_divisor).round_ties_even() as i32,
            fake_accel_x: (accel_x * accel_factor).round_ties_even() as i32,
            fake_accel_y: (accel_y * accel_factor).round_ties_even() as i32,
            fake_accel_z: (-accel_z * accel_factor).round_ties_even() as i32,
            resolution,
        }
    }

    /// Decodes a sample from six integer counts in report order.
    ///
    /// Pitch is taken as-is; yaw, roll and the three accelerometer axes are
    /// sign-inverted to undo the hardware's axis convention.
    #[must_use]
    pub fn from_counts(timestamp_us: u64, counts: &MotionAxes, resolution: Resolution) -> Self {
        let gyro_res = resolution.gyro_per_deg_s() as f32;
        let accel_res = resolution.accel_per_g() as f32;

        let pitch = counts[0];
        let [yaw, roll, ax, ay, az] =
            [counts[1], counts[2], counts[3], counts[4], counts[5]].map(i16::wrapping_neg);

        Self::new(
            timestamp_us,
            [
                f32::from(pitch) / gyro_res,
                f32::from(yaw) / gyro_res,
                f32::from(roll) / gyro_res,
            ],
            [
                f32::from(ax) / accel_res,
                f32::from(ay) / accel_res,
                f32::from(az) / accel_res,
            ],
            resolution,
        )
    }

    pub fn timestamp_us(&self) -> u64 {
        self.timestamp_us
    }

    pub fn gyro_pitch(&self) -> f32 {
        self.gyro_pitch
    }

    pub fn gyro_yaw(&self) -> f32 {
        self.gyro_yaw
    }

    pub fn gyro_roll(&self) -> f32 {
        self.gyro_roll
    }

    pub fn accel_x(&self) -> f32 {
        self.accel_x
    }

    pub fn accel_y(&self) -> f32 {
        self.accel_y
    }

    pub fn accel_z(&self) -> f32 {
        self.accel_z
    }

    /// Angular rates as (pitch, yaw, roll) in deg/s.
    pub fn gyro(&self) -> [f32; 3] {
        [self.gyro_pitch, self.gyro_yaw, self.gyro_roll]
    }

    /// Accelerations as (x, y, z) in g.
    pub fn accel(&self) -> [f32; 3] {
        [self.accel_x, self.accel_y, self.accel_z]
    }

    /// Legacy fixed-point gyro: deg/s divided by `256 / resolution`.
    pub fn fake_gyro(&self) -> [i32; 3] {
        [self.fake_gyro_pitch, self.fake_gyro_yaw, self.fake_gyro_roll]
    }

    /// Legacy fixed-point accel: g times `resolution / 64`, Z sign-flipped.
    pub fn fake_accel(&self) -> [i32; 3] {
        [self.fake_accel_x, self.fake_accel_y, self.fake_accel_z]
    }

    /// Gyro back in sensor counts, truncated toward zero.
    pub fn gyro_counts(&self) -> [i32; 3] {
        let res = self.resolution.gyro_per_deg_s() as f32;
        self.gyro().map(|v| (v * res) as i32)
    }

    /// Accel back in sensor counts, truncated toward zero.
    pub fn accel_counts(&self) -> [i32; 3] {
        let res = self.resolution.accel_per_g() as f32;
        self.accel().map(|v| (v * res) as i32)
    }

    /// Microseconds elapsed since `earlier`; zero if `earlier` is not older.
    pub fn elapsed_since(&self, earlier: &MotionSample) -> u64 {
        self.timestamp_us.saturating_sub(earlier.timestamp_us)
    }
}

/// Fixed-depth history of the most recent samples, newest last.
#[derive(Debug, Clone)]
pub struct SampleHistory {
    samples: VecDeque<MotionSample>,
    depth: usize,
}

impl SampleHistory {
    /// Creates an empty history keeping at most `depth` samples (minimum 1).
    #[must_use]
    pub fn new(depth: usize) -> Self {
        let depth = depth.max(1);
        Self {
            samples: VecDeque::with_capacity(depth),
            depth,
        }
    }

    /// Appends a sample, dropping the oldest one when full.
    pub fn push(&mut self, sample: MotionSample) {
        if self.samples.len() == self.depth {
            self.samples.pop_front();
        }
        self.samples.push_back(sample);
    }

    /// Most recent sample.
    pub fn current(&self) -> Option<&MotionSample> {
        self.samples.back()
    }

    /// Sample immediately before the most recent one.
    pub fn previous(&self) -> Option<&MotionSample> {
        self.back(1)
    }

    /// Sample `n` steps back from the most recent (0 = current).
    pub fn back(&self, n: usize) -> Option<&MotionSample> {
        let len = self.samples.len();
        if n >= len {
            return None;
        }
        self.samples.get(len - 1 - n)
    }

    /// Iterates from oldest to newest.
    pub fn iter(&self) -> impl Iterator<Item = &MotionSample> + '_ {
        self.samples.iter()
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn clear(&mut self) {
        self.samples.clear();
    }
}
