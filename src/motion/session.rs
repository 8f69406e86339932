//! # Motion Session
//!
//! Turns input reports into [`MotionSample`]s for one connected controller.
//!
//! A session owns everything that is per-device: the factory calibration, the
//! timestamp unwrapping state, a bounded sample history and the subscriber
//! list. Sessions share nothing, so a host driving several controllers keeps
//! one session per device.
//!
//! ## Usage
//!
//! ```
//! use chrono::Utc;
//! use ds4_motion::config::MotionConfig;
//! use ds4_motion::motion::session::MotionSession;
//!
//! let mut session = MotionSession::new("ds4-0", &MotionConfig::default())?;
//!
//! let mut report = [0u8; 64];
//! report[10..12].copy_from_slice(&300u16.to_le_bytes());
//! report[13..15].copy_from_slice(&160i16.to_le_bytes()); // pitch
//!
//! let sample = session.process_report(&report, Utc::now())?;
//! assert_eq!(sample.timestamp_us(), 1600);
//! assert_eq!(sample.gyro_pitch(), 10.0);
//! # Ok::<(), ds4_motion::error::MotionError>(())
//! ```

use chrono::{DateTime, Utc};
use tracing::{info, trace};

use super::calibration::CalibrationSet;
use super::calibrator::{apply_calibration, calibrate_motion};
use super::protocol::{ensure_len_at, read_motion_axes, Resolution, INPUT_REPORT_MIN_LEN};
use super::sample::{MotionSample, SampleHistory};
use super::subscriber::{MotionEvent, SampleSubscriber, SubscriberList};
use super::timestamp::{read_tick, TimestampState};
use crate::config::MotionConfig;
use crate::error::Result;

/// Where motion data sits in a report and how to scale it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ReportDecoder {
    /// Start of the report within the buffers handed to the decoder
    pub offset: usize,
    pub resolution: Resolution,
}

impl ReportDecoder {
    #[must_use]
    pub fn new(offset: usize, resolution: Resolution) -> Self {
        Self { offset, resolution }
    }

    /// Decodes one report without touching any held state.
    ///
    /// Returns the new sample and the timestamp state that follows `prior`.
    /// `received_at` and `device_id` only annotate diagnostics.
    ///
    /// # Errors
    ///
    /// Returns `BufferTooShort` if the report cannot hold the tick counter
    /// and the six motion fields.
    pub fn process_report(
        &self,
        report: &[u8],
        received_at: DateTime<Utc>,
        device_id: &str,
        calibration: Option<&CalibrationSet>,
        prior: TimestampState,
    ) -> Result<(MotionSample, TimestampState)> {
        ensure_len_at(report, self.offset, INPUT_REPORT_MIN_LEN, "Input report")?;

        let counts = match calibration {
            Some(cal) => calibrate_motion(report, cal, self.offset)?.calibrated,
            None => read_motion_axes(report, self.offset)?,
        };

        let tick = read_tick(report, self.offset)?;
        let (timestamp_us, next) = prior.advance(tick);

        let sample = MotionSample::from_counts(timestamp_us, &counts, self.resolution);
        trace!(
            "{} report at {}: tick {} -> {} us, gyro {:?}, accel {:?}",
            device_id,
            received_at,
            tick,
            timestamp_us,
            sample.gyro(),
            sample.accel()
        );

        Ok((sample, next))
    }
}

/// Decodes one report with the DS4 layout at offset 0.
///
/// Pure: returns the sample and the next timestamp state; `prior` is not
/// modified, so a failed call leaves the caller's state intact.
///
/// # Errors
///
/// See [`ReportDecoder::process_report`].
pub fn process_report(
    report: &[u8],
    received_at: DateTime<Utc>,
    device_id: &str,
    calibration: Option<&CalibrationSet>,
    prior: TimestampState,
) -> Result<(MotionSample, TimestampState)> {
    ReportDecoder::default().process_report(report, received_at, device_id, calibration, prior)
}

/// Motion processing state of one connected controller.
#[derive(Debug)]
pub struct MotionSession {
    device_id: String,
    decoder: ReportDecoder,
    calibration: Option<CalibrationSet>,
    timestamp: TimestampState,
    history: SampleHistory,
    subscribers: SubscriberList,
}

impl MotionSession {
    /// Creates a session without calibration.
    ///
    /// # Errors
    ///
    /// Returns `InvalidResolution` if the configured resolutions are out of
    /// range.
    pub fn new(device_id: impl Into<String>, config: &MotionConfig) -> Result<Self> {
        Ok(Self {
            device_id: device_id.into(),
            decoder: ReportDecoder::new(config.report_offset, config.resolution()?),
            calibration: None,
            timestamp: TimestampState::new(),
            history: SampleHistory::new(config.history_depth),
            subscribers: SubscriberList::new(),
        })
    }

    pub fn device_id(&self) -> &str {
        &self.device_id
    }

    pub fn decoder(&self) -> &ReportDecoder {
        &self.decoder
    }

    /// Current calibration, or `None` when raw values pass through.
    pub fn calibration(&self) -> Option<&CalibrationSet> {
        self.calibration.as_ref()
    }

    /// Replaces the calibration from feature report bytes.
    ///
    /// `None` clears it. If the bytes fail to parse the previous calibration
    /// is kept and the error returned.
    ///
    /// # Errors
    ///
    /// Returns `BufferTooShort` or `DegenerateRange` from the parser.
    pub fn set_calibration(&mut self, report: Option<&[u8]>) -> Result<()> {
        let calibration = report
            .map(|bytes| CalibrationSet::parse(bytes, self.decoder.resolution))
            .transpose()?;
        self.set_calibration_set(calibration);
        Ok(())
    }

    /// Replaces the calibration with an already parsed set.
    pub fn set_calibration_set(&mut self, calibration: Option<CalibrationSet>) {
        match calibration {
            Some(_) => info!("Calibration loaded for {}", self.device_id),
            None => info!("Calibration cleared for {}, using raw motion values", self.device_id),
        }
        self.calibration = calibration;
    }

    /// Registers a subscriber for new samples.
    pub fn subscribe(&mut self, subscriber: Box<dyn SampleSubscriber>) {
        self.subscribers.push(subscriber);
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }

    /// Processes one input report.
    ///
    /// On success the timestamp state and history advance and every
    /// subscriber is notified before this returns. On failure nothing changes.
    ///
    /// # Errors
    ///
    /// Returns `BufferTooShort` for truncated reports.
    pub fn process_report(
        &mut self,
        report: &[u8],
        received_at: DateTime<Utc>,
    ) -> Result<MotionSample> {
        let (sample, next) = self.decoder.process_report(
            report,
            received_at,
            &self.device_id,
            self.calibration.as_ref(),
            self.timestamp,
        )?;

        self.commit(sample, next, received_at);
        Ok(sample)
    }

    /// Like [`process_report`](Self::process_report), but also writes the
    /// calibrated motion fields back into `report` for downstream consumers.
    ///
    /// # Errors
    ///
    /// Returns `BufferTooShort` for truncated reports; the buffer is then
    /// left unmodified.
    pub fn process_report_in_place(
        &mut self,
        report: &mut [u8],
        received_at: DateTime<Utc>,
    ) -> Result<MotionSample> {
        let offset = self.decoder.offset;
        ensure_len_at(report, offset, INPUT_REPORT_MIN_LEN, "Input report")?;

        if let Some(cal) = &self.calibration {
            apply_calibration(report, cal, offset)?;
        }

        let (sample, next) = self.decoder.process_report(
            report,
            received_at,
            &self.device_id,
            None,
            self.timestamp,
        )?;

        self.commit(sample, next, received_at);
        Ok(sample)
    }

    fn commit(&mut self, sample: MotionSample, next: TimestampState, received_at: DateTime<Utc>) {
        self.timestamp = next;
        self.history.push(sample);

        if !self.subscribers.is_empty() {
            let event = MotionEvent {
                device_id: self.device_id.clone(),
                received_at,
                sample,
            };
            self.subscribers.notify(&event);
        }
    }

    /// Most recent sample, or an all-zero sample before the first report.
    pub fn current(&self) -> MotionSample {
        self.history.current().copied().unwrap_or_default()
    }

    /// Sample before the most recent one.
    pub fn previous(&self) -> Option<MotionSample> {
        self.history.previous().copied()
    }

    pub fn history(&self) -> &SampleHistory {
        &self.history
    }

    pub fn timestamp_state(&self) -> TimestampState {
        self.timestamp
    }

    /// Starts over after a disconnect.
    ///
    /// Clears the timestamp state and history. Calibration and subscribers
    /// are kept; call [`set_calibration`](Self::set_calibration) with the new
    /// device's bytes when they arrive.
    pub fn reset(&mut self) {
        info!("Resetting motion session for {}", self.device_id);
        self.timestamp.reset();
        self.history.clear();
    }
}
