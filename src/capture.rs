//! # Capture Files
//!
//! Loads recorded controller data for replay: a raw calibration feature report
//! and a file of back-to-back fixed-size input reports.

use std::fs;
use std::path::Path;

use tracing::info;

use crate::error::{MotionError, Result};

/// Recorded input reports of a single size
#[derive(Debug, Clone)]
pub struct ReportCapture {
    data: Vec<u8>,
    report_size: usize,
}

impl ReportCapture {
    /// Splits `data` into `report_size`-byte records.
    ///
    /// # Errors
    ///
    /// Returns `Capture` if `data` is empty, `report_size` is zero, or the
    /// length is not a whole number of records.
    pub fn from_bytes(data: Vec<u8>, report_size: usize) -> Result<Self> {
        if report_size == 0 {
            return Err(MotionError::Capture("report size must be non-zero".to_string()));
        }
        if data.is_empty() {
            return Err(MotionError::Capture("capture contains no reports".to_string()));
        }
        if data.len() % report_size != 0 {
            return Err(MotionError::Capture(format!(
                "capture length {} is not a multiple of the report size {}",
                data.len(),
                report_size
            )));
        }

        Ok(Self { data, report_size })
    }

    /// Reads a capture file.
    ///
    /// # Errors
    ///
    /// Returns `Io` if the file cannot be read, `Capture` if it is malformed.
    pub fn load<P: AsRef<Path>>(path: P, report_size: usize) -> Result<Self> {
        let path = path.as_ref();
        let capture = Self::from_bytes(fs::read(path)?, report_size)?;
        info!(
            "Loaded {} reports of {} bytes from {}",
            capture.len(),
            report_size,
            path.display()
        );
        Ok(capture)
    }

    pub fn len(&self) -> usize {
        self.data.len() / self.report_size
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn report_size(&self) -> usize {
        self.report_size
    }

    /// Iterates over the recorded reports in order.
    pub fn reports(&self) -> impl Iterator<Item = &[u8]> + '_ {
        self.data.chunks_exact(self.report_size)
    }
}

/// Reads a raw calibration feature report.
///
/// An empty path means no calibration was recorded.
///
/// # Errors
///
/// Returns `Io` if a non-empty path cannot be read.
pub fn load_calibration(path: &str) -> Result<Option<Vec<u8>>> {
    if path.is_empty() {
        return Ok(None);
    }
    Ok(Some(fs::read(path)?))
}
