//! # Timestamp Reconstruction
//!
//! The controller stamps every input report with a free-running 16-bit tick
//! counter (one tick = 16/3 µs) that wraps roughly every 350 ms. This module
//! unwraps it into a monotonically non-decreasing microsecond counter.
//!
//! ```
//! use ds4_motion::motion::timestamp::TimestampState;
//!
//! let state = TimestampState::new();
//! let (t0, state) = state.advance(65530);
//! let (t1, _) = state.advance(5); // wrapped: 11 ticks later
//! assert_eq!(t1 - t0, 11 * 16 / 3);
//! ```

use super::protocol::{
    ensure_len_at, read_u16_le, TICK_OFFSET, TICK_US_DENOMINATOR, TICK_US_NUMERATOR,
};
use crate::error::Result;

/// Converts a tick count to microseconds (multiply first, then truncate).
#[inline]
fn ticks_to_us(ticks: u64) -> u64 {
    ticks * TICK_US_NUMERATOR / TICK_US_DENOMINATOR
}

/// Forward distance from `previous` to `current` on the 16-bit tick counter.
///
/// # Examples
///
/// ```
/// use ds4_motion::motion::timestamp::tick_delta;
///
/// assert_eq!(tick_delta(100, 150), 50);
/// assert_eq!(tick_delta(65530, 5), 11);
/// ```
#[must_use]
pub fn tick_delta(previous: u16, current: u16) -> u16 {
    if previous > current {
        (u16::MAX - previous) + current + 1
    } else {
        current - previous
    }
}

/// Reads the raw tick counter of an input report.
///
/// # Errors
///
/// Returns `BufferTooShort` if the report cannot hold the counter.
pub fn read_tick(report: &[u8], offset: usize) -> Result<u16> {
    ensure_len_at(report, offset, TICK_OFFSET + 2, "Input report")?;
    Ok(read_u16_le(report, offset + TICK_OFFSET))
}

/// Running timestamp of one connected controller session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TimestampState {
    last_tick: Option<u16>,
    running_us: u64,
}

impl TimestampState {
    /// Creates an unset state for a fresh session.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Last tick seen, or `None` before the first report.
    #[must_use]
    pub fn last_tick(&self) -> Option<u16> {
        self.last_tick
    }

    /// Absolute microseconds reconstructed so far.
    #[must_use]
    pub fn running_us(&self) -> u64 {
        self.running_us
    }

    /// Computes the absolute timestamp for `tick` and the state that follows.
    ///
    /// The first tick of a session maps directly to `tick * 16 / 3`; later ticks
    /// advance by the wrapped distance from the previous one.
    #[must_use]
    pub fn advance(&self, tick: u16) -> (u64, TimestampState) {
        let absolute = match self.last_tick {
            None => ticks_to_us(u64::from(tick)),
            Some(previous) => {
                self.running_us + ticks_to_us(u64::from(tick_delta(previous, tick)))
            }
        };

        let next = TimestampState {
            last_tick: Some(tick),
            running_us: absolute,
        };
        (absolute, next)
    }

    /// Advances in place and returns the absolute timestamp.
    pub fn update(&mut self, tick: u16) -> u64 {
        let (absolute, next) = self.advance(tick);
        *self = next;
        absolute
    }

    /// Clears the state after a disconnect.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
