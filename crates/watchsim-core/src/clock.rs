//! Device clock: the authoritative simulated timestamp.
//!
//! The clock is the single source of truth for simulated device time.
//! Incoming time deltas of arbitrary size are quantized into fixed
//! 100 ms sub-steps, and every sub-step is individually checked for
//! second and minute boundary crossings. This guarantees that no
//! boundary interrupt is ever skipped, even when a single `advance`
//! call spans several seconds (as happens at 1000x acceleration).
//!
//! # Design Principles
//!
//! - The timestamp only ever increases, and only by exact multiples of
//!   the 100 ms quantum. It is never set directly except on reset.
//! - Boundary interrupts are returned in chronological order; within a
//!   sub-step the second check precedes the minute check.
//! - Pure arithmetic: no I/O, no failure modes. Invalid (negative or
//!   non-finite) deltas are dropped with a warning.

use chrono::{NaiveDateTime, TimeDelta, Timelike, Utc};
use tracing::warn;
use watchsim_types::RtcReading;

/// Size of one device clock quantum in milliseconds.
pub const DEVICE_TICK_MS: u32 = 100;

/// A boundary interrupt raised by the device clock.
///
/// Interrupts carry the timestamp at which the boundary was crossed so
/// downstream consumers never need to re-read the clock mid-batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClockInterrupt {
    /// The second-of-minute component changed.
    NewSecond {
        /// The new second component, 0-59.
        second: u32,
        /// Device time at the boundary.
        at: NaiveDateTime,
    },

    /// The minute-of-hour component changed.
    NewMinute {
        /// The new minute component, 0-59.
        minute: u32,
        /// Device time at the boundary.
        at: NaiveDateTime,
    },
}

/// The simulated device clock.
///
/// Advanced exclusively through [`advance`], which quantizes deltas
/// into [`DEVICE_TICK_MS`] sub-steps. Fractional milliseconds below one
/// quantum are carried in an accumulator between calls.
///
/// [`advance`]: DeviceClock::advance
#[derive(Debug, Clone)]
pub struct DeviceClock {
    /// Current simulated device time.
    current: NaiveDateTime,

    /// Second component at the last processed sub-step.
    last_second: u32,

    /// Minute component at the last processed sub-step.
    last_minute: u32,

    /// Milliseconds received but not yet consumed by a full quantum.
    accumulated_ms: f64,
}

impl DeviceClock {
    /// Create a clock starting at the given device time.
    pub fn new(start: NaiveDateTime) -> Self {
        Self {
            current: start,
            last_second: start.second(),
            last_minute: start.minute(),
            accumulated_ms: 0.0,
        }
    }

    /// Advance device time by `delta_ms` simulated milliseconds.
    ///
    /// The delta is added to the internal accumulator and consumed in
    /// exact 100 ms quanta. Every quantum is checked for second and
    /// minute boundary crossings, so a large delta produces every
    /// interrupt it elapses over, in chronological order.
    ///
    /// Negative or non-finite deltas are ignored with a warning.
    pub fn advance(&mut self, delta_ms: f64) -> Vec<ClockInterrupt> {
        if !delta_ms.is_finite() || delta_ms < 0.0 {
            warn!(delta_ms, "ignoring invalid clock delta");
            return Vec::new();
        }

        self.accumulated_ms += delta_ms;

        let quantum = f64::from(DEVICE_TICK_MS);
        let mut interrupts = Vec::new();

        while self.accumulated_ms >= quantum {
            self.accumulated_ms -= quantum;

            let Some(next) = self
                .current
                .checked_add_signed(TimeDelta::milliseconds(i64::from(DEVICE_TICK_MS)))
            else {
                warn!("device time overflow, clock frozen");
                self.accumulated_ms = 0.0;
                break;
            };
            self.current = next;

            // Second check first, then minute check: interrupts within a
            // sub-step must be raised in chronological simulated order.
            let second = self.current.second();
            if second != self.last_second {
                interrupts.push(ClockInterrupt::NewSecond {
                    second,
                    at: self.current,
                });
                self.last_second = second;
            }

            let minute = self.current.minute();
            if minute != self.last_minute {
                interrupts.push(ClockInterrupt::NewMinute {
                    minute,
                    at: self.current,
                });
                self.last_minute = minute;
            }
        }

        interrupts
    }

    /// Current simulated device time.
    pub const fn current_time(&self) -> NaiveDateTime {
        self.current
    }

    /// RTC register read: calendar and time-of-day components.
    pub fn rtc(&self) -> RtcReading {
        RtcReading::from(self.current)
    }

    /// Reinitialize the clock to `start` (or the current wall-clock
    /// time when `None`), zeroing the accumulator and boundary trackers.
    pub fn reset(&mut self, start: Option<NaiveDateTime>) {
        let start = start.unwrap_or_else(|| Utc::now().naive_utc());
        self.current = start;
        self.last_second = start.second();
        self.last_minute = start.minute();
        self.accumulated_ms = 0.0;
    }
}
