//! RTC (real-time clock) reading exposed by the device clock.

use chrono::{Datelike, NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};

/// Calendar and time-of-day components of the simulated device time.
///
/// Mirrors a hardware RTC register read: month is 1-12 and day-of-week
/// is 0-6 with Sunday as 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RtcReading {
    /// Calendar year.
    pub year: i32,
    /// Month of year, 1-12.
    pub month: u32,
    /// Day of month, 1-31.
    pub day: u32,
    /// Hour of day, 0-23.
    pub hour: u32,
    /// Minute of hour, 0-59.
    pub minute: u32,
    /// Second of minute, 0-59.
    pub second: u32,
    /// Millisecond of second, 0-999.
    pub millisecond: u32,
    /// Day of week, 0-6 (Sunday = 0).
    pub day_of_week: u32,
}

impl From<NaiveDateTime> for RtcReading {
    fn from(t: NaiveDateTime) -> Self {
        Self {
            year: t.year(),
            month: t.month(),
            day: t.day(),
            hour: t.hour(),
            minute: t.minute(),
            second: t.second(),
            millisecond: t.and_utc().timestamp_subsec_millis(),
            day_of_week: t.weekday().num_days_from_sunday(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    #[test]
    fn reading_from_datetime() {
        // 2024-01-01 was a Monday.
        let t = NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_milli_opt(13, 45, 7, 250)
            .unwrap();
        let rtc = RtcReading::from(t);
        assert_eq!(rtc.year, 2024);
        assert_eq!(rtc.month, 1);
        assert_eq!(rtc.day, 1);
        assert_eq!(rtc.hour, 13);
        assert_eq!(rtc.minute, 45);
        assert_eq!(rtc.second, 7);
        assert_eq!(rtc.millisecond, 250);
        assert_eq!(rtc.day_of_week, 1);
    }

    #[test]
    fn sunday_is_zero() {
        // 2024-01-07 was a Sunday.
        let t = NaiveDate::from_ymd_opt(2024, 1, 7)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        assert_eq!(RtcReading::from(t).day_of_week, 0);
    }
}
