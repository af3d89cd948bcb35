//! The synthetic experiment calendar every series is anchored to.
//!
//! Minute 0 is `start`; the recording covers `days * 1440` whole minutes.

use chrono::{DateTime, Duration, TimeZone, Utc};
use serde::{Deserialize, Serialize};

pub type Timestamp = DateTime<Utc>;

pub const MINUTES_PER_DAY: i64 = 1440;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExperimentCalendar {
    pub start: Timestamp,
    pub days: u32,
}

impl Default for ExperimentCalendar {
    fn default() -> Self {
        let start = Utc
            .with_ymd_and_hms(2023, 1, 1, 0, 0, 0)
            .single()
            .unwrap_or_default();
        Self::new(start, 14)
    }
}

impl ExperimentCalendar {
    pub fn new(start: Timestamp, days: u32) -> Self {
        Self { start, days }
    }

    pub fn with_days(days: u32) -> Self {
        Self {
            days,
            ..Self::default()
        }
    }

    pub fn total_minutes(&self) -> i64 {
        i64::from(self.days) * MINUTES_PER_DAY
    }

    pub fn end(&self) -> Timestamp {
        self.time_at(self.total_minutes())
    }

    pub fn time_at(&self, minute: i64) -> Timestamp {
        self.start + Duration::minutes(minute)
    }

    pub fn minutes_since_start(&self, time: Timestamp) -> i64 {
        (time - self.start).num_minutes()
    }

    /// 1-based day index; minute 0..1439 is day 1.
    pub fn day_number(&self, time: Timestamp) -> i64 {
        self.minutes_since_start(time).div_euclid(MINUTES_PER_DAY) + 1
    }

    /// First and last minute (inclusive) of a 1-based day.
    pub fn day_bounds(&self, day: i64) -> (Timestamp, Timestamp) {
        let first = (day - 1) * MINUTES_PER_DAY;
        (self.time_at(first), self.time_at(first + MINUTES_PER_DAY - 1))
    }

    pub fn clamp(&self, time: Timestamp) -> Timestamp {
        time.clamp(self.start, self.end())
    }

    /// Maps a pointer fraction across the full recording to a whole minute.
    pub fn time_at_fraction(&self, fraction: f64) -> Timestamp {
        let fraction = if fraction.is_nan() {
            0.0
        } else {
            fraction.clamp(0.0, 1.0)
        };
        let minute = (fraction * self.total_minutes() as f64).round() as i64;
        self.time_at(minute)
    }
}
