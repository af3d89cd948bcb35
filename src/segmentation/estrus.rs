//! The four-day estrus cycle, as a pure function of the experiment day.

use crate::calendar::{ExperimentCalendar, Timestamp};

/// First estrus day of the recording (1-based).
pub const FIRST_ESTRUS_DAY: i64 = 2;
pub const CYCLE_DAYS: i64 = 4;

/// Days 2, 6, 10, 14, ... are estrus days.
pub fn is_estrus_day(day: i64) -> bool {
    (day - FIRST_ESTRUS_DAY).rem_euclid(CYCLE_DAYS) == 0
}

pub fn estrus_state(calendar: &ExperimentCalendar, time: Timestamp) -> bool {
    is_estrus_day(calendar.day_number(time))
}
