//! Deterministic facility schedule model.
//!
//! Pure function from a wall-clock instant to occupancy/usage descriptors.
//! The site runs Monday through Saturday, 07:00-19:00, with four short
//! breaks and one lunch break. All windows are half-open `[start, end)`.

use chrono::{DateTime, Datelike, Timelike, Utc};

pub const BREAK_NONE: &str = "none";
pub const BREAK_SHORT: &str = "short";
pub const BREAK_LUNCH: &str = "lunch";

/// Short-break windows as minutes-of-day `[start, end)`.
const SHORT_BREAKS: [(u32, u32); 4] = [
    (10 * 60, 10 * 60 + 10),
    (11 * 60 + 50, 12 * 60),
    (15 * 60 + 20, 15 * 60 + 30),
    (17 * 60, 17 * 60 + 10),
];

const LUNCH_START: u32 = 13 * 60 + 30;
const LUNCH_END: u32 = 14 * 60;

#[derive(Debug, Clone, PartialEq)]
pub struct ScheduleFeatures {
    /// Monday=1 .. Sunday=7.
    pub day_of_week: u32,
    pub is_working_hours: bool,
    pub is_break: bool,
    pub break_type: &'static str,
    pub usage_multiplier: f64,
    pub minutes_since_break_start: i32,
    pub occupancy: f64,
}

/// Derive schedule features for an instant. Rules are evaluated in order,
/// first match wins: Sunday, short break, lunch, plain working hours,
/// after hours.
pub fn schedule_features(ts: DateTime<Utc>) -> ScheduleFeatures {
    let day_of_week = ts.weekday().number_from_monday();
    let total_minutes = ts.hour() * 60 + ts.minute();

    if day_of_week == 7 {
        // Sunday: minimal activity, no breaks.
        return ScheduleFeatures {
            day_of_week,
            is_working_hours: false,
            is_break: false,
            break_type: BREAK_NONE,
            usage_multiplier: 0.1,
            minutes_since_break_start: 0,
            occupancy: 0.1,
        };
    }

    let is_working_hours = total_minutes >= 7 * 60 && total_minutes < 19 * 60;

    let in_short_break = SHORT_BREAKS
        .iter()
        .any(|&(start, end)| total_minutes >= start && total_minutes < end);

    if in_short_break {
        ScheduleFeatures {
            day_of_week,
            is_working_hours,
            is_break: true,
            break_type: BREAK_SHORT,
            usage_multiplier: 2.8,
            minutes_since_break_start: (total_minutes % 10) as i32,
            occupancy: 0.8,
        }
    } else if total_minutes >= LUNCH_START && total_minutes < LUNCH_END {
        ScheduleFeatures {
            day_of_week,
            is_working_hours,
            is_break: true,
            break_type: BREAK_LUNCH,
            usage_multiplier: 4.0,
            minutes_since_break_start: (total_minutes - LUNCH_START) as i32,
            occupancy: 0.95,
        }
    } else if is_working_hours {
        ScheduleFeatures {
            day_of_week,
            is_working_hours,
            is_break: false,
            break_type: BREAK_NONE,
            usage_multiplier: 1.3,
            minutes_since_break_start: 0,
            occupancy: 0.35,
        }
    } else {
        // After hours on a working day.
        ScheduleFeatures {
            day_of_week,
            is_working_hours,
            is_break: false,
            break_type: BREAK_NONE,
            usage_multiplier: 0.2,
            minutes_since_break_start: 0,
            occupancy: 0.1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    // 2024-01-02 is a Tuesday, 2024-01-07 a Sunday, 2024-01-06 a Saturday.
    fn at(day: u32, hour: u32, min: u32, sec: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, day, hour, min, sec).unwrap()
    }

    #[test]
    fn sunday_is_minimal_regardless_of_time() {
        for hour in [0, 10, 13, 18, 23] {
            let f = schedule_features(at(7, hour, 0, 0));
            assert_eq!(f.day_of_week, 7);
            assert!(!f.is_working_hours);
            assert!(!f.is_break);
            assert_eq!(f.usage_multiplier, 0.1);
            assert_eq!(f.occupancy, 0.1);
            assert_eq!(f.minutes_since_break_start, 0);
        }
    }

    #[test]
    fn short_break_window_is_half_open() {
        let inside = schedule_features(at(2, 10, 9, 59));
        assert!(inside.is_break);
        assert_eq!(inside.break_type, BREAK_SHORT);
        assert_eq!(inside.usage_multiplier, 2.8);
        assert_eq!(inside.minutes_since_break_start, 9);

        let outside = schedule_features(at(2, 10, 10, 0));
        assert!(!outside.is_break);
        assert_eq!(outside.break_type, BREAK_NONE);
        assert_eq!(outside.usage_multiplier, 1.3);
    }

    #[test]
    fn lunch_break_offsets_from_half_past_one() {
        let f = schedule_features(at(2, 13, 45, 0));
        assert!(f.is_break);
        assert_eq!(f.break_type, BREAK_LUNCH);
        assert_eq!(f.usage_multiplier, 4.0);
        assert_eq!(f.minutes_since_break_start, 15);
        assert_eq!(f.occupancy, 0.95);

        // 14:00 is past the window.
        assert!(!schedule_features(at(2, 14, 0, 0)).is_break);
    }

    #[test]
    fn working_hours_without_break() {
        let f = schedule_features(at(2, 9, 30, 0));
        assert!(f.is_working_hours);
        assert!(!f.is_break);
        assert_eq!(f.usage_multiplier, 1.3);
        assert_eq!(f.occupancy, 0.35);
    }

    #[test]
    fn after_hours_on_working_day() {
        for (h, m) in [(6, 59), (19, 0), (22, 30)] {
            let f = schedule_features(at(2, h, m, 0));
            assert!(!f.is_working_hours);
            assert!(!f.is_break);
            assert_eq!(f.usage_multiplier, 0.2);
            assert_eq!(f.occupancy, 0.1);
        }
    }

    #[test]
    fn saturday_is_a_working_day() {
        let f = schedule_features(at(6, 9, 0, 0));
        assert_eq!(f.day_of_week, 6);
        assert!(f.is_working_hours);
    }

    #[test]
    fn deterministic_for_equal_inputs() {
        let ts = at(2, 11, 55, 30);
        assert_eq!(schedule_features(ts), schedule_features(ts));
    }

    #[test]
    fn breaks_outside_working_hours_still_apply_window_first() {
        // 17:00 short break sits inside working hours; 19:05 does not match
        // any break and falls through to after-hours.
        assert_eq!(schedule_features(at(2, 17, 5, 0)).break_type, BREAK_SHORT);
        assert_eq!(schedule_features(at(2, 19, 5, 0)).usage_multiplier, 0.2);
    }
}
