//! Per-sensor feature engineering.
//!
//! Turns one sensor's raw reading (plus its immediate upstream sensor, when
//! one exists in the same payload) into the flat record the classifier was
//! trained on. Schedule fields are derived from the ingestion-cycle wall
//! clock, never from timestamps embedded in the payload.

use chrono::{DateTime, Timelike, Utc};
use serde::{Deserialize, Serialize};

use crate::models::payload::{SensorDto, TimeSeriesReadingDto};
use crate::services::schedule;

pub const LEAK_TYPE_NONE: &str = "none";
pub const LEAK_TYPE_CONTINUOUS: &str = "continuous";

/// Flat feature record, shape-compatible with the training dataset. The
/// `is_leak`/`leak_severity`/`leak_type` fields are labels: populated in
/// training data, fixed placeholders at inference time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeakFeatureRecord {
    pub timestamp: String,
    pub sensor_id: i64,
    pub pipe_id: i64,
    pub zone_id: i64,
    pub pressure_current: f64,
    pub pressure_previous_sensor: f64,
    pub flow_rate: f64,
    pub water_usage_diff: f64,
    pub pressure_drop_rate: f64,
    pub hour: i32,
    pub minute: i32,
    pub day_of_week: i32,
    pub is_working_hours: bool,
    pub is_break_time: bool,
    pub break_type: String,
    pub expected_usage_multiplier: f64,
    pub minutes_since_break_start: i32,
    pub occupancy_level: f64,
    pub pressure_vs_baseline: f64,
    pub flow_vs_baseline: f64,
    pub is_leak: bool,
    pub leak_severity: i32,
    pub leak_type: String,
}

/// Build the feature record for one sensor.
///
/// `upstream` must come from the same payload as `sensor`; resolving it
/// against the store mid-cycle would race the reconciler.
pub fn build_feature_record(
    sensor: &SensorDto,
    upstream: Option<&SensorDto>,
    zone_id: i64,
    snapshot_time: DateTime<Utc>,
) -> LeakFeatureRecord {
    let stats = &sensor.statistics;
    let pressure_series = &sensor.readings.pressure_readings;
    let flow_series = &sensor.readings.flow_rate_readings;

    let pressure_current = last_value_or(pressure_series, stats.average_pressure);
    let flow_rate = last_value_or(flow_series, stats.average_flow_rate);

    // No upstream sensor means zero drop across the boundary: the "previous"
    // pressure degenerates to this sensor's own.
    let pressure_previous_sensor = match upstream {
        Some(prev) => last_value_or(
            &prev.readings.pressure_readings,
            prev.statistics.average_pressure,
        ),
        None => pressure_current,
    };

    let water_usage_diff = match upstream {
        Some(prev) => prev.statistics.total_flow_volume - stats.total_flow_volume,
        None => 0.0,
    };

    let pressure_drop_rate = pressure_drop_rate(pressure_series);

    let sched = schedule::schedule_features(snapshot_time);

    LeakFeatureRecord {
        timestamp: snapshot_time.format("%Y-%m-%d %H:%M:%S").to_string(),
        sensor_id: sensor.id,
        pipe_id: sensor.pipe_id,
        zone_id,
        pressure_current,
        pressure_previous_sensor,
        flow_rate,
        water_usage_diff,
        pressure_drop_rate,
        hour: snapshot_time.hour() as i32,
        minute: snapshot_time.minute() as i32,
        day_of_week: sched.day_of_week as i32,
        is_working_hours: sched.is_working_hours,
        is_break_time: sched.is_break,
        break_type: sched.break_type.to_string(),
        expected_usage_multiplier: sched.usage_multiplier,
        minutes_since_break_start: sched.minutes_since_break_start,
        occupancy_level: sched.occupancy,
        pressure_vs_baseline: pressure_current - stats.average_pressure,
        flow_vs_baseline: flow_rate - stats.average_flow_rate,
        // Placeholders; required only for shape symmetry with training data.
        is_leak: false,
        leak_severity: 0,
        leak_type: LEAK_TYPE_NONE.to_string(),
    }
}

fn last_value_or(series: &[TimeSeriesReadingDto], fallback: f64) -> f64 {
    series.last().map(|r| r.value).unwrap_or(fallback)
}

/// Slope of the pressure series in units per minute between its first and
/// last samples. Fewer than two points, or a non-positive span, yields 0.
pub fn pressure_drop_rate(series: &[TimeSeriesReadingDto]) -> f64 {
    let (first, last) = match (series.first(), series.last()) {
        (Some(f), Some(l)) if series.len() >= 2 => (f, l),
        _ => return 0.0,
    };
    let minutes = (last.timestamp - first.timestamp) as f64 / 60.0;
    if minutes <= 0.0 {
        return 0.0;
    }
    (last.value - first.value) / minutes
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::payload::{SensorReadingsDto, SensorStatisticsDto};
    use chrono::TimeZone;

    fn point(timestamp: i64, value: f64) -> TimeSeriesReadingDto {
        TimeSeriesReadingDto {
            timestamp,
            value,
            quality: None,
        }
    }

    fn sensor(id: i64, pipe_id: i64, previous_sensor_id: Option<i64>) -> SensorDto {
        SensorDto {
            id,
            name: format!("S-{}", id),
            pipe_id,
            previous_sensor_id,
            location: "test".to_string(),
            distance_from_previous_sensor: 10.0,
            elevation: 0.0,
            is_water_tap: false,
            expected_daily_usage: 100.0,
            sensor_status: "active".to_string(),
            last_calibration_date: 1_700_000_000,
            readings: SensorReadingsDto::default(),
            statistics: SensorStatisticsDto {
                average_pressure: 41.0,
                average_flow_rate: 2.0,
                total_flow_volume: 5.0,
                ..SensorStatisticsDto::default()
            },
        }
    }

    fn cycle_time() -> DateTime<Utc> {
        // Tuesday 09:30 UTC.
        Utc.with_ymd_and_hms(2024, 1, 2, 9, 30, 0).unwrap()
    }

    #[test]
    fn drop_rate_needs_two_points() {
        assert_eq!(pressure_drop_rate(&[]), 0.0);
        assert_eq!(pressure_drop_rate(&[point(0, 40.0)]), 0.0);
    }

    #[test]
    fn drop_rate_guards_non_positive_span() {
        assert_eq!(pressure_drop_rate(&[point(100, 40.0), point(100, 42.0)]), 0.0);
        assert_eq!(pressure_drop_rate(&[point(200, 40.0), point(100, 42.0)]), 0.0);
    }

    #[test]
    fn drop_rate_is_slope_per_minute() {
        let series = [point(0, 40.0), point(600, 42.0)];
        assert!((pressure_drop_rate(&series) - 0.2).abs() < 1e-12);

        let falling = [point(0, 42.0), point(300, 41.0)];
        assert!((pressure_drop_rate(&falling) + 0.2).abs() < 1e-12);
    }

    #[test]
    fn empty_series_falls_back_to_averages() {
        let s = sensor(100, 10, None);
        let rec = build_feature_record(&s, None, 1, cycle_time());
        assert_eq!(rec.pressure_current, 41.0);
        assert_eq!(rec.flow_rate, 2.0);
        assert_eq!(rec.pressure_vs_baseline, 0.0);
        assert_eq!(rec.flow_vs_baseline, 0.0);
    }

    #[test]
    fn no_upstream_means_self_reference_and_zero_diff() {
        let mut s = sensor(100, 10, None);
        s.readings.pressure_readings = vec![point(0, 40.0), point(600, 42.0)];
        let rec = build_feature_record(&s, None, 1, cycle_time());
        assert_eq!(rec.pressure_previous_sensor, rec.pressure_current);
        assert_eq!(rec.water_usage_diff, 0.0);
    }

    #[test]
    fn upstream_supplies_pressure_and_usage_diff() {
        let mut up = sensor(100, 10, None);
        up.readings.pressure_readings = vec![point(0, 44.0), point(600, 43.5)];
        up.statistics.total_flow_volume = 8.0;

        let mut down = sensor(101, 10, Some(100));
        down.readings.pressure_readings = vec![point(0, 40.0), point(600, 42.0)];

        let rec = build_feature_record(&down, Some(&up), 1, cycle_time());
        assert_eq!(rec.pressure_previous_sensor, 43.5);
        assert!((rec.water_usage_diff - 3.0).abs() < 1e-12);
        assert_eq!(rec.pressure_current, 42.0);
        assert!((rec.pressure_vs_baseline - 1.0).abs() < 1e-12);
    }

    #[test]
    fn schedule_fields_come_from_cycle_clock() {
        let s = sensor(100, 10, None);
        let rec = build_feature_record(&s, None, 1, cycle_time());
        assert_eq!(rec.hour, 9);
        assert_eq!(rec.minute, 30);
        assert_eq!(rec.day_of_week, 2);
        assert!(rec.is_working_hours);
        assert!(!rec.is_break_time);
        assert_eq!(rec.expected_usage_multiplier, 1.3);
        assert_eq!(rec.leak_type, LEAK_TYPE_NONE);
        assert!(!rec.is_leak);
    }
}
