//! Diesel model structs representing the pipe-network topology and the
//! scored snapshot history.
//!
//! Zone/Pipe/Sensor carry the external identity from the telemetry source as
//! their primary key; reconciliation upserts them in place. SensorSnapshot is
//! append-only and pruned by the retention manager.

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};

use crate::schema;

pub mod log_levels {
    pub const INFO: &str = "Info";
    pub const WARNING: &str = "Warning";
    pub const ERROR: &str = "Error";
}

#[derive(Debug, Clone, Queryable, Identifiable, Selectable, Serialize, Deserialize)]
#[diesel(table_name = schema::zones)]
pub struct Zone {
    pub id: i64,
    pub name: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = schema::zones)]
pub struct NewZone {
    pub id: i64,
    pub name: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Queryable, Identifiable, Associations, Selectable, Serialize, Deserialize)]
#[diesel(table_name = schema::pipes)]
#[diesel(belongs_to(Zone))]
pub struct Pipe {
    pub id: i64,
    pub name: String,
    pub zone_id: i64,
    pub previous_pipe_id: Option<i64>,
    pub diameter: f64,
    pub length: f64,
    pub material: String,
    pub installation_date: DateTime<Utc>,
    pub expected_pressure_drop: f64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = schema::pipes)]
pub struct NewPipe {
    pub id: i64,
    pub name: String,
    pub zone_id: i64,
    pub previous_pipe_id: Option<i64>,
    pub diameter: f64,
    pub length: f64,
    pub material: String,
    pub installation_date: DateTime<Utc>,
    pub expected_pressure_drop: f64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Queryable, Identifiable, Associations, Selectable, Serialize, Deserialize)]
#[diesel(table_name = schema::sensors)]
#[diesel(belongs_to(Pipe))]
pub struct Sensor {
    pub id: i64,
    pub name: String,
    pub pipe_id: i64,
    pub previous_sensor_id: Option<i64>,
    pub location: String,
    pub distance_from_previous_sensor: f64,
    pub elevation: f64,
    pub is_water_tap: bool,
    pub expected_daily_usage: f64,
    pub status: String,
    pub last_calibration_date: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = schema::sensors)]
pub struct NewSensor {
    pub id: i64,
    pub name: String,
    pub pipe_id: i64,
    pub previous_sensor_id: Option<i64>,
    pub location: String,
    pub distance_from_previous_sensor: f64,
    pub elevation: f64,
    pub is_water_tap: bool,
    pub expected_daily_usage: f64,
    pub status: String,
    pub last_calibration_date: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Queryable, Identifiable, Associations, Selectable, Serialize, Deserialize)]
#[diesel(table_name = schema::sensor_snapshots)]
#[diesel(belongs_to(Sensor))]
pub struct SensorSnapshot {
    pub id: i64,
    pub timestamp: DateTime<Utc>,
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
    pub leak_probability: f64,
    pub is_leak_predicted: bool,
    pub leak_severity_predicted: i32,
    pub leak_type_predicted: String,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = schema::sensor_snapshots)]
pub struct NewSensorSnapshot {
    pub timestamp: DateTime<Utc>,
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
    pub leak_probability: f64,
    pub is_leak_predicted: bool,
    pub leak_severity_predicted: i32,
    pub leak_type_predicted: String,
}

#[derive(Debug, Clone, Queryable, Identifiable, Selectable)]
#[diesel(table_name = schema::settings)]
pub struct Setting {
    pub id: i64,
    pub poll_interval_minutes: i32,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = schema::settings)]
pub struct NewSetting {
    pub poll_interval_minutes: i32,
}

#[derive(Debug, Clone, Queryable, Identifiable, Selectable, Serialize)]
#[diesel(table_name = schema::log_entries)]
pub struct LogEntry {
    pub id: i64,
    pub timestamp: DateTime<Utc>,
    pub level: String,
    pub message: String,
    pub context: Option<String>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = schema::log_entries)]
pub struct NewLogEntry {
    pub timestamp: DateTime<Utc>,
    pub level: String,
    pub message: String,
    pub context: Option<String>,
}
