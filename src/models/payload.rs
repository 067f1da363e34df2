//! Wire types for the IoT readings payload.
//!
//! One payload carries the full topology (zones, pipes, sensors) together
//! with per-sensor time series and summary statistics for the requested
//! window. Timestamps inside the payload are epoch seconds; the pipeline
//! deliberately ignores them for snapshot timestamps and stamps every
//! snapshot with the ingestion-cycle wall clock instead.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadingPayload {
    pub reading_metadata: ReadingMetadata,
    #[serde(default)]
    pub zones: Vec<ZoneDto>,
    #[serde(default)]
    pub pipes: Vec<PipeDto>,
    #[serde(default)]
    pub sensors: Vec<SensorDto>,
    #[serde(default)]
    pub system_health: SystemHealthDto,
}

impl ReadingPayload {
    /// Decode a payload from JSON, reporting the path to the offending field
    /// on failure.
    pub fn from_json(raw: &str) -> Result<Self, String> {
        let de = &mut serde_json::Deserializer::from_str(raw);
        serde_path_to_error::deserialize(de).map_err(|e| format!("payload decode failed: {}", e))
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadingMetadata {
    pub reading_id: String,
    pub timestamp: i64,
    pub interval_minutes: i32,
    pub data_points_per_sensor: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ZoneDto {
    pub id: i64,
    pub name: String,
    pub total_sensors: i32,
    pub status: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PipeDto {
    pub id: i64,
    pub name: String,
    pub zone_id: i64,
    #[serde(default)]
    pub previous_pipe_id: Option<i64>,
    pub diameter: f64,
    pub length: f64,
    pub material: String,
    /// Epoch seconds.
    pub installation_date: i64,
    pub expected_pressure_drop: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SensorDto {
    pub id: i64,
    pub name: String,
    pub pipe_id: i64,
    #[serde(default)]
    pub previous_sensor_id: Option<i64>,
    pub location: String,
    pub distance_from_previous_sensor: f64,
    pub elevation: f64,
    pub is_water_tap: bool,
    pub expected_daily_usage: f64,
    pub sensor_status: String,
    /// Epoch seconds.
    pub last_calibration_date: i64,
    #[serde(default)]
    pub readings: SensorReadingsDto,
    #[serde(default)]
    pub statistics: SensorStatisticsDto,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SensorReadingsDto {
    pub start_timestamp: i64,
    pub end_timestamp: i64,
    pub interval_seconds: i32,
    #[serde(default)]
    pub pressure_readings: Vec<TimeSeriesReadingDto>,
    #[serde(default)]
    pub flow_rate_readings: Vec<TimeSeriesReadingDto>,
    #[serde(default)]
    pub temperature_readings: Vec<TimeSeriesReadingDto>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeSeriesReadingDto {
    /// Epoch seconds.
    pub timestamp: i64,
    pub value: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quality: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SensorStatisticsDto {
    pub total_water_usage: f64,
    pub average_pressure: f64,
    pub min_pressure: f64,
    pub max_pressure: f64,
    pub pressure_variance: f64,
    pub average_flow_rate: f64,
    pub total_flow_volume: f64,
    pub pressure_drop_rate: f64,
    pub anomaly_score: f64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SystemHealthDto {
    pub total_sensors_active: i32,
    pub total_sensors_inactive: i32,
    pub data_quality_score: f64,
    pub last_system_check_timestamp: i64,
    pub network_latency: i32,
}
