//! Minimal runtime configuration helpers.
//! The poll interval itself lives in the database settings row, not here.

pub const DEFAULT_DATABASE_URL: &str = "leakwatch.sqlite3";
pub const DEFAULT_IOT_BASE_URL: &str = "http://localhost:8000";
pub const DEFAULT_READINGS_ENDPOINT: &str = "/api/v1/readings";
pub const DEFAULT_DATA_POINTS_PER_SENSOR: i32 = 5;
pub const DEFAULT_MODEL_PATH: &str = "data/models/leak_model.json";
pub const DEFAULT_TRAINING_DATA_PATH: &str = "data/training/leak_training_data.csv";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TelemetrySourceKind {
    /// Poll the configured IoT backend over HTTP.
    Http,
    /// Generate payloads locally (no backend required).
    Synthetic,
}

#[derive(Debug, Clone)]
pub struct Config {
    /// SQLite database path (or `:memory:`).
    pub database_url: String,
    pub telemetry_source: TelemetrySourceKind,
    pub iot_base_url: String,
    pub iot_readings_endpoint: String,
    pub data_points_per_sensor: i32,
    /// Persisted classifier artifact; trained on first use when absent.
    pub model_path: String,
    pub training_data_path: String,
}

impl Config {
    pub fn from_env() -> Result<Self, String> {
        let database_url = std::env::var("DATABASE_URL").unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string());

        let telemetry_source = match std::env::var("TELEMETRY_SOURCE") {
            Ok(s) => match s.trim().to_ascii_lowercase().as_str() {
                "http" => TelemetrySourceKind::Http,
                "synthetic" | "" => TelemetrySourceKind::Synthetic,
                other => {
                    return Err(format!(
                        "TELEMETRY_SOURCE must be `http` or `synthetic`, got `{}`",
                        other
                    ))
                }
            },
            Err(_) => TelemetrySourceKind::Synthetic,
        };

        let iot_base_url = std::env::var("IOT_BASE_URL").unwrap_or_else(|_| DEFAULT_IOT_BASE_URL.to_string());
        let iot_readings_endpoint =
            std::env::var("IOT_READINGS_ENDPOINT").unwrap_or_else(|_| DEFAULT_READINGS_ENDPOINT.to_string());

        let data_points_per_sensor = std::env::var("DATA_POINTS_PER_SENSOR")
            .ok()
            .and_then(|s| s.parse::<i32>().ok())
            .unwrap_or(DEFAULT_DATA_POINTS_PER_SENSOR);
        if data_points_per_sensor < 1 {
            return Err("DATA_POINTS_PER_SENSOR must be at least 1".to_string());
        }

        let model_path = std::env::var("MODEL_PATH").unwrap_or_else(|_| DEFAULT_MODEL_PATH.to_string());
        let training_data_path =
            std::env::var("TRAINING_DATA_PATH").unwrap_or_else(|_| DEFAULT_TRAINING_DATA_PATH.to_string());

        Ok(Config {
            database_url,
            telemetry_source,
            iot_base_url,
            iot_readings_endpoint,
            data_points_per_sensor,
            model_path,
            training_data_path,
        })
    }
}
