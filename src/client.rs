//! Telemetry source boundary.
//!
//! The pipeline consumes one [`ReadingPayload`] per cycle from a
//! [`TelemetrySource`]. The production source is a blocking `ureq` client
//! against the IoT backend's readings endpoint; a seeded synthetic generator
//! (`services::synthetic`) implements the same trait for offline runs.
//!
//! A fetch or decode failure means "no data this cycle" for the caller; the
//! pipeline itself is never invoked with a malformed payload.

use core::fmt;
use std::error::Error;

use crate::models::payload::ReadingPayload;

#[derive(Debug)]
pub enum IotClientError {
    Transport(String),
    Http { status: u16, message: String },
    Decode(String),
}

impl fmt::Display for IotClientError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IotClientError::Transport(s) => write!(f, "transport error: {}", s),
            IotClientError::Http { status, message } => write!(f, "http {}: {}", status, message),
            IotClientError::Decode(s) => write!(f, "decode error: {}", s),
        }
    }
}

impl Error for IotClientError {}

/// Something that can produce one readings payload per ingestion cycle.
pub trait TelemetrySource {
    fn fetch_reading(&mut self, window_minutes: i32) -> Result<ReadingPayload, IotClientError>;
}

/// Blocking HTTP client for the IoT readings endpoint.
pub struct IotClient {
    agent: ureq::Agent,
    base_url: String,
    readings_endpoint: String,
    data_points_per_sensor: i32,
}

impl IotClient {
    pub fn new(base_url: &str, readings_endpoint: &str, data_points_per_sensor: i32) -> Self {
        let endpoint = if readings_endpoint.starts_with('/') {
            readings_endpoint.to_string()
        } else {
            format!("/{}", readings_endpoint)
        };
        IotClient {
            agent: ureq::AgentBuilder::new().build(),
            base_url: base_url.trim_end_matches('/').to_string(),
            readings_endpoint: endpoint,
            data_points_per_sensor,
        }
    }

    fn readings_url(&self, window_minutes: i32) -> String {
        format!(
            "{}{}?window_minutes={}&data_points_per_sensor={}",
            self.base_url, self.readings_endpoint, window_minutes, self.data_points_per_sensor
        )
    }
}

impl TelemetrySource for IotClient {
    fn fetch_reading(&mut self, window_minutes: i32) -> Result<ReadingPayload, IotClientError> {
        let url = self.readings_url(window_minutes);
        let response = self
            .agent
            .get(&url)
            .set("Accept", "application/json")
            .call()
            .map_err(|e| match e {
                ureq::Error::Status(status, resp) => IotClientError::Http {
                    status,
                    message: resp.into_string().unwrap_or_default(),
                },
                other => IotClientError::Transport(other.to_string()),
            })?;

        let body = response
            .into_string()
            .map_err(|e| IotClientError::Transport(e.to_string()))?;
        ReadingPayload::from_json(&body).map_err(IotClientError::Decode)
    }
}
