//! Cooperative ingestion scheduler.
//!
//! One cycle runs to completion before the next is considered; the loop
//! sleeps out the remainder of the configured interval to keep a steady
//! cadence. A failed fetch is "no data this cycle"; a failed pipeline run is
//! logged, audited, and retried after a short backoff.

use log::{error, info, warn};
use std::thread;
use std::time::{Duration, Instant};

use diesel::SqliteConnection;

use crate::client::TelemetrySource;
use crate::services::model::LeakModelService;
use crate::services::{audit, pipeline, risk, settings};

const ERROR_BACKOFF: Duration = Duration::from_secs(30);

pub fn run_loop(
    conn: &mut SqliteConnection,
    source: &mut dyn TelemetrySource,
    model: &LeakModelService,
) -> Result<(), String> {
    info!("Sensor polling loop started");
    loop {
        let tick_start = Instant::now();
        let minutes = settings::poll_interval_minutes(conn)?;
        let interval = Duration::from_secs(u64::from(minutes.max(1) as u32) * 60);

        match source.fetch_reading(minutes) {
            Err(e) => {
                warn!("No IoT data this cycle: {}", e);
                audit::log_warning(conn, "Failed to fetch IoT readings")?;
            }
            Ok(payload) => {
                info!(
                    "Received IoT payload {}: zones={}, pipes={}, sensors={}",
                    payload.reading_metadata.reading_id,
                    payload.zones.len(),
                    payload.pipes.len(),
                    payload.sensors.len()
                );
                match pipeline::process_reading(conn, model, &payload) {
                    Ok(added) => {
                        log_risk_summary(conn, added);
                    }
                    Err(e) => {
                        error!("Ingestion cycle failed: {}", e);
                        audit::log_error(conn, "Ingestion cycle failed", Some(&e))?;
                        thread::sleep(ERROR_BACKOFF);
                        continue;
                    }
                }
            }
        }

        // Maintain steady cadence
        let elapsed = tick_start.elapsed();
        if elapsed < interval {
            thread::sleep(interval - elapsed);
        }
    }
}

fn log_risk_summary(conn: &mut SqliteConnection, added: usize) {
    match risk::current_pipe_risk(conn) {
        Ok(risks) => {
            let worst = risks
                .iter()
                .max_by(|a, b| a.leak_probability.total_cmp(&b.leak_probability));
            match worst {
                Some(top) => info!(
                    "Cycle added {} snapshot(s); {} pipe(s) in risk view, highest {:.3} on pipe {} ({})",
                    added,
                    risks.len(),
                    top.leak_probability,
                    top.pipe_id,
                    top.pipe_name
                ),
                None => info!("Cycle added {} snapshot(s); risk view is empty", added),
            }
        }
        Err(e) => warn!("Risk view unavailable: {}", e),
    }
}
