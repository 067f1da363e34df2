//! One ingestion cycle: reconcile topology, build and score per-sensor
//! feature records, persist the snapshot batch, prune old history, audit.
//!
//! Reconciliation and the snapshot batch are two independent commits; a
//! crash between them leaves updated topology with no snapshots for that
//! cycle, which is accepted. A persistence failure in either commit aborts
//! the cycle without partial snapshot writes; the surrounding scheduler owns
//! retry/backoff.

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel::SqliteConnection;
use log::{info, warn};
use std::fmt;

use crate::db::models::NewSensorSnapshot;
use crate::models::payload::ReadingPayload;
use crate::schema;
use crate::services::features::{self, LeakFeatureRecord};
use crate::services::model::{classify, LeakModelService, LeakPrediction};
use crate::services::{audit, reconcile, retention};

/// Carries service-level error strings across a Diesel transaction boundary.
#[derive(Debug)]
enum TxError {
    Db(diesel::result::Error),
    Service(String),
}

impl From<diesel::result::Error> for TxError {
    fn from(value: diesel::result::Error) -> Self {
        TxError::Db(value)
    }
}

impl fmt::Display for TxError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TxError::Db(e) => write!(f, "{}", e),
            TxError::Service(s) => write!(f, "{}", s),
        }
    }
}

/// Process one readings payload. Returns the number of snapshots committed.
pub fn process_reading(
    conn: &mut SqliteConnection,
    model: &LeakModelService,
    payload: &ReadingPayload,
) -> Result<usize, String> {
    // 1) Reconcile topology and commit before any scoring work.
    conn.transaction::<(), TxError, _>(|conn| {
        reconcile::upsert_topology(conn, payload).map_err(TxError::Service)
    })
    .map_err(|e| format!("topology reconciliation failed: {}", e))?;

    // 2) One wall-clock instant shared by every snapshot in this cycle.
    let snapshot_time = Utc::now();

    // 3) Build and score. Upstream sensors resolve against the payload, not
    //    the store, so scoring never reads a partially-updated topology.
    let mut staged: Vec<NewSensorSnapshot> = Vec::with_capacity(payload.sensors.len());
    for sensor in &payload.sensors {
        if !sensor_exists(conn, sensor.id)? {
            warn!("Skipping sensor {}: not present in store after reconciliation", sensor.id);
            continue;
        }
        let Some(pipe) = payload.pipes.iter().find(|p| p.id == sensor.pipe_id) else {
            warn!("Skipping sensor {}: pipe {} missing from payload", sensor.id, sensor.pipe_id);
            continue;
        };
        let upstream = sensor
            .previous_sensor_id
            .and_then(|prev_id| payload.sensors.iter().find(|s| s.id == prev_id))
            // A self-referencing chain degrades to "no upstream".
            .filter(|prev| prev.id != sensor.id);

        let record = features::build_feature_record(sensor, upstream, pipe.zone_id, snapshot_time);
        let probability = model.predict_leak_probability(&record)?;
        let prediction = classify(probability);
        staged.push(snapshot_row(&record, &prediction, snapshot_time));
    }

    // 4) Commit the whole batch or nothing.
    let inserted = staged.len();
    conn.transaction::<(), TxError, _>(|conn| {
        use schema::sensor_snapshots::dsl as SS;
        diesel::insert_into(SS::sensor_snapshots).values(&staged).execute(conn)?;
        Ok(())
    })
    .map_err(|e| format!("committing snapshot batch failed: {}", e))?;

    // 5) Prune in a separate commit; over-retention beats data loss.
    let pruned = retention::prune_snapshots(conn)?;

    // 6) Audit the cycle.
    audit::log_info(
        conn,
        &format!("Processed IoT reading {}", payload.reading_metadata.reading_id),
    )?;
    info!(
        "Cycle complete: reading={}, snapshots={}, pruned={}",
        payload.reading_metadata.reading_id, inserted, pruned
    );

    Ok(inserted)
}

fn sensor_exists(conn: &mut SqliteConnection, sensor_id: i64) -> Result<bool, String> {
    use schema::sensors::dsl as S;
    let count: i64 = S::sensors
        .filter(S::id.eq(sensor_id))
        .count()
        .get_result(conn)
        .map_err(|e| format!("sensor lookup {} failed: {}", sensor_id, e))?;
    Ok(count > 0)
}

fn snapshot_row(
    record: &LeakFeatureRecord,
    prediction: &LeakPrediction,
    snapshot_time: DateTime<Utc>,
) -> NewSensorSnapshot {
    NewSensorSnapshot {
        timestamp: snapshot_time,
        sensor_id: record.sensor_id,
        pipe_id: record.pipe_id,
        zone_id: record.zone_id,
        pressure_current: record.pressure_current,
        pressure_previous_sensor: record.pressure_previous_sensor,
        flow_rate: record.flow_rate,
        water_usage_diff: record.water_usage_diff,
        pressure_drop_rate: record.pressure_drop_rate,
        hour: record.hour,
        minute: record.minute,
        day_of_week: record.day_of_week,
        is_working_hours: record.is_working_hours,
        is_break_time: record.is_break_time,
        break_type: record.break_type.clone(),
        expected_usage_multiplier: record.expected_usage_multiplier,
        minutes_since_break_start: record.minutes_since_break_start,
        occupancy_level: record.occupancy_level,
        pressure_vs_baseline: record.pressure_vs_baseline,
        flow_vs_baseline: record.flow_vs_baseline,
        leak_probability: prediction.probability,
        is_leak_predicted: prediction.is_leak_predicted,
        leak_severity_predicted: prediction.severity,
        leak_type_predicted: prediction.leak_type.clone(),
    }
}
