//! Idempotent topology reconciliation.
//!
//! Merges the payload's zones, pipes, and sensors into the store keyed by
//! their external ids: insert when absent, otherwise overwrite every mutable
//! attribute in place. Application order is zones, then pipes, then sensors,
//! because the store enforces the corresponding foreign keys. Rows whose
//! parent reference cannot be resolved are skipped with a warning rather
//! than failing the cycle.

use chrono::Utc;
use diesel::prelude::*;
use diesel::SqliteConnection;
use log::{debug, warn};

use crate::db::models as dbm;
use crate::models::payload::ReadingPayload;
use crate::schema;
use crate::utils::epoch_seconds_to_utc;

pub fn upsert_topology(conn: &mut SqliteConnection, payload: &ReadingPayload) -> Result<(), String> {
    upsert_zones(conn, payload)?;
    upsert_pipes(conn, payload)?;
    upsert_sensors(conn, payload)?;
    debug!(
        "Reconciled topology: zones={}, pipes={}, sensors={}",
        payload.zones.len(),
        payload.pipes.len(),
        payload.sensors.len()
    );
    Ok(())
}

fn upsert_zones(conn: &mut SqliteConnection, payload: &ReadingPayload) -> Result<(), String> {
    use schema::zones::dsl as Z;

    for zone in &payload.zones {
        let now = Utc::now();
        let new_row = dbm::NewZone {
            id: zone.id,
            name: zone.name.clone(),
            status: zone.status.clone(),
            created_at: now,
            updated_at: now,
        };
        diesel::insert_into(Z::zones)
            .values(&new_row)
            .on_conflict(Z::id)
            .do_update()
            .set((
                Z::name.eq(new_row.name.clone()),
                Z::status.eq(new_row.status.clone()),
                Z::updated_at.eq(now),
            ))
            .execute(conn)
            .map_err(|e| format!("upsert zone {} failed: {}", zone.id, e))?;
    }
    Ok(())
}

fn upsert_pipes(conn: &mut SqliteConnection, payload: &ReadingPayload) -> Result<(), String> {
    use schema::pipes::dsl as P;
    use schema::zones::dsl as Z;

    for pipe in &payload.pipes {
        let zone_known: i64 = Z::zones
            .filter(Z::id.eq(pipe.zone_id))
            .count()
            .get_result(conn)
            .map_err(|e| format!("zone lookup for pipe {} failed: {}", pipe.id, e))?;
        if zone_known == 0 {
            warn!("Skipping pipe {}: zone {} unknown", pipe.id, pipe.zone_id);
            continue;
        }

        let now = Utc::now();
        let new_row = dbm::NewPipe {
            id: pipe.id,
            name: pipe.name.clone(),
            zone_id: pipe.zone_id,
            previous_pipe_id: pipe.previous_pipe_id,
            diameter: pipe.diameter,
            length: pipe.length,
            material: pipe.material.clone(),
            installation_date: epoch_seconds_to_utc(pipe.installation_date),
            expected_pressure_drop: pipe.expected_pressure_drop,
            created_at: now,
            updated_at: now,
        };
        diesel::insert_into(P::pipes)
            .values(&new_row)
            .on_conflict(P::id)
            .do_update()
            .set((
                P::name.eq(new_row.name.clone()),
                P::zone_id.eq(new_row.zone_id),
                P::previous_pipe_id.eq(new_row.previous_pipe_id),
                P::diameter.eq(new_row.diameter),
                P::length.eq(new_row.length),
                P::material.eq(new_row.material.clone()),
                P::installation_date.eq(new_row.installation_date),
                P::expected_pressure_drop.eq(new_row.expected_pressure_drop),
                P::updated_at.eq(now),
            ))
            .execute(conn)
            .map_err(|e| format!("upsert pipe {} failed: {}", pipe.id, e))?;
    }
    Ok(())
}

fn upsert_sensors(conn: &mut SqliteConnection, payload: &ReadingPayload) -> Result<(), String> {
    use schema::pipes::dsl as P;
    use schema::sensors::dsl as S;

    for sensor in &payload.sensors {
        let pipe_known: i64 = P::pipes
            .filter(P::id.eq(sensor.pipe_id))
            .count()
            .get_result(conn)
            .map_err(|e| format!("pipe lookup for sensor {} failed: {}", sensor.id, e))?;
        if pipe_known == 0 {
            warn!("Skipping sensor {}: pipe {} unknown", sensor.id, sensor.pipe_id);
            continue;
        }

        let now = Utc::now();
        let new_row = dbm::NewSensor {
            id: sensor.id,
            name: sensor.name.clone(),
            pipe_id: sensor.pipe_id,
            previous_sensor_id: sensor.previous_sensor_id,
            location: sensor.location.clone(),
            distance_from_previous_sensor: sensor.distance_from_previous_sensor,
            elevation: sensor.elevation,
            is_water_tap: sensor.is_water_tap,
            expected_daily_usage: sensor.expected_daily_usage,
            status: sensor.sensor_status.clone(),
            last_calibration_date: epoch_seconds_to_utc(sensor.last_calibration_date),
            created_at: now,
            updated_at: now,
        };
        diesel::insert_into(S::sensors)
            .values(&new_row)
            .on_conflict(S::id)
            .do_update()
            .set((
                S::name.eq(new_row.name.clone()),
                S::pipe_id.eq(new_row.pipe_id),
                S::previous_sensor_id.eq(new_row.previous_sensor_id),
                S::location.eq(new_row.location.clone()),
                S::distance_from_previous_sensor.eq(new_row.distance_from_previous_sensor),
                S::elevation.eq(new_row.elevation),
                S::is_water_tap.eq(new_row.is_water_tap),
                S::expected_daily_usage.eq(new_row.expected_daily_usage),
                S::status.eq(new_row.status.clone()),
                S::last_calibration_date.eq(new_row.last_calibration_date),
                S::updated_at.eq(now),
            ))
            .execute(conn)
            .map_err(|e| format!("upsert sensor {} failed: {}", sensor.id, e))?;
    }
    Ok(())
}
