//! Current per-pipe risk view.
//!
//! Read-only reduction over the recent snapshot history. Per pipe the
//! probability comes from the snapshot with the latest timestamp inside the
//! window, not the maximum over the window; max-over-window overstates
//! transient risk and was superseded. Pipes without a recent snapshot are
//! omitted entirely.

use chrono::{Duration, Utc};
use diesel::prelude::*;
use diesel::SqliteConnection;
use serde::Serialize;
use std::collections::BTreeMap;

use crate::db::models::SensorSnapshot;
use crate::schema;

/// Fixed look-back horizon for the risk view.
pub const RISK_WINDOW_HOURS: i64 = 1;

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct PipeRisk {
    pub pipe_id: i64,
    pub pipe_name: String,
    pub zone_id: i64,
    pub zone_name: String,
    pub leak_probability: f64,
}

pub fn current_pipe_risk(conn: &mut SqliteConnection) -> Result<Vec<PipeRisk>, String> {
    use schema::pipes::dsl as P;
    use schema::sensor_snapshots::dsl as SS;
    use schema::zones::dsl as Z;

    let cutoff = Utc::now() - Duration::hours(RISK_WINDOW_HOURS);
    let recent: Vec<SensorSnapshot> = SS::sensor_snapshots
        .filter(SS::timestamp.ge(cutoff))
        .load(conn)
        .map_err(|e| format!("loading recent snapshots failed: {}", e))?;

    // pipe id -> snapshot with the latest timestamp in the window
    let mut latest_by_pipe: BTreeMap<i64, SensorSnapshot> = BTreeMap::new();
    for snapshot in recent {
        match latest_by_pipe.get(&snapshot.pipe_id) {
            Some(existing) if existing.timestamp >= snapshot.timestamp => {}
            _ => {
                latest_by_pipe.insert(snapshot.pipe_id, snapshot);
            }
        }
    }

    let mut result = Vec::with_capacity(latest_by_pipe.len());
    for (pipe_id, snapshot) in latest_by_pipe {
        let (pipe_name, zone_id): (String, i64) = P::pipes
            .filter(P::id.eq(pipe_id))
            .select((P::name, P::zone_id))
            .first(conn)
            .map_err(|e| format!("loading pipe {} failed: {}", pipe_id, e))?;
        let zone_name: String = Z::zones
            .filter(Z::id.eq(zone_id))
            .select(Z::name)
            .first(conn)
            .map_err(|e| format!("loading zone {} failed: {}", zone_id, e))?;
        result.push(PipeRisk {
            pipe_id,
            pipe_name,
            zone_id,
            zone_name,
            leak_probability: snapshot.leak_probability,
        });
    }
    Ok(result)
}
