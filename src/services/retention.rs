//! Bounded-window snapshot retention.
//!
//! Runs as its own commit after the snapshot batch: a crash between insert
//! and prune leaves extra history, never missing history.

use chrono::{Duration, Utc};
use diesel::prelude::*;
use diesel::SqliteConnection;
use log::debug;

use crate::schema;

/// Fixed retention horizon for snapshot history.
pub const RETENTION_HOURS: i64 = 24;

/// Delete every snapshot older than the retention window. Returns the number
/// of pruned rows.
pub fn prune_snapshots(conn: &mut SqliteConnection) -> Result<usize, String> {
    use schema::sensor_snapshots::dsl as SS;

    let cutoff = Utc::now() - Duration::hours(RETENTION_HOURS);
    let deleted = diesel::delete(SS::sensor_snapshots.filter(SS::timestamp.lt(cutoff)))
        .execute(conn)
        .map_err(|e| format!("pruning snapshots failed: {}", e))?;
    if deleted > 0 {
        debug!("Retention: pruned {} snapshot(s) older than {}", deleted, cutoff);
    }
    Ok(deleted)
}
