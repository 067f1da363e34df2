//! Append-only audit log, mirrored to the process logger.

use chrono::Utc;
use diesel::prelude::*;
use diesel::SqliteConnection;
use log::{error, info, warn};

use crate::db::models::{log_levels, NewLogEntry};
use crate::schema;

fn append(
    conn: &mut SqliteConnection,
    level: &str,
    message: &str,
    context: Option<&str>,
) -> Result<(), String> {
    use schema::log_entries::dsl as L;

    diesel::insert_into(L::log_entries)
        .values(&NewLogEntry {
            timestamp: Utc::now(),
            level: level.to_string(),
            message: message.to_string(),
            context: context.map(|c| c.to_string()),
        })
        .execute(conn)
        .map_err(|e| format!("appending audit entry failed: {}", e))?;
    Ok(())
}

pub fn log_info(conn: &mut SqliteConnection, message: &str) -> Result<(), String> {
    info!("[audit] {}", message);
    append(conn, log_levels::INFO, message, None)
}

pub fn log_warning(conn: &mut SqliteConnection, message: &str) -> Result<(), String> {
    warn!("[audit] {}", message);
    append(conn, log_levels::WARNING, message, None)
}

pub fn log_error(conn: &mut SqliteConnection, message: &str, context: Option<&str>) -> Result<(), String> {
    error!("[audit] {}", message);
    append(conn, log_levels::ERROR, message, context)
}
