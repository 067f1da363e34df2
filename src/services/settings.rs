//! Singleton settings row, created lazily on first read.

use diesel::prelude::*;
use diesel::SqliteConnection;

use crate::db::models::{NewSetting, Setting};
use crate::schema;

pub const DEFAULT_POLL_INTERVAL_MINUTES: i32 = 5;
const MIN_POLL_INTERVAL_MINUTES: i32 = 1;
const MAX_POLL_INTERVAL_MINUTES: i32 = 60;

/// Read the poll interval, creating the default row on first access. The
/// returned value is always within [1, 60].
pub fn poll_interval_minutes(conn: &mut SqliteConnection) -> Result<i32, String> {
    use schema::settings::dsl as S;

    let existing: Option<Setting> = S::settings
        .order(S::id.asc())
        .first(conn)
        .optional()
        .map_err(|e| format!("reading settings failed: {}", e))?;

    let minutes = match existing {
        Some(setting) => setting.poll_interval_minutes,
        None => {
            diesel::insert_into(S::settings)
                .values(&NewSetting {
                    poll_interval_minutes: DEFAULT_POLL_INTERVAL_MINUTES,
                })
                .execute(conn)
                .map_err(|e| format!("creating default settings failed: {}", e))?;
            DEFAULT_POLL_INTERVAL_MINUTES
        }
    };

    Ok(minutes.clamp(MIN_POLL_INTERVAL_MINUTES, MAX_POLL_INTERVAL_MINUTES))
}

/// Update the poll interval, clamped to [1, 60]. Creates the row when absent.
pub fn update_poll_interval_minutes(conn: &mut SqliteConnection, minutes: i32) -> Result<(), String> {
    use schema::settings::dsl as S;

    let minutes = minutes.clamp(MIN_POLL_INTERVAL_MINUTES, MAX_POLL_INTERVAL_MINUTES);

    let existing: Option<Setting> = S::settings
        .order(S::id.asc())
        .first(conn)
        .optional()
        .map_err(|e| format!("reading settings failed: {}", e))?;

    match existing {
        Some(setting) => {
            diesel::update(S::settings.filter(S::id.eq(setting.id)))
                .set(S::poll_interval_minutes.eq(minutes))
                .execute(conn)
                .map_err(|e| format!("updating settings failed: {}", e))?;
        }
        None => {
            diesel::insert_into(S::settings)
                .values(&NewSetting {
                    poll_interval_minutes: minutes,
                })
                .execute(conn)
                .map_err(|e| format!("creating settings failed: {}", e))?;
        }
    }
    Ok(())
}
