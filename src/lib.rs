pub mod models {
    pub mod payload;
}

pub mod client;
pub mod config;
pub mod db {
    pub mod models;
}
pub mod schema;
pub mod utils;
pub mod services {
    pub mod audit;
    pub mod features;
    pub mod model;
    pub mod pipeline;
    pub mod polling;
    pub mod reconcile;
    pub mod retention;
    pub mod risk;
    pub mod schedule;
    pub mod settings;
    pub mod synthetic;
}

use crate::client::{IotClient, TelemetrySource};
use crate::config::{Config, TelemetrySourceKind};
use crate::services::model::LeakModelService;
use crate::services::{polling, synthetic::SyntheticIotClient};
use diesel::connection::SimpleConnection;
use diesel::prelude::*;
use diesel::SqliteConnection;
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use log::info;

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

/// Open the SQLite database with foreign keys enforced. Cascading deletes
/// from zones down to snapshots rely on the pragma.
pub fn establish_connection(database_url: &str) -> Result<SqliteConnection, String> {
    let mut conn =
        SqliteConnection::establish(database_url).map_err(|e| format!("DB connection failed: {}", e))?;
    conn.batch_execute("PRAGMA foreign_keys = ON; PRAGMA busy_timeout = 5000;")
        .map_err(|e| format!("DB pragma setup failed: {}", e))?;
    Ok(conn)
}

pub fn apply_database_migrations(conn: &mut SqliteConnection) -> Result<(), String> {
    match conn.run_pending_migrations(MIGRATIONS) {
        Ok(applied) => {
            if applied.is_empty() {
                info!("Database schema is up to date; no migrations were applied");
            } else {
                let names = applied.iter().map(|v| v.to_string()).collect::<Vec<_>>().join(", ");
                info!("Applied {} database migration(s): {}", applied.len(), names);
            }
            Ok(())
        }
        Err(e) => Err(format!("Applying database migrations failed: {}", e)),
    }
}

pub fn run() -> Result<(), String> {
    // 1) Load config
    let cfg = Config::from_env()?;
    info!(
        "Config loaded (db={}, source={:?}, model={}, training_data={})",
        cfg.database_url, cfg.telemetry_source, cfg.model_path, cfg.training_data_path
    );

    // 2) Connect DB and apply pending migrations
    let mut conn = establish_connection(&cfg.database_url)?;
    info!("Connected to database");
    apply_database_migrations(&mut conn)?;

    // 3) Classifier adapter; the model loads (or trains) lazily on first use
    let model = LeakModelService::new(&cfg.model_path, &cfg.training_data_path);

    // 4) Telemetry source
    let mut source: Box<dyn TelemetrySource> = match cfg.telemetry_source {
        TelemetrySourceKind::Http => {
            info!("Polling IoT backend at {}{}", cfg.iot_base_url, cfg.iot_readings_endpoint);
            Box::new(IotClient::new(
                &cfg.iot_base_url,
                &cfg.iot_readings_endpoint,
                cfg.data_points_per_sensor,
            ))
        }
        TelemetrySourceKind::Synthetic => {
            info!("Using synthetic telemetry source");
            Box::new(SyntheticIotClient::new(0x4c45_414b, cfg.data_points_per_sensor))
        }
    };

    // 5) Ingestion loop
    polling::run_loop(&mut conn, source.as_mut(), &model)
}
