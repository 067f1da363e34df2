//! Handwritten Diesel schema declarations used by model structs.
//!
//! Migrations define the actual tables and constraints. This module only
//! provides `diesel::table!` declarations so we can derive Insertable/Queryable
//! in a type-safe way without running `diesel print-schema`.
//!
//! Identity columns on `zones`/`pipes`/`sensors` are the external ids supplied
//! by the telemetry source; they are never generated locally. Snapshot and
//! log rows use SQLite rowids.

diesel::table! {
    zones (id) {
        id -> BigInt,
        name -> Text,
        status -> Text,
        created_at -> TimestamptzSqlite,
        updated_at -> TimestamptzSqlite,
    }
}

diesel::table! {
    pipes (id) {
        id -> BigInt,
        name -> Text,
        zone_id -> BigInt,
        previous_pipe_id -> Nullable<BigInt>,
        diameter -> Double,
        length -> Double,
        material -> Text,
        installation_date -> TimestamptzSqlite,
        expected_pressure_drop -> Double,
        created_at -> TimestamptzSqlite,
        updated_at -> TimestamptzSqlite,
    }
}

diesel::table! {
    sensors (id) {
        id -> BigInt,
        name -> Text,
        pipe_id -> BigInt,
        previous_sensor_id -> Nullable<BigInt>,
        location -> Text,
        distance_from_previous_sensor -> Double,
        elevation -> Double,
        is_water_tap -> Bool,
        expected_daily_usage -> Double,
        status -> Text,
        last_calibration_date -> TimestamptzSqlite,
        created_at -> TimestamptzSqlite,
        updated_at -> TimestamptzSqlite,
    }
}

// Append-only; rows are never updated after insertion.
diesel::table! {
    sensor_snapshots (id) {
        id -> BigInt,
        timestamp -> TimestamptzSqlite,
        sensor_id -> BigInt,
        pipe_id -> BigInt,
        zone_id -> BigInt,
        pressure_current -> Double,
        pressure_previous_sensor -> Double,
        flow_rate -> Double,
        water_usage_diff -> Double,
        pressure_drop_rate -> Double,
        hour -> Integer,
        minute -> Integer,
        day_of_week -> Integer,
        is_working_hours -> Bool,
        is_break_time -> Bool,
        break_type -> Text,
        expected_usage_multiplier -> Double,
        minutes_since_break_start -> Integer,
        occupancy_level -> Double,
        pressure_vs_baseline -> Double,
        flow_vs_baseline -> Double,
        leak_probability -> Double,
        is_leak_predicted -> Bool,
        leak_severity_predicted -> Integer,
        leak_type_predicted -> Text,
    }
}

// Singleton; exactly one row after first access.
diesel::table! {
    settings (id) {
        id -> BigInt,
        poll_interval_minutes -> Integer,
    }
}

diesel::table! {
    log_entries (id) {
        id -> BigInt,
        timestamp -> TimestamptzSqlite,
        level -> Text,
        message -> Text,
        context -> Nullable<Text>,
    }
}

diesel::joinable!(pipes -> zones (zone_id));
diesel::joinable!(sensors -> pipes (pipe_id));
diesel::joinable!(sensor_snapshots -> sensors (sensor_id));

diesel::allow_tables_to_appear_in_same_query!(
    zones,
    pipes,
    sensors,
    sensor_snapshots,
    settings,
    log_entries,
);
