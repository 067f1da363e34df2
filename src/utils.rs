use chrono::{DateTime, Utc};

/// Convert epoch seconds from the telemetry source into an absolute UTC
/// instant. Out-of-range values degrade to the epoch rather than failing the
/// cycle.
pub fn epoch_seconds_to_utc(secs: i64) -> DateTime<Utc> {
    DateTime::<Utc>::from_timestamp(secs, 0).unwrap_or(DateTime::<Utc>::UNIX_EPOCH)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn converts_epoch_seconds() {
        let ts = epoch_seconds_to_utc(1_700_000_000);
        assert_eq!(ts, Utc.with_ymd_and_hms(2023, 11, 14, 22, 13, 20).unwrap());
    }

    #[test]
    fn out_of_range_degrades_to_epoch() {
        assert_eq!(epoch_seconds_to_utc(i64::MAX), DateTime::<Utc>::UNIX_EPOCH);
    }
}
