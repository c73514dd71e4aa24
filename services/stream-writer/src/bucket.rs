//! Archive bucket timestamp computation.
//!
//! A bucket boundary is the start of the current hour, advanced by whole
//! multiples of `granularity` seconds: floor the time to the top of the
//! hour, then floor-divide the seconds elapsed since that hour by
//! `granularity` and add that many seconds back.

use chrono::{DateTime, Duration, Timelike, Utc};

/// Format used for archive filenames: `YYYYMMDDHHMMSS`.
pub const BUCKET_FORMAT: &str = "%Y%m%d%H%M%S";

/// Compute the bucket boundary for `now` at the given `granularity_secs`.
///
/// Panics if `granularity_secs` is zero.
pub fn bucket_start(now: DateTime<Utc>, granularity_secs: u32) -> DateTime<Utc> {
    assert!(granularity_secs > 0, "granularity must be positive");
    let hour_start = now
        .with_minute(0)
        .and_then(|d| d.with_second(0))
        .and_then(|d| d.with_nanosecond(0))
        .expect("zeroing minute/second/nanosecond always succeeds");
    let elapsed = (now - hour_start).num_seconds().max(0) as u32;
    let bucket_offset = (elapsed / granularity_secs) * granularity_secs;
    hour_start + Duration::seconds(bucket_offset as i64)
}

/// Render a bucket timestamp as the 14-digit string used in archive
/// filenames.
pub fn bucket_key(bucket: DateTime<Utc>) -> String {
    bucket.format(BUCKET_FORMAT).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn dt(h: u32, m: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2013, 1, 1, h, m, s).unwrap()
    }

    #[test]
    fn five_second_granularity() {
        let bucket = bucket_start(dt(12, 13, 48), 5);
        assert_eq!(bucket_key(bucket), "20130101121345");
    }

    #[test]
    fn five_minute_granularity() {
        let bucket = bucket_start(dt(12, 14, 2), 300);
        assert_eq!(bucket_key(bucket), "20130101121000");
    }

    #[test]
    fn one_hour_granularity() {
        let bucket = bucket_start(dt(12, 20, 0), 3600);
        assert_eq!(bucket_key(bucket), "20130101120000");
    }

    #[test]
    fn exact_boundary_is_stable() {
        let bucket = bucket_start(dt(12, 10, 0), 300);
        assert_eq!(bucket_key(bucket), "20130101121000");
    }
}
