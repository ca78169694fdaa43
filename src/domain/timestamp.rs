//! Conversion between the Voice Memos epoch and the Unix epoch.
//!
//! The recordings database stores dates as floating-point seconds since
//! 2001-01-01 (Apple's reference date). The offset below is the exact value
//! the app uses, including its fractional part.

use std::fmt::Write;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use chrono::{DateTime, Local, Utc};
use serde::{Deserialize, Serialize};

/// Seconds between the Unix epoch and the Voice Memos epoch.
pub const APPLE_EPOCH_OFFSET: f64 = 978_307_200.825_232;

/// Converts a vendor-epoch timestamp to Unix seconds.
#[must_use]
pub fn to_unix_seconds(vendor: f64) -> f64 {
    vendor + APPLE_EPOCH_OFFSET
}

/// Converts Unix seconds to a vendor-epoch timestamp.
#[must_use]
pub fn from_unix_seconds(unix: f64) -> f64 {
    unix - APPLE_EPOCH_OFFSET
}

/// Converts a vendor-epoch timestamp to a UTC calendar time.
///
/// Returns `None` when the value falls outside chrono's representable range.
#[must_use]
pub fn to_datetime(vendor: f64) -> Option<DateTime<Utc>> {
    let unix = to_unix_seconds(vendor);
    if !unix.is_finite() {
        return None;
    }

    let secs = unix.floor();
    let nanos = (((unix - secs) * 1e9) as u32).min(999_999_999);
    DateTime::from_timestamp(secs as i64, nanos)
}

/// Converts a UTC calendar time to a vendor-epoch timestamp.
#[must_use]
pub fn from_datetime(dt: DateTime<Utc>) -> f64 {
    let unix = dt.timestamp() as f64 + f64::from(dt.timestamp_subsec_nanos()) / 1e9;
    from_unix_seconds(unix)
}

/// Converts a vendor-epoch timestamp to a `SystemTime` for file stamping.
#[must_use]
pub fn to_system_time(vendor: f64) -> Option<SystemTime> {
    let unix = to_unix_seconds(vendor);
    if !unix.is_finite() {
        return None;
    }

    if unix >= 0.0 {
        UNIX_EPOCH.checked_add(Duration::try_from_secs_f64(unix).ok()?)
    } else {
        UNIX_EPOCH.checked_sub(Duration::try_from_secs_f64(-unix).ok()?)
    }
}

/// Time zone used when rendering recording dates as text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DisplayZone {
    /// The machine's local time zone.
    #[default]
    Local,
    /// Coordinated Universal Time.
    Utc,
}

impl DisplayZone {
    /// Renders `dt` with a strftime-style format in this zone.
    ///
    /// Returns `None` if the format string contains invalid specifiers.
    #[must_use]
    pub fn format(self, dt: DateTime<Utc>, fmt: &str) -> Option<String> {
        let mut out = String::new();
        let written = match self {
            Self::Local => write!(out, "{}", dt.with_timezone(&Local).format(fmt)),
            Self::Utc => write!(out, "{}", dt.format(fmt)),
        };
        written.ok().map(|()| out)
    }
}

impl std::str::FromStr for DisplayZone {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "local" => Ok(Self::Local),
            "utc" => Ok(Self::Utc),
            _ => Err(format!("Unknown timezone: {s}. Use: local, utc")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_offset() {
        let unix = to_unix_seconds(700_000_000.0);
        assert!((unix - 1_678_307_200.825_232).abs() < 1e-6);
    }

    #[test]
    fn test_round_trip_within_one_second() {
        for unix in [0_i64, 978_307_200, 1_678_307_200, -86_400, 4_102_444_800] {
            let dt = DateTime::from_timestamp(unix, 0).unwrap();
            let back = to_datetime(from_datetime(dt)).unwrap();
            assert!((back.timestamp() - unix).abs() <= 1, "{unix} -> {back}");
        }
    }

    #[test]
    fn test_to_datetime_utc_calendar() {
        let dt = to_datetime(700_000_000.0).unwrap();
        assert_eq!(
            dt.format("%Y-%m-%d %H:%M:%S").to_string(),
            "2023-03-08 20:26:40"
        );
    }

    #[test]
    fn test_date_prefix_rolls_over_east_of_utc() {
        // 20:26:40 UTC is already the next day at UTC+9.
        let dt = to_datetime(700_000_000.0).unwrap();
        let tokyo = chrono::FixedOffset::east_opt(9 * 3600).unwrap();
        assert_eq!(
            dt.with_timezone(&tokyo).format("%Y-%m-%d_").to_string(),
            "2023-03-09_"
        );
    }

    #[test]
    fn test_out_of_range_is_none() {
        assert!(to_datetime(f64::MAX).is_none());
        assert!(to_datetime(f64::NAN).is_none());
        assert!(to_system_time(f64::INFINITY).is_none());
    }

    #[test]
    fn test_system_time_matches_unix_seconds() {
        let st = to_system_time(700_000_000.0).unwrap();
        let secs = st.duration_since(UNIX_EPOCH).unwrap().as_secs();
        assert_eq!(secs, 1_678_307_200);
    }

    #[test]
    fn test_invalid_format_is_none() {
        let dt = to_datetime(0.0).unwrap();
        assert!(DisplayZone::Utc.format(dt, "%Q").is_none());
        assert_eq!(
            DisplayZone::Utc.format(dt, "%Y-%m-%d_").as_deref(),
            Some("2001-01-01_")
        );
    }

    #[test]
    fn test_zone_from_str() {
        assert_eq!("UTC".parse::<DisplayZone>(), Ok(DisplayZone::Utc));
        assert_eq!("local".parse::<DisplayZone>(), Ok(DisplayZone::Local));
        assert!("mars".parse::<DisplayZone>().is_err());
    }
}
