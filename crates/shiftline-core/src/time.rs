//! Local-naive timestamp helpers.
//!
//! The schedule API sends wall-clock times without a reliable zone, so every
//! timestamp is handled as a `NaiveDateTime` in café-local time.

use chrono::{DateTime, Duration, DurationRound, NaiveDate, NaiveDateTime, NaiveTime};

/// Formats accepted for naive timestamps, tried in order.
/// `%.f` also matches an absent fractional part.
const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// Canonical text form used when a timestamp feeds an identity key.
pub const CANONICAL_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Parse a wire timestamp into local-naive time.
///
/// Offsets (`Z`, `+01:00`) are accepted and dropped: the wall-clock reading
/// is kept as-is.
pub fn parse_local(raw: &str) -> Option<NaiveDateTime> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }
    for fmt in NAIVE_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt);
        }
    }
    DateTime::parse_from_rfc3339(s).ok().map(|dt| dt.naive_local())
}

/// Render a timestamp in the canonical key form.
pub fn canonical(dt: NaiveDateTime) -> String {
    dt.format(CANONICAL_FORMAT).to_string()
}

/// Midnight at the start of `date`.
pub fn start_of_day(date: NaiveDate) -> NaiveDateTime {
    date.and_time(NaiveTime::MIN)
}

/// Round down to the whole hour.
pub fn floor_hour(dt: NaiveDateTime) -> NaiveDateTime {
    dt.duration_trunc(Duration::hours(1)).unwrap_or(dt)
}

/// Round up to the whole hour; whole hours are returned unchanged.
pub fn ceil_hour(dt: NaiveDateTime) -> NaiveDateTime {
    let floor = floor_hour(dt);
    if floor == dt {
        dt
    } else {
        floor + Duration::hours(1)
    }
}

/// Fractional minutes from `from` to `to` (negative when `to` is earlier).
pub fn minutes_between(from: NaiveDateTime, to: NaiveDateTime) -> f64 {
    (to - from).num_milliseconds() as f64 / 60_000.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 4)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    #[test]
    fn parses_common_wire_shapes() {
        let expected = at(9, 30);
        for raw in [
            "2024-03-04T09:30:00",
            "2024-03-04T09:30:00.000",
            "2024-03-04 09:30:00",
            "2024-03-04T09:30",
            " 2024-03-04T09:30:00 ",
            "2024-03-04T09:30:00Z",
            "2024-03-04T09:30:00-05:00",
        ] {
            assert_eq!(parse_local(raw), Some(expected), "input {raw:?}");
        }
    }

    #[test]
    fn rejects_garbage() {
        assert_eq!(parse_local(""), None);
        assert_eq!(parse_local("tomorrow"), None);
        assert_eq!(parse_local("2024-13-40T09:00:00"), None);
    }

    #[test]
    fn hour_rounding() {
        assert_eq!(floor_hour(at(9, 59)), at(9, 0));
        assert_eq!(ceil_hour(at(9, 1)), at(10, 0));
        assert_eq!(ceil_hour(at(9, 0)), at(9, 0));
        assert_eq!(ceil_hour(at(23, 30)), at(23, 0) + Duration::hours(1));
    }

    #[test]
    fn fractional_minutes() {
        assert_eq!(minutes_between(at(9, 0), at(10, 30)), 90.0);
        assert_eq!(minutes_between(at(10, 0), at(9, 0)), -60.0);
        let half = at(9, 0) + Duration::seconds(30);
        assert_eq!(minutes_between(at(9, 0), half), 0.5);
    }
}
