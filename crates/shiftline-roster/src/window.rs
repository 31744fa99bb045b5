use chrono::{Duration, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use shiftline_core::time::start_of_day;

/// An inclusive range of calendar days requested from the roster endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DateWindow {
    pub first: NaiveDate,
    pub last: NaiveDate,
}

impl DateWindow {
    /// Start of the first day.
    pub fn start_time(&self) -> NaiveDateTime {
        start_of_day(self.first)
    }

    /// Midnight after the last day (exclusive end); saturates at the
    /// calendar's upper bound.
    pub fn end_time(&self) -> NaiveDateTime {
        start_of_day(self.last)
            .checked_add_signed(Duration::days(1))
            .unwrap_or(NaiveDateTime::MAX)
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.first <= date && date <= self.last
    }
}

/// Split `days` days starting at `start` into consecutive windows of at most
/// `window_days` days. A zero window size is treated as one day. Windows stop
/// at the last representable date.
pub fn roster_windows(start: NaiveDate, days: u32, window_days: u32) -> Vec<DateWindow> {
    let step = i64::from(window_days.max(1));
    let total = i64::from(days);
    let mut out = Vec::new();
    let mut offset = 0;
    while offset < total {
        let len = step.min(total - offset);
        let Some(first) = start.checked_add_signed(Duration::days(offset)) else {
            break;
        };
        match first.checked_add_signed(Duration::days(len - 1)) {
            Some(last) => out.push(DateWindow { first, last }),
            None => {
                out.push(DateWindow {
                    first,
                    last: NaiveDate::MAX,
                });
                break;
            }
        }
        offset += len;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, day).unwrap()
    }

    #[test]
    fn splits_horizon_into_pages() {
        let w = roster_windows(d(1), 16, 7);
        assert_eq!(
            w,
            vec![
                DateWindow { first: d(1), last: d(7) },
                DateWindow { first: d(8), last: d(14) },
                DateWindow { first: d(15), last: d(16) },
            ]
        );
        assert_eq!(w[2].end_time(), start_of_day(d(17)));
    }

    #[test]
    fn degenerate_inputs() {
        assert!(roster_windows(d(1), 0, 7).is_empty());
        assert_eq!(roster_windows(d(1), 2, 0).len(), 2);
    }

    #[test]
    fn huge_horizon_stops_at_calendar_end() {
        let w = roster_windows(d(1), u32::MAX, u32::MAX);
        assert_eq!(w, vec![DateWindow { first: d(1), last: NaiveDate::MAX }]);
        assert_eq!(w[0].end_time(), NaiveDateTime::MAX);

        let w = roster_windows(NaiveDate::MAX, 3, 1);
        assert_eq!(w, vec![DateWindow { first: NaiveDate::MAX, last: NaiveDate::MAX }]);
    }
}
