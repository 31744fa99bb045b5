use chrono::{Duration, NaiveDateTime};
use serde::{Deserialize, Serialize};
use shiftline_core::time::{canonical, ceil_hour, floor_hour, minutes_between};
use shiftline_core::{Result, ShiftlineError};

/// The span of time a chart covers. `start < end` always holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeWindow {
    start: NaiveDateTime,
    end: NaiveDateTime,
}

impl TimeWindow {
    pub fn new(start: NaiveDateTime, end: NaiveDateTime) -> Result<Self> {
        if end <= start {
            return Err(ShiftlineError::InvalidWindow {
                start: canonical(start),
                end: canonical(end),
            });
        }
        Ok(Self { start, end })
    }

    /// Whole-hour window around `[earliest, latest]`, at least one hour long.
    pub fn around(earliest: NaiveDateTime, latest: NaiveDateTime) -> Self {
        let start = floor_hour(earliest);
        let end = ceil_hour(latest.max(earliest)).max(start + Duration::hours(1));
        Self { start, end }
    }

    pub fn start(&self) -> NaiveDateTime {
        self.start
    }

    pub fn end(&self) -> NaiveDateTime {
        self.end
    }

    pub fn total_minutes(&self) -> f64 {
        minutes_between(self.start, self.end)
    }

    /// Inclusive of both edges.
    pub fn contains(&self, t: NaiveDateTime) -> bool {
        self.start <= t && t <= self.end
    }

    pub fn strictly_contains(&self, t: NaiveDateTime) -> bool {
        self.start < t && t < self.end
    }

    pub fn clamp(&self, t: NaiveDateTime) -> NaiveDateTime {
        t.clamp(self.start, self.end)
    }

    /// Minutes from the window start, before any clamping.
    pub fn offset_minutes(&self, t: NaiveDateTime) -> f64 {
        minutes_between(self.start, t)
    }

    /// Whole hours inside the window, edges included.
    pub fn hours(&self) -> impl Iterator<Item = NaiveDateTime> + '_ {
        std::iter::successors(Some(ceil_hour(self.start)), |t| Some(*t + Duration::hours(1)))
            .take_while(move |t| *t <= self.end)
    }
}
