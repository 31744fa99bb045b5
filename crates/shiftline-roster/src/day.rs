use chrono::{Duration, NaiveDate, NaiveDateTime};
use serde::Serialize;
use shiftline_core::time::start_of_day;
use shiftline_core::{
    EmployeeId, EmployeeShiftSet, ParseFailure, RosterRole, ShiftKey, ShiftRecord,
};
use tracing::warn;

/// A shift annotated for display.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnrichedShift {
    pub shift: ShiftRecord,
    pub owner_id: EmployeeId,
    pub owner_name: String,
    pub is_self: bool,
    pub is_available: bool,
    /// Where the shift is worked, e.g. "Barista · Café 1402".
    pub location: String,
}

impl EnrichedShift {
    pub fn new(shift: ShiftRecord, owner: &EmployeeShiftSet) -> Self {
        let location = location_of(&shift);
        Self {
            owner_id: owner.employee_id.clone(),
            owner_name: owner.display_name.clone(),
            is_self: owner.role == RosterRole::Me,
            is_available: owner.role == RosterRole::Available,
            location,
            shift,
        }
    }

    pub fn key(&self) -> ShiftKey {
        self.shift.key()
    }

    /// Grouping label of the timeline row this shift belongs to.
    pub fn category(&self) -> String {
        self.shift.station_label()
    }
}

fn location_of(shift: &ShiftRecord) -> String {
    let label = shift.station_label();
    match shift.cafe_number.trim() {
        "" => label,
        cafe => format!("{label} · Café {cafe}"),
    }
}

/// All shifts touching one calendar day, ready for layout.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DaySchedule {
    pub date: NaiveDate,
    /// Ordered by start time, then identity key.
    pub shifts: Vec<EnrichedShift>,
    /// Shifts left out because their times could not be read.
    pub skipped: Vec<ParseFailure>,
}

impl DaySchedule {
    pub fn is_empty(&self) -> bool {
        self.shifts.is_empty()
    }

    /// Midnight-to-midnight bounds of the day.
    pub fn bounds(&self) -> (NaiveDateTime, NaiveDateTime) {
        day_bounds(self.date)
    }
}

fn day_bounds(date: NaiveDate) -> (NaiveDateTime, NaiveDateTime) {
    let start = start_of_day(date);
    (start, start + Duration::days(1))
}

/// Collect every shift of the merged roster that overlaps `date`.
///
/// Overnight shifts appear on both days they touch. Zero-length shifts
/// count when they sit inside the day.
pub fn build_day_schedule(merged_roster: &[EmployeeShiftSet], date: NaiveDate) -> DaySchedule {
    let (day_start, day_end) = day_bounds(date);
    let mut rows: Vec<(NaiveDateTime, ShiftKey, EnrichedShift)> = Vec::new();
    let mut skipped = Vec::new();

    for owner in merged_roster {
        for shift in &owner.shifts {
            let (start, end) = match shift.interval() {
                Ok(iv) => iv,
                Err(failure) => {
                    warn!(%failure, owner = %owner.employee_id, "shift skipped from day schedule");
                    skipped.push(failure);
                    continue;
                }
            };
            let touches = start < day_end && (end > day_start || (end == start && start >= day_start));
            if touches {
                rows.push((start, shift.key(), EnrichedShift::new(shift.clone(), owner)));
            }
        }
    }

    rows.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.cmp(&b.1)));
    DaySchedule {
        date,
        shifts: rows.into_iter().map(|(_, _, s)| s).collect(),
        skipped,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shiftline_core::AVAILABLE_DISPLAY_NAME;

    fn record(id: &str, start: &str, end: &str) -> ShiftRecord {
        let mut r = ShiftRecord::new(Some(id), start, end, "BAR");
        r.cafe_number = "1402".into();
        r
    }

    fn roster() -> Vec<EmployeeShiftSet> {
        vec![
            EmployeeShiftSet::teammate(
                "T",
                "Tom",
                [
                    record("t1", "2024-03-04T10:00:00", "2024-03-04T14:00:00"),
                    record("t2", "2024-03-05T10:00:00", "2024-03-05T14:00:00"),
                    record("t3", "2024-03-03T22:00:00", "2024-03-04T02:00:00"),
                    record("bad", "2024-03-04Tnope", "2024-03-04T14:00:00"),
                ],
            ),
            EmployeeShiftSet::new(
                "ME".into(),
                "Mia",
                RosterRole::Me,
                [record("m1", "2024-03-04T08:00:00", "2024-03-04T12:00:00")],
            ),
            EmployeeShiftSet::new(
                EmployeeId::available(),
                AVAILABLE_DISPLAY_NAME,
                RosterRole::Available,
                [record("a1", "2024-03-04T10:00:00", "2024-03-04T12:00:00")],
            ),
        ]
    }

    #[test]
    fn collects_and_orders_one_day() {
        let day = build_day_schedule(&roster(), NaiveDate::from_ymd_opt(2024, 3, 4).unwrap());
        let ids: Vec<_> = day
            .shifts
            .iter()
            .map(|s| s.shift.shift_id.as_ref().unwrap().as_str())
            .collect();
        assert_eq!(ids, ["t3", "m1", "a1", "t1"]);
        assert_eq!(day.skipped.len(), 1);
    }

    #[test]
    fn classifies_owners() {
        let day = build_day_schedule(&roster(), NaiveDate::from_ymd_opt(2024, 3, 4).unwrap());
        let mine = day.shifts.iter().find(|s| s.is_self).unwrap();
        assert_eq!(mine.owner_name, "Mia");
        let open = day.shifts.iter().find(|s| s.is_available).unwrap();
        assert_eq!(open.owner_id, EmployeeId::available());
        assert_eq!(open.location, "Barista · Café 1402");
        assert_eq!(open.category(), "Barista");
    }

    #[test]
    fn empty_roster_gives_empty_day() {
        let day = build_day_schedule(&[], NaiveDate::from_ymd_opt(2024, 3, 4).unwrap());
        assert!(day.is_empty());
        assert!(day.skipped.is_empty());
    }
}
