use chrono::NaiveDate;
use shiftline_core::time::start_of_day;
use shiftline_core::{EmployeeShiftSet, MySchedule, ParseFailure, ShiftRecord, TrackItem};
use tracing::warn;

/// Items that survived a filter plus the records it could not read.
#[derive(Debug, Clone, PartialEq)]
pub struct Filtered<T> {
    pub kept: Vec<T>,
    pub failures: Vec<ParseFailure>,
}

/// Drop shifts that ended before `today` began.
///
/// A shift ending during today (even one already finished) is kept. Shifts
/// with an unreadable end time are dropped and reported.
pub fn drop_expired_shifts(shifts: Vec<ShiftRecord>, today: NaiveDate) -> Filtered<ShiftRecord> {
    retain_current(shifts, today, |s| s)
}

/// Same rule as [`drop_expired_shifts`], judged by each item's shift.
pub fn drop_expired_track_items(items: Vec<TrackItem>, today: NaiveDate) -> Filtered<TrackItem> {
    retain_current(items, today, |i| &i.shift)
}

/// Apply the expiry rule to a fetched schedule's shifts and track items.
pub fn prune_schedule(schedule: MySchedule, today: NaiveDate) -> (MySchedule, Vec<ParseFailure>) {
    let shifts = drop_expired_shifts(schedule.shifts, today);
    let items = drop_expired_track_items(schedule.track_items, today);
    let mut failures = shifts.failures;
    failures.extend(items.failures);
    (
        MySchedule {
            shifts: shifts.kept,
            track_items: items.kept,
            employee_directory: schedule.employee_directory,
        },
        failures,
    )
}

/// Apply the expiry rule to every teammate in a cached roster. Teammates
/// left with no current shifts are dropped.
pub fn prune_roster(
    roster: Vec<EmployeeShiftSet>,
    today: NaiveDate,
) -> (Vec<EmployeeShiftSet>, Vec<ParseFailure>) {
    let mut failures = Vec::new();
    let mut kept = Vec::with_capacity(roster.len());
    for mut set in roster {
        let shifts = drop_expired_shifts(std::mem::take(&mut set.shifts), today);
        failures.extend(shifts.failures);
        if !shifts.kept.is_empty() {
            set.shifts = shifts.kept;
            kept.push(set);
        }
    }
    (kept, failures)
}

fn retain_current<T>(
    items: Vec<T>,
    today: NaiveDate,
    shift_of: impl Fn(&T) -> &ShiftRecord,
) -> Filtered<T> {
    let horizon = start_of_day(today);
    let mut kept = Vec::with_capacity(items.len());
    let mut failures = Vec::new();
    for item in items {
        match shift_of(&item).end() {
            Ok(end) if end < horizon => {}
            Ok(_) => kept.push(item),
            Err(failure) => {
                warn!(%failure, "dropping shift with unreadable end time");
                failures.push(failure);
            }
        }
    }
    Filtered { kept, failures }
}
