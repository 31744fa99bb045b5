use std::collections::{HashMap, HashSet};

use shiftline_core::{
    DirectoryEntry, EmployeeId, EmployeeShiftSet, MyIdentity, MySchedule, RequestState,
    RosterRole, ShiftKey, ShiftRecord, TrackItem, AVAILABLE_DISPLAY_NAME,
};
use tracing::debug;

/// Combine the user's schedule, the cached team roster and the user's
/// identity into one roster where every shift key has exactly one owner.
///
/// Ownership precedence: a shift posted for pickup belongs to the synthetic
/// "available" set; otherwise the user's own schedule claims it; otherwise
/// the first teammate listing it keeps it. The user's own entry in the team
/// roster is always discarded in favour of `my_schedule`.
///
/// Output order: surviving teammates in input order, then the user, then
/// the "available" set when it has any postings. The function is pure.
pub fn merge_roster(
    my_schedule: &MySchedule,
    team_roster: &[EmployeeShiftSet],
    me: &MyIdentity,
) -> Vec<EmployeeShiftSet> {
    let available = available_set(my_schedule, &me.employee_id);
    let mut claimed: HashSet<ShiftKey> = available.keys().collect();

    let mine = EmployeeShiftSet::new(
        me.employee_id.clone(),
        me.name.display_name(),
        RosterRole::Me,
        my_schedule
            .shifts
            .iter()
            .filter(|s| !claimed.contains(&s.key()))
            .cloned(),
    );
    claimed.extend(mine.keys());

    let mut merged: Vec<EmployeeShiftSet> = Vec::with_capacity(team_roster.len() + 2);
    for teammate in team_roster {
        if teammate.employee_id == me.employee_id
            || teammate.employee_id == EmployeeId::available()
        {
            continue;
        }
        let kept: Vec<ShiftRecord> = teammate
            .shifts
            .iter()
            .filter(|s| !claimed.contains(&s.key()))
            .cloned()
            .collect();
        if kept.is_empty() {
            debug!(employee = %teammate.employee_id, "teammate has no unclaimed shifts; dropped");
            continue;
        }
        claimed.extend(kept.iter().map(ShiftRecord::key));
        // A teammate listed twice is folded into one entry.
        match merged
            .iter_mut()
            .find(|e| e.employee_id == teammate.employee_id)
        {
            Some(existing) => existing.union(kept),
            None => merged.push(EmployeeShiftSet::new(
                teammate.employee_id.clone(),
                teammate.display_name.clone(),
                RosterRole::Teammate,
                kept,
            )),
        }
    }

    merged.push(mine);
    if !available.is_empty() {
        merged.push(available);
    }
    merged
}

/// Postings currently open for pickup, one per shift key.
///
/// When a shift was posted more than once the most recent `requested_at`
/// wins; ties keep the first seen, and an unreadable timestamp never
/// replaces a readable one.
pub fn available_set(my_schedule: &MySchedule, me: &EmployeeId) -> EmployeeShiftSet {
    let mut picked: Vec<&TrackItem> = Vec::new();
    let mut index: HashMap<ShiftKey, usize> = HashMap::new();

    for item in my_schedule
        .track_items
        .iter()
        .filter(|i| i.is_actively_available())
    {
        let key = item.shift.key();
        match index.get(&key) {
            Some(&i) => {
                if supersedes(item, picked[i]) {
                    picked[i] = item;
                }
            }
            None => {
                index.insert(key, picked.len());
                picked.push(item);
            }
        }
    }

    let names = directory_names(&my_schedule.employee_directory);
    EmployeeShiftSet::new(
        EmployeeId::available(),
        AVAILABLE_DISPLAY_NAME,
        RosterRole::Available,
        picked.into_iter().map(|item| posting_record(item, &names, me)),
    )
}

fn supersedes(candidate: &TrackItem, current: &TrackItem) -> bool {
    match (candidate.requested_at(), current.requested_at()) {
        (Some(c), Some(k)) => c > k,
        (Some(_), None) => true,
        (None, _) => false,
    }
}

fn directory_names(directory: &[DirectoryEntry]) -> HashMap<&EmployeeId, String> {
    directory
        .iter()
        .map(|e| (&e.employee_id, e.display_name()))
        .filter(|(_, name)| !name.is_empty())
        .collect()
}

/// The posted shift annotated with the track item's posting metadata.
fn posting_record(
    item: &TrackItem,
    names: &HashMap<&EmployeeId, String>,
    me: &EmployeeId,
) -> ShiftRecord {
    let mut record = item.shift.clone();
    if item.requester_id.is_some() {
        record.requester_id = item.requester_id.clone();
    }
    if item.requested_at.is_some() {
        record.requested_at = item.requested_at.clone();
    }
    if item.manager_notes.is_some() {
        record.manager_notes = item.manager_notes.clone();
    }

    let pending = item
        .related_requests
        .iter()
        .filter(|r| r.state == RequestState::Pending);
    record.pending_pickup_requester_names = pending
        .clone()
        .filter_map(|r| r.requester_id.as_ref())
        .map(|id| names.get(id).cloned().unwrap_or_else(|| id.to_string()))
        .collect();
    record.my_pickup_request_id = pending
        .filter(|r| r.requester_id.as_ref() == Some(me))
        .map(|r| r.request_id.clone())
        .next();
    record
}
