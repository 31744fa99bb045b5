use chrono::{DateTime, Utc};
use serde::Serialize;
use shiftline_core::{EmployeeShiftSet, ParseFailure};

/// The merged roster as shown to the user.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RosterView {
    pub roster: Vec<EmployeeShiftSet>,
    /// Refresh time of the oldest source behind `roster`.
    pub as_of: Option<DateTime<Utc>>,
    /// Set when any source is past its staleness window or the last
    /// refresh failed.
    pub stale: bool,
    /// Records dropped while preparing the view.
    pub skipped: Vec<ParseFailure>,
}

impl RosterView {
    pub fn empty() -> Self {
        Self {
            roster: Vec::new(),
            as_of: None,
            stale: true,
            skipped: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.roster.iter().all(|e| e.is_empty())
    }
}

/// Where the signed-in employee works; the team roster is fetched per store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Store {
    pub cafe_number: String,
    pub company_code: String,
}
