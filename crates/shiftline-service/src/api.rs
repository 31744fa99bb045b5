use async_trait::async_trait;
use chrono::NaiveDateTime;
use shiftline_core::{EmployeeId, EmployeeName, EmployeeShiftSet, MySchedule};

use crate::error::Result;

/// Remote schedule endpoints, implemented by the networking layer.
///
/// `Ok(None)` means the server answered without data; transport or auth
/// failures come back as [`ServiceError::Upstream`](crate::ServiceError::Upstream).
#[async_trait]
pub trait ScheduleApi: Send + Sync {
    /// The signed-in employee's shifts, track items and directory for the
    /// next `days_forward` days.
    async fn fetch_my_schedule(&self, days_forward: u32) -> Result<Option<MySchedule>>;

    /// Teammates' shifts at one café between `start` and `end`.
    async fn fetch_team_roster(
        &self,
        cafe_number: &str,
        company_code: &str,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> Result<Option<Vec<EmployeeShiftSet>>>;
}

/// Who is signed in.
pub trait IdentityProvider: Send + Sync {
    fn current_employee_id(&self) -> Option<EmployeeId>;

    fn current_employee_name(&self) -> EmployeeName;
}
