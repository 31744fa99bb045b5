use std::fmt;

use chrono::NaiveDateTime;
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{ParseFailure, ShiftlineError};
use crate::time;
use crate::workstation;

/// Employee id of the synthetic owner of shifts posted for pickup.
pub const AVAILABLE_EMPLOYEE_ID: &str = "AVAILABLE";
/// Display name of the synthetic "available" owner.
pub const AVAILABLE_DISPLAY_NAME: &str = "Available";

/// Ids arrive as JSON strings or numbers depending on the endpoint.
fn string_or_number<'de, D>(d: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Signed(i64),
        Unsigned(u64),
        Float(f64),
    }
    Ok(match Raw::deserialize(d)? {
        Raw::Text(s) => s,
        Raw::Signed(n) => n.to_string(),
        Raw::Unsigned(n) => n.to_string(),
        Raw::Float(n) => n.to_string(),
    })
}

fn opt_string_or_number<'de, D>(d: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    struct Wrap(#[serde(deserialize_with = "string_or_number")] String);
    Ok(Option::<Wrap>::deserialize(d)?.map(|w| w.0))
}

/// Associate identifier as issued by the schedule API.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct EmployeeId(pub String);

impl EmployeeId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Owner id of the "available for pickup" pseudo-employee.
    pub fn available() -> Self {
        Self(AVAILABLE_EMPLOYEE_ID.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl<'de> Deserialize<'de> for EmployeeId {
    fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        string_or_number(d).map(Self)
    }
}

impl fmt::Display for EmployeeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for EmployeeId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for EmployeeId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Shift identifier; numeric ids are normalised to their decimal text.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct ShiftId(pub String);

impl ShiftId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl<'de> Deserialize<'de> for ShiftId {
    fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        string_or_number(d).map(Self)
    }
}

impl From<&str> for ShiftId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl fmt::Display for ShiftId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identity of a shift for deduplication.
///
/// `Id` when the record carries a non-blank shift id, otherwise `Slot`
/// built from the start time and the raw workstation code.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ShiftKey {
    Id { id: String },
    Slot { start: String, station: String },
}

impl fmt::Display for ShiftKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShiftKey::Id { id } => write!(f, "id:{id}"),
            ShiftKey::Slot { start, station } => write!(f, "slot:{start}@{station}"),
        }
    }
}

/// A single scheduled work interval as received from the API.
///
/// Times stay in their wire form; [`ShiftRecord::interval`] parses them on
/// demand so a bad timestamp only affects the stage that needs it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShiftRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shift_id: Option<ShiftId>,
    pub start_time: String,
    pub end_time: String,
    #[serde(default)]
    pub workstation_code: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workstation_name: Option<String>,
    #[serde(default, deserialize_with = "string_or_number")]
    pub cafe_number: String,
    #[serde(default, deserialize_with = "string_or_number")]
    pub company_code: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner_employee_id: Option<EmployeeId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requester_id: Option<EmployeeId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requested_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub manager_notes: Option<String>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "opt_string_or_number"
    )]
    pub my_pickup_request_id: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub pending_pickup_requester_names: Vec<String>,
}

impl ShiftRecord {
    /// Bare record with the scheduling fields set and no posting metadata.
    pub fn new(
        shift_id: Option<&str>,
        start_time: impl Into<String>,
        end_time: impl Into<String>,
        workstation_code: impl Into<String>,
    ) -> Self {
        Self {
            shift_id: shift_id.map(ShiftId::from),
            start_time: start_time.into(),
            end_time: end_time.into(),
            workstation_code: workstation_code.into(),
            workstation_name: None,
            cafe_number: String::new(),
            company_code: String::new(),
            owner_employee_id: None,
            requester_id: None,
            requested_at: None,
            manager_notes: None,
            my_pickup_request_id: None,
            pending_pickup_requester_names: Vec::new(),
        }
    }

    /// The stable identity key. Every dedup site goes through here.
    ///
    /// The slot fallback canonicalises a parseable start time so the same
    /// instant written two ways still collides.
    pub fn key(&self) -> ShiftKey {
        if let Some(id) = self.shift_id.as_ref().map(|id| id.0.trim()) {
            if !id.is_empty() {
                return ShiftKey::Id { id: id.to_string() };
            }
        }
        let start = match time::parse_local(&self.start_time) {
            Some(dt) => time::canonical(dt),
            None => self.start_time.trim().to_string(),
        };
        ShiftKey::Slot {
            start,
            station: self.workstation_code.trim().to_string(),
        }
    }

    pub fn start(&self) -> Result<NaiveDateTime, ParseFailure> {
        time::parse_local(&self.start_time).ok_or_else(|| {
            ParseFailure::new(
                self.key(),
                "startTime",
                &self.start_time,
                "unrecognised timestamp",
            )
        })
    }

    pub fn end(&self) -> Result<NaiveDateTime, ParseFailure> {
        time::parse_local(&self.end_time).ok_or_else(|| {
            ParseFailure::new(
                self.key(),
                "endTime",
                &self.end_time,
                "unrecognised timestamp",
            )
        })
    }

    /// Parsed `(start, end)`; an end before the start is rejected.
    pub fn interval(&self) -> Result<(NaiveDateTime, NaiveDateTime), ParseFailure> {
        let start = self.start()?;
        let end = self.end()?;
        if end < start {
            return Err(ParseFailure::new(
                self.key(),
                "endTime",
                &self.end_time,
                "ends before it starts",
            ));
        }
        Ok((start, end))
    }

    /// Workstation label used for grouping and display.
    pub fn station_label(&self) -> String {
        workstation::resolve_label(&self.workstation_code, self.workstation_name.as_deref())
    }
}

/// Which kind of owner an [`EmployeeShiftSet`] represents in a merged roster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum RosterRole {
    #[default]
    Teammate,
    Me,
    Available,
}

/// Every known shift of one associate, unique by identity key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmployeeShiftSet {
    pub employee_id: EmployeeId,
    pub display_name: String,
    #[serde(default)]
    pub role: RosterRole,
    #[serde(default)]
    pub shifts: Vec<ShiftRecord>,
}

impl EmployeeShiftSet {
    /// Build a set, collapsing duplicate keys (the later record wins).
    pub fn new(
        employee_id: EmployeeId,
        display_name: impl Into<String>,
        role: RosterRole,
        shifts: impl IntoIterator<Item = ShiftRecord>,
    ) -> Self {
        let mut set = Self {
            employee_id,
            display_name: display_name.into(),
            role,
            shifts: Vec::new(),
        };
        set.union(shifts);
        set
    }

    pub fn teammate(
        employee_id: impl Into<EmployeeId>,
        display_name: impl Into<String>,
        shifts: impl IntoIterator<Item = ShiftRecord>,
    ) -> Self {
        Self::new(employee_id.into(), display_name, RosterRole::Teammate, shifts)
    }

    /// Insert a record, replacing any record with the same key in place.
    pub fn upsert(&mut self, record: ShiftRecord) {
        let key = record.key();
        match self.shifts.iter_mut().find(|s| s.key() == key) {
            Some(slot) => *slot = record,
            None => self.shifts.push(record),
        }
    }

    /// Union with `incoming`; incoming records replace same-key records.
    pub fn union(&mut self, incoming: impl IntoIterator<Item = ShiftRecord>) {
        for record in incoming {
            self.upsert(record);
        }
    }

    pub fn contains_key(&self, key: &ShiftKey) -> bool {
        self.shifts.iter().any(|s| &s.key() == key)
    }

    pub fn keys(&self) -> impl Iterator<Item = ShiftKey> + '_ {
        self.shifts.iter().map(ShiftRecord::key)
    }

    pub fn is_empty(&self) -> bool {
        self.shifts.is_empty()
    }

    pub fn len(&self) -> usize {
        self.shifts.len()
    }
}

/// First/last/preferred name parts of an associate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct EmployeeName {
    #[serde(default)]
    pub first: String,
    #[serde(default)]
    pub last: String,
    #[serde(default)]
    pub preferred: Option<String>,
}

impl EmployeeName {
    pub fn new(first: impl Into<String>, last: impl Into<String>) -> Self {
        Self {
            first: first.into(),
            last: last.into(),
            preferred: None,
        }
    }

    pub fn with_preferred(mut self, preferred: impl Into<String>) -> Self {
        self.preferred = Some(preferred.into());
        self
    }

    /// Preferred name when set, else "first last".
    pub fn display_name(&self) -> String {
        if let Some(p) = self.preferred.as_deref().map(str::trim) {
            if !p.is_empty() {
                return p.to_string();
            }
        }
        join_name(&self.first, &self.last)
    }
}

fn join_name(first: &str, last: &str) -> String {
    [first.trim(), last.trim()]
        .into_iter()
        .filter(|p| !p.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// The authenticated associate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MyIdentity {
    pub employee_id: EmployeeId,
    pub name: EmployeeName,
}

impl MyIdentity {
    pub fn new(employee_id: impl Into<EmployeeId>, name: EmployeeName) -> Self {
        Self {
            employee_id: employee_id.into(),
            name,
        }
    }
}

/// One row of the employee directory sent with the user's schedule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectoryEntry {
    pub employee_id: EmployeeId,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
}

impl DirectoryEntry {
    pub fn display_name(&self) -> String {
        join_name(&self.first_name, &self.last_name)
    }
}

/// Shift-exchange classification of a track item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TrackType {
    Available,
    Pickup,
    Swap,
    #[serde(other)]
    Unknown,
}

/// State of a shift-exchange request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RequestState {
    Available,
    Pending,
    Approved,
    Denied,
    Cancelled,
    #[serde(other)]
    Unknown,
}

/// A pickup request attached to a posting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelatedRequest {
    #[serde(deserialize_with = "string_or_number")]
    pub request_id: String,
    #[serde(default)]
    pub requester_id: Option<EmployeeId>,
    pub state: RequestState,
}

/// State of one shift exchange (posting, pickup request, approval).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackItem {
    #[serde(rename = "type")]
    pub track_type: TrackType,
    pub shift: ShiftRecord,
    pub request_state: RequestState,
    #[serde(default)]
    pub requested_at: Option<String>,
    #[serde(default)]
    pub requester_id: Option<EmployeeId>,
    #[serde(default)]
    pub manager_notes: Option<String>,
    #[serde(default)]
    pub related_requests: Vec<RelatedRequest>,
}

impl TrackItem {
    /// Posted for pickup and not yet claimed by an approved request.
    pub fn is_actively_available(&self) -> bool {
        self.track_type == TrackType::Available
            && matches!(
                self.request_state,
                RequestState::Available | RequestState::Approved
            )
            && !self
                .related_requests
                .iter()
                .any(|r| r.state == RequestState::Approved)
    }

    /// Parsed `requested_at`, if present and readable.
    pub fn requested_at(&self) -> Option<NaiveDateTime> {
        self.requested_at.as_deref().and_then(time::parse_local)
    }
}

/// Payload of `fetch_my_schedule`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct MySchedule {
    #[serde(default)]
    pub shifts: Vec<ShiftRecord>,
    #[serde(default)]
    pub track_items: Vec<TrackItem>,
    #[serde(default)]
    pub employee_directory: Vec<DirectoryEntry>,
}

/// Kinds of payload held by the time-window cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CacheKind {
    /// The user's own schedule and track items.
    Schedule,
    /// Teammates' shifts, merged across fetch windows.
    TeamRoster,
    /// Postings available for pickup.
    Availability,
    /// Output of the roster merge.
    MergedRoster,
}

impl CacheKind {
    pub const ALL: [CacheKind; 4] = [
        CacheKind::Schedule,
        CacheKind::TeamRoster,
        CacheKind::Availability,
        CacheKind::MergedRoster,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CacheKind::Schedule => "schedule",
            CacheKind::TeamRoster => "team_roster",
            CacheKind::Availability => "availability",
            CacheKind::MergedRoster => "merged_roster",
        }
    }
}

impl fmt::Display for CacheKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for CacheKind {
    type Err = ShiftlineError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "schedule" => Ok(CacheKind::Schedule),
            "team_roster" => Ok(CacheKind::TeamRoster),
            "availability" => Ok(CacheKind::Availability),
            "merged_roster" => Ok(CacheKind::MergedRoster),
            other => Err(ShiftlineError::UnknownCacheKind(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_prefers_shift_id() {
        let s = ShiftRecord::new(Some("42"), "2024-03-04T09:00:00", "2024-03-04T17:00:00", "BAR");
        assert_eq!(s.key(), ShiftKey::Id { id: "42".into() });
    }

    #[test]
    fn key_falls_back_to_canonical_slot() {
        let a = ShiftRecord::new(None, "2024-03-04T09:00:00.000", "2024-03-04T17:00:00", "BAR");
        let b = ShiftRecord::new(Some("  "), "2024-03-04 09:00", "2024-03-04T12:00:00", "BAR");
        assert_eq!(a.key(), b.key());
        assert_eq!(
            a.key(),
            ShiftKey::Slot {
                start: "2024-03-04T09:00:00".into(),
                station: "BAR".into()
            }
        );
    }

    #[test]
    fn numeric_ids_deserialize_as_text() {
        let json = r#"{"shiftId":1234,"startTime":"2024-03-04T09:00:00","endTime":"2024-03-04T17:00:00",
                       "workstationCode":"BAR","cafeNumber":77,"ownerEmployeeId":900}"#;
        let s: ShiftRecord = serde_json::from_str(json).unwrap();
        assert_eq!(s.shift_id, Some(ShiftId::from("1234")));
        assert_eq!(s.cafe_number, "77");
        assert_eq!(s.owner_employee_id, Some(EmployeeId::from("900")));
    }

    #[test]
    fn interval_rejects_inverted_and_garbage() {
        let inverted = ShiftRecord::new(Some("1"), "2024-03-04T17:00:00", "2024-03-04T09:00:00", "BAR");
        let err = inverted.interval().unwrap_err();
        assert_eq!(err.field, "endTime");

        let garbage = ShiftRecord::new(Some("2"), "soon", "2024-03-04T09:00:00", "BAR");
        assert_eq!(garbage.interval().unwrap_err().field, "startTime");
    }

    #[test]
    fn upsert_replaces_in_place() {
        let mut set = EmployeeShiftSet::teammate(
            "7",
            "Sam",
            [
                ShiftRecord::new(Some("1"), "2024-03-04T09:00:00", "2024-03-04T12:00:00", "BAR"),
                ShiftRecord::new(Some("2"), "2024-03-05T09:00:00", "2024-03-05T12:00:00", "BAR"),
            ],
        );
        set.upsert(ShiftRecord::new(Some("1"), "2024-03-04T10:00:00", "2024-03-04T12:00:00", "KIT"));
        assert_eq!(set.len(), 2);
        assert_eq!(set.shifts[0].workstation_code, "KIT");
    }

    #[test]
    fn display_name_prefers_preferred() {
        let n = EmployeeName::new("Robert", "Lee").with_preferred("Bobby");
        assert_eq!(n.display_name(), "Bobby");
        assert_eq!(EmployeeName::new("Robert", "").display_name(), "Robert");
        assert_eq!(
            EmployeeName::new("Robert", "Lee").with_preferred(" ").display_name(),
            "Robert Lee"
        );
    }

    #[test]
    fn availability_classification() {
        let json = r#"{"type":"AVAILABLE","requestState":"APPROVED",
            "shift":{"shiftId":"9","startTime":"2024-03-04T09:00:00","endTime":"2024-03-04T12:00:00"},
            "relatedRequests":[{"requestId":5,"requesterId":"11","state":"PENDING"}]}"#;
        let mut item: TrackItem = serde_json::from_str(json).unwrap();
        assert!(item.is_actively_available());

        item.related_requests[0].state = RequestState::Approved;
        assert!(!item.is_actively_available());

        item.related_requests.clear();
        item.track_type = TrackType::Pickup;
        assert!(!item.is_actively_available());
    }

    #[test]
    fn unknown_enum_values_are_tolerated() {
        let json = r#"{"type":"GIVEAWAY","requestState":"ESCALATED",
            "shift":{"startTime":"2024-03-04T09:00:00","endTime":"2024-03-04T12:00:00"}}"#;
        let item: TrackItem = serde_json::from_str(json).unwrap();
        assert_eq!(item.track_type, TrackType::Unknown);
        assert_eq!(item.request_state, RequestState::Unknown);
        assert!(!item.is_actively_available());
    }

    #[test]
    fn cache_kind_round_trips_through_text() {
        for kind in CacheKind::ALL {
            assert_eq!(kind.as_str().parse::<CacheKind>().unwrap(), kind);
        }
        assert!("bogus".parse::<CacheKind>().is_err());
    }
}
