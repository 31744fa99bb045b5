//! Push-notification events, decoded once at the boundary.
//!
//! Only the data each event carries is modelled here; rendering the
//! notification text belongs to the UI layer.

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::types::{CacheKind, EmployeeId, ShiftId};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PushEvent {
    /// A teammate posted one of their shifts for pickup.
    ShiftPosted {
        #[serde(rename = "shiftId")]
        shift_id: ShiftId,
        #[serde(default, rename = "startTime")]
        start_time: Option<String>,
    },
    /// Someone asked to pick up a posting (the user's, or one they watch).
    PickupRequested {
        #[serde(rename = "shiftId")]
        shift_id: ShiftId,
        #[serde(default, rename = "requesterId")]
        requester_id: Option<EmployeeId>,
    },
    /// A manager approved a pickup; ownership of the shift changed.
    PickupApproved {
        #[serde(rename = "shiftId")]
        shift_id: ShiftId,
    },
    PickupDenied {
        #[serde(rename = "shiftId")]
        shift_id: ShiftId,
    },
    /// The published schedule changed.
    ScheduleChanged {
        #[serde(default, rename = "weekOf")]
        week_of: Option<String>,
    },
    #[serde(other)]
    Unknown,
}

impl PushEvent {
    /// Decode a raw push payload.
    pub fn decode(payload: &str) -> Result<Self> {
        Ok(serde_json::from_str(payload)?)
    }

    /// Cache kinds whose contents this event makes out of date.
    pub fn stale_kinds(&self) -> &'static [CacheKind] {
        match self {
            PushEvent::ShiftPosted { .. } => &[
                CacheKind::Schedule,
                CacheKind::Availability,
                CacheKind::MergedRoster,
            ],
            PushEvent::PickupRequested { .. } | PushEvent::PickupDenied { .. } => {
                &[CacheKind::Schedule, CacheKind::Availability]
            }
            PushEvent::PickupApproved { .. } => &[
                CacheKind::Schedule,
                CacheKind::TeamRoster,
                CacheKind::Availability,
                CacheKind::MergedRoster,
            ],
            PushEvent::ScheduleChanged { .. } => &[
                CacheKind::Schedule,
                CacheKind::TeamRoster,
                CacheKind::MergedRoster,
            ],
            PushEvent::Unknown => &[],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_each_variant_with_only_its_fields() {
        let posted = PushEvent::decode(r#"{"event":"SHIFT_POSTED","shiftId":55,"startTime":"2024-03-04T09:00:00"}"#)
            .unwrap();
        assert_eq!(
            posted,
            PushEvent::ShiftPosted {
                shift_id: ShiftId::from("55"),
                start_time: Some("2024-03-04T09:00:00".into()),
            }
        );

        let approved = PushEvent::decode(r#"{"event":"PICKUP_APPROVED","shiftId":"55","body":"ignored"}"#)
            .unwrap();
        assert_eq!(approved.stale_kinds().len(), 4);
    }

    #[test]
    fn every_roster_event_refetches_the_schedule() {
        let payloads = [
            r#"{"event":"SHIFT_POSTED","shiftId":"7"}"#,
            r#"{"event":"PICKUP_REQUESTED","shiftId":"7"}"#,
            r#"{"event":"PICKUP_APPROVED","shiftId":"7"}"#,
            r#"{"event":"PICKUP_DENIED","shiftId":"7"}"#,
            r#"{"event":"SCHEDULE_CHANGED"}"#,
        ];
        for raw in payloads {
            let ev = PushEvent::decode(raw).unwrap();
            assert!(ev.stale_kinds().contains(&CacheKind::Schedule), "{raw}");
        }
    }

    #[test]
    fn unknown_events_do_not_fail() {
        let ev = PushEvent::decode(r#"{"event":"BIRTHDAY","name":"Sam"}"#).unwrap();
        assert_eq!(ev, PushEvent::Unknown);
        assert!(ev.stale_kinds().is_empty());
    }

    #[test]
    fn missing_required_field_is_an_error() {
        assert!(PushEvent::decode(r#"{"event":"PICKUP_DENIED"}"#).is_err());
    }
}
