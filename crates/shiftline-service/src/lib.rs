//! `shiftline-service`: async orchestration over the schedule endpoints.
//!
//! Pulls the employee's schedule and the paged team roster through
//! [`ScheduleApi`], merges them into the [`TimeWindowCache`] and serves
//! the merged roster and day timelines. Remote failures fall back to the
//! last cached merge flagged as stale.
//!
//! [`TimeWindowCache`]: shiftline_cache::TimeWindowCache

pub mod api;
pub mod error;
pub mod service;
pub mod types;

pub use api::{IdentityProvider, ScheduleApi};
pub use error::{Result, ServiceError};
pub use service::ScheduleService;
pub use types::{RosterView, Store};
