//! `shiftline-roster`: reconciles the three shift sources into one roster.
//!
//! # Pipeline
//!
//! | Step                     | Function                  |
//! |--------------------------|---------------------------|
//! | Drop past shifts         | [`prune_schedule`]        |
//! | Merge sources            | [`merge_roster`]          |
//! | Pick one day for display | [`build_day_schedule`]    |
//! | Page roster requests     | [`roster_windows`]        |
//!
//! Everything here is pure: no I/O, no clock reads, no shared state.

pub mod day;
pub mod expire;
pub mod merge;
pub mod window;

pub use day::{build_day_schedule, DaySchedule, EnrichedShift};
pub use expire::{
    drop_expired_shifts, drop_expired_track_items, prune_roster, prune_schedule,
    Filtered,
};
pub use merge::{available_set, merge_roster};
pub use window::{roster_windows, DateWindow};
