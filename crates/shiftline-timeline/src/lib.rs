//! `shiftline-timeline`: lays a day's shifts out as a horizontal chart.
//!
//! Shifts are grouped by workstation label, each group packed into the
//! fewest lanes that keep overlapping shifts apart, and every bar mapped to
//! pixels. Pure and synchronous.

pub mod lanes;
pub mod layout;
pub mod window;

pub use lanes::pack_lanes;
pub use layout::{
    layout_day, layout_shifts, Bar, Focus, Group, HourMark, Lane, LayoutOptions, TimelineLayout,
};
pub use window::TimeWindow;
