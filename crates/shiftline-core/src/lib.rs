//! `shiftline-core`: shared vocabulary of the shift schedule engine.
//!
//! Shift records and their identity keys, local-naive time helpers, the
//! workstation label table, push events, configuration and errors.

pub mod clock;
pub mod config;
pub mod error;
pub mod events;
pub mod time;
pub mod types;
pub mod workstation;

pub use clock::{Clock, FixedClock, SystemClock};
pub use config::ShiftlineConfig;
pub use error::{ParseFailure, Result, ShiftlineError};
pub use events::PushEvent;
pub use types::*;
