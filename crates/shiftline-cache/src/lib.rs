//! `shiftline-cache`: time-windowed payload cache with SQLite persistence.
//!
//! Each [`CacheKind`](shiftline_core::CacheKind) maps to one row holding a
//! JSON blob and its refresh stamp. Entries go stale after a shared window
//! (5 minutes by default); the team roster supports incremental merges so
//! paginated date windows accumulate instead of overwriting each other.

pub mod cache;
pub mod db;
pub mod error;
pub mod types;

pub use cache::TimeWindowCache;
pub use error::{CacheError, Result};
pub use types::CacheEntry;
