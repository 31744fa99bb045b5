use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// A cached payload and the instant it was last refreshed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry<T> {
    pub payload: T,
    pub last_refreshed_at: DateTime<Utc>,
}

impl<T> CacheEntry<T> {
    /// Age of the entry at `now`. Negative if stamped in the future.
    pub fn age(&self, now: DateTime<Utc>) -> Duration {
        now.signed_duration_since(self.last_refreshed_at)
    }

    /// Stale once the age reaches `window`: an entry exactly `window` old is
    /// already stale.
    pub fn is_stale(&self, now: DateTime<Utc>, window: Duration) -> bool {
        self.age(now) >= window
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn staleness_boundary_is_inclusive() {
        let stamped = Utc::now();
        let entry = CacheEntry {
            payload: (),
            last_refreshed_at: stamped,
        };
        let window = Duration::minutes(5);
        assert!(entry.is_stale(stamped + Duration::minutes(5), window));
        assert!(!entry.is_stale(stamped + Duration::seconds(299), window));
        assert!(!entry.is_stale(stamped - Duration::minutes(1), window));
    }
}
