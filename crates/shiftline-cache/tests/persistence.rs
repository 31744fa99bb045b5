// The cache must survive process restarts and forget everything on logout.

use std::sync::Arc;

use chrono::{Duration, Utc};
use shiftline_cache::TimeWindowCache;
use shiftline_core::config::CacheConfig;
use shiftline_core::{CacheKind, EmployeeShiftSet, FixedClock, ShiftRecord};

fn roster() -> Vec<EmployeeShiftSet> {
    vec![EmployeeShiftSet::teammate(
        "T1",
        "Tess",
        [ShiftRecord::new(
            Some("100"),
            "2024-03-04T08:00:00",
            "2024-03-04T12:00:00",
            "BAR",
        )],
    )]
}

#[test]
fn entries_survive_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("cache.db");

    {
        let cache = TimeWindowCache::open(&path).unwrap();
        cache.merge_team_roster(roster()).unwrap();
    }

    let reopened = TimeWindowCache::open(&path).unwrap();
    let entry = reopened
        .get::<Vec<EmployeeShiftSet>>(CacheKind::TeamRoster)
        .expect("roster persisted");
    assert_eq!(entry.payload, roster());
}

#[test]
fn staleness_follows_config_window() {
    let dir = tempfile::tempdir().unwrap();
    let config = CacheConfig {
        path: dir.path().join("cache.db").to_string_lossy().into_owned(),
        stale_after_secs: 60,
    };
    let clock = Arc::new(FixedClock::new(Utc::now()));
    let cache = TimeWindowCache::from_config(&config)
        .unwrap()
        .with_clock(clock.clone());

    cache.put(CacheKind::Schedule, &roster()).unwrap();
    clock.advance(Duration::seconds(59));
    assert!(!cache.is_stale(CacheKind::Schedule));
    clock.advance(Duration::seconds(1));
    assert!(cache.is_stale(CacheKind::Schedule));
    assert_eq!(cache.age(CacheKind::Schedule), Some(Duration::seconds(60)));
}

#[test]
fn clear_on_logout_persists() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("cache.db");

    {
        let cache = TimeWindowCache::open(&path).unwrap();
        for kind in CacheKind::ALL {
            cache.put(kind, &roster()).unwrap();
        }
        cache.clear().unwrap();
    }

    let reopened = TimeWindowCache::open(&path).unwrap();
    for kind in CacheKind::ALL {
        assert!(reopened.get::<Vec<EmployeeShiftSet>>(kind).is_none());
        assert!(reopened.is_stale(kind));
    }
}
