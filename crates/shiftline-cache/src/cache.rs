use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Duration, Utc};
use rusqlite::{Connection, TransactionBehavior};
use serde::de::{DeserializeOwned, IgnoredAny};
use serde::Serialize;
use shiftline_core::config::{CacheConfig, STALE_AFTER_SECS};
use shiftline_core::{CacheKind, Clock, EmployeeShiftSet, SystemClock};
use tracing::{debug, info, instrument, warn};

use crate::db::init_db;
use crate::error::Result;
use crate::types::CacheEntry;

/// Persistent store of fetched payloads, one entry per [`CacheKind`].
///
/// Wraps a single SQLite connection in a `Mutex`. Reads never fail: a
/// missing, corrupt or undecodable entry reads back as `None`, which callers
/// treat as "stale, refresh now".
pub struct TimeWindowCache {
    db: Mutex<Connection>,
    clock: Arc<dyn Clock>,
    stale_after: Duration,
}

impl TimeWindowCache {
    /// Wrap an open connection, creating the schema if needed.
    pub fn new(conn: Connection) -> Result<Self> {
        init_db(&conn)?;
        Ok(Self {
            db: Mutex::new(conn),
            clock: Arc::new(SystemClock),
            stale_after: Duration::seconds(STALE_AFTER_SECS),
        })
    }

    /// Open (or create) the cache database at `path`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        Self::new(Connection::open(path)?)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::new(Connection::open_in_memory()?)
    }

    /// Open the database named by `config` with its staleness window.
    pub fn from_config(config: &CacheConfig) -> Result<Self> {
        Ok(Self::open(&config.path)?.with_stale_after(config.stale_after()))
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_stale_after(mut self, window: Duration) -> Self {
        self.stale_after = window;
        self
    }

    pub fn stale_after(&self) -> Duration {
        self.stale_after
    }

    /// Read the entry for `kind`, or `None` if absent or unreadable.
    #[instrument(skip(self), fields(kind = %kind))]
    pub fn get<T: DeserializeOwned>(&self, kind: CacheKind) -> Option<CacheEntry<T>> {
        let db = self.conn();
        read_entry(&db, kind)
    }

    /// Overwrite the payload for `kind` and stamp it with the current time.
    #[instrument(skip(self, payload), fields(kind = %kind))]
    pub fn put<T: Serialize>(&self, kind: CacheKind, payload: &T) -> Result<DateTime<Utc>> {
        let now = self.clock.now();
        let db = self.conn();
        write_entry(&db, kind, payload, now)?;
        debug!("cache entry written");
        Ok(now)
    }

    /// Instant the entry for `kind` was last refreshed, if it is readable.
    pub fn last_refreshed_at(&self, kind: CacheKind) -> Option<DateTime<Utc>> {
        let db = self.conn();
        let row = db.query_row(
            "SELECT payload, refreshed_at FROM cache_entries WHERE kind = ?1",
            [kind.as_str()],
            |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)),
        );
        let (payload, stamp) = match row {
            Ok(r) => r,
            Err(rusqlite::Error::QueryReturnedNoRows) => return None,
            Err(e) => {
                warn!(kind = %kind, "cache stamp unreadable: {e}");
                return None;
            }
        };
        if serde_json::from_str::<IgnoredAny>(&payload).is_err() {
            warn!(kind = %kind, "cache payload is not valid JSON; treating as absent");
            return None;
        }
        parse_stamp(kind, &stamp)
    }

    /// Age of the entry for `kind` at the current time.
    pub fn age(&self, kind: CacheKind) -> Option<Duration> {
        let stamped = self.last_refreshed_at(kind)?;
        Some(self.clock.now().signed_duration_since(stamped))
    }

    /// The entry for `kind` if it decodes as `T` and is younger than the
    /// staleness window. A payload of the wrong shape counts as absent.
    pub fn fresh<T: DeserializeOwned>(&self, kind: CacheKind) -> Option<CacheEntry<T>> {
        let entry = self.get::<T>(kind)?;
        let age = self.clock.now().signed_duration_since(entry.last_refreshed_at);
        (age < self.stale_after).then_some(entry)
    }

    /// True when the entry is absent, unreadable, or at least the staleness
    /// window old.
    pub fn is_stale(&self, kind: CacheKind) -> bool {
        match self.age(kind) {
            Some(age) => age >= self.stale_after,
            None => true,
        }
    }

    /// Merge a team-roster page into the cached roster.
    ///
    /// Employees already cached get the union of their old and new shifts
    /// (a new record replaces an old one with the same identity key); new
    /// employees are appended. The read-modify-write runs inside a single
    /// immediate transaction. Returns the merged roster as persisted.
    #[instrument(skip(self, new_partial), fields(incoming = new_partial.len()))]
    pub fn merge_team_roster(
        &self,
        new_partial: Vec<EmployeeShiftSet>,
    ) -> Result<Vec<EmployeeShiftSet>> {
        self.write_team_roster(new_partial, true)
    }

    /// Start the team roster over from one page, discarding whatever was
    /// cached. Used for the first page of a full re-fetch.
    #[instrument(skip(self, first_page), fields(incoming = first_page.len()))]
    pub fn replace_team_roster(
        &self,
        first_page: Vec<EmployeeShiftSet>,
    ) -> Result<Vec<EmployeeShiftSet>> {
        self.write_team_roster(first_page, false)
    }

    fn write_team_roster(
        &self,
        new_partial: Vec<EmployeeShiftSet>,
        keep_existing: bool,
    ) -> Result<Vec<EmployeeShiftSet>> {
        let now = self.clock.now();
        let mut db = self.conn();
        let tx = db.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let mut roster: Vec<EmployeeShiftSet> = if keep_existing {
            read_entry(&tx, CacheKind::TeamRoster)
                .map(|e| e.payload)
                .unwrap_or_default()
        } else {
            Vec::new()
        };
        for incoming in new_partial {
            merge_employee(&mut roster, incoming);
        }

        write_entry(&tx, CacheKind::TeamRoster, &roster, now)?;
        tx.commit()?;
        debug!(employees = roster.len(), "team roster merged");
        Ok(roster)
    }

    /// Drop the entry for one kind so the next read refreshes it.
    pub fn invalidate(&self, kind: CacheKind) -> Result<()> {
        let db = self.conn();
        let n = db.execute("DELETE FROM cache_entries WHERE kind = ?1", [kind.as_str()])?;
        if n > 0 {
            debug!(kind = %kind, "cache entry invalidated");
        }
        Ok(())
    }

    /// Remove every entry (logout / credential revocation).
    pub fn clear(&self) -> Result<()> {
        let db = self.conn();
        let n = db.execute("DELETE FROM cache_entries", [])?;
        info!(removed = n, "cache cleared");
        Ok(())
    }

    fn conn(&self) -> MutexGuard<'_, Connection> {
        self.db.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn read_entry<T: DeserializeOwned>(conn: &Connection, kind: CacheKind) -> Option<CacheEntry<T>> {
    let row = conn.query_row(
        "SELECT payload, refreshed_at FROM cache_entries WHERE kind = ?1",
        [kind.as_str()],
        |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)),
    );
    let (payload, stamp) = match row {
        Ok(r) => r,
        Err(rusqlite::Error::QueryReturnedNoRows) => return None,
        Err(e) => {
            warn!(kind = %kind, "cache entry unreadable: {e}");
            return None;
        }
    };
    let payload = match serde_json::from_str(&payload) {
        Ok(p) => p,
        Err(e) => {
            warn!(kind = %kind, "cache payload undecodable; treating as absent: {e}");
            return None;
        }
    };
    Some(CacheEntry {
        payload,
        last_refreshed_at: parse_stamp(kind, &stamp)?,
    })
}

fn write_entry<T: Serialize>(
    conn: &Connection,
    kind: CacheKind,
    payload: &T,
    now: DateTime<Utc>,
) -> Result<()> {
    let json = serde_json::to_string(payload)?;
    conn.execute(
        "INSERT INTO cache_entries (kind, payload, refreshed_at)
         VALUES (?1, ?2, ?3)
         ON CONFLICT(kind) DO UPDATE
         SET payload = excluded.payload, refreshed_at = excluded.refreshed_at",
        rusqlite::params![kind.as_str(), json, now.to_rfc3339()],
    )?;
    Ok(())
}

fn parse_stamp(kind: CacheKind, stamp: &str) -> Option<DateTime<Utc>> {
    match DateTime::parse_from_rfc3339(stamp) {
        Ok(dt) => Some(dt.with_timezone(&Utc)),
        Err(e) => {
            warn!(kind = %kind, stamp, "cache stamp undecodable; treating as absent: {e}");
            None
        }
    }
}

fn merge_employee(roster: &mut Vec<EmployeeShiftSet>, incoming: EmployeeShiftSet) {
    match roster
        .iter_mut()
        .find(|e| e.employee_id == incoming.employee_id)
    {
        Some(existing) => {
            if !incoming.display_name.trim().is_empty() {
                existing.display_name = incoming.display_name;
            }
            existing.union(incoming.shifts);
        }
        None => roster.push(EmployeeShiftSet::new(
            incoming.employee_id,
            incoming.display_name,
            incoming.role,
            incoming.shifts,
        )),
    }
}
