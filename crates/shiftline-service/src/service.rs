use std::collections::HashSet;
use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use shiftline_cache::TimeWindowCache;
use shiftline_core::{
    CacheKind, Clock, EmployeeShiftSet, MyIdentity, MySchedule, PushEvent, ShiftlineConfig,
    SystemClock,
};
use shiftline_roster::{
    available_set, build_day_schedule, merge_roster, prune_roster, prune_schedule,
};
use shiftline_roster::{roster_windows, DateWindow};
use shiftline_timeline::{layout_day, LayoutOptions, TimelineLayout};
use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};

use crate::api::{IdentityProvider, ScheduleApi};
use crate::error::{Result, ServiceError};
use crate::types::{RosterView, Store};

/// Per-session roster bookkeeping, guarded by the roster writer lock.
#[derive(Debug, Default)]
struct RosterSession {
    fetched: HashSet<DateWindow>,
}

/// Fetches, merges and caches schedule data for the signed-in employee.
///
/// Roster writes are serialized through one async lock so paginated merges
/// never interleave. The lock also owns the set of date windows fetched
/// this session, which is reset on logout.
pub struct ScheduleService {
    cache: Arc<TimeWindowCache>,
    api: Arc<dyn ScheduleApi>,
    identity: Arc<dyn IdentityProvider>,
    config: ShiftlineConfig,
    clock: Arc<dyn Clock>,
    roster_writer: Mutex<RosterSession>,
}

impl ScheduleService {
    pub fn new(
        cache: Arc<TimeWindowCache>,
        api: Arc<dyn ScheduleApi>,
        identity: Arc<dyn IdentityProvider>,
        config: ShiftlineConfig,
    ) -> Self {
        Self {
            cache,
            api,
            identity,
            config,
            clock: Arc::new(SystemClock),
            roster_writer: Mutex::new(RosterSession::default()),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn cache(&self) -> &TimeWindowCache {
        &self.cache
    }

    fn today(&self) -> NaiveDate {
        self.clock.local_now().date()
    }

    fn cached_schedule(&self) -> Option<MySchedule> {
        self.cache
            .get::<MySchedule>(CacheKind::Schedule)
            .map(|e| e.payload)
    }

    fn me(&self) -> Result<MyIdentity> {
        let id = self
            .identity
            .current_employee_id()
            .ok_or(ServiceError::NotSignedIn)?;
        Ok(MyIdentity::new(id, self.identity.current_employee_name()))
    }

    /// Refresh the employee's own schedule when it or the availability set
    /// is stale (or when `force`d).
    ///
    /// Past shifts and track items are dropped before caching; the open
    /// postings are cached separately as the availability set. A cached
    /// payload that no longer decodes counts as stale. Returns the schedule
    /// now in the cache, if any.
    #[instrument(skip(self))]
    pub async fn refresh_my_schedule(&self, force: bool) -> Result<Option<MySchedule>> {
        if !force {
            let schedule = self.cache.fresh::<MySchedule>(CacheKind::Schedule);
            let available = self.cache.fresh::<EmployeeShiftSet>(CacheKind::Availability);
            if let (Some(schedule), Some(_)) = (schedule, available) {
                debug!("schedule still fresh");
                return Ok(Some(schedule.payload));
            }
        }
        let me = self.me()?;

        let Some(fetched) = self
            .api
            .fetch_my_schedule(self.config.roster.days_forward)
            .await?
        else {
            warn!("schedule endpoint returned no data; keeping cached copy");
            return Ok(self.cached_schedule());
        };

        let (schedule, skipped) = prune_schedule(fetched, self.today());
        if !skipped.is_empty() {
            warn!(skipped = skipped.len(), "unreadable shifts dropped from schedule");
        }
        self.cache.put(CacheKind::Schedule, &schedule)?;
        let available = available_set(&schedule, &me.employee_id);
        self.cache.put(CacheKind::Availability, &available)?;
        info!(
            shifts = schedule.shifts.len(),
            postings = available.len(),
            "schedule refreshed"
        );
        Ok(Some(schedule))
    }

    /// Fetch the team roster for `store` one date window at a time and merge
    /// each page into the cache.
    ///
    /// Windows already fetched this session are skipped unless `force` is
    /// set or the cached roster went stale. In that case the first page
    /// replaces the cached roster, so shifts outside the current horizon do
    /// not pile up. A page that comes back empty is retried on the next
    /// refresh. Returns how many windows were merged.
    #[instrument(skip(self, store), fields(cafe = %store.cafe_number))]
    pub async fn refresh_team_roster(&self, store: &Store, force: bool) -> Result<usize> {
        let mut session = self.roster_writer.lock().await;
        let mut replace = force
            || self
                .cache
                .fresh::<Vec<EmployeeShiftSet>>(CacheKind::TeamRoster)
                .is_none();
        if replace {
            session.fetched.clear();
        }

        let windows = roster_windows(
            self.today(),
            self.config.roster.days_forward,
            self.config.roster.window_days,
        );
        let mut merged = 0;
        for window in windows {
            if session.fetched.contains(&window) {
                continue;
            }
            let page = self
                .api
                .fetch_team_roster(
                    &store.cafe_number,
                    &store.company_code,
                    window.start_time(),
                    window.end_time(),
                )
                .await?;
            match page {
                Some(partial) if replace => {
                    self.cache.replace_team_roster(partial)?;
                    replace = false;
                    session.fetched.insert(window);
                    merged += 1;
                }
                Some(partial) => {
                    self.cache.merge_team_roster(partial)?;
                    session.fetched.insert(window);
                    merged += 1;
                }
                None => warn!(first = %window.first, last = %window.last, "roster window returned no data"),
            }
        }
        debug!(merged, "team roster refresh done");
        Ok(merged)
    }

    /// Rebuild the merged roster from what is cached and store it. Shifts
    /// that ended before today are left out of every source.
    #[instrument(skip(self))]
    pub fn merged_roster(&self) -> Result<RosterView> {
        let me = self.me()?;
        let schedule_entry = self.cache.get::<MySchedule>(CacheKind::Schedule);
        let team_entry = self.cache.get::<Vec<EmployeeShiftSet>>(CacheKind::TeamRoster);

        let stamps: Vec<DateTime<Utc>> = [
            schedule_entry.as_ref().map(|e| e.last_refreshed_at),
            team_entry.as_ref().map(|e| e.last_refreshed_at),
        ]
        .into_iter()
        .flatten()
        .collect();
        let stale = self.cache.is_stale(CacheKind::Schedule)
            || self.cache.is_stale(CacheKind::TeamRoster);

        let (schedule, mut skipped) = prune_schedule(
            schedule_entry.map(|e| e.payload).unwrap_or_default(),
            self.today(),
        );
        let (team, team_skipped) =
            prune_roster(team_entry.map(|e| e.payload).unwrap_or_default(), self.today());
        skipped.extend(team_skipped);
        let roster = merge_roster(&schedule, &team, &me);
        self.cache.put(CacheKind::MergedRoster, &roster)?;

        Ok(RosterView {
            roster,
            as_of: stamps.into_iter().min(),
            stale,
            skipped,
        })
    }

    /// The last merged roster written, flagged stale.
    pub fn cached_view(&self) -> RosterView {
        match self.cache.get::<Vec<EmployeeShiftSet>>(CacheKind::MergedRoster) {
            Some(entry) => RosterView {
                roster: entry.payload,
                as_of: Some(entry.last_refreshed_at),
                stale: true,
                skipped: Vec::new(),
            },
            None => RosterView::empty(),
        }
    }

    /// Refresh everything that needs it and return the merged roster.
    ///
    /// Remote failures are logged and answered with the last cached merge
    /// instead of an error.
    pub async fn refresh(&self, force: bool) -> Result<RosterView> {
        match self.refresh_sources(force).await {
            Ok(()) => self.merged_roster(),
            Err(e) if e.is_upstream() => {
                warn!(error = %e, code = e.code(), "refresh failed; serving cached roster");
                Ok(self.cached_view())
            }
            Err(e) => Err(e),
        }
    }

    async fn refresh_sources(&self, force: bool) -> Result<()> {
        let schedule = self.refresh_my_schedule(force).await?;
        match schedule.as_ref().and_then(store_of) {
            Some(store) => {
                self.refresh_team_roster(&store, force).await?;
            }
            None => debug!("no store known yet; team roster not fetched"),
        }
        Ok(())
    }

    /// Timeline for one day of the merged roster, with the "now" marker
    /// taken from the service clock unless `options` sets one.
    pub fn day_layout(&self, date: NaiveDate, options: LayoutOptions) -> Result<TimelineLayout> {
        let view = self.merged_roster()?;
        let day = build_day_schedule(&view.roster, date);
        let options = match options.now {
            Some(_) => options,
            None => options.at(self.clock.local_now()),
        };
        Ok(layout_day(&day, &options))
    }

    /// Invalidate whatever an incoming push event makes stale.
    pub async fn handle_event(&self, event: &PushEvent) -> Result<()> {
        let kinds = event.stale_kinds();
        if kinds.is_empty() {
            debug!(?event, "push event ignored");
            return Ok(());
        }
        let mut session = self.roster_writer.lock().await;
        for &kind in kinds {
            self.cache.invalidate(kind)?;
            if kind == CacheKind::TeamRoster {
                session.fetched.clear();
            }
        }
        info!(?event, invalidated = kinds.len(), "push event applied");
        Ok(())
    }

    /// Decode a raw push payload and apply it.
    pub async fn handle_raw_event(&self, raw: &str) -> Result<PushEvent> {
        let event = PushEvent::decode(raw)?;
        self.handle_event(&event).await?;
        Ok(event)
    }

    /// Forget everything cached for the signed-in employee.
    pub async fn logout(&self) -> Result<()> {
        let mut session = self.roster_writer.lock().await;
        session.fetched.clear();
        self.cache.clear()?;
        info!("session data cleared");
        Ok(())
    }
}

/// Store of the first shift that names one.
fn store_of(schedule: &MySchedule) -> Option<Store> {
    schedule
        .shifts
        .iter()
        .chain(schedule.track_items.iter().map(|i| &i.shift))
        .find(|s| !s.cafe_number.trim().is_empty())
        .map(|s| Store {
            cafe_number: s.cafe_number.trim().to_string(),
            company_code: s.company_code.trim().to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use shiftline_core::ShiftRecord;

    #[test]
    fn store_comes_from_first_shift_with_a_cafe() {
        let mut blank = ShiftRecord::new(Some("a"), "2024-03-04T09:00:00", "2024-03-04T12:00:00", "BAR");
        blank.cafe_number = " ".into();
        let mut named = blank.clone();
        named.cafe_number = " 1402 ".into();
        named.company_code = "CC".into();
        let schedule = MySchedule {
            shifts: vec![blank, named],
            ..Default::default()
        };
        assert_eq!(
            store_of(&schedule),
            Some(Store {
                cafe_number: "1402".into(),
                company_code: "CC".into()
            })
        );
        assert_eq!(store_of(&MySchedule::default()), None);
    }
}
