use std::collections::HashMap;

use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;
use shiftline_core::config::TimelineConfig;
use shiftline_core::{ParseFailure, ShiftKey};
use shiftline_roster::{DaySchedule, EnrichedShift};
use tracing::{debug, warn};

use crate::lanes::pack_lanes;
use crate::window::TimeWindow;

/// A point of interest to mark on the chart, such as a tapped shift.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Focus {
    pub start: NaiveDateTime,
    pub end: Option<NaiveDateTime>,
}

impl Focus {
    /// The marked instant: the middle of the span when an end is given.
    pub fn instant(&self) -> NaiveDateTime {
        match self.end {
            Some(end) if end > self.start => self.start + (end - self.start) / 2,
            _ => self.start,
        }
    }
}

#[derive(Debug, Clone)]
pub struct LayoutOptions {
    /// Fixed chart window; computed from the shifts when absent.
    pub window: Option<TimeWindow>,
    /// Stretch the window over exactly this many pixels.
    pub fit_width: Option<f64>,
    pub hour_width_px: f64,
    pub lane_height_px: f64,
    pub group_header_px: f64,
    pub group_gap_px: f64,
    pub now: Option<NaiveDateTime>,
    pub focus: Option<Focus>,
}

impl Default for LayoutOptions {
    fn default() -> Self {
        Self::from_config(&TimelineConfig::default())
    }
}

impl LayoutOptions {
    pub fn from_config(config: &TimelineConfig) -> Self {
        Self {
            window: None,
            fit_width: None,
            hour_width_px: config.hour_width_px,
            lane_height_px: config.lane_height_px,
            group_header_px: config.group_header_px,
            group_gap_px: config.group_gap_px,
            now: None,
            focus: None,
        }
    }

    pub fn with_window(mut self, window: TimeWindow) -> Self {
        self.window = Some(window);
        self
    }

    pub fn fit_to(mut self, width_px: f64) -> Self {
        self.fit_width = Some(width_px);
        self
    }

    pub fn at(mut self, now: NaiveDateTime) -> Self {
        self.now = Some(now);
        self
    }

    pub fn focus_on(mut self, start: NaiveDateTime, end: Option<NaiveDateTime>) -> Self {
        self.focus = Some(Focus { start, end });
        self
    }

    fn pixels_per_minute(&self, window: &TimeWindow) -> f64 {
        match self.fit_width {
            Some(width) if width.is_finite() && width > 0.0 => width / window.total_minutes(),
            Some(width) => {
                warn!(width, "ignoring unusable fit width");
                self.hour_width_px / 60.0
            }
            None => self.hour_width_px / 60.0,
        }
    }
}

/// One drawn shift.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Bar {
    pub shift: EnrichedShift,
    pub group: usize,
    pub lane: usize,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    /// `start`/`end` clamped to the chart window.
    pub display_start: NaiveDateTime,
    pub display_end: NaiveDateTime,
    pub clipped_start: bool,
    pub clipped_end: bool,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Bar {
    pub fn key(&self) -> ShiftKey {
        self.shift.key()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Lane {
    pub y: f64,
    /// Indices into [`TimelineLayout::bars`], in placement order.
    pub bars: Vec<usize>,
}

/// All shifts of one category, stacked under a header row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Group {
    pub label: String,
    pub y: f64,
    pub height: f64,
    pub lanes: Vec<Lane>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct HourMark {
    pub time: NaiveDateTime,
    pub x: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimelineLayout {
    /// `None` only for an empty layout without a fixed window.
    pub window: Option<TimeWindow>,
    pub pixels_per_minute: f64,
    pub groups: Vec<Group>,
    pub bars: Vec<Bar>,
    pub now_x: Option<f64>,
    pub focus_x: Option<f64>,
    pub hour_marks: Vec<HourMark>,
    pub content_width: f64,
    pub content_height: f64,
    /// Shifts left out because their times could not be read.
    pub skipped: Vec<ParseFailure>,
}

impl TimelineLayout {
    fn empty(window: Option<TimeWindow>, skipped: Vec<ParseFailure>) -> Self {
        Self {
            window,
            pixels_per_minute: 0.0,
            groups: Vec::new(),
            bars: Vec::new(),
            now_x: None,
            focus_x: None,
            hour_marks: Vec::new(),
            content_width: 0.0,
            content_height: 0.0,
            skipped,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn lane_count(&self) -> usize {
        self.groups.iter().map(|g| g.lanes.len()).sum()
    }
}

/// Lay out one day's schedule. Shifts the day schedule already skipped stay
/// in the layout's `skipped` report.
pub fn layout_day(day: &DaySchedule, options: &LayoutOptions) -> TimelineLayout {
    let mut layout = layout_shifts(&day.shifts, Some(day.date), options);
    let mut skipped = day.skipped.clone();
    skipped.append(&mut layout.skipped);
    layout.skipped = skipped;
    layout
}

struct Placed<'a> {
    shift: &'a EnrichedShift,
    key: ShiftKey,
    start: NaiveDateTime,
    end: NaiveDateTime,
}

/// Lay out an arbitrary list of shifts. `date` is the calendar day shown;
/// the "now" marker is only placed when it matches the day of `options.now`.
pub fn layout_shifts(
    shifts: &[EnrichedShift],
    date: Option<NaiveDate>,
    options: &LayoutOptions,
) -> TimelineLayout {
    let mut skipped = Vec::new();
    let mut placed = Vec::with_capacity(shifts.len());
    for shift in shifts {
        match shift.shift.interval() {
            Ok((start, end)) => placed.push(Placed {
                shift,
                key: shift.key(),
                start,
                end,
            }),
            Err(failure) => {
                warn!(%failure, "shift left out of layout");
                skipped.push(failure);
            }
        }
    }

    let window = match (options.window, bounds(&placed)) {
        (_, None) => return TimelineLayout::empty(options.window, skipped),
        (Some(fixed), Some(_)) => fixed,
        (None, Some((earliest, latest))) => TimeWindow::around(earliest, latest),
    };
    let ppm = options.pixels_per_minute(&window);
    let x_of = |t: NaiveDateTime| window.offset_minutes(t) * ppm;

    let mut bars = Vec::with_capacity(placed.len());
    let mut groups = Vec::new();
    let mut y = 0.0;
    for (label, mut members) in group_by_category(placed) {
        members.sort_by(|a, b| {
            a.start
                .cmp(&b.start)
                .then_with(|| a.end.cmp(&b.end))
                .then_with(|| a.key.cmp(&b.key))
        });
        let intervals: Vec<_> = members.iter().map(|p| (p.start, p.end)).collect();
        let packed = pack_lanes(&intervals);

        let group_index = groups.len();
        let lanes_top = y + options.group_header_px;
        let mut lane_of = vec![0; members.len()];
        for (lane, positions) in packed.iter().enumerate() {
            for &pos in positions {
                lane_of[pos] = lane;
            }
        }

        let mut lanes: Vec<Lane> = (0..packed.len())
            .map(|lane| Lane {
                y: lanes_top + lane as f64 * options.lane_height_px,
                bars: Vec::new(),
            })
            .collect();
        for (pos, p) in members.iter().enumerate() {
            let lane = lane_of[pos];
            let display_start = window.clamp(p.start);
            let display_end = window.clamp(p.end);
            lanes[lane].bars.push(bars.len());
            bars.push(Bar {
                shift: p.shift.clone(),
                group: group_index,
                lane,
                start: p.start,
                end: p.end,
                display_start,
                display_end,
                clipped_start: p.start < window.start(),
                clipped_end: p.end > window.end(),
                x: x_of(display_start),
                y: lanes[lane].y,
                width: x_of(display_end) - x_of(display_start),
                height: options.lane_height_px,
            });
        }

        let height = options.group_header_px + packed.len() as f64 * options.lane_height_px;
        debug!(group = %label, shifts = members.len(), lanes = packed.len(), "group laid out");
        groups.push(Group {
            label,
            y,
            height,
            lanes,
        });
        y += height + options.group_gap_px;
    }
    let content_height = (y - options.group_gap_px).max(0.0);

    let now_x = options
        .now
        .filter(|now| window.strictly_contains(*now) && Some(now.date()) == date)
        .map(x_of);
    let focus_x = options
        .focus
        .map(|f| f.instant())
        .filter(|t| window.contains(*t))
        .map(x_of);
    let hour_marks = window
        .hours()
        .map(|time| HourMark { time, x: x_of(time) })
        .collect();

    TimelineLayout {
        window: Some(window),
        pixels_per_minute: ppm,
        groups,
        bars,
        now_x,
        focus_x,
        hour_marks,
        content_width: window.total_minutes() * ppm,
        content_height,
        skipped,
    }
}

fn bounds(placed: &[Placed<'_>]) -> Option<(NaiveDateTime, NaiveDateTime)> {
    let earliest = placed.iter().map(|p| p.start).min()?;
    let latest = placed.iter().map(|p| p.end).max()?;
    Some((earliest, latest))
}

/// Groups ordered by their earliest start, then label.
fn group_by_category(placed: Vec<Placed<'_>>) -> Vec<(String, Vec<Placed<'_>>)> {
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut groups: Vec<(String, Vec<Placed<'_>>)> = Vec::new();
    for p in placed {
        let label = p.shift.category();
        match index.get(&label) {
            Some(&i) => groups[i].1.push(p),
            None => {
                index.insert(label.clone(), groups.len());
                groups.push((label, vec![p]));
            }
        }
    }
    groups.sort_by(|a, b| {
        earliest(&a.1)
            .cmp(&earliest(&b.1))
            .then_with(|| a.0.cmp(&b.0))
    });
    groups
}

fn earliest(members: &[Placed<'_>]) -> Option<NaiveDateTime> {
    members.iter().map(|p| p.start).min()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use shiftline_core::{EmployeeShiftSet, ShiftRecord};

    fn at(h: u32, m: u32) -> NaiveDateTime {
        day().and_hms_opt(h, m, 0).unwrap()
    }

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 4).unwrap()
    }

    fn shift(id: &str, start: &str, end: &str, code: &str) -> EnrichedShift {
        let owner = EmployeeShiftSet::teammate("T", "Tom", []);
        EnrichedShift::new(
            ShiftRecord::new(
                Some(id),
                format!("2024-03-04T{start}:00"),
                format!("2024-03-04T{end}:00"),
                code,
            ),
            &owner,
        )
    }

    fn abc() -> Vec<EnrichedShift> {
        vec![
            shift("A", "09:00", "11:00", "BAR"),
            shift("B", "10:00", "12:00", "BAR"),
            shift("C", "11:30", "13:00", "BAR"),
        ]
    }

    fn bar<'a>(layout: &'a TimelineLayout, id: &str) -> &'a Bar {
        layout
            .bars
            .iter()
            .find(|b| b.shift.shift.shift_id.as_ref().map(|s| s.as_str()) == Some(id))
            .unwrap()
    }

    #[test]
    fn packs_overlapping_shifts_into_two_lanes() {
        let layout = layout_shifts(&abc(), Some(day()), &LayoutOptions::default());

        assert_eq!(layout.groups.len(), 1);
        assert_eq!(layout.groups[0].label, "Barista");
        assert_eq!(layout.groups[0].lanes.len(), 2);
        assert_eq!(bar(&layout, "A").lane, 0);
        assert_eq!(bar(&layout, "B").lane, 1);
        assert_eq!(bar(&layout, "C").lane, 0);
    }

    #[test]
    fn computes_window_and_geometry() {
        let layout = layout_shifts(&abc(), Some(day()), &LayoutOptions::default());
        let window = layout.window.unwrap();
        assert_eq!((window.start(), window.end()), (at(9, 0), at(13, 0)));
        assert_eq!(layout.pixels_per_minute, 2.0);
        assert_eq!(layout.content_width, 480.0);

        let b = bar(&layout, "B");
        assert_eq!(b.x, 120.0);
        assert_eq!(b.width, 240.0);
        assert_eq!(b.y, 20.0 + 28.0);
        assert_eq!(layout.content_height, 20.0 + 2.0 * 28.0);
        assert_eq!(layout.hour_marks.len(), 5);
        assert_eq!(layout.hour_marks[4].x, 480.0);
    }

    #[test]
    fn fit_width_scales_to_window() {
        let options = LayoutOptions::default().fit_to(960.0);
        let layout = layout_shifts(&abc(), Some(day()), &options);
        assert_eq!(layout.pixels_per_minute, 4.0);
        assert_eq!(layout.content_width, 960.0);
    }

    #[test]
    fn clips_to_fixed_window() {
        let window = TimeWindow::new(at(10, 0), at(12, 0)).unwrap();
        let mut shifts = abc();
        shifts.push(shift("D", "14:00", "15:00", "BAR"));
        let layout = layout_shifts(&shifts, Some(day()), &LayoutOptions::default().with_window(window));

        let a = bar(&layout, "A");
        assert!(a.clipped_start);
        assert_eq!(a.display_start, at(10, 0));
        assert_eq!(a.x, 0.0);
        assert_eq!(a.width, 120.0);

        let c = bar(&layout, "C");
        assert!(c.clipped_end && !c.clipped_start);
        assert_eq!(c.display_end, at(12, 0));

        // entirely outside: kept, collapsed onto the right edge
        let d = bar(&layout, "D");
        assert_eq!(d.width, 0.0);
        assert_eq!(d.x, 240.0);
        assert_eq!(layout.bars.len(), 4);
    }

    #[test]
    fn groups_ordered_by_earliest_start_then_label() {
        let shifts = vec![
            shift("k", "11:00", "12:00", "KIT"),
            shift("r", "08:00", "09:00", "REG"),
            shift("b", "11:00", "13:00", "BAR"),
        ];
        let options = LayoutOptions::default();
        let layout = layout_shifts(&shifts, Some(day()), &options);
        let labels: Vec<_> = layout.groups.iter().map(|g| g.label.as_str()).collect();
        assert_eq!(labels, ["Register", "Barista", "Kitchen"]);

        // header + one lane + gap per group
        let step = options.group_header_px + options.lane_height_px + options.group_gap_px;
        assert_eq!(layout.groups[1].y, step);
        assert_eq!(bar(&layout, "k").y, 2.0 * step + options.group_header_px);
    }

    #[test]
    fn now_marker_only_inside_window_on_today() {
        let options = LayoutOptions::default().at(at(10, 30));
        let layout = layout_shifts(&abc(), Some(day()), &options);
        assert_eq!(layout.now_x, Some(180.0));

        let tomorrow = day() + Duration::days(1);
        assert_eq!(layout_shifts(&abc(), Some(tomorrow), &options).now_x, None);

        // on the edge is not strictly inside
        let edge = LayoutOptions::default().at(at(9, 0));
        assert_eq!(layout_shifts(&abc(), Some(day()), &edge).now_x, None);
    }

    #[test]
    fn focus_marks_centre_of_span() {
        let options = LayoutOptions::default().focus_on(at(10, 0), Some(at(12, 0)));
        let layout = layout_shifts(&abc(), Some(day()), &options);
        assert_eq!(layout.focus_x, Some(240.0));

        let outside = LayoutOptions::default().focus_on(at(15, 0), None);
        assert_eq!(layout_shifts(&abc(), Some(day()), &outside).focus_x, None);
    }

    #[test]
    fn unparsable_shift_is_reported_not_drawn() {
        let mut shifts = abc();
        shifts.push(shift("X", "09:00", "soon", "BAR"));
        let layout = layout_shifts(&shifts, Some(day()), &LayoutOptions::default());
        assert_eq!(layout.bars.len(), 3);
        assert_eq!(layout.skipped.len(), 1);
        assert_eq!(layout.groups[0].lanes.len(), 2);
    }

    #[test]
    fn empty_input_gives_empty_layout() {
        let options = LayoutOptions::default().at(at(10, 0)).focus_on(at(10, 0), None);
        let layout = layout_shifts(&[], Some(day()), &options);
        assert!(layout.is_empty());
        assert!(layout.groups.is_empty());
        assert_eq!(layout.now_x, None);
        assert_eq!(layout.focus_x, None);
        assert_eq!(layout.window, None);
    }

    #[test]
    fn layout_day_carries_day_report() {
        let roster = vec![EmployeeShiftSet::teammate(
            "T",
            "Tom",
            [
                ShiftRecord::new(Some("a"), "2024-03-04T09:00:00", "2024-03-04T11:00:00", "BAR"),
                ShiftRecord::new(Some("b"), "garbage", "2024-03-04T11:00:00", "BAR"),
            ],
        )];
        let day_schedule = shiftline_roster::build_day_schedule(&roster, day());
        let layout = layout_day(&day_schedule, &LayoutOptions::default());
        assert_eq!(layout.bars.len(), 1);
        assert_eq!(layout.skipped.len(), 1);
        assert_eq!(layout.lane_count(), 1);
    }
}
