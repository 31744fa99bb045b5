use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

/// Age at which a cached payload is due for refresh (5 minutes).
pub const STALE_AFTER_SECS: i64 = 300;
pub const DEFAULT_DAYS_FORWARD: u32 = 14;
pub const DEFAULT_ROSTER_WINDOW_DAYS: u32 = 7;
/// Width of one visual hour when the timeline is not fitted to a width.
pub const DEFAULT_HOUR_WIDTH_PX: f64 = 120.0;
pub const DEFAULT_LANE_HEIGHT_PX: f64 = 28.0;
pub const DEFAULT_GROUP_HEADER_PX: f64 = 20.0;
pub const DEFAULT_GROUP_GAP_PX: f64 = 8.0;

/// Top-level config (shiftline.toml + SHIFTLINE_* env overrides).
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ShiftlineConfig {
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub roster: RosterConfig,
    #[serde(default)]
    pub timeline: TimelineConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    #[serde(default = "default_cache_path")]
    pub path: String,
    /// One staleness window shared by every cache kind.
    #[serde(default = "default_stale_after_secs")]
    pub stale_after_secs: i64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            path: default_cache_path(),
            stale_after_secs: STALE_AFTER_SECS,
        }
    }
}

impl CacheConfig {
    pub fn stale_after(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.stale_after_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RosterConfig {
    /// How far ahead the user's own schedule is requested.
    #[serde(default = "default_days_forward")]
    pub days_forward: u32,
    /// Size of each paginated team-roster request, in days.
    #[serde(default = "default_roster_window_days")]
    pub window_days: u32,
}

impl Default for RosterConfig {
    fn default() -> Self {
        Self {
            days_forward: DEFAULT_DAYS_FORWARD,
            window_days: DEFAULT_ROSTER_WINDOW_DAYS,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimelineConfig {
    #[serde(default = "default_hour_width")]
    pub hour_width_px: f64,
    #[serde(default = "default_lane_height")]
    pub lane_height_px: f64,
    #[serde(default = "default_group_header")]
    pub group_header_px: f64,
    #[serde(default = "default_group_gap")]
    pub group_gap_px: f64,
}

impl Default for TimelineConfig {
    fn default() -> Self {
        Self {
            hour_width_px: DEFAULT_HOUR_WIDTH_PX,
            lane_height_px: DEFAULT_LANE_HEIGHT_PX,
            group_header_px: DEFAULT_GROUP_HEADER_PX,
            group_gap_px: DEFAULT_GROUP_GAP_PX,
        }
    }
}

fn default_cache_path() -> String {
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    format!("{}/.shiftline/cache.db", home)
}
fn default_stale_after_secs() -> i64 {
    STALE_AFTER_SECS
}
fn default_days_forward() -> u32 {
    DEFAULT_DAYS_FORWARD
}
fn default_roster_window_days() -> u32 {
    DEFAULT_ROSTER_WINDOW_DAYS
}
fn default_hour_width() -> f64 {
    DEFAULT_HOUR_WIDTH_PX
}
fn default_lane_height() -> f64 {
    DEFAULT_LANE_HEIGHT_PX
}
fn default_group_header() -> f64 {
    DEFAULT_GROUP_HEADER_PX
}
fn default_group_gap() -> f64 {
    DEFAULT_GROUP_GAP_PX
}

impl ShiftlineConfig {
    /// Load config from a TOML file with SHIFTLINE_* env var overrides.
    ///
    /// Nested keys use a double underscore, e.g.
    /// `SHIFTLINE_CACHE__STALE_AFTER_SECS=120`. A missing file yields defaults.
    pub fn load(config_path: Option<&str>) -> crate::error::Result<Self> {
        let path = config_path
            .map(String::from)
            .unwrap_or_else(default_config_path);
        Self::figment(&path)
            .extract()
            .map_err(|e| crate::error::ShiftlineError::Config(e.to_string()))
    }

    fn figment(path: &str) -> Figment {
        Figment::new()
            .merge(Toml::file(path))
            .merge(Env::prefixed("SHIFTLINE_").split("__"))
    }
}

fn default_config_path() -> String {
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    format!("{}/.shiftline/shiftline.toml", home)
}
