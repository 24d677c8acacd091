use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use chrono::NaiveDate;

use crate::calendar::{parse_month, DEFAULT_MINUTES_PER_PIXEL};
use crate::layout::{
    LayoutConfig, LayoutError, DEFAULT_CELL_PADDING, DEFAULT_EVENT_HEIGHT, DEFAULT_EVENT_SPACING,
    DEFAULT_MIN_ROW_HEIGHT,
};
use crate::limits::MAX_SEED_RESOURCES;

#[derive(Debug)]
pub enum ConfigError {
    Invalid { var: &'static str, value: String },
    Layout(LayoutError),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Invalid { var, value } => write!(f, "invalid value for {var}: {value:?}"),
            ConfigError::Layout(e) => write!(f, "invalid layout settings: {e}"),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Layout(e) => Some(e),
            ConfigError::Invalid { .. } => None,
        }
    }
}

impl From<LayoutError> for ConfigError {
    fn from(e: LayoutError) -> Self {
        ConfigError::Layout(e)
    }
}

/// Process settings, read once at startup from `DAYGRID_*` variables.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub data_dir: PathBuf,
    pub metrics_port: Option<u16>,
    /// Appends since the last compaction that trigger the next one.
    pub compact_threshold: u64,
    pub compact_interval: Duration,
    /// Resources created when the store opens empty.
    pub seed_resources: usize,
    /// First day of the month to render. `None` means the current month.
    pub month: Option<NaiveDate>,
    pub layout: LayoutConfig,
    pub minutes_per_pixel: f64,
}

impl Settings {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as `from_env` with a custom variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let data_dir = lookup("DAYGRID_DATA_DIR").unwrap_or_else(|| "./data".into());
        let metrics_port = parse_opt(&lookup, "DAYGRID_METRICS_PORT")?;
        let compact_threshold = parse_opt(&lookup, "DAYGRID_COMPACT_THRESHOLD")?.unwrap_or(1000);
        let interval_secs: u64 = parse_opt(&lookup, "DAYGRID_COMPACT_INTERVAL_SECS")?.unwrap_or(30);
        if interval_secs == 0 {
            return Err(invalid("DAYGRID_COMPACT_INTERVAL_SECS", "0"));
        }

        let seed_resources: usize = parse_opt(&lookup, "DAYGRID_SEED_RESOURCES")?.unwrap_or(15);
        if seed_resources > MAX_SEED_RESOURCES {
            return Err(invalid("DAYGRID_SEED_RESOURCES", &seed_resources.to_string()));
        }

        let month = match lookup("DAYGRID_MONTH") {
            Some(raw) => Some(parse_month(&raw).map_err(|_| invalid("DAYGRID_MONTH", &raw))?),
            None => None,
        };

        let layout = LayoutConfig::new(
            parse_opt(&lookup, "DAYGRID_EVENT_HEIGHT")?.unwrap_or(DEFAULT_EVENT_HEIGHT),
            parse_opt(&lookup, "DAYGRID_EVENT_SPACING")?.unwrap_or(DEFAULT_EVENT_SPACING),
            parse_opt(&lookup, "DAYGRID_CELL_PADDING")?.unwrap_or(DEFAULT_CELL_PADDING),
            parse_opt(&lookup, "DAYGRID_MIN_ROW_HEIGHT")?.unwrap_or(DEFAULT_MIN_ROW_HEIGHT),
        )?;

        let minutes_per_pixel =
            parse_opt(&lookup, "DAYGRID_MINUTES_PER_PIXEL")?.unwrap_or(DEFAULT_MINUTES_PER_PIXEL);
        if !minutes_per_pixel.is_finite() || minutes_per_pixel < 0.0 {
            return Err(invalid("DAYGRID_MINUTES_PER_PIXEL", &minutes_per_pixel.to_string()));
        }

        Ok(Self {
            data_dir: PathBuf::from(data_dir),
            metrics_port,
            compact_threshold,
            compact_interval: Duration::from_secs(interval_secs),
            seed_resources,
            month,
            layout,
            minutes_per_pixel,
        })
    }

    pub fn wal_path(&self) -> PathBuf {
        self.data_dir.join("calendar.wal")
    }
}

fn invalid(var: &'static str, value: &str) -> ConfigError {
    ConfigError::Invalid { var, value: value.to_string() }
}

fn parse_opt<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    var: &'static str,
) -> Result<Option<T>, ConfigError> {
    match lookup(var) {
        Some(raw) => raw.trim().parse().map(Some).map_err(|_| invalid(var, &raw)),
        None => Ok(None),
    }
}
