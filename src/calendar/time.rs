use chrono::{NaiveDate, NaiveTime, ParseResult, Timelike};

use crate::model::Px;

pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Drag sensitivity used by the timeline when none is configured.
pub const DEFAULT_MINUTES_PER_PIXEL: f64 = 0.5;

const LAST_MINUTE_OF_DAY: i64 = 23 * 60 + 59;

/// `yyyy-MM-dd`.
pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

pub fn parse_date(s: &str) -> ParseResult<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), DATE_FORMAT)
}

/// `yyyy-MM`, resolved to the first of that month.
pub fn parse_month(s: &str) -> ParseResult<NaiveDate> {
    NaiveDate::parse_from_str(&format!("{}-01", s.trim()), DATE_FORMAT)
}

/// Accepts `HH:MM` or `HH:MM:SS`.
pub fn parse_time(s: &str) -> ParseResult<NaiveTime> {
    let s = s.trim();
    NaiveTime::parse_from_str(s, "%H:%M:%S").or_else(|_| NaiveTime::parse_from_str(s, "%H:%M"))
}

/// e.g. `9:05 AM`.
pub fn format_time_12h(time: NaiveTime) -> String {
    time.format("%-I:%M %p").to_string()
}

pub fn minute_of_day(time: NaiveTime) -> i64 {
    i64::from(time.hour()) * 60 + i64::from(time.minute())
}

/// Whole minutes represented by a horizontal drag distance.
pub fn drag_minutes(delta_px: Px, minutes_per_pixel: f64) -> i64 {
    (delta_px * minutes_per_pixel).round() as i64
}

/// Shift by whole minutes, clamped to `[00:00, 23:59]`. Seconds are dropped.
pub fn shift_minutes(time: NaiveTime, minutes: i64) -> NaiveTime {
    let target = minute_of_day(time)
        .saturating_add(minutes)
        .clamp(0, LAST_MINUTE_OF_DAY);
    NaiveTime::from_hms_opt((target / 60) as u32, (target % 60) as u32, 0).unwrap_or(time)
}

/// New start time after dragging an event `delta_px` pixels sideways.
pub fn shift_time(time: NaiveTime, delta_px: Px, minutes_per_pixel: f64) -> NaiveTime {
    shift_minutes(time, drag_minutes(delta_px, minutes_per_pixel))
}
