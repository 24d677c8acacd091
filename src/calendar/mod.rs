//! Calendar arithmetic for the month view: day enumeration, navigation,
//! the month picker grid, date/time text and drag-to-reschedule time shifts.

pub mod month;
pub mod palette;
pub mod time;

pub use month::{
    add_months, days_in_month, end_of_month, is_same_month, is_today, month_title, picker_weeks,
    start_of_month, MonthNavigator,
};
pub use palette::{color_for, display_color, PaletteColor};
pub use time::{
    format_date, format_time_12h, parse_date, parse_month, parse_time, shift_minutes, shift_time,
    DEFAULT_MINUTES_PER_PIXEL,
};
