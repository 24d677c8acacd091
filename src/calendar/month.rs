use chrono::{Datelike, Months, NaiveDate};

pub fn start_of_month(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

pub fn end_of_month(date: NaiveDate) -> NaiveDate {
    start_of_month(date)
        .checked_add_months(Months::new(1))
        .and_then(|next| next.pred_opt())
        .unwrap_or(NaiveDate::MAX)
}

/// Every date from the first to the last day of `date`'s month.
pub fn days_in_month(date: NaiveDate) -> Vec<NaiveDate> {
    let end = end_of_month(date);
    start_of_month(date)
        .iter_days()
        .take_while(|d| *d <= end)
        .collect()
}

/// Month arithmetic; the day is clamped to the target month's length.
pub fn add_months(date: NaiveDate, months: i32) -> Option<NaiveDate> {
    if months >= 0 {
        date.checked_add_months(Months::new(months as u32))
    } else {
        date.checked_sub_months(Months::new(months.unsigned_abs()))
    }
}

pub fn is_same_month(a: NaiveDate, b: NaiveDate) -> bool {
    a.year() == b.year() && a.month() == b.month()
}

/// Whether `day` is the highlighted "today" cell of the grid header and
/// the picker.
pub fn is_today(day: NaiveDate, today: NaiveDate) -> bool {
    day == today
}

/// e.g. `"March 2024"`.
pub fn month_title(date: NaiveDate) -> String {
    date.format("%B %Y").to_string()
}

/// Sunday-first week rows for a month picker, blank-padded on both ends.
pub fn picker_weeks(date: NaiveDate) -> Vec<[Option<NaiveDate>; 7]> {
    let days = days_in_month(date);
    let leading = start_of_month(date).weekday().num_days_from_sunday() as usize;

    let mut cells: Vec<Option<NaiveDate>> = vec![None; leading];
    cells.extend(days.into_iter().map(Some));
    while cells.len() % 7 != 0 {
        cells.push(None);
    }

    cells
        .chunks(7)
        .map(|week| {
            let mut row = [None; 7];
            row.copy_from_slice(week);
            row
        })
        .collect()
}

/// The month currently shown by the grid header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonthNavigator {
    current: NaiveDate,
}

impl MonthNavigator {
    pub fn new(current: NaiveDate) -> Self {
        Self { current }
    }

    pub fn current(&self) -> NaiveDate {
        self.current
    }

    /// Step back one month. Stays put at the edge of the calendar.
    pub fn previous(&mut self) -> NaiveDate {
        if let Some(prev) = add_months(self.current, -1) {
            self.current = prev;
        }
        self.current
    }

    pub fn next(&mut self) -> NaiveDate {
        if let Some(next) = add_months(self.current, 1) {
            self.current = next;
        }
        self.current
    }

    pub fn today(&mut self, today: NaiveDate) -> NaiveDate {
        self.current = today;
        self.current
    }

    /// Jump to a date picked in the month picker.
    pub fn select(&mut self, date: NaiveDate) -> NaiveDate {
        self.current = date;
        self.current
    }

    pub fn days(&self) -> Vec<NaiveDate> {
        days_in_month(self.current)
    }

    pub fn title(&self) -> String {
        month_title(self.current)
    }

    pub fn picker_weeks(&self) -> Vec<[Option<NaiveDate>; 7]> {
        picker_weeks(self.current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn month_bounds() {
        assert_eq!(start_of_month(ymd(2024, 2, 17)), ymd(2024, 2, 1));
        assert_eq!(end_of_month(ymd(2024, 2, 17)), ymd(2024, 2, 29));
        assert_eq!(end_of_month(ymd(2023, 2, 1)), ymd(2023, 2, 28));
        assert_eq!(end_of_month(ymd(2024, 12, 31)), ymd(2024, 12, 31));
    }

    #[test]
    fn days_in_month_enumerates_whole_month() {
        let days = days_in_month(ymd(2024, 4, 10));
        assert_eq!(days.len(), 30);
        assert_eq!(days[0], ymd(2024, 4, 1));
        assert_eq!(days[29], ymd(2024, 4, 30));
        assert!(days.windows(2).all(|w| w[1] == w[0].succ_opt().unwrap()));
    }

    #[test]
    fn add_months_clamps_day() {
        assert_eq!(add_months(ymd(2024, 1, 31), 1), Some(ymd(2024, 2, 29)));
        assert_eq!(add_months(ymd(2024, 3, 31), -1), Some(ymd(2024, 2, 29)));
        assert_eq!(add_months(ymd(2024, 5, 15), 0), Some(ymd(2024, 5, 15)));
    }

    #[test]
    fn same_month() {
        assert!(is_same_month(ymd(2024, 5, 1), ymd(2024, 5, 31)));
        assert!(!is_same_month(ymd(2024, 5, 1), ymd(2023, 5, 1)));
    }

    #[test]
    fn today_marks_one_day_of_the_picker() {
        let today = ymd(2024, 6, 12);
        let marked: Vec<NaiveDate> = picker_weeks(today)
            .into_iter()
            .flatten()
            .flatten()
            .filter(|&day| is_today(day, today))
            .collect();
        assert_eq!(marked, vec![today]);
        assert!(!is_today(ymd(2023, 6, 12), today));
        assert!(days_in_month(ymd(2024, 7, 1)).into_iter().all(|day| !is_today(day, today)));
    }

    #[test]
    fn title_format() {
        assert_eq!(month_title(ymd(2024, 3, 9)), "March 2024");
    }

    #[test]
    fn picker_pads_leading_and_trailing() {
        // June 2024 starts on a Saturday and has 30 days.
        let weeks = picker_weeks(ymd(2024, 6, 1));
        assert_eq!(weeks.len(), 6);
        assert_eq!(weeks[0][..6], [None; 6]);
        assert_eq!(weeks[0][6], Some(ymd(2024, 6, 1)));
        assert_eq!(weeks[5][0], Some(ymd(2024, 6, 30)));
        assert!(weeks[5][1..].iter().all(Option::is_none));
    }

    #[test]
    fn picker_exact_fit() {
        // February 2026 starts on a Sunday and has 28 days.
        let weeks = picker_weeks(ymd(2026, 2, 1));
        assert_eq!(weeks.len(), 4);
        assert!(weeks.iter().flatten().all(Option::is_some));
    }

    #[test]
    fn navigator_wraps_years() {
        let mut nav = MonthNavigator::new(ymd(2024, 12, 15));
        assert_eq!(nav.next(), ymd(2025, 1, 15));
        assert_eq!(nav.title(), "January 2025");
        nav.previous();
        assert_eq!(nav.previous(), ymd(2024, 11, 15));
        assert_eq!(nav.days().len(), 30);
    }

    #[test]
    fn navigator_today_and_select() {
        let mut nav = MonthNavigator::new(ymd(2020, 1, 1));
        assert_eq!(nav.today(ymd(2024, 7, 4)), ymd(2024, 7, 4));
        assert_eq!(nav.select(ymd(2023, 9, 2)), ymd(2023, 9, 2));
        assert_eq!(nav.current(), ymd(2023, 9, 2));
        assert_eq!(nav.picker_weeks(), picker_weeks(ymd(2023, 9, 2)));
    }

    #[test]
    fn navigator_stops_at_calendar_edge() {
        let mut nav = MonthNavigator::new(NaiveDate::MAX);
        assert_eq!(nav.next(), NaiveDate::MAX);
    }
}
