use chrono::{Datelike, Months, NaiveDate};

pub const WEEKDAY_HEADINGS: [&str; 7] = ["Su", "Mo", "Tu", "We", "Th", "Fr", "Sa"];

/// One slot of a 7-column month grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DayCell {
    Blank,
    Day(NaiveDate),
}

impl DayCell {
    pub fn date(&self) -> Option<NaiveDate> {
        match self {
            DayCell::Day(date) => Some(*date),
            DayCell::Blank => None,
        }
    }
}

pub fn first_of_month(reference: NaiveDate) -> NaiveDate {
    NaiveDate::from_ymd_opt(reference.year(), reference.month(), 1).unwrap_or(reference)
}

pub fn days_in_month(year: i32, month: u32) -> u32 {
    let first = match NaiveDate::from_ymd_opt(year, month, 1) {
        Some(date) => date,
        None => return 28,
    };
    first
        .checked_add_months(Months::new(1))
        .and_then(|next| next.pred_opt())
        .map(|last| last.day())
        .unwrap_or(31)
}

/// First and last day of the month containing `reference`.
pub fn month_bounds(reference: NaiveDate) -> (NaiveDate, NaiveDate) {
    let first = first_of_month(reference);
    let days = days_in_month(first.year(), first.month());
    let last = NaiveDate::from_ymd_opt(first.year(), first.month(), days).unwrap_or(first);
    (first, last)
}

/// Builds the cells for the month containing `reference`: one blank per
/// weekday before the 1st (weeks start on Sunday), then every day of the
/// month in order. The day-of-month of `reference` is ignored.
pub fn month_grid(reference: NaiveDate) -> Vec<DayCell> {
    let (first, last) = month_bounds(reference);
    let leading = first.weekday().num_days_from_sunday() as usize;
    let mut cells = Vec::with_capacity(leading + last.day() as usize);
    cells.extend(std::iter::repeat(DayCell::Blank).take(leading));
    cells.extend(
        first
            .iter_days()
            .take_while(|day| *day <= last)
            .map(DayCell::Day),
    );
    cells
}

/// Appends blanks until the grid fills whole weeks.
pub fn pad_trailing(mut cells: Vec<DayCell>) -> Vec<DayCell> {
    while cells.len() % 7 != 0 {
        cells.push(DayCell::Blank);
    }
    cells
}

/// Moves to the first day of the month `delta` months away.
pub fn shift_month(reference: NaiveDate, delta: i32) -> NaiveDate {
    let first = first_of_month(reference);
    let shifted = if delta >= 0 {
        first.checked_add_months(Months::new(delta as u32))
    } else {
        first.checked_sub_months(Months::new(delta.unsigned_abs()))
    };
    shifted.unwrap_or(first)
}

/// Parses `YYYY-MM` into the first day of that month.
pub fn parse_month(input: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(&format!("{}-01", input.trim()), "%Y-%m-%d").ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn leading_blanks(cells: &[DayCell]) -> usize {
        cells.iter().take_while(|c| **c == DayCell::Blank).count()
    }

    #[test]
    fn month_starting_on_sunday_has_no_padding() {
        let cells = month_grid(date(2026, 2, 14));
        assert_eq!(cells.len(), 28);
        assert_eq!(cells[0], DayCell::Day(date(2026, 2, 1)));
        assert_eq!(cells[27], DayCell::Day(date(2026, 2, 28)));
    }

    #[test]
    fn leading_blanks_follow_weekday_of_first() {
        // 2026-01-01 is a Thursday.
        let cells = month_grid(date(2026, 1, 31));
        assert_eq!(leading_blanks(&cells), 4);
        assert_eq!(cells.len(), 4 + 31);
        assert_eq!(cells[4], DayCell::Day(date(2026, 1, 1)));
    }

    #[test]
    fn leap_february_has_29_days() {
        let cells = month_grid(date(2024, 2, 1));
        let days: Vec<_> = cells.iter().filter_map(DayCell::date).collect();
        assert_eq!(days.len(), 29);
        assert_eq!(days.last(), Some(&date(2024, 2, 29)));
    }

    #[test]
    fn every_day_cell_falls_inside_the_month() {
        for month in 1..=12 {
            let reference = date(2026, month, 1);
            let cells = month_grid(reference);
            let leading = leading_blanks(&cells);
            let days = days_in_month(2026, month) as usize;
            assert_eq!(cells.len(), leading + days);
            for cell in &cells[leading..] {
                let day = cell.date().expect("no blanks after the first day");
                assert_eq!((day.year(), day.month()), (2026, month));
            }
        }
    }

    #[test]
    fn trailing_padding_fills_the_last_week() {
        // August 2026 starts on a Saturday: 6 blanks + 31 days.
        let cells = pad_trailing(month_grid(date(2026, 8, 1)));
        assert_eq!(cells.len(), 42);
        assert_eq!(cells.len() % 7, 0);
        assert_eq!(cells.last(), Some(&DayCell::Blank));
    }

    #[test]
    fn shift_month_crosses_year_boundaries() {
        assert_eq!(shift_month(date(2026, 12, 31), 1), date(2027, 1, 1));
        assert_eq!(shift_month(date(2026, 1, 15), -1), date(2025, 12, 1));
        assert_eq!(shift_month(date(2026, 3, 9), 0), date(2026, 3, 1));
    }

    #[test]
    fn parse_month_accepts_year_and_month() {
        assert_eq!(parse_month("2026-02"), Some(date(2026, 2, 1)));
        assert_eq!(parse_month(" 2026-11 "), Some(date(2026, 11, 1)));
        assert_eq!(parse_month("2026-13"), None);
        assert_eq!(parse_month("feb"), None);
    }

    #[test]
    fn bounds_cover_whole_month() {
        assert_eq!(
            month_bounds(date(2026, 4, 17)),
            (date(2026, 4, 1), date(2026, 4, 30))
        );
        assert_eq!(days_in_month(2100, 2), 28);
    }
}
