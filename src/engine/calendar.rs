use chrono::{Datelike, Duration, NaiveDate};
use serde::Serialize;
use std::collections::HashMap;
use utoipa::ToSchema;

use crate::model::attendance::AttendanceRecord;

/// One cell of a month-at-a-glance grid.
#[derive(Debug, Clone, Serialize, PartialEq, ToSchema)]
pub struct CalendarCell {
    #[schema(example = "2024-02-01", value_type = String, format = "date")]
    pub date: NaiveDate,
    /// False for the leading/trailing cells borrowed from adjacent months.
    pub in_month: bool,
    pub record: Option<AttendanceRecord>,
}

/// Cells spanning the complete Sunday–Saturday weeks that cover the given
/// month. Each cell joins the record whose date matches that calendar day
/// exactly (day granularity, timezone-naive). An invalid month yields an
/// empty grid rather than an error.
pub fn month_grid(year: i32, month: u32, records: &[AttendanceRecord]) -> Vec<CalendarCell> {
    let Some(first) = NaiveDate::from_ymd_opt(year, month, 1) else {
        return Vec::new();
    };
    let last = last_day_of_month(first);

    let start = first - Duration::days(first.weekday().num_days_from_sunday() as i64);
    let end = last + Duration::days((6 - last.weekday().num_days_from_sunday()) as i64);

    let by_date: HashMap<NaiveDate, &AttendanceRecord> =
        records.iter().map(|r| (r.date, r)).collect();

    start
        .iter_days()
        .take_while(|d| *d <= end)
        .map(|date| CalendarCell {
            date,
            in_month: date.month() == month && date.year() == year,
            record: by_date.get(&date).map(|r| (*r).clone()),
        })
        .collect()
}

fn last_day_of_month(first: NaiveDate) -> NaiveDate {
    let next_month = if first.month() == 12 {
        NaiveDate::from_ymd_opt(first.year() + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(first.year(), first.month() + 1, 1)
    };
    // The first of the next month always exists for a valid `first`.
    next_month.expect("valid successor month") - Duration::days(1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::attendance::AttendanceStatus;
    use chrono::Weekday;

    fn record(employee_id: i64, date: NaiveDate) -> AttendanceRecord {
        AttendanceRecord {
            id: date.day() as i64,
            employee_id,
            date,
            status: AttendanceStatus::Present,
            note: None,
        }
    }

    #[test]
    fn february_2024_grid_covers_complete_weeks() {
        let grid = month_grid(2024, 2, &[]);

        // Feb 2024 starts on a Thursday, so the grid runs Sun Jan 28
        // through Sat Mar 2: five full weeks.
        assert_eq!(grid.len(), 35);
        assert_eq!(grid.first().unwrap().date, NaiveDate::from_ymd_opt(2024, 1, 28).unwrap());
        assert_eq!(grid.last().unwrap().date, NaiveDate::from_ymd_opt(2024, 3, 2).unwrap());
        assert_eq!(grid.first().unwrap().date.weekday(), Weekday::Sun);
        assert_eq!(grid.last().unwrap().date.weekday(), Weekday::Sat);

        // Every day 1..=29 of February appears exactly once, flagged in-month.
        for day in 1..=29 {
            let date = NaiveDate::from_ymd_opt(2024, 2, day).unwrap();
            let cells: Vec<_> = grid.iter().filter(|c| c.date == date).collect();
            assert_eq!(cells.len(), 1, "day {day} should appear once");
            assert!(cells[0].in_month);
        }
        assert_eq!(grid.iter().filter(|c| c.in_month).count(), 29);
        assert_eq!(grid.iter().filter(|c| !c.in_month).count(), 6);
    }

    #[test]
    fn records_land_on_their_exact_day() {
        let marked = NaiveDate::from_ymd_opt(2024, 2, 14).unwrap();
        let outside = NaiveDate::from_ymd_opt(2024, 1, 28).unwrap();
        let records = vec![record(1, marked), record(1, outside)];

        let grid = month_grid(2024, 2, &records);

        let cell = grid.iter().find(|c| c.date == marked).unwrap();
        assert!(cell.record.is_some());

        // A record on a padding day still shows up in its cell.
        let padding = grid.iter().find(|c| c.date == outside).unwrap();
        assert!(!padding.in_month);
        assert!(padding.record.is_some());

        assert_eq!(grid.iter().filter(|c| c.record.is_some()).count(), 2);
    }

    #[test]
    fn grid_always_spans_whole_weeks() {
        for (year, month) in [(2023, 12), (2024, 6), (2025, 2), (2024, 9)] {
            let grid = month_grid(year, month, &[]);
            assert_eq!(grid.len() % 7, 0, "{year}-{month}");
            assert_eq!(grid.first().unwrap().date.weekday(), Weekday::Sun);
            assert_eq!(grid.last().unwrap().date.weekday(), Weekday::Sat);
        }
    }

    #[test]
    fn invalid_month_yields_empty_grid() {
        assert!(month_grid(2024, 13, &[]).is_empty());
        assert!(month_grid(2024, 0, &[]).is_empty());
    }
}
