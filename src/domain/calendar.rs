//! Due-date arithmetic.
//!
//! Adding a month clamps to the last day of the target month, so
//! 31 January becomes 28 (or 29) February rather than rolling into March.

use chrono::{Datelike, Months, NaiveDate, NaiveDateTime, NaiveTime};

/// Same instant one calendar month later, clamped to the target month's end
pub fn add_one_month(at: NaiveDateTime) -> NaiveDateTime {
    at.checked_add_months(Months::new(1))
        .unwrap_or(NaiveDateTime::MAX)
}

/// Half-open bounds `[first of month, first of next month)` around `at`
pub fn month_bounds(at: NaiveDateTime) -> (NaiveDateTime, NaiveDateTime) {
    let start_date = NaiveDate::from_ymd_opt(at.year(), at.month(), 1).unwrap_or(at.date());
    let end_date = start_date
        .checked_add_months(Months::new(1))
        .unwrap_or(NaiveDate::MAX);
    (
        start_date.and_time(NaiveTime::MIN),
        end_date.and_time(NaiveTime::MIN),
    )
}

/// Start of the day following `date`, used as an exclusive upper bound
pub fn start_of_next_day(date: NaiveDate) -> NaiveDateTime {
    date.succ_opt()
        .unwrap_or(NaiveDate::MAX)
        .and_time(NaiveTime::MIN)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(y: i32, m: u32, d: u32, h: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, 30, 0)
            .unwrap()
    }

    #[test]
    fn test_add_one_month_keeps_day_and_time() {
        assert_eq!(add_one_month(at(2024, 1, 15, 10)), at(2024, 2, 15, 10));
        assert_eq!(add_one_month(at(2024, 12, 5, 8)), at(2025, 1, 5, 8));
    }

    #[test]
    fn test_add_one_month_clamps_month_end() {
        assert_eq!(add_one_month(at(2024, 1, 31, 9)), at(2024, 2, 29, 9));
        assert_eq!(add_one_month(at(2023, 1, 31, 9)), at(2023, 2, 28, 9));
        assert_eq!(add_one_month(at(2024, 3, 31, 9)), at(2024, 4, 30, 9));
    }

    #[test]
    fn test_month_bounds() {
        let (start, end) = month_bounds(at(2024, 2, 17, 13));
        assert_eq!(start, NaiveDate::from_ymd_opt(2024, 2, 1).unwrap().and_time(NaiveTime::MIN));
        assert_eq!(end, NaiveDate::from_ymd_opt(2024, 3, 1).unwrap().and_time(NaiveTime::MIN));

        let (_, end) = month_bounds(at(2024, 12, 31, 23));
        assert_eq!(end, NaiveDate::from_ymd_opt(2025, 1, 1).unwrap().and_time(NaiveTime::MIN));
    }

    #[test]
    fn test_start_of_next_day() {
        let date = NaiveDate::from_ymd_opt(2024, 2, 29).unwrap();
        assert_eq!(
            start_of_next_day(date),
            NaiveDate::from_ymd_opt(2024, 3, 1).unwrap().and_time(NaiveTime::MIN)
        );
    }
}
