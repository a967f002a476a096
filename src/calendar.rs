//! Weekend-only business-day helpers used to default the run's end date and to lay out
//! synthetic data. No holiday calendars.

use chrono::{Datelike, Duration, NaiveDate, Weekday};

pub fn is_business_day(date: NaiveDate) -> bool {
    !matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

/// Last business day strictly before `date` (a "-1 business day, preceding" roll).
pub fn previous_business_day(date: NaiveDate) -> NaiveDate {
    let mut d = date - Duration::days(1);
    while !is_business_day(d) {
        d -= Duration::days(1);
    }
    d
}

/// All business days in `[start, end]`, ascending.
pub fn business_days(start: NaiveDate, end: NaiveDate) -> Vec<NaiveDate> {
    start
        .iter_days()
        .take_while(|d| *d <= end)
        .filter(|d| is_business_day(*d))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_previous_business_day_rolls_over_weekend() {
        // 2024-03-04 is a Monday
        let monday = NaiveDate::from_ymd_opt(2024, 3, 4).unwrap();
        let friday = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        assert_eq!(previous_business_day(monday), friday);

        let sunday = NaiveDate::from_ymd_opt(2024, 3, 3).unwrap();
        assert_eq!(previous_business_day(sunday), friday);

        let wednesday = NaiveDate::from_ymd_opt(2024, 3, 6).unwrap();
        assert_eq!(
            previous_business_day(wednesday),
            NaiveDate::from_ymd_opt(2024, 3, 5).unwrap()
        );
    }

    #[test]
    fn test_business_days_skips_weekends() {
        let start = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        let end = NaiveDate::from_ymd_opt(2024, 3, 11).unwrap();
        let days = business_days(start, end);
        assert_eq!(days.len(), 7);
        assert!(days.iter().all(|d| is_business_day(*d)));
        assert!(business_days(end, start).is_empty());
    }
}
