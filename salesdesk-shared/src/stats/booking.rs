use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Serialize};

/// Confirmed bookings required per week.
pub const MIN_WEEKLY_BOOKINGS: i64 = 2;

/// The Monday-to-Sunday week containing `day`. Monday is day 1; a Sunday
/// belongs to the week that started six days earlier.
pub fn week_range(day: NaiveDate) -> (NaiveDate, NaiveDate) {
    let monday = day - Duration::days(i64::from(day.weekday().num_days_from_monday()));
    (monday, monday + Duration::days(6))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeeklySummary {
    pub week_start: NaiveDate,
    pub week_end: NaiveDate,
    pub total_bookings: i64,
    pub meets_minimum_requirement: bool,
}

/// Evaluate the minimum-bookings policy for the week containing
/// `week_start` (any day of the week is accepted and snapped to Monday).
pub fn weekly_summary(week_start: NaiveDate, total_bookings: i64) -> WeeklySummary {
    let (start, end) = week_range(week_start);
    WeeklySummary {
        week_start: start,
        week_end: end,
        total_bookings,
        meets_minimum_requirement: total_bookings >= MIN_WEEKLY_BOOKINGS,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn week_starts_on_monday() {
        // 2026-06-10 is a Wednesday.
        let (start, end) = week_range(d(2026, 6, 10));
        assert_eq!(start, d(2026, 6, 8));
        assert_eq!(end, d(2026, 6, 14));
    }

    #[test]
    fn sunday_belongs_to_the_previous_monday() {
        // 2026-06-14 is a Sunday.
        let (start, end) = week_range(d(2026, 6, 14));
        assert_eq!(start, d(2026, 6, 8));
        assert_eq!(end, d(2026, 6, 14));
    }

    #[test]
    fn monday_is_its_own_week_start() {
        let (start, _) = week_range(d(2026, 6, 8));
        assert_eq!(start, d(2026, 6, 8));
    }

    #[test]
    fn two_bookings_meet_the_minimum() {
        assert!(weekly_summary(d(2026, 6, 8), 2).meets_minimum_requirement);
        assert!(!weekly_summary(d(2026, 6, 8), 1).meets_minimum_requirement);
        assert!(!weekly_summary(d(2026, 6, 8), 0).meets_minimum_requirement);
    }
}
