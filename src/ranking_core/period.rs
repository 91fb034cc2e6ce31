use chrono::{Datelike, Duration, NaiveDate, Weekday};

/// Accepts `SUN`, `sun`, `Sunday`, ...
pub fn parse_week_day(value: &str) -> Option<Weekday> {
    value.trim().parse::<Weekday>().ok()
}

/// First occurrence of `anchor` on or after `date`
pub fn following(date: NaiveDate, anchor: Weekday) -> NaiveDate {
    let target = anchor.num_days_from_monday() as i64;
    let current = date.weekday().num_days_from_monday() as i64;
    date + Duration::days((7 + target - current) % 7)
}
