use std::sync::LazyLock;

use chrono::{Datelike, Duration, NaiveDate, Weekday};
use regex::Regex;

static PARTIAL_DATE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?:(\d{4})-)?(\d{1,2})-(\d{1,2})$").unwrap());

/// Attribute keys that are shorthand for a priority value
pub const PRIORITIES: [&str; 5] = ["critical", "high", "medium", "low", "lowest"];

/// A date-shaped expression that is not a real calendar date
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("'{expression}' is not a valid date")]
pub struct InvalidDate {
    pub expression: String,
}

/// Resolve a date expression relative to `today`.
///
/// Understands `today`, `tomorrow`, `yesterday`, `next week`, weekday names
/// (next occurrence, never today), `MM-DD` (current year) and `YYYY-MM-DD`.
/// Returns `Ok(None)` for anything that is not a date expression.
pub fn complete_date(expression: &str, today: NaiveDate) -> Result<Option<NaiveDate>, InvalidDate> {
    let expr = expression.trim().to_lowercase();
    let relative = match expr.as_str() {
        "today" => Some(today),
        "tomorrow" => Some(today + Duration::days(1)),
        "yesterday" => Some(today - Duration::days(1)),
        "next week" | "nextweek" => Some(today + Duration::days(7)),
        other => parse_weekday(other).map(|weekday| next_weekday(today, weekday)),
    };
    if relative.is_some() {
        return Ok(relative);
    }

    let Some(caps) = PARTIAL_DATE_RE.captures(&expr) else {
        return Ok(None);
    };
    let invalid = || InvalidDate {
        expression: expression.to_string(),
    };
    let year = match caps.get(1) {
        Some(y) => y.as_str().parse::<i32>().map_err(|_| invalid())?,
        None => today.year(),
    };
    let month = caps[2].parse::<u32>().map_err(|_| invalid())?;
    let day = caps[3].parse::<u32>().map_err(|_| invalid())?;
    NaiveDate::from_ymd_opt(year, month, day)
        .map(Some)
        .ok_or_else(invalid)
}

/// `@high` style keys map to a priority word
pub fn complete_priority(key: &str) -> Option<&'static str> {
    PRIORITIES.iter().copied().find(|p| *p == key)
}

pub fn format_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

fn parse_weekday(s: &str) -> Option<Weekday> {
    match s {
        "monday" | "mon" => Some(Weekday::Mon),
        "tuesday" | "tue" => Some(Weekday::Tue),
        "wednesday" | "wed" => Some(Weekday::Wed),
        "thursday" | "thu" => Some(Weekday::Thu),
        "friday" | "fri" => Some(Weekday::Fri),
        "saturday" | "sat" => Some(Weekday::Sat),
        "sunday" | "sun" => Some(Weekday::Sun),
        _ => None,
    }
}

fn next_weekday(today: NaiveDate, weekday: Weekday) -> NaiveDate {
    let from = today.weekday().num_days_from_monday() as i64;
    let to = weekday.num_days_from_monday() as i64;
    let mut delta = (to - from).rem_euclid(7);
    if delta == 0 {
        delta = 7;
    }
    today + Duration::days(delta)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    // 2024-05-15 is a Wednesday
    const TODAY: (i32, u32, u32) = (2024, 5, 15);

    fn today() -> NaiveDate {
        day(TODAY.0, TODAY.1, TODAY.2)
    }

    #[test]
    fn test_relative_words() {
        assert_eq!(complete_date("today", today()), Ok(Some(today())));
        assert_eq!(complete_date("Tomorrow", today()), Ok(Some(day(2024, 5, 16))));
        assert_eq!(complete_date("yesterday", today()), Ok(Some(day(2024, 5, 14))));
        assert_eq!(complete_date("next week", today()), Ok(Some(day(2024, 5, 22))));
    }

    #[test]
    fn test_weekdays_are_in_the_future() {
        assert_eq!(complete_date("friday", today()), Ok(Some(day(2024, 5, 17))));
        assert_eq!(complete_date("mon", today()), Ok(Some(day(2024, 5, 20))));
        assert_eq!(complete_date("wednesday", today()), Ok(Some(day(2024, 5, 22))));
    }

    #[test]
    fn test_partial_dates() {
        assert_eq!(complete_date("12-25", today()), Ok(Some(day(2024, 12, 25))));
        assert_eq!(complete_date("2025-1-5", today()), Ok(Some(day(2025, 1, 5))));
        assert_eq!(complete_date("2024-05-15", today()), Ok(Some(today())));
    }

    #[test]
    fn test_invalid_calendar_date() {
        let err = complete_date("02-30", today()).unwrap_err();
        assert_eq!(err.expression, "02-30");
    }

    #[test]
    fn test_not_a_date() {
        assert_eq!(complete_date("high", today()), Ok(None));
        assert_eq!(complete_date("3h", today()), Ok(None));
        assert_eq!(complete_date("42", today()), Ok(None));
    }

    #[test]
    fn test_priority_keys() {
        assert_eq!(complete_priority("high"), Some("high"));
        assert_eq!(complete_priority("urgent"), None);
    }
}
