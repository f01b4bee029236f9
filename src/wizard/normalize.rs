//! Normalizers turning free-text chat input into typed values.
//!
//! Both functions are total: bad input returns `None`, which the wizard
//! answers with a re-prompt.

use std::sync::LazyLock;

use chrono::{Datelike, Local, NaiveDate};
use regex::Regex;

static DAY_MONTH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d{1,2})\.(\d{1,2})$").unwrap());

/// Parse a date reply: "today", "yesterday" (case-insensitive) or `DD.MM`
/// with the current year substituted.
pub fn normalize_date(text: &str) -> Option<NaiveDate> {
    normalize_date_with(Local::now().date_naive(), text)
}

/// Same as [`normalize_date`] with an explicit reference date, so tests do
/// not depend on the wall clock.
pub fn normalize_date_with(today: NaiveDate, text: &str) -> Option<NaiveDate> {
    let text = text.trim();

    if text.eq_ignore_ascii_case("today") {
        return Some(today);
    }
    if text.eq_ignore_ascii_case("yesterday") {
        return today.pred_opt();
    }

    let caps = DAY_MONTH.captures(text)?;
    let day: u32 = caps[1].parse().ok()?;
    let month: u32 = caps[2].parse().ok()?;

    // Rejects calendar-invalid combinations like 31.04 or 29.02 outside leap years
    NaiveDate::from_ymd_opt(today.year(), month, day)
}

/// Parse an amount reply as a plain decimal number, rounded to one
/// fractional digit. Accepts a decimal comma. Negative values are allowed.
pub fn normalize_amount(text: &str) -> Option<f64> {
    let cleaned = text.trim().replace(',', ".");
    let value: f64 = cleaned.parse().ok()?;
    if !value.is_finite() {
        return None;
    }
    Some((value * 10.0).round() / 10.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_today() {
        let today = day(2026, 8, 6);
        assert_eq!(normalize_date_with(today, "today"), Some(today));
        assert_eq!(normalize_date_with(today, "TODAY"), Some(today));
        assert_eq!(normalize_date_with(today, "  Today "), Some(today));
    }

    #[test]
    fn test_yesterday() {
        let today = day(2026, 8, 6);
        assert_eq!(normalize_date_with(today, "yesterday"), Some(day(2026, 8, 5)));
        assert_eq!(normalize_date_with(today, "YESTERDAY"), Some(day(2026, 8, 5)));
    }

    #[test]
    fn test_yesterday_crosses_month_boundary() {
        assert_eq!(
            normalize_date_with(day(2026, 3, 1), "yesterday"),
            Some(day(2026, 2, 28))
        );
    }

    #[test]
    fn test_day_month_gets_current_year() {
        assert_eq!(
            normalize_date_with(day(2026, 8, 6), "15.06"),
            Some(day(2026, 6, 15))
        );
        // single-digit day and month accepted
        assert_eq!(
            normalize_date_with(day(2026, 8, 6), "3.1"),
            Some(day(2026, 1, 3))
        );
    }

    #[test]
    fn test_feb_29_only_in_leap_years() {
        // 2026 is not a leap year
        assert_eq!(normalize_date_with(day(2026, 8, 6), "29.02"), None);
        // 2028 is
        assert_eq!(
            normalize_date_with(day(2028, 8, 6), "29.02"),
            Some(day(2028, 2, 29))
        );
    }

    #[test]
    fn test_no_april_31() {
        assert_eq!(normalize_date_with(day(2026, 8, 6), "31.04"), None);
    }

    #[test]
    fn test_garbage_dates_rejected() {
        let today = day(2026, 8, 6);
        assert_eq!(normalize_date_with(today, "tomorrow"), None);
        assert_eq!(normalize_date_with(today, "15/06"), None);
        assert_eq!(normalize_date_with(today, "15.06.2026"), None);
        assert_eq!(normalize_date_with(today, "99.99"), None);
        assert_eq!(normalize_date_with(today, ""), None);
    }

    #[test]
    fn test_amount_rounds_to_one_decimal() {
        assert_eq!(normalize_amount("12.345"), Some(12.3));
        assert_eq!(normalize_amount("12.35"), Some(12.4));
        assert_eq!(normalize_amount("23.50"), Some(23.5));
    }

    #[test]
    fn test_amount_plain_integers() {
        assert_eq!(normalize_amount("100"), Some(100.0));
        assert_eq!(normalize_amount("-5"), Some(-5.0));
    }

    #[test]
    fn test_amount_decimal_comma() {
        assert_eq!(normalize_amount("12,5"), Some(12.5));
    }

    #[test]
    fn test_amount_rejects_non_numbers() {
        assert_eq!(normalize_amount("abc"), None);
        assert_eq!(normalize_amount("12 euro"), None);
        assert_eq!(normalize_amount(""), None);
        assert_eq!(normalize_amount("inf"), None);
        assert_eq!(normalize_amount("NaN"), None);
    }
}
