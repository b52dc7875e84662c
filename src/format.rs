//! Display formatting for amounts, dates and elapsed time (fr-FR)

use crate::error::{ClientError, Result};
use chrono::{DateTime, Locale, NaiveDate, NaiveDateTime, Utc};
use std::fmt;

/// Label used when no currency is given
pub const DEFAULT_CURRENCY: &str = "FCFA";

const LOCALE: Locale = Locale::fr_FR;
/// fr-FR groups thousands with a narrow no-break space
const GROUP_SEPARATOR: char = '\u{202F}';
/// and separates the amount from the currency with a no-break space
const CURRENCY_SEPARATOR: char = '\u{A0}';
const DAY_MS: i64 = 24 * 60 * 60 * 1000;

/// Format an amount with thousands separators and a currency label
///
/// Non-finite amounts are formatted as 0. `XAF`, `XOF` and `FCFA` (or an empty
/// currency) display as `FCFA` without decimals; any other currency code is
/// shown as given with two decimals.
pub fn format_currency(amount: f64, currency: &str) -> String {
    let amount = if amount.is_finite() { amount } else { 0.0 };
    let (label, fraction_digits) = currency_display(currency);

    let rounded = format!("{:.*}", fraction_digits, amount.abs());
    let (integer, fraction) = rounded.split_once('.').unwrap_or((rounded.as_str(), ""));

    let mut out = String::new();
    if amount < 0.0 && rounded.bytes().any(|b| b.is_ascii_digit() && b != b'0') {
        out.push('-');
    }
    out.push_str(&group_thousands(integer));
    if !fraction.is_empty() {
        out.push(',');
        out.push_str(fraction);
    }
    out.push(CURRENCY_SEPARATOR);
    out.push_str(&label);
    out
}

/// Like [`format_currency`] for raw text input; anything unparseable is 0
pub fn format_currency_str(raw: &str, currency: &str) -> String {
    let cleaned: String = raw
        .trim()
        .chars()
        .filter(|c| !c.is_whitespace() && *c != GROUP_SEPARATOR && *c != CURRENCY_SEPARATOR)
        .map(|c| if c == ',' { '.' } else { c })
        .collect();
    format_currency(cleaned.parse().unwrap_or(0.0), currency)
}

fn currency_display(currency: &str) -> (String, usize) {
    let code = currency.trim().to_ascii_uppercase();
    match code.as_str() {
        "" | "XAF" | "XOF" | "FCFA" => (DEFAULT_CURRENCY.to_string(), 0),
        _ => (code, 2),
    }
}

fn group_thousands(digits: &str) -> String {
    let len = digits.len();
    let mut out = String::with_capacity(len + len / 3 * GROUP_SEPARATOR.len_utf8());
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            out.push(GROUP_SEPARATOR);
        }
        out.push(ch);
    }
    out
}

/// Parse a backend timestamp
///
/// Accepts RFC 3339, naive `YYYY-MM-DDTHH:MM:SS[.f]` (taken as UTC) and plain
/// `YYYY-MM-DD` (midnight UTC).
pub fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>> {
    let raw = raw.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.with_timezone(&Utc));
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Ok(naive.and_utc());
        }
    }
    if let Some(naive) = NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
    {
        return Ok(naive.and_utc());
    }

    Err(ClientError::InvalidDate(raw.to_string()))
}

/// Long-form date, e.g. `18 octobre 2026`
pub fn format_date(raw: &str) -> Result<String> {
    Ok(format_long_date(parse_timestamp(raw)?))
}

pub fn format_long_date(date: DateTime<Utc>) -> String {
    date.format_localized("%-d %B %Y", LOCALE).to_string()
}

/// Elapsed time bucket
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelativeTime {
    /// Less than a minute ago, or in the future
    JustNow,
    Minutes(i64),
    Hours(i64),
    Days(i64),
    /// A week or more ago
    Date(DateTime<Utc>),
}

impl fmt::Display for RelativeTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RelativeTime::JustNow => f.write_str("À l'instant"),
            RelativeTime::Minutes(m) => write!(f, "{m} min"),
            RelativeTime::Hours(h) => write!(f, "{h} h"),
            RelativeTime::Days(d) => write!(f, "{d} j"),
            RelativeTime::Date(date) => write!(f, "{}", date.format_localized("%-d %b", LOCALE)),
        }
    }
}

/// Bucket the time elapsed between `then` and `now`
pub fn relative_time_at(then: DateTime<Utc>, now: DateTime<Utc>) -> RelativeTime {
    let elapsed = now - then;
    let minutes = elapsed.num_minutes();

    if minutes < 1 {
        RelativeTime::JustNow
    } else if minutes < 60 {
        RelativeTime::Minutes(minutes)
    } else if elapsed.num_hours() < 24 {
        RelativeTime::Hours(elapsed.num_hours())
    } else if elapsed.num_days() < 7 {
        RelativeTime::Days(elapsed.num_days())
    } else {
        RelativeTime::Date(then)
    }
}

pub fn relative_time(then: DateTime<Utc>) -> RelativeTime {
    relative_time_at(then, Utc::now())
}

/// Relative time for a raw timestamp; empty for empty or unparseable input
pub fn format_relative_time(raw: &str) -> String {
    if raw.trim().is_empty() {
        return String::new();
    }
    parse_timestamp(raw)
        .map(|then| relative_time(then).to_string())
        .unwrap_or_default()
}

/// Whole days left until `end`, rounded up, never negative
pub fn days_remaining_at(end: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    let remaining_ms = (end - now).num_milliseconds();
    if remaining_ms <= 0 {
        0
    } else {
        (remaining_ms + DAY_MS - 1) / DAY_MS
    }
}

pub fn days_remaining(end: &str) -> Result<i64> {
    Ok(days_remaining_at(parse_timestamp(end)?, Utc::now()))
}

/// `current / goal * 100`, or 0 when there is no usable goal
pub fn funding_percentage(current: f64, goal: f64) -> f64 {
    if goal == 0.0 || !goal.is_finite() || !current.is_finite() {
        return 0.0;
    }
    current / goal * 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 18, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_format_currency_fcfa() {
        assert_eq!(
            format_currency(1_234_567.0, "XAF"),
            "1\u{202F}234\u{202F}567\u{A0}FCFA"
        );
        assert_eq!(format_currency(999.6, DEFAULT_CURRENCY), "1\u{202F}000\u{A0}FCFA");
        assert_eq!(format_currency(-1500.0, "xof"), "-1\u{202F}500\u{A0}FCFA");
        assert_eq!(format_currency(0.0, ""), "0\u{A0}FCFA");
    }

    #[test]
    fn test_format_currency_other_codes() {
        assert_eq!(format_currency(1234.5, "EUR"), "1\u{202F}234,50\u{A0}EUR");
        assert_eq!(format_currency(0.004, "usd"), "0,00\u{A0}USD");
    }

    #[test]
    fn test_format_currency_never_fails() {
        for amount in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY, f64::MAX, f64::MIN, -0.0, 1e-12] {
            for currency in ["FCFA", "XAF", "EUR", ""] {
                let out = format_currency(amount, currency);
                let label = if currency == "EUR" { "EUR" } else { "FCFA" };
                assert!(out.ends_with(label), "{out}");
            }
        }
        assert_eq!(format_currency(f64::NAN, "FCFA"), "0\u{A0}FCFA");
    }

    #[test]
    fn test_format_currency_large_amounts() {
        assert_eq!(
            format_currency(1e20, "FCFA"),
            "100\u{202F}000\u{202F}000\u{202F}000\u{202F}000\u{202F}000\u{202F}000\u{A0}FCFA"
        );
        assert_eq!(
            format_currency(1e18, "EUR"),
            "1\u{202F}000\u{202F}000\u{202F}000\u{202F}000\u{202F}000\u{202F}000,00\u{A0}EUR"
        );
        let max = format_currency(f64::MAX, "FCFA");
        assert!(max.starts_with("179\u{202F}769\u{202F}313"), "{max}");
        assert!(!max.contains("18\u{202F}446\u{202F}744"), "{max}");
    }

    #[test]
    fn test_format_currency_str() {
        assert_eq!(format_currency_str("abc", "FCFA"), "0\u{A0}FCFA");
        assert_eq!(format_currency_str("", "FCFA"), "0\u{A0}FCFA");
        assert_eq!(format_currency_str(" 250000 ", "FCFA"), "250\u{202F}000\u{A0}FCFA");
        assert_eq!(format_currency_str("12,5", "EUR"), "12,50\u{A0}EUR");
    }

    #[test]
    fn test_parse_timestamp() {
        let expected = Utc.with_ymd_and_hms(2026, 10, 18, 9, 30, 0).unwrap();
        assert_eq!(parse_timestamp("2026-10-18T09:30:00Z").unwrap(), expected);
        assert_eq!(parse_timestamp("2026-10-18T10:30:00+01:00").unwrap(), expected);
        assert_eq!(parse_timestamp("2026-10-18T09:30:00").unwrap(), expected);
        assert_eq!(parse_timestamp("2026-10-18T09:30:00.250").unwrap(), expected + Duration::milliseconds(250));
        assert_eq!(
            parse_timestamp("2026-10-18").unwrap(),
            Utc.with_ymd_and_hms(2026, 10, 18, 0, 0, 0).unwrap()
        );
        assert!(matches!(parse_timestamp("hier"), Err(ClientError::InvalidDate(_))));
    }

    #[test]
    fn test_format_date() {
        assert_eq!(format_date("2026-10-18").unwrap(), "18 octobre 2026");
        assert_eq!(format_date("2025-01-01T08:00:00Z").unwrap(), "1 janvier 2025");
        assert!(format_date("not a date").is_err());
    }

    #[test]
    fn test_relative_time_buckets() {
        let now = now();
        assert_eq!(relative_time_at(now - Duration::seconds(45), now), RelativeTime::JustNow);
        assert_eq!(relative_time_at(now - Duration::seconds(90), now), RelativeTime::Minutes(1));
        assert_eq!(relative_time_at(now - Duration::minutes(59), now), RelativeTime::Minutes(59));
        assert_eq!(relative_time_at(now - Duration::hours(3), now), RelativeTime::Hours(3));
        assert_eq!(relative_time_at(now - Duration::days(2), now), RelativeTime::Days(2));

        let old = now - Duration::days(15);
        assert_eq!(relative_time_at(old, now), RelativeTime::Date(old));

        // future timestamps are not negative durations
        assert_eq!(relative_time_at(now + Duration::hours(1), now), RelativeTime::JustNow);
    }

    #[test]
    fn test_relative_time_display() {
        assert_eq!(RelativeTime::JustNow.to_string(), "À l'instant");
        assert_eq!(RelativeTime::Minutes(5).to_string(), "5 min");
        assert_eq!(RelativeTime::Hours(3).to_string(), "3 h");
        assert_eq!(RelativeTime::Days(2).to_string(), "2 j");

        let date = Utc.with_ymd_and_hms(2026, 10, 3, 0, 0, 0).unwrap();
        let shown = RelativeTime::Date(date).to_string();
        assert!(shown.starts_with("3 oct"), "{shown}");
    }

    #[test]
    fn test_format_relative_time_lenient() {
        assert_eq!(format_relative_time(""), "");
        assert_eq!(format_relative_time("garbage"), "");
        let just_now = Utc::now().to_rfc3339();
        assert_eq!(format_relative_time(&just_now), "À l'instant");
    }

    #[test]
    fn test_days_remaining() {
        let now = now();
        assert_eq!(days_remaining_at(now + Duration::days(10), now), 10);
        assert_eq!(days_remaining_at(now + Duration::hours(1), now), 1);
        assert_eq!(days_remaining_at(now + Duration::days(1) + Duration::seconds(1), now), 2);
        assert_eq!(days_remaining_at(now, now), 0);
        assert_eq!(days_remaining_at(now - Duration::days(3), now), 0);
    }

    #[test]
    fn test_days_remaining_monotonic() {
        let end = now() + Duration::days(5);
        let mut previous = i64::MAX;
        for hour in 0..(24 * 8) {
            let remaining = days_remaining_at(end, now() + Duration::hours(hour));
            assert!(remaining >= 0);
            assert!(remaining <= previous);
            previous = remaining;
        }
        assert_eq!(previous, 0);
    }

    #[test]
    fn test_funding_percentage() {
        assert_eq!(funding_percentage(250_000.0, 1_000_000.0), 25.0);
        assert_eq!(funding_percentage(1_500.0, 1_000.0), 150.0);
        for current in [0.0, 1.0, -5.0, 1e12] {
            assert_eq!(funding_percentage(current, 0.0), 0.0);
        }
        assert_eq!(funding_percentage(10.0, f64::NAN), 0.0);
    }
}
