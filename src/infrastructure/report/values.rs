// ============================================================
// CELL VALUE COERCION
// ============================================================
// Permissive conversions for report cells; failures become None

use chrono::{NaiveDate, NaiveDateTime};
use once_cell::sync::Lazy;
use regex::Regex;

static NON_NUMERIC: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^\d.]").unwrap());

/// Date formats seen in Siteimprove exports, tried in order.
/// The flag marks formats that carry a time component.
const DATE_FORMATS: &[(&str, bool)] = &[
    ("%m/%d/%Y %I:%M:%S %p", true), // "1/3/2025 8:51:10 AM"
    ("%m/%d/%Y %H:%M:%S", true),
    ("%m/%d/%Y %H:%M", true),
    ("%m/%d/%Y %I:%M %p", true),
    ("%m/%d/%Y", false),
    ("%Y-%m-%d %H:%M:%S", true),
    ("%Y-%m-%d %H:%M", true),
    ("%Y-%m-%d", false),
    ("%d/%m/%Y %H:%M:%S", true),
    ("%d/%m/%Y", false),
];

/// Trim a cell and strip quotes; empty and "nan" cells become None
pub fn clean_value(value: Option<&str>) -> Option<String> {
    let value = value?.trim();
    if value.is_empty() || value.eq_ignore_ascii_case("nan") {
        return None;
    }
    let cleaned = value.replace('"', "").trim().to_string();
    if cleaned.is_empty() {
        None
    } else {
        Some(cleaned)
    }
}

/// Extract an integer from a cell such as "1,234" or "12.0"
pub fn safe_int(value: Option<&str>) -> Option<i64> {
    let digits = NON_NUMERIC.replace_all(value?, "");
    if digits.is_empty() {
        return None;
    }
    digits
        .parse::<f64>()
        .ok()
        .filter(|f| f.is_finite())
        .map(|f| f.trunc() as i64)
}

/// Parse a report date, trying every known format
pub fn parse_date(value: Option<&str>) -> Option<NaiveDateTime> {
    let value = value?.trim().replace('"', "");
    if value.is_empty() {
        return None;
    }

    let parsed = DATE_FORMATS.iter().find_map(|(format, has_time)| {
        if *has_time {
            NaiveDateTime::parse_from_str(&value, format).ok()
        } else {
            NaiveDate::parse_from_str(&value, format)
                .ok()
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        }
    });

    if parsed.is_none() {
        tracing::warn!(value = %value, "Could not parse date");
    }
    parsed
}
