//! Field-level similarity heuristics.
//!
//! Scores how alike two attribute values of the same logical field are,
//! on a [0,100] scale. Dispatch is driven by the value kind first and the
//! field name second:
//!
//! - identical values (including both null/absent) score 100, a null
//!   against a non-null scores 0, and differing primitive kinds score 0
//! - string fields named like URLs, filenames, or timestamps are
//!   normalized before falling back to edit-distance similarity
//! - numeric fields are scored by relative difference against the
//!   magnitude of their mean
//! - structured values only match on canonical byte-equality; there is no
//!   deep partial credit
//!
//! All comparisons are pure and symmetric in their two value arguments.

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde_json::Value;
use url::Url;

use super::models::canonical_json;

pub mod constants {
    /// Score for identical or instant-equal values.
    pub const EXACT_SCORE: f64 = 100.0;

    /// Score for URL fields matching after query-string stripping.
    pub const URL_NORMALIZED_SCORE: f64 = 95.0;

    /// Score for file/name fields matching on the stem before the first dot.
    pub const FILENAME_NORMALIZED_SCORE: f64 = 90.0;

    /// Per-field score above which a field counts as matching.
    pub const FIELD_MATCH_THRESHOLD: f64 = 80.0;
}

/// Compare two attribute values of the field `field_name`.
///
/// Absent values are treated as null: two absents match exactly, an
/// absent against a present value does not match at all.
pub fn compare_field(field_name: &str, a: Option<&Value>, b: Option<&Value>) -> f64 {
    let a = a.unwrap_or(&Value::Null);
    let b = b.unwrap_or(&Value::Null);

    match (a, b) {
        (Value::Null, Value::Null) => constants::EXACT_SCORE,
        (Value::Null, _) | (_, Value::Null) => 0.0,
        (Value::Bool(x), Value::Bool(y)) => {
            if x == y {
                constants::EXACT_SCORE
            } else {
                0.0
            }
        }
        (Value::Number(x), Value::Number(y)) => {
            match (x.as_f64(), y.as_f64()) {
                (Some(x), Some(y)) => compare_numbers(x, y),
                _ => 0.0,
            }
        }
        (Value::String(x), Value::String(y)) => compare_strings(field_name, x, y),
        (Value::Object(_) | Value::Array(_), Value::Object(_) | Value::Array(_)) => {
            compare_structured(a, b)
        }
        // Differing primitive kinds never match.
        _ => 0.0,
    }
}

/// Relative-difference score for numeric values.
///
/// Equal values score 100. Otherwise the absolute difference is measured
/// against the magnitude of the mean: `100 - 100*|a-b| / |(a+b)/2|`,
/// clamped at 0. A zero mean with unequal values (one side zero, or exact
/// opposites) scores 0.
fn compare_numbers(a: f64, b: f64) -> f64 {
    if a == b {
        return constants::EXACT_SCORE;
    }
    let mean = ((a + b) / 2.0).abs();
    if mean == 0.0 {
        return 0.0;
    }
    (100.0 - 100.0 * (a - b).abs() / mean).max(0.0)
}

fn compare_strings(field_name: &str, a: &str, b: &str) -> f64 {
    if a == b {
        return constants::EXACT_SCORE;
    }

    let field = field_name.to_lowercase();

    if (field.contains("url") || field.contains("link")) && strip_query(a) == strip_query(b) {
        return constants::URL_NORMALIZED_SCORE;
    }

    if (field.contains("file") || field.contains("name")) && stem(a) == stem(b) {
        return constants::FILENAME_NORMALIZED_SCORE;
    }

    if field.contains("date") || field.contains("time") {
        // Parse failure on either side falls through to edit distance.
        if let (Some(x), Some(y)) = (parse_instant_str(a), parse_instant_str(b)) {
            if x == y {
                return constants::EXACT_SCORE;
            }
        }
    }

    levenshtein_similarity(a, b)
}

fn compare_structured(a: &Value, b: &Value) -> f64 {
    let canonical = |value: &Value| match value {
        Value::Object(map) => canonical_json(map),
        other => serde_json::to_string(other).unwrap_or_default(),
    };
    if canonical(a) == canonical(b) {
        constants::EXACT_SCORE
    } else {
        0.0
    }
}

/// Normalized Levenshtein similarity: `round(100 * (maxLen - distance) / maxLen)`.
/// Two empty strings are identical and score 100.
fn levenshtein_similarity(a: &str, b: &str) -> f64 {
    let max_len = a.chars().count().max(b.chars().count());
    if max_len == 0 {
        return constants::EXACT_SCORE;
    }
    let distance = strsim::levenshtein(a, b);
    (100.0 * (max_len - distance) as f64 / max_len as f64).round()
}

/// Drop the query-string portion of a URL-shaped value. Values that do not
/// parse as URLs are split at the first '?' instead.
fn strip_query(value: &str) -> String {
    if let Ok(mut url) = Url::parse(value) {
        url.set_query(None);
        return url.to_string();
    }
    value.split('?').next().unwrap_or(value).to_string()
}

/// The substring before the first '.' of a filename-shaped value.
fn stem(value: &str) -> &str {
    value.split('.').next().unwrap_or(value)
}

/// Parse a calendar timestamp from a string, accepting RFC 3339,
/// `YYYY-MM-DD`, and `YYYY-MM-DD HH:MM:SS`.
pub(crate) fn parse_instant_str(value: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(ndt) = NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S") {
        return Some(Utc.from_utc_datetime(&ndt));
    }
    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return date.and_hms_opt(0, 0, 0).map(|ndt| Utc.from_utc_datetime(&ndt));
    }
    None
}

/// Parse a calendar timestamp from an attribute value. Numbers are read as
/// Unix epochs, in milliseconds when above 10^12 and seconds otherwise.
pub(crate) fn parse_instant(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::String(s) => parse_instant_str(s),
        Value::Number(n) => {
            let epoch = n.as_f64()?;
            if epoch.abs() >= 1e12 {
                Utc.timestamp_millis_opt(epoch as i64).single()
            } else {
                Utc.timestamp_opt(epoch as i64, 0).single()
            }
        }
        _ => None,
    }
}
