use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

/// A typed value placed into a predicate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FilterValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    /// Serialized as RFC 3339
    Date(DateTime<Utc>),
}

// Largest magnitude an f64 holds without losing integer precision.
const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_991.0;

impl FilterValue {
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Integral floats collapse to `Int`.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn from_f64(number: f64) -> Self {
        if number.fract() == 0.0 && number.abs() <= MAX_SAFE_INTEGER {
            Self::Int(number as i64)
        } else {
            Self::Float(number)
        }
    }
}

impl From<bool> for FilterValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i32> for FilterValue {
    fn from(v: i32) -> Self {
        Self::Int(i64::from(v))
    }
}

impl From<i64> for FilterValue {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<f64> for FilterValue {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<String> for FilterValue {
    fn from(v: String) -> Self {
        Self::String(v)
    }
}

impl From<&str> for FilterValue {
    fn from(v: &str) -> Self {
        Self::String(v.to_string())
    }
}

impl From<DateTime<Utc>> for FilterValue {
    fn from(v: DateTime<Utc>) -> Self {
        Self::Date(v)
    }
}

impl<T: Into<FilterValue>> From<Option<T>> for FilterValue {
    fn from(v: Option<T>) -> Self {
        v.map_or(Self::Null, Into::into)
    }
}

/// Parse a finite decimal number, `None` when blank or not numeric.
#[must_use]
pub fn number_from_str(raw: &str) -> Option<FilterValue> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    if let Ok(int) = trimmed.parse::<i64>() {
        return Some(FilterValue::Int(int));
    }
    let number = trimmed.parse::<f64>().ok()?;
    number.is_finite().then(|| FilterValue::from_f64(number))
}

/// Default date parser: RFC 3339, bare ISO date-times (read as UTC),
/// `YYYY-MM-DD` (midnight UTC) and RFC 2822.
#[must_use]
pub fn parse_iso_date(raw: &str) -> Option<DateTime<Utc>> {
    let trimmed = raw.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(parsed.with_timezone(&Utc));
    }
    for format in [
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%dT%H:%M",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%d %H:%M:%S",
    ] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(trimmed, format) {
            return Some(naive.and_utc());
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        return date.and_hms_opt(0, 0, 0).map(|naive| naive.and_utc());
    }
    DateTime::parse_from_rfc2822(trimmed)
        .ok()
        .map(|parsed| parsed.with_timezone(&Utc))
}
