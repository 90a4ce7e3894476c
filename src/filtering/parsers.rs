//! Typed parsing of raw query values, driven by the declared [`FieldType`].
//!
//! Search terms and filter values follow separate rules: search parsing
//! never sees the `null` sentinel, filter parsing accepts already typed
//! values and an injectable date parser.

use crate::config::DateParser;
use crate::errors::{QueryBuilderError, QueryResult};
use crate::models::{FieldType, FilterFieldSpec, QueryValue, SearchFieldSpec};

use super::value::{FilterValue, number_from_str, parse_iso_date};

/// Parse a trimmed search term for one search field.
pub fn parse_search_value(raw: &str, spec: &SearchFieldSpec) -> QueryResult<FilterValue> {
    match spec.field_type {
        FieldType::Number => number_from_str(raw)
            .ok_or_else(|| QueryBuilderError::invalid_search_number(&spec.field, raw)),
        FieldType::Boolean => match raw {
            "true" | "1" => Ok(FilterValue::Bool(true)),
            "false" | "0" => Ok(FilterValue::Bool(false)),
            _ => Err(QueryBuilderError::invalid_search_boolean(&spec.field, raw)),
        },
        FieldType::Enum => match &spec.enum_values {
            Some(allowed) if !allowed.iter().any(|member| member == raw) => Err(
                QueryBuilderError::invalid_search_enum(&spec.field, raw, allowed.clone()),
            ),
            _ => Ok(FilterValue::String(raw.to_string())),
        },
        FieldType::String | FieldType::Date => Ok(FilterValue::String(raw.to_string())),
    }
}

/// `true` when the value is the `null` sentinel that clears a filter.
fn is_null_sentinel(value: &QueryValue) -> bool {
    match value {
        QueryValue::Null => true,
        QueryValue::Text(text) => text.trim().eq_ignore_ascii_case("null"),
        _ => false,
    }
}

/// Parse one filter value for `spec`.
///
/// `List` values are rejected here; membership lists are split by the caller.
pub fn parse_filter_value(
    value: &QueryValue,
    spec: &FilterFieldSpec,
    date_parser: Option<&DateParser>,
) -> QueryResult<FilterValue> {
    if is_null_sentinel(value) {
        return Ok(FilterValue::Null);
    }

    match spec.field_type {
        FieldType::Number => parse_number(value, spec),
        FieldType::Boolean => parse_boolean(value, spec),
        FieldType::Date => parse_date(value, spec, date_parser),
        FieldType::Enum => parse_enum(value, spec),
        FieldType::String => Ok(match value {
            QueryValue::Bool(flag) => FilterValue::Bool(*flag),
            QueryValue::Number(number) => FilterValue::from_f64(*number),
            other => FilterValue::String(other.to_string()),
        }),
    }
}

fn parse_number(value: &QueryValue, spec: &FilterFieldSpec) -> QueryResult<FilterValue> {
    let parsed = match value {
        QueryValue::Number(number) if number.is_finite() => Some(FilterValue::from_f64(*number)),
        QueryValue::Text(text) => number_from_str(text),
        _ => None,
    };
    parsed.ok_or_else(|| QueryBuilderError::invalid_filter_value(&spec.field, value.to_string()))
}

fn parse_boolean(value: &QueryValue, spec: &FilterFieldSpec) -> QueryResult<FilterValue> {
    match value {
        QueryValue::Bool(flag) => Ok(FilterValue::Bool(*flag)),
        QueryValue::Text(text) => match text.trim() {
            "true" | "1" => Ok(FilterValue::Bool(true)),
            "false" | "0" => Ok(FilterValue::Bool(false)),
            _ => Err(QueryBuilderError::invalid_boolean(&spec.field, text.as_str())),
        },
        other => Err(QueryBuilderError::invalid_boolean(&spec.field, other.to_string())),
    }
}

#[allow(clippy::cast_possible_truncation)]
fn parse_date(
    value: &QueryValue,
    spec: &FilterFieldSpec,
    date_parser: Option<&DateParser>,
) -> QueryResult<FilterValue> {
    let parsed = match value {
        QueryValue::Text(text) => match date_parser {
            Some(parser) => parser(text.as_str()),
            None => parse_iso_date(text),
        },
        // Epoch milliseconds
        QueryValue::Number(millis) if millis.is_finite() => {
            chrono::DateTime::from_timestamp_millis(*millis as i64)
        }
        _ => None,
    };
    parsed
        .map(FilterValue::Date)
        .ok_or_else(|| QueryBuilderError::invalid_date(&spec.field, value.to_string()))
}

fn parse_enum(value: &QueryValue, spec: &FilterFieldSpec) -> QueryResult<FilterValue> {
    let text = value.to_string();
    match &spec.enum_values {
        Some(allowed) if !allowed.contains(&text) => Err(QueryBuilderError::invalid_enum(
            &spec.field,
            text,
            allowed.clone(),
        )),
        _ => Ok(FilterValue::String(text)),
    }
}
