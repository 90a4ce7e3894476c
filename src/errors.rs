//! # Error Handling for Query Translation
//!
//! Every failure of [`build_query`](crate::build_query) surfaces as a single
//! [`QueryBuilderError`] carrying a machine-readable [`ErrorCode`], a
//! user-facing message and optional structured [`ErrorDetails`] (allowed keys,
//! allowed enum members, skipped search fields) so handlers can render a
//! precise message without parsing text.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use axum::{Json, extract::Query};
//! use querycrate::{QueryBuilderError, QueryOptions, build_query, query_from_pairs};
//!
//! async fn list_posts(
//!     Query(params): Query<Vec<(String, String)>>,
//! ) -> Result<Json<serde_json::Value>, QueryBuilderError> {
//!     let options = QueryOptions::new(query_from_pairs(params)).config(post_config());
//!     let built = build_query(&options)?;
//!     Ok(Json(built.to_json()))
//! }
//! ```
//!
//! With the `axum` feature (enabled by default) the error converts into a
//! `400 Bad Request` response whose body is `{"error", "code", "details"}`.

use serde::Serialize;
use std::fmt;

use crate::models::IgnoredSearchField;

/// Result type for query translation.
pub type QueryResult<T> = Result<T, QueryBuilderError>;

/// Machine-readable failure codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub enum ErrorCode {
    /// Strict mode saw a query key outside the allow-set.
    InvalidFilterKey,
    /// A typed search field declares a string operator.
    InvalidSearchOperatorUsage,
    /// A string search field declares an unknown operator.
    InvalidSearchOperator,
    /// Every configured search field rejected the search term.
    InvalidSearchValue,
    InvalidSearchNumber,
    InvalidSearchBoolean,
    InvalidSearchEnum,
    /// An exact filter key was combined with `_min`/`_max`.
    InvalidRangeUsage,
    InvalidBoolean,
    InvalidDate,
    InvalidEnum,
    /// A numeric filter value is not a finite number.
    InvalidFilterValue,
    /// A sort key has no configured sort field.
    InvalidSortKey,
}

impl ErrorCode {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::InvalidFilterKey => "InvalidFilterKey",
            Self::InvalidSearchOperatorUsage => "InvalidSearchOperatorUsage",
            Self::InvalidSearchOperator => "InvalidSearchOperator",
            Self::InvalidSearchValue => "InvalidSearchValue",
            Self::InvalidSearchNumber => "InvalidSearchNumber",
            Self::InvalidSearchBoolean => "InvalidSearchBoolean",
            Self::InvalidSearchEnum => "InvalidSearchEnum",
            Self::InvalidRangeUsage => "InvalidRangeUsage",
            Self::InvalidBoolean => "InvalidBoolean",
            Self::InvalidDate => "InvalidDate",
            Self::InvalidEnum => "InvalidEnum",
            Self::InvalidFilterValue => "InvalidFilterValue",
            Self::InvalidSortKey => "InvalidSortKey",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Structured context attached to a [`QueryBuilderError`].
///
/// Only the members relevant to the failing check are populated.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct ErrorDetails {
    /// Offending query key
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    /// Target field of the failing field spec
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    /// Raw value that failed to parse
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub operator: Option<String>,
    /// Accepted keys, operators or enum members
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allowed: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ignored_search_fields: Option<Vec<IgnoredSearchField>>,
}

/// The single error kind produced by query translation.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryBuilderError {
    pub code: ErrorCode,
    pub message: String,
    pub details: Option<ErrorDetails>,
}

impl QueryBuilderError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: None,
        }
    }

    #[must_use]
    pub fn with_details(mut self, details: ErrorDetails) -> Self {
        self.details = Some(details);
        self
    }

    // ============================================================================
    // Constructors, one per code
    // ============================================================================

    pub fn invalid_filter_key(key: impl Into<String>, allowed: Vec<String>) -> Self {
        let key = key.into();
        Self::new(
            ErrorCode::InvalidFilterKey,
            format!("Query parameter '{key}' is not allowed"),
        )
        .with_details(ErrorDetails {
            key: Some(key),
            allowed: Some(allowed),
            ..ErrorDetails::default()
        })
    }

    pub fn invalid_search_operator_usage(
        field: impl Into<String>,
        operator: impl Into<String>,
    ) -> Self {
        let field = field.into();
        Self::new(
            ErrorCode::InvalidSearchOperatorUsage,
            format!("Search field '{field}' is not a string field and cannot declare an operator"),
        )
        .with_details(ErrorDetails {
            field: Some(field),
            operator: Some(operator.into()),
            ..ErrorDetails::default()
        })
    }

    pub fn invalid_search_operator(
        field: impl Into<String>,
        operator: impl Into<String>,
        allowed: Vec<String>,
    ) -> Self {
        let field = field.into();
        let operator = operator.into();
        Self::new(
            ErrorCode::InvalidSearchOperator,
            format!("Search operator '{operator}' on field '{field}' is not supported"),
        )
        .with_details(ErrorDetails {
            field: Some(field),
            operator: Some(operator),
            allowed: Some(allowed),
            ..ErrorDetails::default()
        })
    }

    #[must_use]
    pub fn invalid_search_value(ignored: Vec<IgnoredSearchField>) -> Self {
        Self::new(
            ErrorCode::InvalidSearchValue,
            "Search value is not compatible with any searchable field",
        )
        .with_details(ErrorDetails {
            ignored_search_fields: Some(ignored),
            ..ErrorDetails::default()
        })
    }

    pub fn invalid_search_number(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self::field_value(ErrorCode::InvalidSearchNumber, "a number", field, value)
    }

    pub fn invalid_search_boolean(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self::field_value(ErrorCode::InvalidSearchBoolean, "a boolean", field, value)
    }

    pub fn invalid_search_enum(
        field: impl Into<String>,
        value: impl Into<String>,
        allowed: Vec<String>,
    ) -> Self {
        Self::enum_value(ErrorCode::InvalidSearchEnum, field, value, allowed)
    }

    pub fn invalid_range_usage(key: impl Into<String>) -> Self {
        let key = key.into();
        Self::new(
            ErrorCode::InvalidRangeUsage,
            format!("Filter '{key}' cannot be combined with '{key}_min' or '{key}_max'"),
        )
        .with_details(ErrorDetails {
            key: Some(key),
            ..ErrorDetails::default()
        })
    }

    pub fn invalid_boolean(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self::field_value(ErrorCode::InvalidBoolean, "a boolean", field, value)
    }

    pub fn invalid_date(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self::field_value(ErrorCode::InvalidDate, "a valid date", field, value)
    }

    pub fn invalid_enum(
        field: impl Into<String>,
        value: impl Into<String>,
        allowed: Vec<String>,
    ) -> Self {
        Self::enum_value(ErrorCode::InvalidEnum, field, value, allowed)
    }

    pub fn invalid_filter_value(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self::field_value(ErrorCode::InvalidFilterValue, "a number", field, value)
    }

    pub fn invalid_sort_key(key: impl Into<String>, allowed: Vec<String>) -> Self {
        let key = key.into();
        Self::new(
            ErrorCode::InvalidSortKey,
            format!("Cannot sort by '{key}'"),
        )
        .with_details(ErrorDetails {
            key: Some(key),
            allowed: Some(allowed),
            ..ErrorDetails::default()
        })
    }

    fn field_value(
        code: ErrorCode,
        expected: &str,
        field: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        let field = field.into();
        let value = value.into();
        Self::new(
            code,
            format!("Value '{value}' for field '{field}' must be {expected}"),
        )
        .with_details(ErrorDetails {
            field: Some(field),
            value: Some(value),
            ..ErrorDetails::default()
        })
    }

    fn enum_value(
        code: ErrorCode,
        field: impl Into<String>,
        value: impl Into<String>,
        allowed: Vec<String>,
    ) -> Self {
        let field = field.into();
        let value = value.into();
        Self::new(
            code,
            format!(
                "Value '{value}' for field '{field}' must be one of: {}",
                allowed.join(", ")
            ),
        )
        .with_details(ErrorDetails {
            field: Some(field),
            value: Some(value),
            allowed: Some(allowed),
            ..ErrorDetails::default()
        })
    }
}

impl fmt::Display for QueryBuilderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl std::error::Error for QueryBuilderError {}

/// Error response sent to clients
#[derive(Serialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ErrorResponse {
    pub error: String,
    pub code: ErrorCode,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<ErrorDetails>,
}

impl From<&QueryBuilderError> for ErrorResponse {
    fn from(err: &QueryBuilderError) -> Self {
        Self {
            error: err.message.clone(),
            code: err.code,
            details: err.details.clone(),
        }
    }
}

#[cfg(feature = "axum")]
impl QueryBuilderError {
    /// Every translation failure is a client error.
    #[must_use]
    pub fn status_code(&self) -> axum::http::StatusCode {
        axum::http::StatusCode::BAD_REQUEST
    }
}

#[cfg(feature = "axum")]
impl axum::response::IntoResponse for QueryBuilderError {
    fn into_response(self) -> axum::response::Response {
        tracing::debug!(
            code = %self.code,
            error = %self.message,
            "Query translation rejected"
        );

        let status = self.status_code();
        (status, axum::Json(ErrorResponse::from(&self))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_display_matches_serialized_name() {
        let codes = [
            ErrorCode::InvalidFilterKey,
            ErrorCode::InvalidSearchOperatorUsage,
            ErrorCode::InvalidSearchValue,
            ErrorCode::InvalidRangeUsage,
            ErrorCode::InvalidSortKey,
        ];
        for code in codes {
            let serialized = serde_json::to_value(code).unwrap();
            assert_eq!(serialized, serde_json::Value::String(code.to_string()));
        }
    }

    #[test]
    fn test_invalid_filter_key_details() {
        let err = QueryBuilderError::invalid_filter_key(
            "colour",
            vec!["search".to_string(), "sort".to_string()],
        );
        assert_eq!(err.code, ErrorCode::InvalidFilterKey);
        let details = err.details.unwrap();
        assert_eq!(details.key.as_deref(), Some("colour"));
        assert_eq!(details.allowed.unwrap(), vec!["search", "sort"]);
    }

    #[test]
    fn test_enum_error_lists_allowed_members() {
        let err = QueryBuilderError::invalid_enum(
            "status",
            "archived",
            vec!["draft".to_string(), "published".to_string()],
        );
        assert_eq!(err.code, ErrorCode::InvalidEnum);
        assert!(err.message.contains("draft, published"));
    }

    #[test]
    fn test_details_serialize_camel_case_and_skip_empty() {
        let err = QueryBuilderError::invalid_search_value(vec![IgnoredSearchField {
            field: "age".to_string(),
            value: "abc".to_string(),
            reason: ErrorCode::InvalidSearchNumber,
        }]);
        let json = serde_json::to_value(err.details.unwrap()).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "ignoredSearchFields": [
                    {"field": "age", "value": "abc", "reason": "InvalidSearchNumber"}
                ]
            })
        );
    }

    #[test]
    fn test_display_includes_code() {
        let err = QueryBuilderError::invalid_range_usage("price");
        assert_eq!(
            err.to_string(),
            "InvalidRangeUsage: Filter 'price' cannot be combined with 'price_min' or 'price_max'"
        );
    }

    #[test]
    fn test_error_trait() {
        let err = QueryBuilderError::invalid_sort_key("nope", vec![]);
        let _: &dyn std::error::Error = &err;
    }

    #[cfg(feature = "axum")]
    #[test]
    fn test_into_response_is_bad_request() {
        use axum::response::IntoResponse;

        let err = QueryBuilderError::invalid_boolean("published", "maybe");
        assert_eq!(err.status_code(), axum::http::StatusCode::BAD_REQUEST);
        let response = err.into_response();
        assert_eq!(response.status(), axum::http::StatusCode::BAD_REQUEST);
    }
}
