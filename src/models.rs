use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt;

use crate::errors::ErrorCode;
use crate::filtering::sort::OrderBy;
use crate::filtering::{FilterValue, Predicate};

/// Declared type of a searchable or filterable field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    #[default]
    String,
    Number,
    Boolean,
    Date,
    Enum,
}

/// String-matching operators available to string search fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchOperator {
    Contains,
    StartsWith,
    EndsWith,
    Equals,
}

impl SearchOperator {
    pub const ALL: [Self; 4] = [Self::Contains, Self::StartsWith, Self::EndsWith, Self::Equals];

    /// Resolve an operator by its wire name (`contains`, `startsWith`, ...).
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|op| op.as_str() == name)
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Contains => "contains",
            Self::StartsWith => "startsWith",
            Self::EndsWith => "endsWith",
            Self::Equals => "equals",
        }
    }
}

impl fmt::Display for SearchOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    /// Anything other than exactly `desc` sorts ascending.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        if raw.trim() == "desc" { Self::Desc } else { Self::Asc }
    }
}

/// A field eligible for free-text search.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchFieldSpec {
    pub field: String,
    /// Dot-separated relation path, e.g. `author.profile`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    /// Wire name of a [`SearchOperator`]; `contains` when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operator: Option<String>,
    #[serde(default, rename = "type")]
    pub field_type: FieldType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enum_values: Option<Vec<String>>,
}

impl SearchFieldSpec {
    pub fn new(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    #[must_use]
    pub fn operator(mut self, operator: impl Into<String>) -> Self {
        self.operator = Some(operator.into());
        self
    }

    #[must_use]
    pub fn field_type(mut self, field_type: FieldType) -> Self {
        self.field_type = field_type;
        self
    }

    #[must_use]
    pub fn enum_values<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.enum_values = Some(values.into_iter().map(Into::into).collect());
        self
    }
}

/// A filter exposed under the query parameter `key` (plus `key_min`/`key_max`).
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterFieldSpec {
    pub key: String,
    pub field: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, rename = "type")]
    pub field_type: FieldType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enum_values: Option<Vec<String>>,
}

impl FilterFieldSpec {
    pub fn new(key: impl Into<String>, field: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            field: field.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    #[must_use]
    pub fn field_type(mut self, field_type: FieldType) -> Self {
        self.field_type = field_type;
        self
    }

    #[must_use]
    pub fn enum_values<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.enum_values = Some(values.into_iter().map(Into::into).collect());
        self
    }
}

/// Maps a public sort key to a target field.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SortFieldSpec {
    pub key: String,
    pub field: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
}

impl SortFieldSpec {
    pub fn new(key: impl Into<String>, field: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            field: field.into(),
            model: None,
        }
    }

    #[must_use]
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }
}

/// Ordering applied when the request carries no `sort` parameter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DefaultSort {
    pub key: String,
    #[serde(default)]
    pub order: SortOrder,
}

impl DefaultSort {
    pub fn new(key: impl Into<String>, order: SortOrder) -> Self {
        Self {
            key: key.into(),
            order,
        }
    }
}

/// Equality condition injected into every composed `where`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SoftDelete {
    pub field: String,
    pub value: FilterValue,
}

impl SoftDelete {
    pub fn new(field: impl Into<String>, value: impl Into<FilterValue>) -> Self {
        Self {
            field: field.into(),
            value: value.into(),
        }
    }
}

/// A raw query-string value as handed over by the HTTP layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum QueryValue {
    Null,
    Bool(bool),
    Number(f64),
    Text(String),
    /// Repeated parameter (`?id=1&id=2`)
    List(Vec<String>),
}

impl QueryValue {
    /// Scalar rendering of the value; `None` for `Null` and `List`.
    #[must_use]
    pub fn as_text(&self) -> Option<Cow<'_, str>> {
        match self {
            Self::Text(text) => Some(Cow::Borrowed(text)),
            Self::Number(number) => Some(Cow::Owned(number.to_string())),
            Self::Bool(flag) => Some(Cow::Owned(flag.to_string())),
            Self::Null | Self::List(_) => None,
        }
    }

    /// `true` for `Null` and for the empty string.
    #[must_use]
    pub fn is_blank(&self) -> bool {
        match self {
            Self::Null => true,
            Self::Text(text) => text.is_empty(),
            Self::List(items) => items.is_empty(),
            Self::Bool(_) | Self::Number(_) => false,
        }
    }

    /// Joins list items with `separator`, other values render as scalars.
    pub(crate) fn joined(&self, separator: &str) -> Option<Cow<'_, str>> {
        match self {
            Self::List(items) => Some(Cow::Owned(items.join(separator))),
            other => other.as_text(),
        }
    }
}

impl fmt::Display for QueryValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("null"),
            Self::List(items) => f.write_str(&items.join(",")),
            other => f.write_str(&other.as_text().unwrap_or_default()),
        }
    }
}

impl From<&str> for QueryValue {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

impl From<String> for QueryValue {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

impl From<bool> for QueryValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<f64> for QueryValue {
    fn from(v: f64) -> Self {
        Self::Number(v)
    }
}

impl From<i32> for QueryValue {
    fn from(v: i32) -> Self {
        Self::Number(f64::from(v))
    }
}

impl From<Vec<String>> for QueryValue {
    fn from(v: Vec<String>) -> Self {
        Self::List(v)
    }
}

impl From<Vec<&str>> for QueryValue {
    fn from(v: Vec<&str>) -> Self {
        Self::List(v.into_iter().map(str::to_string).collect())
    }
}

/// Query parameters in arrival order.
pub type QueryMap = IndexMap<String, QueryValue>;

/// Collect decoded `(key, value)` pairs into a [`QueryMap`].
///
/// A key seen more than once becomes a [`QueryValue::List`] in arrival order.
pub fn query_from_pairs<I, K, V>(pairs: I) -> QueryMap
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<String>,
{
    let mut query = QueryMap::new();
    for (key, value) in pairs {
        push_query_value(&mut query, key.into(), QueryValue::Text(value.into()));
    }
    query
}

/// Insert `value` under `key`, turning a repeated key into a [`QueryValue::List`].
pub(crate) fn push_query_value(query: &mut QueryMap, key: String, value: QueryValue) {
    let Some(existing) = query.get_mut(&key) else {
        query.insert(key, value);
        return;
    };

    let mut items = match std::mem::replace(existing, QueryValue::Null) {
        QueryValue::List(items) => items,
        scalar => vec![scalar.to_string()],
    };
    match value {
        QueryValue::List(more) => items.extend(more),
        scalar => items.push(scalar.to_string()),
    }
    *existing = QueryValue::List(items);
}

/// One search field skipped because the term did not parse as its type.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct IgnoredSearchField {
    pub field: String,
    pub value: String,
    pub reason: ErrorCode,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Meta {
    pub ignored_search_fields: Vec<IgnoredSearchField>,
}

/// Output of [`build_query`](crate::build_query).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BuildResult {
    #[serde(rename = "where")]
    pub where_clause: Predicate,
    #[serde(rename = "orderBy")]
    pub order_by: Vec<OrderBy>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<Meta>,
}

impl BuildResult {
    /// Render as the JSON document an ORM-style client expects.
    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}
