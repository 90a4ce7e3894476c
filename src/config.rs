//! Invocation configuration.
//!
//! [`QueryConfig`] is the request-independent part (field specs, strictness,
//! soft delete) and is usually built once per resource, either in code or
//! deserialized from a JSON/TOML document:
//!
//! ```json
//! {
//!   "searchFields": [{"field": "title"}, {"field": "views", "type": "number"}],
//!   "filterFields": [{"key": "status", "field": "status", "type": "enum", "enumValues": ["draft", "published"]}],
//!   "sortFields": [{"key": "title", "field": "title"}],
//!   "defaultSort": {"key": "title", "order": "asc"},
//!   "softDelete": {"field": "deleted", "value": false},
//!   "strict": true
//! }
//! ```
//!
//! [`QueryOptions`] pairs a config with one request's [`QueryMap`].

use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::fmt;
use std::sync::Arc;

use crate::builder::build_query;
use crate::errors::QueryResult;
use crate::models::{
    BuildResult, DefaultSort, FilterFieldSpec, QueryMap, QueryValue, SearchFieldSpec, SoftDelete,
    SortFieldSpec, push_query_value,
};

/// Replacement for the default ISO date parser. `None` rejects the value.
pub type DateParser = Arc<dyn Fn(&str) -> Option<DateTime<Utc>> + Send + Sync>;

const fn default_strict() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryConfig {
    #[serde(default)]
    pub search_fields: Vec<SearchFieldSpec>,
    #[serde(default)]
    pub filter_fields: Vec<FilterFieldSpec>,
    #[serde(default)]
    pub sort_fields: Vec<SortFieldSpec>,
    #[serde(default)]
    pub default_sort: Option<DefaultSort>,
    #[serde(default)]
    pub soft_delete: Option<SoftDelete>,
    /// Reject unknown keys, conflicting ranges and operator misuse
    #[serde(default = "default_strict")]
    pub strict: bool,
    /// Extra query keys accepted in strict mode (`page`, `limit`, ...)
    #[serde(default)]
    pub allowed_query_keys: Vec<String>,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            search_fields: Vec::new(),
            filter_fields: Vec::new(),
            sort_fields: Vec::new(),
            default_sort: None,
            soft_delete: None,
            strict: default_strict(),
            allowed_query_keys: Vec::new(),
        }
    }
}

impl QueryConfig {
    /// Translate one request's parameters with this config.
    pub fn build(&self, query: QueryMap) -> QueryResult<BuildResult> {
        build_query(&QueryOptions {
            query,
            config: self.clone(),
            date_parser: None,
        })
    }
}

/// Everything one [`build_query`] call needs.
#[derive(Clone, Default)]
pub struct QueryOptions {
    pub query: QueryMap,
    pub config: QueryConfig,
    pub date_parser: Option<DateParser>,
}

impl fmt::Debug for QueryOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueryOptions")
            .field("query", &self.query)
            .field("config", &self.config)
            .field("date_parser", &self.date_parser.as_ref().map(|_| "<fn>"))
            .finish()
    }
}

impl QueryOptions {
    #[must_use]
    pub fn new(query: QueryMap) -> Self {
        Self {
            query,
            ..Self::default()
        }
    }

    /// Build from `(key, value)` pairs.
    ///
    /// Repeated keys are grouped into a [`QueryValue::List`] the same way
    /// [`query_from_pairs`](crate::query_from_pairs) does.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<QueryValue>,
    {
        let mut query = QueryMap::new();
        for (key, value) in pairs {
            push_query_value(&mut query, key.into(), value.into());
        }
        Self::new(query)
    }

    #[must_use]
    pub fn config(mut self, config: QueryConfig) -> Self {
        self.config = config;
        self
    }

    #[must_use]
    pub fn search_fields(mut self, fields: Vec<SearchFieldSpec>) -> Self {
        self.config.search_fields = fields;
        self
    }

    #[must_use]
    pub fn filter_fields(mut self, fields: Vec<FilterFieldSpec>) -> Self {
        self.config.filter_fields = fields;
        self
    }

    #[must_use]
    pub fn sort_fields(mut self, fields: Vec<SortFieldSpec>) -> Self {
        self.config.sort_fields = fields;
        self
    }

    #[must_use]
    pub fn default_sort(mut self, sort: DefaultSort) -> Self {
        self.config.default_sort = Some(sort);
        self
    }

    #[must_use]
    pub fn soft_delete(mut self, soft_delete: SoftDelete) -> Self {
        self.config.soft_delete = Some(soft_delete);
        self
    }

    #[must_use]
    pub fn strict(mut self, strict: bool) -> Self {
        self.config.strict = strict;
        self
    }

    #[must_use]
    pub fn allowed_query_keys<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.allowed_query_keys = keys.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn date_parser<F>(mut self, parser: F) -> Self
    where
        F: Fn(&str) -> Option<DateTime<Utc>> + Send + Sync + 'static,
    {
        self.date_parser = Some(Arc::new(parser));
        self
    }
}
