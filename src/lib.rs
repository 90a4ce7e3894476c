//! # querycrate
//!
//! Turns the flat query parameters of a list endpoint into a typed
//! filter/sort descriptor for an ORM-style query layer: an `AND`/`OR`
//! predicate tree plus ordered sort clauses, validated against a field
//! configuration you supply.
//!
//! ```rust
//! use querycrate::{
//!     FieldType, FilterFieldSpec, QueryOptions, SearchFieldSpec, SoftDelete, SortFieldSpec,
//!     build_query,
//! };
//!
//! let options = QueryOptions::from_pairs([
//!     ("search", "rust"),
//!     ("views_min", "10"),
//!     ("sort", "title:desc"),
//! ])
//! .search_fields(vec![SearchFieldSpec::new("title")])
//! .filter_fields(vec![FilterFieldSpec::new("views", "views").field_type(FieldType::Number)])
//! .sort_fields(vec![SortFieldSpec::new("title", "title")])
//! .soft_delete(SoftDelete::new("deleted", false));
//!
//! let built = build_query(&options).unwrap();
//! assert_eq!(
//!     built.to_json(),
//!     serde_json::json!({
//!         "where": {"AND": [
//!             {"deleted": false},
//!             {"views": {"gte": 10}},
//!             {"OR": [{"title": {"contains": "rust", "mode": "insensitive"}}]}
//!         ]},
//!         "orderBy": [{"title": "desc"}]
//!     })
//! );
//! ```
//!
//! The crate performs no I/O: executing the query, pagination and schema
//! checks belong to the caller.

pub mod builder;
pub mod config;
pub mod errors;
pub mod filtering;
pub mod models;

pub use builder::build_query;
pub use config::{DateParser, QueryConfig, QueryOptions};
pub use errors::{ErrorCode, ErrorDetails, ErrorResponse, QueryBuilderError, QueryResult};
pub use filtering::{FilterValue, Node, Operators, OrderBy, OrderNode, Predicate};
pub use models::{
    BuildResult, DefaultSort, FieldType, FilterFieldSpec, IgnoredSearchField, Meta, QueryMap,
    QueryValue, SearchFieldSpec, SearchOperator, SoftDelete, SortFieldSpec, SortOrder,
    query_from_pairs,
};
