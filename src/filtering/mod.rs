//! # Filtering & Sorting Primitives
//!
//! The building blocks [`build_query`](crate::build_query) composes:
//!
//! - **[`value`]**: typed [`FilterValue`]s, number coercion and the default ISO date parser
//! - **[`parsers`]**: search-term and filter-value parsing per declared field type
//! - **[`path`]**: relation path nesting (`author.profile` + `age`)
//! - **[`predicate`]**: the `AND`/`OR` predicate tree and its deep merge
//! - **[`sort`]**: `key:order` sort parsing and order clauses
//!
//! ## Query Parameter Examples
//!
//! ```rust,ignore
//! // Free-text search across configured fields (OR group)
//! GET /posts?search=rust
//!
//! // Exact and membership filters (AND group)
//! GET /posts?status=published&id=1,2,3
//!
//! // Range bounds on one field merge into {gte, lte}
//! GET /posts?views_min=10&views_max=100
//!
//! // Clear a filter explicitly
//! GET /posts?published_at=null
//!
//! // Sorting, left to right
//! GET /posts?sort=published_at:desc,title
//! ```

pub mod parsers;
pub mod path;
pub mod predicate;
pub mod sort;
pub mod value;

pub use parsers::{parse_filter_value, parse_search_value};
pub use path::{Nestable, build_path, scope};
pub use predicate::{FieldMap, Node, Operators, Predicate, QueryMode, merge_fields};
pub use sort::{OrderBy, OrderNode, SortRequest, parse_sort};
pub use value::{FilterValue, number_from_str, parse_iso_date};
