use indexmap::IndexMap;
use serde::Serialize;

use super::path::Nestable;
use crate::models::SortOrder;

/// One requested ordering, not yet validated against sortable fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortRequest {
    pub key: String,
    pub order: SortOrder,
}

/// Direction for a field, possibly nested under relations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum OrderNode {
    Direction(SortOrder),
    Relation(IndexMap<String, OrderNode>),
}

impl Nestable for OrderNode {
    fn relation(children: IndexMap<String, Self>) -> Self {
        Self::Relation(children)
    }
}

/// A single order clause, e.g. `{"name": "desc"}`.
pub type OrderBy = IndexMap<String, OrderNode>;

/// Parse `key[:order],key[:order],...` preserving input order.
///
/// Blank segments are dropped; the order defaults to ascending.
#[must_use]
pub fn parse_sort(raw: Option<&str>) -> Vec<SortRequest> {
    let Some(raw) = raw else {
        return Vec::new();
    };

    raw.split(',')
        .map(str::trim)
        .filter(|segment| !segment.is_empty())
        .map(|segment| {
            let mut parts = segment.split(':');
            let key = parts.next().unwrap_or_default().trim().to_string();
            let order = parts.next().map_or(SortOrder::Asc, SortOrder::parse);
            SortRequest { key, order }
        })
        .collect()
}
