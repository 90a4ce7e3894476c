//! The predicate tree handed to the query layer.
//!
//! ```text
//! Predicate ::= {"AND": [Predicate]} | {"OR": [Predicate]} | {field: Node, ...}
//! Node      ::= value | {gte, lte, in, contains, startsWith, endsWith, mode} | {field: Node, ...}
//! ```

use indexmap::IndexMap;
use serde::Serialize;

use super::path::Nestable;
use super::value::FilterValue;
use crate::models::SearchOperator;

/// Field-scoped conditions keyed by field (or relation) name.
pub type FieldMap = IndexMap<String, Node>;

/// Top-level predicate.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Predicate {
    And {
        #[serde(rename = "AND")]
        and: Vec<Predicate>,
    },
    Or {
        #[serde(rename = "OR")]
        or: Vec<Predicate>,
    },
    /// The empty map is the match-everything predicate `{}`
    Fields(FieldMap),
}

impl Predicate {
    #[must_use]
    pub fn and(predicates: Vec<Predicate>) -> Self {
        Self::And { and: predicates }
    }

    #[must_use]
    pub fn or(predicates: Vec<Predicate>) -> Self {
        Self::Or { or: predicates }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Fields(fields) if fields.is_empty())
    }
}

impl Default for Predicate {
    fn default() -> Self {
        Self::Fields(FieldMap::new())
    }
}

/// Condition on one field.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Node {
    /// Bare equality
    Value(FilterValue),
    Operators(Operators),
    /// Traversal into a related entity
    Relation(FieldMap),
}

impl Node {
    /// Deep merge: relations recurse, operator sets union, anything else is replaced.
    #[must_use]
    pub fn merge(self, source: Node) -> Node {
        match (self, source) {
            (Node::Relation(target), Node::Relation(source)) => {
                Node::Relation(merge_fields(target, source))
            }
            (Node::Operators(target), Node::Operators(source)) => {
                Node::Operators(target.merge(source))
            }
            (_, source) => source,
        }
    }
}

impl Nestable for Node {
    fn relation(children: FieldMap) -> Self {
        Self::Relation(children)
    }
}

/// `mode` marker for case-insensitive string matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum QueryMode {
    Insensitive,
}

/// Operator object applied to a single field.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Operators {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gte: Option<FilterValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lte: Option<FilterValue>,
    #[serde(rename = "in", skip_serializing_if = "Option::is_none")]
    pub in_list: Option<Vec<FilterValue>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contains: Option<FilterValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub starts_with: Option<FilterValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ends_with: Option<FilterValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mode: Option<QueryMode>,
}

impl Operators {
    #[must_use]
    pub fn range(gte: Option<FilterValue>, lte: Option<FilterValue>) -> Self {
        Self {
            gte,
            lte,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn in_list(values: Vec<FilterValue>) -> Self {
        Self {
            in_list: Some(values),
            ..Self::default()
        }
    }

    /// Case-insensitive string match; `equals` is not an operator object
    /// and yields `None`.
    #[must_use]
    pub fn text(operator: SearchOperator, value: FilterValue) -> Option<Self> {
        let mut operators = Self {
            mode: Some(QueryMode::Insensitive),
            ..Self::default()
        };
        match operator {
            SearchOperator::Contains => operators.contains = Some(value),
            SearchOperator::StartsWith => operators.starts_with = Some(value),
            SearchOperator::EndsWith => operators.ends_with = Some(value),
            SearchOperator::Equals => return None,
        }
        Some(operators)
    }

    /// Slot-wise union, `source` wins where both are set.
    #[must_use]
    pub fn merge(self, source: Operators) -> Self {
        Self {
            gte: source.gte.or(self.gte),
            lte: source.lte.or(self.lte),
            in_list: source.in_list.or(self.in_list),
            contains: source.contains.or(self.contains),
            starts_with: source.starts_with.or(self.starts_with),
            ends_with: source.ends_with.or(self.ends_with),
            mode: source.mode.or(self.mode),
        }
    }
}

/// Merge `source` into `target`, keeping the position of keys already in `target`.
#[must_use]
pub fn merge_fields(mut target: FieldMap, source: FieldMap) -> FieldMap {
    for (key, incoming) in source {
        match target.get_mut(&key) {
            Some(existing) => {
                let current = std::mem::replace(existing, Node::Value(FilterValue::Null));
                *existing = current.merge(incoming);
            }
            None => {
                target.insert(key, incoming);
            }
        }
    }
    target
}
