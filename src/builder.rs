//! Query composition: query parameters in, `{where, orderBy, meta}` out.
//!
//! Phases run in a fixed order, each relying on the checks before it:
//!
//! 1. strict key validation
//! 2. search assembly (`OR` group, skipping fields the term cannot parse as)
//! 3. filter assembly (exact, membership and `_min`/`_max` range filters)
//! 4. sort assembly
//! 5. `where` composition with the soft-delete predicate first

use indexmap::IndexSet;

use crate::config::{DateParser, QueryConfig, QueryOptions};
use crate::errors::{QueryBuilderError, QueryResult};
use crate::filtering::{
    FieldMap, FilterValue, Node, OrderBy, OrderNode, Operators, Predicate, SortRequest,
    merge_fields, parse_filter_value, parse_search_value, parse_sort, scope,
};
use crate::models::{
    BuildResult, FieldType, FilterFieldSpec, IgnoredSearchField, Meta, QueryMap, QueryValue,
    SearchFieldSpec, SearchOperator,
};

const SEARCH_KEY: &str = "search";
const SORT_KEY: &str = "sort";
const MIN_SUFFIX: &str = "_min";
const MAX_SUFFIX: &str = "_max";

/// Translate `options.query` into a predicate tree and order clauses.
///
/// # Errors
///
/// Returns a [`QueryBuilderError`] for any strict-mode violation, unparsable
/// filter value, unknown sort key, or a search term that no configured
/// search field accepts.
pub fn build_query(options: &QueryOptions) -> QueryResult<BuildResult> {
    let result = compose(options);
    match &result {
        Ok(built) => tracing::trace!(
            conditions = ?built.where_clause,
            order_by = built.order_by.len(),
            "Built query"
        ),
        Err(err) => tracing::debug!(code = %err.code, error = %err.message, "Query rejected"),
    }
    result
}

fn compose(options: &QueryOptions) -> QueryResult<BuildResult> {
    let config = &options.config;
    let query = &options.query;

    if config.strict {
        validate_query_keys(config, query)?;
    }

    let mut ignored = Vec::new();
    let search = build_search(config, query, &mut ignored)?;
    let filters = build_filters(config, query, options.date_parser.as_ref())?;
    let order_by = build_order_by(config, query)?;
    let where_clause = compose_where(config, filters, search);

    Ok(BuildResult {
        where_clause,
        order_by,
        meta: (!ignored.is_empty()).then_some(Meta {
            ignored_search_fields: ignored,
        }),
    })
}

fn allowed_query_keys(config: &QueryConfig) -> IndexSet<String> {
    let mut allowed: IndexSet<String> = [SEARCH_KEY, SORT_KEY].into_iter().map(String::from).collect();
    for spec in &config.filter_fields {
        allowed.insert(spec.key.clone());
    }
    for spec in &config.filter_fields {
        allowed.insert(format!("{}{MIN_SUFFIX}", spec.key));
    }
    for spec in &config.filter_fields {
        allowed.insert(format!("{}{MAX_SUFFIX}", spec.key));
    }
    allowed.extend(config.allowed_query_keys.iter().cloned());
    allowed
}

fn validate_query_keys(config: &QueryConfig, query: &QueryMap) -> QueryResult<()> {
    let allowed = allowed_query_keys(config);
    match query.keys().find(|key| !allowed.contains(key.as_str())) {
        Some(key) => Err(QueryBuilderError::invalid_filter_key(
            key.as_str(),
            allowed.into_iter().collect(),
        )),
        None => Ok(()),
    }
}

// ============================================================================
// Search
// ============================================================================

fn build_search(
    config: &QueryConfig,
    query: &QueryMap,
    ignored: &mut Vec<IgnoredSearchField>,
) -> QueryResult<Vec<Predicate>> {
    let Some(raw) = query.get(SEARCH_KEY).and_then(|value| value.joined(" ")) else {
        return Ok(Vec::new());
    };
    let term = raw.trim();
    if term.is_empty() || config.search_fields.is_empty() {
        return Ok(Vec::new());
    }

    let mut predicates = Vec::new();
    for spec in &config.search_fields {
        if config.strict && spec.field_type != FieldType::String {
            if let Some(operator) = &spec.operator {
                return Err(QueryBuilderError::invalid_search_operator_usage(
                    &spec.field,
                    operator.as_str(),
                ));
            }
        }

        let parsed = match parse_search_value(term, spec) {
            Ok(parsed) => parsed,
            Err(err) => {
                tracing::debug!(field = %spec.field, reason = %err.code, "Skipping search field");
                ignored.push(IgnoredSearchField {
                    field: spec.field.clone(),
                    value: term.to_string(),
                    reason: err.code,
                });
                continue;
            }
        };

        let node = if spec.field_type == FieldType::String {
            let operator = resolve_operator(spec, config.strict)?;
            Operators::text(operator, parsed.clone())
                .map_or(Node::Value(parsed), Node::Operators)
        } else {
            Node::Value(parsed)
        };
        predicates.push(Predicate::Fields(scope(spec.model.as_deref(), &spec.field, node)));
    }

    if predicates.is_empty() && !ignored.is_empty() {
        return Err(QueryBuilderError::invalid_search_value(ignored.clone()));
    }
    Ok(predicates)
}

fn resolve_operator(spec: &SearchFieldSpec, strict: bool) -> QueryResult<SearchOperator> {
    let Some(name) = spec.operator.as_deref() else {
        return Ok(SearchOperator::Contains);
    };
    match SearchOperator::from_name(name) {
        Some(operator) => Ok(operator),
        None if strict => Err(QueryBuilderError::invalid_search_operator(
            &spec.field,
            name,
            SearchOperator::ALL
                .iter()
                .map(|op| op.as_str().to_string())
                .collect(),
        )),
        None => {
            tracing::warn!(
                field = %spec.field,
                operator = %name,
                "Unknown search operator, falling back to contains"
            );
            Ok(SearchOperator::Contains)
        }
    }
}

// ============================================================================
// Filters
// ============================================================================

/// A query value that carries input: not absent, `null` or the empty string.
fn present<'q>(query: &'q QueryMap, key: &str) -> Option<&'q QueryValue> {
    query.get(key).filter(|value| !value.is_blank())
}

fn build_filters(
    config: &QueryConfig,
    query: &QueryMap,
    date_parser: Option<&DateParser>,
) -> QueryResult<FieldMap> {
    let mut tree = FieldMap::new();

    for spec in &config.filter_fields {
        let exact = present(query, &spec.key);
        let min = present(query, &format!("{}{MIN_SUFFIX}", spec.key));
        let max = present(query, &format!("{}{MAX_SUFFIX}", spec.key));

        if config.strict && exact.is_some() && (min.is_some() || max.is_some()) {
            return Err(QueryBuilderError::invalid_range_usage(&spec.key));
        }

        let node = if min.is_some() || max.is_some() {
            let gte = min
                .map(|value| parse_filter_value(value, spec, date_parser))
                .transpose()?;
            let lte = max
                .map(|value| parse_filter_value(value, spec, date_parser))
                .transpose()?;
            Node::Operators(Operators::range(gte, lte))
        } else if let Some(node) = exact
            .map(|value| exact_node(value, spec, date_parser))
            .transpose()?
            .flatten()
        {
            node
        } else {
            continue;
        };

        tree = merge_fields(tree, scope(spec.model.as_deref(), &spec.field, node));
    }

    Ok(tree)
}

/// `None` when a membership list has no non-empty parts.
fn exact_node(
    value: &QueryValue,
    spec: &FilterFieldSpec,
    date_parser: Option<&DateParser>,
) -> QueryResult<Option<Node>> {
    let members: Vec<&str> = match value {
        QueryValue::Text(text) if text.contains(',') => text.split(',').collect(),
        QueryValue::List(items) => items.iter().map(String::as_str).collect(),
        single => {
            return parse_filter_value(single, spec, date_parser)
                .map(|value| Some(Node::Value(value)));
        }
    };

    let values = members
        .into_iter()
        .map(str::trim)
        .filter(|member| !member.is_empty())
        .map(|member| parse_filter_value(&QueryValue::from(member), spec, date_parser))
        .collect::<QueryResult<Vec<FilterValue>>>()?;
    if values.is_empty() {
        return Ok(None);
    }
    Ok(Some(Node::Operators(Operators::in_list(values))))
}

// ============================================================================
// Sorting
// ============================================================================

fn build_order_by(config: &QueryConfig, query: &QueryMap) -> QueryResult<Vec<OrderBy>> {
    let raw = query.get(SORT_KEY).and_then(|value| value.joined(","));
    let mut requested = parse_sort(raw.as_deref());
    if requested.is_empty() {
        requested.extend(config.default_sort.iter().map(|default| SortRequest {
            key: default.key.clone(),
            order: default.order,
        }));
    }

    requested
        .into_iter()
        .map(|request| {
            // Later registrations of a key shadow earlier ones
            let spec = config
                .sort_fields
                .iter()
                .rev()
                .find(|spec| spec.key == request.key)
                .ok_or_else(|| {
                    QueryBuilderError::invalid_sort_key(
                        request.key.as_str(),
                        config.sort_fields.iter().map(|spec| spec.key.clone()).collect(),
                    )
                })?;
            Ok(scope(
                spec.model.as_deref(),
                &spec.field,
                OrderNode::Direction(request.order),
            ))
        })
        .collect()
}

// ============================================================================
// Where composition
// ============================================================================

fn compose_where(config: &QueryConfig, filters: FieldMap, search: Vec<Predicate>) -> Predicate {
    let mut clauses = Vec::new();

    if let Some(soft_delete) = &config.soft_delete {
        clauses.push(Predicate::Fields(scope(
            None,
            &soft_delete.field,
            Node::Value(soft_delete.value.clone()),
        )));
    }
    if !filters.is_empty() {
        clauses.push(Predicate::Fields(filters));
    }
    if !search.is_empty() {
        clauses.push(Predicate::or(search));
    }

    if clauses.is_empty() {
        Predicate::default()
    } else {
        Predicate::and(clauses)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ErrorCode;
    use crate::models::{SortFieldSpec, SortOrder};
    use serde_json::json;

    fn options(pairs: &[(&str, &str)]) -> QueryOptions {
        QueryOptions::from_pairs(pairs.iter().copied())
    }

    #[test]
    fn test_allowed_keys_order() {
        let config = QueryConfig {
            filter_fields: vec![FilterFieldSpec::new("a", "a"), FilterFieldSpec::new("b", "b")],
            allowed_query_keys: vec!["page".to_string()],
            ..QueryConfig::default()
        };
        let allowed: Vec<String> = allowed_query_keys(&config).into_iter().collect();
        assert_eq!(
            allowed,
            vec!["search", "sort", "a", "b", "a_min", "b_min", "a_max", "b_max", "page"]
        );
    }

    #[test]
    fn test_empty_everything() {
        let built = build_query(&QueryOptions::default()).unwrap();
        assert!(built.where_clause.is_empty());
        assert!(built.order_by.is_empty());
        assert!(built.meta.is_none());
        assert_eq!(built.to_json(), json!({"where": {}, "orderBy": []}));
    }

    #[test]
    fn test_blank_search_is_ignored() {
        let built = build_query(
            &options(&[("search", "   ")]).search_fields(vec![SearchFieldSpec::new("title")]),
        )
        .unwrap();
        assert!(built.where_clause.is_empty());
    }

    #[test]
    fn test_search_without_fields_is_ignored() {
        let built = build_query(&options(&[("search", "rust")])).unwrap();
        assert!(built.where_clause.is_empty());
        assert!(built.meta.is_none());
    }

    #[test]
    fn test_equals_operator_uses_bare_value() {
        let built = build_query(
            &options(&[("search", " Rust ")])
                .search_fields(vec![SearchFieldSpec::new("title").operator("equals")]),
        )
        .unwrap();
        assert_eq!(
            built.to_json()["where"],
            json!({"AND": [{"OR": [{"title": "Rust"}]}]})
        );
    }

    #[test]
    fn test_unknown_operator_non_strict_falls_back_to_contains() {
        let built = build_query(
            &options(&[("search", "rust")])
                .strict(false)
                .search_fields(vec![SearchFieldSpec::new("title").operator("like")]),
        )
        .unwrap();
        assert_eq!(
            built.to_json()["where"],
            json!({"AND": [{"OR": [{"title": {"contains": "rust", "mode": "insensitive"}}]}]})
        );
    }

    #[test]
    fn test_unknown_operator_strict_fails() {
        let err = build_query(
            &options(&[("search", "rust")])
                .search_fields(vec![SearchFieldSpec::new("title").operator("like")]),
        )
        .unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidSearchOperator);
        assert_eq!(
            err.details.unwrap().allowed.unwrap(),
            vec!["contains", "startsWith", "endsWith", "equals"]
        );
    }

    #[test]
    fn test_list_exact_value_becomes_membership() {
        let mut query = QueryMap::new();
        query.insert("id".to_string(), QueryValue::from(vec!["1", "2"]));
        let built = build_query(
            &QueryOptions::new(query).filter_fields(vec![
                FilterFieldSpec::new("id", "id").field_type(FieldType::Number),
            ]),
        )
        .unwrap();
        assert_eq!(
            built.to_json()["where"],
            json!({"AND": [{"id": {"in": [1, 2]}}]})
        );
    }

    #[test]
    fn test_empty_membership_parts_are_skipped() {
        let built = build_query(
            &options(&[("id", "1,,2, ")]).filter_fields(vec![
                FilterFieldSpec::new("id", "id").field_type(FieldType::Number),
            ]),
        )
        .unwrap();
        assert_eq!(
            built.to_json()["where"],
            json!({"AND": [{"id": {"in": [1, 2]}}]})
        );
    }

    #[test]
    fn test_membership_without_parts_contributes_nothing() {
        let cases: [&[(&str, &str)]; 3] = [
            &[("id", ",")],
            &[("id", " , ,")],
            &[("id", ""), ("id", "")],
        ];
        for pairs in cases {
            let built = build_query(&options(pairs).filter_fields(vec![
                FilterFieldSpec::new("id", "id").field_type(FieldType::Number),
            ]))
            .unwrap();
            assert!(built.where_clause.is_empty(), "{pairs:?}");
        }
    }

    #[test]
    fn test_empty_exact_value_contributes_nothing() {
        let built = build_query(
            &options(&[("status", "")]).filter_fields(vec![FilterFieldSpec::new("status", "status")]),
        )
        .unwrap();
        assert!(built.where_clause.is_empty());
    }

    #[test]
    fn test_repeated_sort_parameters_are_joined() {
        let mut query = QueryMap::new();
        query.insert("sort".to_string(), QueryValue::from(vec!["name:desc", "age"]));
        let built = build_query(&QueryOptions::new(query).sort_fields(vec![
            SortFieldSpec::new("name", "name"),
            SortFieldSpec::new("age", "age"),
        ]))
        .unwrap();
        assert_eq!(
            built.to_json()["orderBy"],
            json!([{"name": "desc"}, {"age": "asc"}])
        );
    }

    #[test]
    fn test_last_registered_sort_key_wins() {
        let built = build_query(&options(&[("sort", "name")]).sort_fields(vec![
            SortFieldSpec::new("name", "first_name"),
            SortFieldSpec::new("name", "display_name"),
        ]))
        .unwrap();
        assert_eq!(built.to_json()["orderBy"], json!([{"display_name": "asc"}]));
    }

    #[test]
    fn test_default_sort_applies_without_sort_param() {
        let built = build_query(
            &QueryOptions::default()
                .sort_fields(vec![SortFieldSpec::new("created", "created_at")])
                .default_sort(crate::models::DefaultSort::new("created", SortOrder::Desc)),
        )
        .unwrap();
        assert_eq!(built.to_json()["orderBy"], json!([{"created_at": "desc"}]));
    }

    #[test]
    fn test_unknown_default_sort_key_fails() {
        let err = build_query(
            &QueryOptions::default().default_sort(crate::models::DefaultSort::new("nope", SortOrder::Asc)),
        )
        .unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidSortKey);
    }
}
