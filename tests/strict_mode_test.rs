use pretty_assertions::assert_eq;
use querycrate::{
    ErrorCode, FieldType, FilterFieldSpec, QueryOptions, SearchFieldSpec, build_query,
};
use serde_json::json;

fn options(pairs: &[(&str, &str)]) -> QueryOptions {
    QueryOptions::from_pairs(pairs.iter().copied()).filter_fields(vec![
        FilterFieldSpec::new("price", "price").field_type(FieldType::Number),
        FilterFieldSpec::new("status", "status"),
    ])
}

#[test]
fn test_unknown_key_rejected_with_allow_set() {
    let err = build_query(&options(&[("colour", "red")]).allowed_query_keys(["page"])).unwrap_err();

    assert_eq!(err.code, ErrorCode::InvalidFilterKey);
    let details = err.details.unwrap();
    assert_eq!(details.key.as_deref(), Some("colour"));
    assert_eq!(
        details.allowed.unwrap(),
        vec![
            "search", "sort", "price", "status", "price_min", "status_min", "price_max",
            "status_max", "page",
        ]
    );
}

#[test]
fn test_allowed_query_keys_pass_through() {
    let built = build_query(
        &options(&[("page", "2"), ("limit", "20"), ("status", "open")])
            .allowed_query_keys(["page", "limit"]),
    )
    .unwrap();

    assert_eq!(built.to_json()["where"], json!({"AND": [{"status": "open"}]}));
}

#[test]
fn test_unknown_keys_are_ignored_when_not_strict() {
    let built = build_query(
        &options(&[("colour", "red"), ("whatever", ""), ("status", "open")]).strict(false),
    )
    .unwrap();

    assert_eq!(built.to_json()["where"], json!({"AND": [{"status": "open"}]}));
}

#[test]
fn test_exact_and_range_conflict_in_strict_mode() {
    for bound in ["price_min", "price_max"] {
        let err = build_query(&options(&[("price", "10"), (bound, "5")])).unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidRangeUsage, "{bound}");
        assert_eq!(err.details.unwrap().key.as_deref(), Some("price"));
    }
}

#[test]
fn test_blank_exact_value_with_range_is_not_a_conflict() {
    let built = build_query(&options(&[("price", ""), ("price_min", "5")])).unwrap();

    assert_eq!(built.to_json()["where"], json!({"AND": [{"price": {"gte": 5}}]}));
}

#[test]
fn test_range_wins_over_exact_when_not_strict() {
    let built = build_query(
        &options(&[("price", "10"), ("price_min", "5"), ("price_max", "50")]).strict(false),
    )
    .unwrap();

    assert_eq!(
        built.to_json()["where"],
        json!({"AND": [{"price": {"gte": 5, "lte": 50}}]})
    );
}

#[test]
fn test_operator_on_typed_search_field_is_config_error() {
    let err = build_query(
        &QueryOptions::from_pairs([("search", "10")]).search_fields(vec![
            SearchFieldSpec::new("title"),
            SearchFieldSpec::new("views")
                .field_type(FieldType::Number)
                .operator("contains"),
        ]),
    )
    .unwrap_err();

    assert_eq!(err.code, ErrorCode::InvalidSearchOperatorUsage);
    let details = err.details.unwrap();
    assert_eq!(details.field.as_deref(), Some("views"));
    assert_eq!(details.operator.as_deref(), Some("contains"));
}

#[test]
fn test_operator_on_typed_search_field_is_ignored_when_not_strict() {
    let built = build_query(
        &QueryOptions::from_pairs([("search", "10")])
            .strict(false)
            .search_fields(vec![
                SearchFieldSpec::new("views")
                    .field_type(FieldType::Number)
                    .operator("contains"),
            ]),
    )
    .unwrap();

    assert_eq!(built.to_json()["where"], json!({"AND": [{"OR": [{"views": 10}]}]}));
}

#[test]
fn test_explicit_string_type_may_declare_operator() {
    let built = build_query(
        &QueryOptions::from_pairs([("search", "ru")]).search_fields(vec![
            SearchFieldSpec::new("title")
                .field_type(FieldType::String)
                .operator("startsWith"),
        ]),
    )
    .unwrap();

    assert_eq!(
        built.to_json()["where"],
        json!({"AND": [{"OR": [{"title": {"startsWith": "ru", "mode": "insensitive"}}]}]})
    );
}

#[test]
fn test_key_validation_runs_before_parsing() {
    // The bad boolean would fail later; the unknown key is reported first
    let err = build_query(
        &QueryOptions::from_pairs([("published", "maybe"), ("bogus", "1")]).filter_fields(vec![
            FilterFieldSpec::new("published", "published").field_type(FieldType::Boolean),
        ]),
    )
    .unwrap_err();

    assert_eq!(err.code, ErrorCode::InvalidFilterKey);
}
