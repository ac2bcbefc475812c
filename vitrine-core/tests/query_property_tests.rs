//! Property-Based Tests for List Translation
//!
//! For any combination of query parameters, translation never fails, the
//! page window stays within bounds, sorting only ever uses allow-listed
//! columns, and filters only ever touch mapped columns.

use proptest::prelude::*;
use serde_json::json;
use vitrine_core::{
    apply_list_params, FilterField, ListConfig, ListParams, Query, SortOrder, Table,
    DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE,
};

const CONFIG: ListConfig = ListConfig {
    sortable: &["display_order", "title", "created_at"],
    filters: &[
        FilterField::bool("featured", "featured"),
        FilterField::text("category", "category"),
        FilterField::uuid("service", "service_id"),
    ],
    searchable: &["title", "description"],
    paginate: true,
    default_sort: "display_order",
    default_order: SortOrder::Asc,
};

fn param_key() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("page".to_string()),
        Just("limit".to_string()),
        Just("sort_by".to_string()),
        Just("sort_order".to_string()),
        Just("search".to_string()),
        Just("featured".to_string()),
        Just("category".to_string()),
        Just("service".to_string()),
        "[a-z_]{1,12}",
    ]
}

fn param_value() -> impl Strategy<Value = String> {
    prop_oneof![
        any::<i64>().prop_map(|n| n.to_string()),
        Just("true".to_string()),
        Just("asc".to_string()),
        Just("title".to_string()),
        ".{0,24}",
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn prop_translation_stays_in_bounds(
        pairs in prop::collection::vec((param_key(), param_value()), 0..10)
    ) {
        let params = ListParams::from_pairs(pairs);
        let plan = apply_list_params(Query::table(Table::Services), &params, &CONFIG);

        let pagination = plan.pagination.ok_or_else(|| TestCaseError::fail("missing pagination"))?;
        prop_assert!(pagination.page >= 1);
        prop_assert!((1..=MAX_PAGE_SIZE).contains(&pagination.limit));

        let range = plan.query.range.ok_or_else(|| TestCaseError::fail("missing range"))?;
        prop_assert_eq!(range.limit, pagination.limit);
        prop_assert_eq!(range.offset, (pagination.page as u64 - 1) * pagination.limit as u64);

        prop_assert_eq!(plan.query.order.len(), 1);
        prop_assert!(CONFIG.sortable.contains(&plan.query.order[0].column));

        for condition in &plan.query.conditions {
            prop_assert!(CONFIG.filters.iter().any(|f| f.column == condition.column()));
        }
    }

    #[test]
    fn prop_page_parses_or_falls_back(raw in ".{0,12}") {
        let params = ListParams::new().with("page", raw.clone());
        let expected = match raw.trim().parse::<i64>() {
            Ok(n) if n >= 1 => n.min(u32::MAX as i64) as u32,
            _ => 1,
        };
        prop_assert_eq!(params.page(), expected);
    }

    #[test]
    fn prop_limit_is_clamped(n in any::<i64>()) {
        let params = ListParams::new().with("limit", n.to_string());
        let expected = if n < 1 { DEFAULT_PAGE_SIZE } else { n.min(MAX_PAGE_SIZE as i64) as u32 };
        prop_assert_eq!(params.limit(), expected);
    }

    #[test]
    fn prop_search_matches_any_column_ignoring_case(
        term in "[a-zA-Z]{1,8}",
        prefix in "[a-z ]{0,8}",
        in_title in any::<bool>(),
    ) {
        let params = ListParams::new().with("search", term.clone());
        let plan = apply_list_params(Query::table(Table::Services), &params, &CONFIG);

        let hit = format!("{}{}", prefix, term.to_uppercase());
        let row = if in_title {
            json!({"title": hit, "description": ""})
        } else {
            json!({"title": "", "description": hit})
        };
        prop_assert!(plan.query.matches(&row));
    }
}
