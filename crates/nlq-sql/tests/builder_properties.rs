//! Built SQL for every intent and slot combination must pass validation

use nlq_catalog::SchemaCatalog;
use nlq_intent::{IntentMatcher, EXAMPLES};
use nlq_ir::{Granularity, Intent, RankMetric, SlotKey, Slots};
use nlq_sql::{QueryBuilder, SqlValidator, FORBIDDEN_KEYWORDS};
use proptest::prelude::*;
use std::sync::Arc;

const STATUSES: &[&str] = &[
    "delivered",
    "shipped",
    "canceled",
    "unavailable",
    "invoiced",
    "processing",
    "created",
    "approved",
];

fn catalog() -> Arc<SchemaCatalog> {
    Arc::new(SchemaCatalog::builtin().unwrap())
}

/// A value for every slot key; narrowed to the intent's schema per case
fn all_slots() -> impl Strategy<Value = Slots> {
    (
        prop::sample::select(Granularity::ALL.to_vec()),
        1i64..=100,
        prop::sample::select(RankMetric::ALL.to_vec()),
        prop::sample::select(vec!["state", "city", "zip_code_prefix"]),
        prop::option::of(1i64..=5),
        prop::option::of(prop::sample::select(STATUSES.to_vec())),
        prop::sample::select(vec![
            "customers",
            "sellers",
            "products",
            "orders",
            "order_items",
            "payments",
            "reviews",
            "geolocation",
            "category_translation",
        ]),
    )
        .prop_map(|(granularity, limit, metric, dimension, score, status, entity)| {
            let mut slots = Slots::new()
                .with(SlotKey::Granularity, granularity.as_str())
                .with(SlotKey::Limit, limit)
                .with(SlotKey::Metric, metric.as_str())
                .with(SlotKey::Dimension, dimension)
                .with(SlotKey::Entity, entity);
            if let Some(score) = score {
                slots.insert(SlotKey::FilterScore, score);
            }
            if let Some(status) = status {
                slots.insert(SlotKey::FilterStatus, status);
            }
            slots
        })
}

fn declared(intent: Intent, all: &Slots) -> Slots {
    let mut slots = Slots::new();
    for spec in intent.slot_schema() {
        if let Some(value) = all.get(spec.key) {
            slots.insert(spec.key, value.clone());
        }
    }
    slots
}

fn words(sql: &str) -> Vec<String> {
    sql.split(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
        .filter(|w| !w.is_empty())
        .map(|w| w.to_ascii_lowercase())
        .collect()
}

proptest! {
    #[test]
    fn test_built_sql_passes_validation(
        all in all_slots(),
        which in 0usize..Intent::ALL.len()
    ) {
        let catalog = catalog();
        let builder = QueryBuilder::new(catalog.clone());
        let validator = SqlValidator::new(catalog);
        let intent = Intent::ALL[which];
        let slots = declared(intent, &all);

        let candidate = builder.build(intent, &slots).unwrap();

        for word in words(&candidate.sql) {
            prop_assert!(!FORBIDDEN_KEYWORDS.contains(&word.as_str()), "{} in {}", word, candidate.sql);
        }
        prop_assert_eq!(candidate.sql.matches('?').count(), candidate.params.len());

        let result = validator.validate(&candidate);
        prop_assert!(result.is_valid(), "{}: {:?}", candidate.sql, result.violations());
    }
}

#[test]
fn test_every_example_builds_valid_sql() {
    let catalog = catalog();
    let matcher = IntentMatcher::new(100).unwrap();
    let builder = QueryBuilder::new(catalog.clone());
    let validator = SqlValidator::new(catalog);

    for example in EXAMPLES {
        let m = matcher.match_question(example.question).unwrap();
        let candidate = builder.build(m.intent, &m.slots).unwrap();
        let result = validator.validate(&candidate);
        assert!(
            result.is_valid(),
            "{:?} -> {} rejected: {:?}",
            example.question,
            candidate.sql,
            result.violations()
        );
    }
}

#[test]
fn test_top_ten_categories_scenario() {
    let matcher = IntentMatcher::new(100).unwrap();
    let builder = QueryBuilder::new(catalog());

    let m = matcher.match_question("Top 10 categories by sales").unwrap();
    assert_eq!(m.intent, Intent::CategoryTopN);

    let candidate = builder.build(m.intent, &m.slots).unwrap();
    assert!(candidate.sql.contains("DESC, 1 LIMIT ?"));
    assert_eq!(
        candidate.params.last().map(|p| p.value.clone()),
        Some(nlq_ir::QueryParam::Int(10))
    );
}
