//! Query builder: one parameterized DuckDB skeleton per intent
//!
//! Slot values travel as `?` parameters. The only text substituted into a
//! skeleton is a grouping column, an entity table or a ranking column, and
//! each of those is first resolved to a name the catalog declares (or to a
//! fixed output alias), never copied from the question.

use nlq_catalog::SchemaCatalog;
use nlq_ir::{
    BoundParam, CandidateSql, Granularity, Intent, QueryParam, RankMetric, SlotKey, Slots,
};
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

/// Largest `LIMIT` the builder will emit
pub const DEFAULT_MAX_LIMIT: i64 = 100;

/// Status filter used by every revenue and sales skeleton
const COMPLETED_STATUS: &str = "delivered";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BuildError {
    #[error("Unsupported grouping dimension '{dimension}' for {intent}")]
    UnsupportedDimension { intent: Intent, dimension: String },

    #[error("Missing required slot '{slot}' for {intent}")]
    MissingSlot { intent: Intent, slot: SlotKey },

    #[error("Unsupported value '{value}' for slot '{slot}'")]
    UnsupportedSlotValue { slot: SlotKey, value: String },

    #[error("Catalog does not declare {table}.{column}")]
    CatalogMismatch { table: String, column: String },
}

impl BuildError {
    pub fn kind(&self) -> &'static str {
        match self {
            BuildError::UnsupportedDimension { .. } => "unsupported_dimension",
            BuildError::MissingSlot { .. } => "missing_slot",
            BuildError::UnsupportedSlotValue { .. } => "unsupported_slot_value",
            BuildError::CatalogMismatch { .. } => "catalog_mismatch",
        }
    }
}

/// Catalog columns each skeleton reads, checked before any SQL is emitted
fn skeleton_columns(intent: Intent) -> &'static [(&'static str, &'static str)] {
    match intent {
        Intent::RevenueTrend => &[
            ("orders", "order_id"),
            ("orders", "order_status"),
            ("orders", "order_purchase_timestamp"),
            ("payments", "order_id"),
            ("payments", "payment_value"),
        ],
        Intent::CategoryTopN => &[
            ("orders", "order_id"),
            ("orders", "order_status"),
            ("order_items", "order_id"),
            ("order_items", "product_id"),
            ("order_items", "price"),
            ("products", "product_id"),
            ("products", "product_category_name"),
            ("category_translation", "product_category_name"),
            ("category_translation", "product_category_name_english"),
        ],
        Intent::CustomerDistribution => &[
            ("customers", "customer_id"),
            ("customers", "customer_unique_id"),
            ("orders", "order_id"),
            ("orders", "customer_id"),
        ],
        Intent::PaymentBreakdown => &[
            ("payments", "payment_type"),
            ("payments", "payment_value"),
            ("payments", "payment_installments"),
        ],
        Intent::ReviewDistribution => &[("reviews", "review_score")],
        Intent::DeliveryTimeByState => &[
            ("orders", "order_id"),
            ("orders", "customer_id"),
            ("orders", "order_status"),
            ("orders", "order_purchase_timestamp"),
            ("orders", "order_delivered_customer_date"),
            ("customers", "customer_id"),
        ],
        Intent::SellerTopN => &[
            ("orders", "order_id"),
            ("orders", "order_status"),
            ("sellers", "seller_id"),
            ("order_items", "seller_id"),
            ("order_items", "order_id"),
            ("order_items", "price"),
        ],
        Intent::ProductCount => &[("products", "product_category_name")],
        Intent::OrderCount => &[("orders", "order_status")],
        Intent::GenericCount => &[],
        Intent::OrderStatusBreakdown => &[("orders", "order_status")],
        Intent::TopCustomers => &[
            ("customers", "customer_id"),
            ("customers", "customer_unique_id"),
            ("customers", "customer_state"),
            ("orders", "order_id"),
            ("orders", "customer_id"),
            ("orders", "order_status"),
            ("payments", "order_id"),
            ("payments", "payment_value"),
        ],
        Intent::CategoryWeight => &[
            ("products", "product_category_name"),
            ("products", "product_weight_g"),
            ("category_translation", "product_category_name"),
            ("category_translation", "product_category_name_english"),
        ],
    }
}

/// Turns a resolved intent and its slots into candidate SQL
#[derive(Debug, Clone)]
pub struct QueryBuilder {
    catalog: Arc<SchemaCatalog>,
    max_limit: i64,
}

impl QueryBuilder {
    pub fn new(catalog: Arc<SchemaCatalog>) -> Self {
        Self {
            catalog,
            max_limit: DEFAULT_MAX_LIMIT,
        }
    }

    pub fn with_max_limit(mut self, max_limit: i64) -> Self {
        self.max_limit = max_limit.max(1);
        self
    }

    pub fn catalog(&self) -> &SchemaCatalog {
        &self.catalog
    }

    pub fn build(&self, intent: Intent, slots: &Slots) -> Result<CandidateSql, BuildError> {
        for spec in intent.slot_schema() {
            if spec.required && !slots.contains(spec.key) {
                return Err(BuildError::MissingSlot {
                    intent,
                    slot: spec.key,
                });
            }
        }
        for (table, column) in skeleton_columns(intent) {
            self.require_column(table, column)?;
        }

        let candidate = match intent {
            Intent::RevenueTrend => self.revenue_trend(slots)?,
            Intent::CategoryTopN => self.category_top_n(slots)?,
            Intent::CustomerDistribution => self.customer_distribution(slots)?,
            Intent::PaymentBreakdown => payment_breakdown(),
            Intent::ReviewDistribution => review_distribution(slots)?,
            Intent::DeliveryTimeByState => self.delivery_time(slots)?,
            Intent::SellerTopN => self.seller_top_n(slots)?,
            Intent::ProductCount => product_count(),
            Intent::OrderCount => order_count(slots)?,
            Intent::GenericCount => self.generic_count(slots)?,
            Intent::OrderStatusBreakdown => order_status_breakdown(),
            Intent::TopCustomers => self.top_customers(slots)?,
            Intent::CategoryWeight => self.category_weight(slots)?,
        };

        debug!(intent = %intent, params = candidate.params.len(), sql = %candidate.sql, "Built SQL");
        Ok(candidate.with_explanation(intent.explanation()))
    }

    fn require_column(&self, table: &str, column: &str) -> Result<(), BuildError> {
        if self.catalog.column(table, column).is_some() {
            Ok(())
        } else {
            Err(BuildError::CatalogMismatch {
                table: table.to_string(),
                column: column.to_string(),
            })
        }
    }

    fn limit(&self, slots: &Slots) -> Result<BoundParam, BuildError> {
        let limit = slots
            .int(SlotKey::Limit)
            .filter(|n| (1..=self.max_limit).contains(n))
            .ok_or_else(|| unsupported(SlotKey::Limit, slots))?;
        Ok(BoundParam::new("limit", QueryParam::Int(limit)))
    }

    /// Resolve a dimension slot to a declared `<prefix>_<dimension>` column.
    /// Returns the column name and its output alias.
    fn dimension_column(
        &self,
        intent: Intent,
        table: &str,
        prefix: &str,
        slots: &Slots,
    ) -> Result<(String, String), BuildError> {
        let dimension = slots.text(SlotKey::Dimension).ok_or(BuildError::MissingSlot {
            intent,
            slot: SlotKey::Dimension,
        })?;

        let well_formed = !dimension.is_empty()
            && dimension
                .chars()
                .all(|c| c.is_ascii_lowercase() || c == '_');
        let column = well_formed
            .then(|| format!("{}_{}", prefix, dimension))
            .and_then(|name| self.catalog.column(table, &name));

        match column {
            Some(col) => {
                let alias = col
                    .name
                    .strip_prefix(prefix)
                    .and_then(|rest| rest.strip_prefix('_'))
                    .unwrap_or(&col.name)
                    .to_string();
                Ok((col.name.clone(), alias))
            }
            None => Err(BuildError::UnsupportedDimension {
                intent,
                dimension: dimension.to_string(),
            }),
        }
    }

    fn revenue_trend(&self, slots: &Slots) -> Result<CandidateSql, BuildError> {
        let granularity = slots
            .text(SlotKey::Granularity)
            .and_then(|g| g.parse::<Granularity>().ok())
            .ok_or_else(|| unsupported(SlotKey::Granularity, slots))?;

        let sql = "SELECT date_trunc(?, o.order_purchase_timestamp) AS period, \
                   ROUND(SUM(p.payment_value), 2) AS revenue, \
                   COUNT(DISTINCT o.order_id) AS order_count \
                   FROM orders o \
                   JOIN payments p ON p.order_id = o.order_id \
                   WHERE o.order_status = ? \
                   GROUP BY 1 \
                   ORDER BY 1";

        Ok(CandidateSql::from_builder(
            sql,
            vec![
                BoundParam::new("granularity", text(granularity.as_str())),
                BoundParam::new("order_status", text(COMPLETED_STATUS)),
            ],
        ))
    }

    fn category_top_n(&self, slots: &Slots) -> Result<CandidateSql, BuildError> {
        let order_by = rank_column(slots)?;
        let sql = format!(
            "SELECT COALESCE(t.product_category_name_english, p.product_category_name) AS category, \
             COUNT(DISTINCT oi.order_id) AS order_count, \
             ROUND(SUM(oi.price), 2) AS sales \
             FROM order_items oi \
             JOIN orders o ON o.order_id = oi.order_id \
             JOIN products p ON p.product_id = oi.product_id \
             LEFT JOIN category_translation t ON t.product_category_name = p.product_category_name \
             WHERE o.order_status = ? AND p.product_category_name IS NOT NULL \
             GROUP BY 1 \
             ORDER BY {} DESC, 1 \
             LIMIT ?",
            order_by
        );

        Ok(CandidateSql::from_builder(
            sql,
            vec![
                BoundParam::new("order_status", text(COMPLETED_STATUS)),
                self.limit(slots)?,
            ],
        ))
    }

    fn customer_distribution(&self, slots: &Slots) -> Result<CandidateSql, BuildError> {
        let (column, alias) =
            self.dimension_column(Intent::CustomerDistribution, "customers", "customer", slots)?;
        let sql = format!(
            "SELECT c.{column} AS {alias}, \
             COUNT(DISTINCT c.customer_unique_id) AS unique_customers, \
             COUNT(DISTINCT o.order_id) AS order_count \
             FROM customers c \
             JOIN orders o ON o.customer_id = c.customer_id \
             GROUP BY 1 \
             ORDER BY unique_customers DESC, 1 \
             LIMIT ?"
        );

        Ok(CandidateSql::from_builder(sql, vec![self.limit(slots)?]))
    }

    fn delivery_time(&self, slots: &Slots) -> Result<CandidateSql, BuildError> {
        let (column, alias) =
            self.dimension_column(Intent::DeliveryTimeByState, "customers", "customer", slots)?;
        let sql = format!(
            "SELECT c.{column} AS {alias}, \
             ROUND(AVG(date_diff('day', o.order_purchase_timestamp, o.order_delivered_customer_date)), 1) AS avg_delivery_days, \
             COUNT(*) AS order_count \
             FROM orders o \
             JOIN customers c ON c.customer_id = o.customer_id \
             WHERE o.order_status = ? AND o.order_delivered_customer_date IS NOT NULL \
             GROUP BY 1 \
             ORDER BY avg_delivery_days ASC, 1 \
             LIMIT ?"
        );

        Ok(CandidateSql::from_builder(
            sql,
            vec![
                BoundParam::new("order_status", text(COMPLETED_STATUS)),
                self.limit(slots)?,
            ],
        ))
    }

    fn seller_top_n(&self, slots: &Slots) -> Result<CandidateSql, BuildError> {
        let (column, alias) = self.dimension_column(Intent::SellerTopN, "sellers", "seller", slots)?;
        let order_by = rank_column(slots)?;
        let sql = format!(
            "SELECT s.{column} AS {alias}, \
             COUNT(DISTINCT s.seller_id) AS seller_count, \
             COUNT(DISTINCT oi.order_id) AS order_count, \
             ROUND(SUM(oi.price), 2) AS sales \
             FROM sellers s \
             JOIN order_items oi ON oi.seller_id = s.seller_id \
             JOIN orders o ON o.order_id = oi.order_id \
             WHERE o.order_status = ? \
             GROUP BY 1 \
             ORDER BY {order_by} DESC, 1 \
             LIMIT ?"
        );

        Ok(CandidateSql::from_builder(
            sql,
            vec![
                BoundParam::new("order_status", text(COMPLETED_STATUS)),
                self.limit(slots)?,
            ],
        ))
    }

    fn generic_count(&self, slots: &Slots) -> Result<CandidateSql, BuildError> {
        let entity = slots
            .text(SlotKey::Entity)
            .ok_or_else(|| unsupported(SlotKey::Entity, slots))?;
        let table = self
            .catalog
            .table(entity)
            .ok_or_else(|| unsupported(SlotKey::Entity, slots))?;

        let sql = format!("SELECT COUNT(*) AS row_count FROM {}", table.name);
        Ok(CandidateSql::from_builder(sql, Vec::new()))
    }

    fn top_customers(&self, slots: &Slots) -> Result<CandidateSql, BuildError> {
        let sql = "SELECT c.customer_unique_id, c.customer_state, \
                   COUNT(DISTINCT o.order_id) AS order_count, \
                   ROUND(SUM(p.payment_value), 2) AS total_spent \
                   FROM customers c \
                   JOIN orders o ON o.customer_id = c.customer_id \
                   JOIN payments p ON p.order_id = o.order_id \
                   WHERE o.order_status = ? \
                   GROUP BY c.customer_unique_id, c.customer_state \
                   ORDER BY total_spent DESC, c.customer_unique_id \
                   LIMIT ?";

        Ok(CandidateSql::from_builder(
            sql,
            vec![
                BoundParam::new("order_status", text(COMPLETED_STATUS)),
                self.limit(slots)?,
            ],
        ))
    }

    fn category_weight(&self, slots: &Slots) -> Result<CandidateSql, BuildError> {
        let sql = "SELECT COALESCE(t.product_category_name_english, p.product_category_name) AS category, \
                   ROUND(AVG(p.product_weight_g), 1) AS avg_weight_g, \
                   COUNT(*) AS product_count \
                   FROM products p \
                   LEFT JOIN category_translation t ON t.product_category_name = p.product_category_name \
                   WHERE p.product_category_name IS NOT NULL AND p.product_weight_g IS NOT NULL \
                   GROUP BY 1 \
                   ORDER BY avg_weight_g DESC, 1 \
                   LIMIT ?";

        Ok(CandidateSql::from_builder(sql, vec![self.limit(slots)?]))
    }
}

fn payment_breakdown() -> CandidateSql {
    CandidateSql::from_builder(
        "SELECT payment_type, \
         COUNT(*) AS payment_count, \
         ROUND(SUM(payment_value), 2) AS total_value, \
         ROUND(AVG(payment_installments), 2) AS avg_installments \
         FROM payments \
         GROUP BY payment_type \
         ORDER BY payment_count DESC, payment_type",
        Vec::new(),
    )
}

fn review_distribution(slots: &Slots) -> Result<CandidateSql, BuildError> {
    match slots.get(SlotKey::FilterScore) {
        None => Ok(CandidateSql::from_builder(
            "SELECT review_score, \
             COUNT(*) AS review_count, \
             ROUND(100.0 * COUNT(*) / SUM(COUNT(*)) OVER (), 2) AS pct \
             FROM reviews \
             GROUP BY review_score \
             ORDER BY review_score",
            Vec::new(),
        )),
        Some(value) => {
            let score = value
                .as_int()
                .filter(|s| (1..=5).contains(s))
                .ok_or_else(|| unsupported(SlotKey::FilterScore, slots))?;
            Ok(CandidateSql::from_builder(
                "SELECT review_score, \
                 COUNT(*) AS review_count \
                 FROM reviews \
                 WHERE review_score = ? \
                 GROUP BY review_score",
                vec![BoundParam::new("filter_score", QueryParam::Int(score))],
            ))
        }
    }
}

fn product_count() -> CandidateSql {
    CandidateSql::from_builder(
        "SELECT COUNT(*) AS total_products, \
         COUNT(DISTINCT product_category_name) AS distinct_categories \
         FROM products",
        Vec::new(),
    )
}

fn order_count(slots: &Slots) -> Result<CandidateSql, BuildError> {
    match slots.get(SlotKey::FilterStatus) {
        None => Ok(CandidateSql::from_builder(
            "SELECT COUNT(*) AS order_count FROM orders",
            Vec::new(),
        )),
        Some(value) => {
            let status = value
                .as_text()
                .ok_or_else(|| unsupported(SlotKey::FilterStatus, slots))?;
            Ok(CandidateSql::from_builder(
                "SELECT COUNT(*) AS order_count FROM orders WHERE order_status = ?",
                vec![BoundParam::new("filter_status", text(status))],
            ))
        }
    }
}

fn order_status_breakdown() -> CandidateSql {
    CandidateSql::from_builder(
        "SELECT order_status, \
         COUNT(*) AS order_count, \
         ROUND(100.0 * COUNT(*) / SUM(COUNT(*)) OVER (), 2) AS pct \
         FROM orders \
         GROUP BY order_status \
         ORDER BY order_count DESC, order_status",
        Vec::new(),
    )
}

/// Output alias a top-N ranking sorts by
fn rank_column(slots: &Slots) -> Result<&'static str, BuildError> {
    let metric = slots
        .text(SlotKey::Metric)
        .and_then(|m| m.parse::<RankMetric>().ok())
        .ok_or_else(|| unsupported(SlotKey::Metric, slots))?;
    Ok(match metric {
        RankMetric::Sales => "sales",
        RankMetric::Orders => "order_count",
    })
}

fn text(value: &str) -> QueryParam {
    QueryParam::Text(value.to_string())
}

fn unsupported(slot: SlotKey, slots: &Slots) -> BuildError {
    let value = match slots.get(slot) {
        Some(nlq_ir::SlotValue::Int(i)) => i.to_string(),
        Some(nlq_ir::SlotValue::Text(s)) => s.clone(),
        None => String::new(),
    };
    BuildError::UnsupportedSlotValue { slot, value }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn builder() -> QueryBuilder {
        QueryBuilder::new(Arc::new(SchemaCatalog::builtin().unwrap()))
    }

    fn placeholders(sql: &str) -> usize {
        sql.matches('?').count()
    }

    #[test]
    fn test_revenue_trend_binds_granularity() {
        let slots = Slots::new().with(SlotKey::Granularity, "month");
        let sql = builder().build(Intent::RevenueTrend, &slots).unwrap();

        assert!(sql.sql.contains("date_trunc(?, o.order_purchase_timestamp)"));
        assert!(sql.sql.contains("GROUP BY 1"));
        assert_eq!(sql.params[0].value, QueryParam::Text("month".into()));
        assert_eq!(placeholders(&sql.sql), sql.params.len());
        assert!(!sql.explanation.is_empty());
    }

    #[test]
    fn test_category_top_n_orders_and_limits() {
        let slots = Slots::new()
            .with(SlotKey::Limit, 10)
            .with(SlotKey::Metric, "sales");
        let sql = builder().build(Intent::CategoryTopN, &slots).unwrap();

        assert!(sql.sql.contains("ORDER BY sales DESC, 1 LIMIT ?"));
        assert_eq!(
            sql.params,
            vec![
                BoundParam::new("order_status", QueryParam::Text("delivered".into())),
                BoundParam::new("limit", QueryParam::Int(10)),
            ]
        );
        assert_eq!(placeholders(&sql.sql), sql.params.len());

        let slots = Slots::new()
            .with(SlotKey::Limit, 3)
            .with(SlotKey::Metric, "orders");
        let sql = builder().build(Intent::CategoryTopN, &slots).unwrap();
        assert!(sql.sql.contains("ORDER BY order_count DESC"));
    }

    #[test]
    fn test_unsupported_dimension() {
        let slots = Slots::new()
            .with(SlotKey::Dimension, "payment")
            .with(SlotKey::Limit, 10);
        let err = builder()
            .build(Intent::CustomerDistribution, &slots)
            .unwrap_err();
        assert_eq!(err.kind(), "unsupported_dimension");

        let slots = Slots::new()
            .with(SlotKey::Dimension, "state; drop table orders")
            .with(SlotKey::Limit, 10);
        assert!(matches!(
            builder().build(Intent::CustomerDistribution, &slots),
            Err(BuildError::UnsupportedDimension { .. })
        ));
    }

    #[test]
    fn test_dimension_resolves_to_catalog_column() {
        let slots = Slots::new()
            .with(SlotKey::Dimension, "zip_code_prefix")
            .with(SlotKey::Limit, 5)
            .with(SlotKey::Metric, "sales");
        let sql = builder().build(Intent::SellerTopN, &slots).unwrap();
        assert!(sql.sql.contains("s.seller_zip_code_prefix AS zip_code_prefix"));
        assert!(sql.sql.contains("WHERE o.order_status = ?"));
        assert_eq!(sql.params[0].value, QueryParam::Text("delivered".into()));
        assert_eq!(placeholders(&sql.sql), sql.params.len());
    }

    #[test]
    fn test_missing_slot() {
        let err = builder()
            .build(Intent::CategoryTopN, &Slots::new())
            .unwrap_err();
        assert_eq!(
            err,
            BuildError::MissingSlot {
                intent: Intent::CategoryTopN,
                slot: SlotKey::Limit
            }
        );
    }

    #[test]
    fn test_limit_out_of_range() {
        let slots = Slots::new()
            .with(SlotKey::Limit, 500)
            .with(SlotKey::Metric, "sales");
        assert!(matches!(
            builder().build(Intent::CategoryTopN, &slots),
            Err(BuildError::UnsupportedSlotValue { slot: SlotKey::Limit, .. })
        ));
    }

    #[test]
    fn test_review_filter_is_bound() {
        let slots = Slots::new().with(SlotKey::FilterScore, 5);
        let sql = builder().build(Intent::ReviewDistribution, &slots).unwrap();
        assert!(sql.sql.contains("WHERE review_score = ?"));
        assert_eq!(sql.params[0].value, QueryParam::Int(5));

        let slots = Slots::new().with(SlotKey::FilterScore, 9);
        assert!(builder().build(Intent::ReviewDistribution, &slots).is_err());
    }

    #[test]
    fn test_generic_count_uses_catalog_table() {
        let slots = Slots::new().with(SlotKey::Entity, "sellers");
        let sql = builder().build(Intent::GenericCount, &slots).unwrap();
        assert_eq!(sql.sql, "SELECT COUNT(*) AS row_count FROM sellers");

        let slots = Slots::new().with(SlotKey::Entity, "users");
        assert!(builder().build(Intent::GenericCount, &slots).is_err());
    }

    #[test]
    fn test_catalog_mismatch() {
        let yaml = r#"
name: tiny
tables:
  - name: orders
    columns:
      - { name: order_id, type: identifier }
"#;
        let catalog = Arc::new(SchemaCatalog::from_yaml_str(yaml).unwrap());
        let err = QueryBuilder::new(catalog)
            .build(Intent::PaymentBreakdown, &Slots::new())
            .unwrap_err();
        assert_eq!(err.kind(), "catalog_mismatch");
    }
}
