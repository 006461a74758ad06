//! Intents and slots

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
#[error("Unknown {kind}: {value}")]
pub struct ParseTagError {
    pub kind: &'static str,
    pub value: String,
}

/// The closed set of analytical questions answerable without an LLM
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    RevenueTrend,
    CategoryTopN,
    CustomerDistribution,
    PaymentBreakdown,
    ReviewDistribution,
    DeliveryTimeByState,
    SellerTopN,
    ProductCount,
    OrderCount,
    GenericCount,
    OrderStatusBreakdown,
    TopCustomers,
    CategoryWeight,
}

impl Intent {
    pub const ALL: [Intent; 13] = [
        Intent::RevenueTrend,
        Intent::CategoryTopN,
        Intent::CustomerDistribution,
        Intent::PaymentBreakdown,
        Intent::ReviewDistribution,
        Intent::DeliveryTimeByState,
        Intent::SellerTopN,
        Intent::ProductCount,
        Intent::OrderCount,
        Intent::GenericCount,
        Intent::OrderStatusBreakdown,
        Intent::TopCustomers,
        Intent::CategoryWeight,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Intent::RevenueTrend => "revenue_trend",
            Intent::CategoryTopN => "category_top_n",
            Intent::CustomerDistribution => "customer_distribution",
            Intent::PaymentBreakdown => "payment_breakdown",
            Intent::ReviewDistribution => "review_distribution",
            Intent::DeliveryTimeByState => "delivery_time_by_state",
            Intent::SellerTopN => "seller_top_n",
            Intent::ProductCount => "product_count",
            Intent::OrderCount => "order_count",
            Intent::GenericCount => "generic_count",
            Intent::OrderStatusBreakdown => "order_status_breakdown",
            Intent::TopCustomers => "top_customers",
            Intent::CategoryWeight => "category_weight",
        }
    }
}

/// Default value applied when a declared slot was not extracted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotDefault {
    Int(i64),
    Text(&'static str),
}

impl From<SlotDefault> for SlotValue {
    fn from(value: SlotDefault) -> Self {
        match value {
            SlotDefault::Int(i) => SlotValue::Int(i),
            SlotDefault::Text(s) => SlotValue::Text(s.to_string()),
        }
    }
}

/// One slot in an intent's template
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotSpec {
    pub key: SlotKey,
    pub required: bool,
    pub default: Option<SlotDefault>,
}

impl SlotSpec {
    pub const fn required(key: SlotKey) -> Self {
        Self { key, required: true, default: None }
    }

    pub const fn defaulted(key: SlotKey, default: SlotDefault) -> Self {
        Self { key, required: true, default: Some(default) }
    }

    pub const fn optional(key: SlotKey) -> Self {
        Self { key, required: false, default: None }
    }
}

/// Row count used when a top-N question gives no number
pub const DEFAULT_LIMIT: i64 = 10;

const LIMIT: SlotSpec = SlotSpec::defaulted(SlotKey::Limit, SlotDefault::Int(DEFAULT_LIMIT));
const METRIC: SlotSpec = SlotSpec::defaulted(SlotKey::Metric, SlotDefault::Text("sales"));

impl Intent {
    /// Slots this intent's template declares. Anything else is never
    /// populated for it.
    pub fn slot_schema(&self) -> &'static [SlotSpec] {
        const GRANULARITY: SlotSpec =
            SlotSpec::defaulted(SlotKey::Granularity, SlotDefault::Text("month"));
        const BY_STATE: SlotSpec =
            SlotSpec::defaulted(SlotKey::Dimension, SlotDefault::Text("state"));
        const BY_CITY: SlotSpec = SlotSpec::defaulted(SlotKey::Dimension, SlotDefault::Text("city"));
        const SCORE: SlotSpec = SlotSpec::optional(SlotKey::FilterScore);
        const STATUS: SlotSpec = SlotSpec::optional(SlotKey::FilterStatus);
        const ENTITY: SlotSpec = SlotSpec::required(SlotKey::Entity);

        match self {
            Intent::RevenueTrend => &[GRANULARITY],
            Intent::CategoryTopN => &[LIMIT, METRIC],
            Intent::CustomerDistribution => &[BY_STATE, LIMIT],
            Intent::PaymentBreakdown => &[],
            Intent::ReviewDistribution => &[SCORE],
            Intent::DeliveryTimeByState => &[BY_STATE, LIMIT],
            Intent::SellerTopN => &[BY_CITY, LIMIT, METRIC],
            Intent::ProductCount => &[],
            Intent::OrderCount => &[STATUS],
            Intent::GenericCount => &[ENTITY],
            Intent::OrderStatusBreakdown => &[],
            Intent::TopCustomers => &[LIMIT],
            Intent::CategoryWeight => &[LIMIT],
        }
    }

    pub fn declares(&self, key: SlotKey) -> bool {
        self.slot_schema().iter().any(|spec| spec.key == key)
    }

    /// One-line plain English description of what the answer shows
    pub fn explanation(&self) -> &'static str {
        match self {
            Intent::RevenueTrend => "Revenue trend for delivered orders (BRL), bucketed by period.",
            Intent::CategoryTopN => "Top product categories ranked by sales or order volume.",
            Intent::CustomerDistribution => "Unique customers and orders per location.",
            Intent::PaymentBreakdown => {
                "Payment method distribution: credit card, boleto, voucher, debit card."
            }
            Intent::ReviewDistribution => "Distribution of review scores (1-5 stars).",
            Intent::DeliveryTimeByState => "Average delivery time in days per location, fastest first.",
            Intent::SellerTopN => "Top seller locations by sales or orders fulfilled.",
            Intent::ProductCount => "Number of products and distinct categories in the catalog.",
            Intent::OrderCount => "Number of orders, optionally filtered by status.",
            Intent::GenericCount => "Row count for the requested entity.",
            Intent::OrderStatusBreakdown => "Order status distribution across all orders.",
            Intent::TopCustomers => "Top customers by total spending on delivered orders.",
            Intent::CategoryWeight => "Heaviest product categories by average product weight.",
        }
    }
}

impl fmt::Display for Intent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Intent {
    type Err = ParseTagError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Intent::ALL
            .iter()
            .copied()
            .find(|intent| intent.as_str() == s)
            .ok_or_else(|| ParseTagError {
                kind: "intent",
                value: s.to_string(),
            })
    }
}

/// Named slot a rule may extract
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SlotKey {
    Granularity,
    Limit,
    Dimension,
    Metric,
    FilterScore,
    FilterStatus,
    Entity,
}

impl SlotKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            SlotKey::Granularity => "granularity",
            SlotKey::Limit => "limit",
            SlotKey::Dimension => "dimension",
            SlotKey::Metric => "metric",
            SlotKey::FilterScore => "filter_score",
            SlotKey::FilterStatus => "filter_status",
            SlotKey::Entity => "entity",
        }
    }
}

impl fmt::Display for SlotKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SlotValue {
    Int(i64),
    Text(String),
}

impl SlotValue {
    pub fn as_int(&self) -> Option<i64> {
        match self {
            SlotValue::Int(i) => Some(*i),
            SlotValue::Text(_) => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            SlotValue::Text(s) => Some(s),
            SlotValue::Int(_) => None,
        }
    }
}

impl From<i64> for SlotValue {
    fn from(value: i64) -> Self {
        SlotValue::Int(value)
    }
}

impl From<i32> for SlotValue {
    fn from(value: i32) -> Self {
        SlotValue::Int(i64::from(value))
    }
}

impl From<u32> for SlotValue {
    fn from(value: u32) -> Self {
        SlotValue::Int(i64::from(value))
    }
}

impl From<&str> for SlotValue {
    fn from(value: &str) -> Self {
        SlotValue::Text(value.to_string())
    }
}

impl From<String> for SlotValue {
    fn from(value: String) -> Self {
        SlotValue::Text(value)
    }
}

/// Extracted slot values keyed by name.
///
/// Only keys declared by the matched intent are ever present; there is no
/// null-filling of absent slots.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Slots(BTreeMap<SlotKey, SlotValue>);

impl Slots {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert, handy for tests and defaults
    pub fn with(mut self, key: SlotKey, value: impl Into<SlotValue>) -> Self {
        self.0.insert(key, value.into());
        self
    }

    pub fn insert(&mut self, key: SlotKey, value: impl Into<SlotValue>) {
        self.0.insert(key, value.into());
    }

    pub fn get(&self, key: SlotKey) -> Option<&SlotValue> {
        self.0.get(&key)
    }

    pub fn int(&self, key: SlotKey) -> Option<i64> {
        self.get(key).and_then(SlotValue::as_int)
    }

    pub fn text(&self, key: SlotKey) -> Option<&str> {
        self.get(key).and_then(SlotValue::as_text)
    }

    pub fn contains(&self, key: SlotKey) -> bool {
        self.0.contains_key(&key)
    }

    pub fn keys(&self) -> impl Iterator<Item = SlotKey> + '_ {
        self.0.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Time bucket for trend intents
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    Day,
    Week,
    #[default]
    Month,
    Quarter,
    Year,
}

impl Granularity {
    pub const ALL: [Granularity; 5] = [
        Granularity::Day,
        Granularity::Week,
        Granularity::Month,
        Granularity::Quarter,
        Granularity::Year,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Granularity::Day => "day",
            Granularity::Week => "week",
            Granularity::Month => "month",
            Granularity::Quarter => "quarter",
            Granularity::Year => "year",
        }
    }
}

impl FromStr for Granularity {
    type Err = ParseTagError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Granularity::ALL
            .iter()
            .copied()
            .find(|g| g.as_str() == s)
            .ok_or_else(|| ParseTagError {
                kind: "granularity",
                value: s.to_string(),
            })
    }
}

/// What a top-N ranking orders by
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RankMetric {
    #[default]
    Sales,
    Orders,
}

impl RankMetric {
    pub const ALL: [RankMetric; 2] = [RankMetric::Sales, RankMetric::Orders];

    pub fn as_str(&self) -> &'static str {
        match self {
            RankMetric::Sales => "sales",
            RankMetric::Orders => "orders",
        }
    }
}

impl FromStr for RankMetric {
    type Err = ParseTagError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RankMetric::ALL
            .iter()
            .copied()
            .find(|m| m.as_str() == s)
            .ok_or_else(|| ParseTagError {
                kind: "metric",
                value: s.to_string(),
            })
    }
}
