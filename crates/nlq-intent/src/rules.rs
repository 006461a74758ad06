//! Rule table: phrase groups and required slots per intent

use nlq_ir::{Intent, SlotKey};

/// Any-of set of phrases. A phrase matches on whole words of the normalized
/// text, so "order" never matches inside "orders".
#[derive(Debug, Clone)]
pub struct PhraseGroup {
    phrases: &'static [&'static str],
}

impl PhraseGroup {
    pub const fn any_of(phrases: &'static [&'static str]) -> Self {
        Self { phrases }
    }

    /// `padded` must be the normalized text with one leading and one
    /// trailing space.
    pub(crate) fn matches_padded(&self, padded: &str) -> bool {
        self.phrases.iter().any(|phrase| {
            let bytes = padded.as_bytes();
            padded.match_indices(phrase).any(|(at, _)| {
                let end = at + phrase.len();
                at > 0 && bytes[at - 1] == b' ' && end < bytes.len() && bytes[end] == b' '
            })
        })
    }

    pub fn phrases(&self) -> &'static [&'static str] {
        self.phrases
    }
}

#[derive(Debug, Clone)]
pub struct Rule {
    pub name: &'static str,
    pub intent: Intent,
    /// Every group must match
    pub groups: Vec<PhraseGroup>,
    /// Slots that must be extracted for the rule to fire
    pub required_slots: Vec<SlotKey>,
}

impl Rule {
    pub fn new(name: &'static str, intent: Intent) -> Self {
        Self {
            name,
            intent,
            groups: Vec::new(),
            required_slots: Vec::new(),
        }
    }

    pub fn requires(mut self, phrases: &'static [&'static str]) -> Self {
        self.groups.push(PhraseGroup::any_of(phrases));
        self
    }

    pub fn requires_slot(mut self, key: SlotKey) -> Self {
        self.required_slots.push(key);
        self
    }

    /// Rules with more requirements are tried first
    pub fn specificity(&self) -> usize {
        self.groups.len() + self.required_slots.len()
    }
}

/// Rules in evaluation order: descending specificity, declaration order
/// within equal specificity.
#[derive(Debug, Clone)]
pub struct RuleTable {
    rules: Vec<Rule>,
}

impl RuleTable {
    pub fn new(mut rules: Vec<Rule>) -> Self {
        // stable sort keeps declaration order for ties
        rules.sort_by(|a, b| b.specificity().cmp(&a.specificity()));
        Self { rules }
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// The demo rule table
    pub fn builtin() -> Self {
        Self::new(builtin_rules())
    }
}

const COUNT: &[&str] = &["how many", "count", "number of", "total number", "total count"];
const REVENUE: &[&str] = &["revenue", "sales", "gmv", "income", "earnings", "turnover"];
const TREND: &[&str] = &[
    "trend", "trends", "over time", "growth", "timeline", "time series", "monthly", "daily",
    "weekly", "yearly", "quarterly", "annual", "by month", "per month", "by day", "per day",
    "by week", "per week", "by year", "per year", "by quarter", "per quarter", "month wise",
];
const CATEGORY: &[&str] = &["category", "categories", "product type", "product types"];
const CUSTOMER: &[&str] = &["customer", "customers", "buyer", "buyers", "shopper", "shoppers", "clients"];
const TOP: &[&str] = &[
    "top", "best", "biggest", "highest spending", "big spenders", "most valuable", "loyal",
    "spend the most", "spent the most",
];
const DISTRIBUTION: &[&str] = &[
    "distribution", "state", "states", "city", "cities", "region", "regions", "by", "per",
    "where", "location", "locations", "across", "wise", "zip",
];
const SELLER: &[&str] = &["seller", "sellers", "vendor", "vendors", "merchant", "merchants"];
const DELIVERY: &[&str] = &[
    "delivery", "deliveries", "deliver", "delivered in", "shipping", "freight", "lead time",
    "days to arrive", "arrive",
];
const PAYMENT: &[&str] = &[
    "payment", "payments", "pay", "paid", "credit card", "boleto", "voucher", "debit card",
    "installment", "installments",
];
const REVIEW: &[&str] = &[
    "review", "reviews", "rating", "ratings", "star", "stars", "score", "scores",
    "satisfaction", "feedback",
];
const STATUS: &[&str] = &["status", "statuses", "canceled", "cancellation", "order state"];
const WEIGHT: &[&str] = &["heavy", "heaviest", "weight", "weights", "bulky"];
const PRODUCT: &[&str] = &["product", "products", "item", "items", "sku", "skus"];
const ORDER: &[&str] = &["order", "orders"];

/// Declaration order matters only between rules of equal specificity.
fn builtin_rules() -> Vec<Rule> {
    vec![
        Rule::new("revenue_trend", Intent::RevenueTrend)
            .requires(REVENUE)
            .requires(TREND),
        Rule::new("top_customers", Intent::TopCustomers)
            .requires(CUSTOMER)
            .requires(TOP),
        Rule::new("customer_distribution", Intent::CustomerDistribution)
            .requires(CUSTOMER)
            .requires(DISTRIBUTION),
        Rule::new("review_score_filter", Intent::ReviewDistribution)
            .requires(REVIEW)
            .requires_slot(SlotKey::FilterScore),
        Rule::new("category_weight", Intent::CategoryWeight)
            .requires(WEIGHT)
            .requires(&["product", "products", "category", "categories", "item", "items"]),
        Rule::new("order_count", Intent::OrderCount)
            .requires(COUNT)
            .requires(ORDER),
        Rule::new("product_count", Intent::ProductCount)
            .requires(COUNT)
            .requires(PRODUCT),
        Rule::new("generic_count", Intent::GenericCount)
            .requires(COUNT)
            .requires_slot(SlotKey::Entity),
        Rule::new("category_top_n", Intent::CategoryTopN).requires(CATEGORY),
        Rule::new("seller_top_n", Intent::SellerTopN).requires(SELLER),
        Rule::new("delivery_time", Intent::DeliveryTimeByState).requires(DELIVERY),
        Rule::new("payment_breakdown", Intent::PaymentBreakdown).requires(PAYMENT),
        Rule::new("review_distribution", Intent::ReviewDistribution).requires(REVIEW),
        Rule::new("order_status_breakdown", Intent::OrderStatusBreakdown).requires(STATUS),
        Rule::new("category_weight_plain", Intent::CategoryWeight).requires(WEIGHT),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phrase_matches_whole_words_only() {
        let group = PhraseGroup::any_of(&["order", "how many"]);
        assert!(group.matches_padded(" show order status "));
        assert!(group.matches_padded(" how many sellers "));
        assert!(!group.matches_padded(" orders by state "));
        assert!(!group.matches_padded(" somehow many "));
    }

    #[test]
    fn test_table_sorted_by_specificity_then_declaration() {
        let table = RuleTable::new(vec![
            Rule::new("a", Intent::PaymentBreakdown).requires(PAYMENT),
            Rule::new("b", Intent::OrderCount).requires(COUNT).requires(ORDER),
            Rule::new("c", Intent::ProductCount).requires(COUNT).requires(PRODUCT),
            Rule::new("d", Intent::GenericCount)
                .requires(COUNT)
                .requires_slot(SlotKey::Entity),
        ]);

        let names: Vec<_> = table.rules().iter().map(|r| r.name).collect();
        assert_eq!(names, vec!["b", "c", "d", "a"]);
    }

    #[test]
    fn test_builtin_covers_every_intent() {
        let table = RuleTable::builtin();
        for intent in Intent::ALL {
            assert!(
                table.rules().iter().any(|r| r.intent == intent),
                "no rule for {}",
                intent
            );
        }
    }

    #[test]
    fn test_generic_count_after_specific_counts() {
        let table = RuleTable::builtin();
        let pos = |name: &str| table.rules().iter().position(|r| r.name == name).unwrap();
        assert!(pos("review_score_filter") < pos("generic_count"));
        assert!(pos("order_count") < pos("generic_count"));
        assert!(pos("generic_count") < pos("category_top_n"));
    }
}
