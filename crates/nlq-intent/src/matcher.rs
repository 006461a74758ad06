//! Rule evaluation

use crate::normalize::normalize;
use crate::rules::{Rule, RuleTable};
use crate::slots::SlotExtractors;
use nlq_ir::{Intent, Slots};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum MatcherError {
    #[error("Invalid slot extractor pattern: {0}")]
    Pattern(#[from] regex::Error),

    #[error("Invalid limit cap {0}: must be at least 1")]
    LimitCap(i64),
}

/// No rule accepted the question
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("No supported question pattern matched")]
pub struct NoMatch;

/// A resolved intent with its populated slots
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntentMatch {
    pub intent: Intent,
    pub slots: Slots,
    /// Name of the rule that fired
    pub rule: &'static str,
}

/// Deterministic intent matcher. Pure with respect to its input: the rule
/// table and extractors are fixed at construction.
#[derive(Debug)]
pub struct IntentMatcher {
    table: RuleTable,
    extractors: SlotExtractors,
}

impl IntentMatcher {
    /// Matcher over the builtin rule table; `max_limit` caps top-N values
    pub fn new(max_limit: i64) -> Result<Self, MatcherError> {
        Self::with_rules(RuleTable::builtin(), max_limit)
    }

    pub fn with_rules(table: RuleTable, max_limit: i64) -> Result<Self, MatcherError> {
        if max_limit < 1 {
            return Err(MatcherError::LimitCap(max_limit));
        }
        Ok(Self {
            table,
            extractors: SlotExtractors::new(max_limit)?,
        })
    }

    /// Normalize raw question text the same way matching does
    pub fn normalize(&self, raw: &str) -> String {
        normalize(raw)
    }

    /// Match already-normalized text.
    ///
    /// The first rule in table order whose phrase groups all match and whose
    /// required slots were all extracted wins. Slots declared by the intent
    /// but not found in the text get the schema default; undeclared slots are
    /// never populated.
    pub fn match_text(&self, normalized: &str) -> Result<IntentMatch, NoMatch> {
        if normalized.is_empty() {
            return Err(NoMatch);
        }
        let padded = format!(" {} ", normalized);

        for rule in self.table.rules() {
            if !rule.groups.iter().all(|g| g.matches_padded(&padded)) {
                continue;
            }
            if let Some(slots) = self.fill_slots(rule, normalized) {
                debug!(rule = rule.name, intent = %rule.intent, "Intent rule matched");
                return Ok(IntentMatch {
                    intent: rule.intent,
                    slots,
                    rule: rule.name,
                });
            }
        }

        debug!(text = normalized, "No intent rule matched");
        Err(NoMatch)
    }

    /// Normalize then match
    pub fn match_question(&self, raw: &str) -> Result<IntentMatch, NoMatch> {
        self.match_text(&normalize(raw))
    }

    fn fill_slots(&self, rule: &Rule, text: &str) -> Option<Slots> {
        let mut slots = Slots::new();

        for spec in rule.intent.slot_schema() {
            match self.extractors.extract(spec.key, text) {
                Some(value) => slots.insert(spec.key, value),
                None => {
                    if let Some(default) = spec.default {
                        slots.insert(spec.key, default);
                    }
                }
            }
        }

        // Rule-level requirements must come from the text, not a default
        let satisfied = rule
            .required_slots
            .iter()
            .all(|key| self.extractors.extract(*key, text).is_some());

        satisfied.then_some(slots)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nlq_ir::SlotKey;

    fn matcher() -> IntentMatcher {
        IntentMatcher::new(100).unwrap()
    }

    #[test]
    fn test_monthly_revenue_trend() {
        let m = matcher().match_question("Monthly revenue trend").unwrap();
        assert_eq!(m.intent, Intent::RevenueTrend);
        assert_eq!(m.slots.text(SlotKey::Granularity), Some("month"));
        assert_eq!(m.slots.len(), 1);
    }

    #[test]
    fn test_trend_granularity_defaults_to_month() {
        let m = matcher().match_question("Revenue growth over time").unwrap();
        assert_eq!(m.intent, Intent::RevenueTrend);
        assert_eq!(m.slots.text(SlotKey::Granularity), Some("month"));

        let m = matcher().match_question("Show weekly sales").unwrap();
        assert_eq!(m.slots.text(SlotKey::Granularity), Some("week"));
    }

    #[test]
    fn test_top_categories_by_sales() {
        let m = matcher().match_question("Top 10 categories by sales").unwrap();
        assert_eq!(m.intent, Intent::CategoryTopN);
        assert_eq!(m.slots.int(SlotKey::Limit), Some(10));
        assert_eq!(m.slots.text(SlotKey::Metric), Some("sales"));
        assert!(!m.slots.contains(SlotKey::Granularity));
    }

    #[test]
    fn test_number_word_limit() {
        let m = matcher().match_question("Top two categories by sales").unwrap();
        assert_eq!(m.intent, Intent::CategoryTopN);
        assert_eq!(m.slots.int(SlotKey::Limit), Some(2));
    }

    #[test]
    fn test_limit_defaults_to_ten() {
        let m = matcher().match_question("Best selling categories").unwrap();
        assert_eq!(m.intent, Intent::CategoryTopN);
        assert_eq!(m.slots.int(SlotKey::Limit), Some(10));
    }

    #[test]
    fn test_code_mixed_star_reviews() {
        let m = matcher().match_question("5 star reviews kitne hain?").unwrap();
        assert_eq!(m.intent, Intent::ReviewDistribution);
        assert_eq!(m.slots.int(SlotKey::FilterScore), Some(5));
        assert_eq!(m.rule, "review_score_filter");
    }

    #[test]
    fn test_unfiltered_review_distribution() {
        let m = matcher().match_question("Review score distribution").unwrap();
        assert_eq!(m.intent, Intent::ReviewDistribution);
        assert!(m.slots.is_empty());
    }

    #[test]
    fn test_weather_is_no_match() {
        assert_eq!(matcher().match_question("what's the weather").unwrap_err(), NoMatch);
        assert_eq!(matcher().match_question("   ").unwrap_err(), NoMatch);
    }

    #[test]
    fn test_counts() {
        let m = matcher().match_question("How many orders were cancelled?").unwrap();
        assert_eq!(m.intent, Intent::OrderCount);
        assert_eq!(m.slots.text(SlotKey::FilterStatus), Some("canceled"));

        let m = matcher().match_question("How many sellers are there?").unwrap();
        assert_eq!(m.intent, Intent::GenericCount);
        assert_eq!(m.slots.text(SlotKey::Entity), Some("sellers"));

        let m = matcher().match_question("kitne grahak hain").unwrap();
        assert_eq!(m.intent, Intent::GenericCount);
        assert_eq!(m.slots.text(SlotKey::Entity), Some("customers"));
    }

    #[test]
    fn test_customer_dimension() {
        let m = matcher().match_question("Which states have the most customers?").unwrap();
        assert_eq!(m.intent, Intent::CustomerDistribution);
        assert_eq!(m.slots.text(SlotKey::Dimension), Some("state"));

        let m = matcher().match_question("Customers by city").unwrap();
        assert_eq!(m.slots.text(SlotKey::Dimension), Some("city"));

        // passed through for the builder to reject
        let m = matcher().match_question("Customers by payment type").unwrap();
        assert_eq!(m.intent, Intent::CustomerDistribution);
        assert_eq!(m.slots.text(SlotKey::Dimension), Some("payment"));
    }

    #[test]
    fn test_matching_is_deterministic() {
        let matcher = matcher();
        let first = matcher.match_question("Top seller cities");
        for _ in 0..5 {
            assert_eq!(matcher.match_question("Top seller cities"), first);
        }
    }

    #[test]
    fn test_rejects_zero_limit_cap() {
        assert!(matches!(IntentMatcher::new(0), Err(MatcherError::LimitCap(0))));
    }
}
