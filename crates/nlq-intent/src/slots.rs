//! Slot extraction from normalized text

use nlq_ir::{Granularity, RankMetric, SlotKey, SlotValue};
use regex::Regex;

/// Order statuses a question may filter on
const ORDER_STATUSES: &[&str] = &[
    "delivered",
    "shipped",
    "canceled",
    "unavailable",
    "invoiced",
    "processing",
    "created",
    "approved",
];

/// Words that can follow "by"/"per" without naming a grouping dimension
const NON_DIMENSION_WORDS: &[&str] = &[
    "sales", "revenue", "gmv", "orders", "order", "count", "volume", "spend", "spending",
    "value", "number", "total", "the", "a", "an", "most", "amount", "money", "weight",
];

/// Compiled slot extractors. Built once per matcher.
#[derive(Debug)]
pub(crate) struct SlotExtractors {
    limit: Regex,
    granularity: Regex,
    dimension_by: Regex,
    dimension_wise: Regex,
    location: Regex,
    metric: Regex,
    score: Regex,
    status: Regex,
    entity: Regex,
    max_limit: i64,
}

impl SlotExtractors {
    pub(crate) fn new(max_limit: i64) -> Result<Self, regex::Error> {
        Ok(Self {
            limit: Regex::new(
                r"\b(?:top|best|first|highest|largest|biggest|bottom|limit)\s+(\d{1,6})\b|\b(\d{1,6})\s+(?:top|best|biggest|highest|largest|heaviest)\b",
            )?,
            granularity: Regex::new(
                r"\b(daily|day|days|weekly|week|weeks|monthly|month|months|quarterly|quarter|quarters|yearly|year|years|annual|annually)\b",
            )?,
            dimension_by: Regex::new(r"\b(?:by|per|across|each)\s+([a-z_]+)\b")?,
            dimension_wise: Regex::new(r"\b([a-z_]+)\s+wise\b")?,
            location: Regex::new(r"\b(state|states|city|cities|zip|zipcode|zipcodes)\b")?,
            metric: Regex::new(
                r"\b(sales|revenue|gmv|spend|spending|orders|order count|order volume|number of orders)\b",
            )?,
            score: Regex::new(
                r"\b([1-5])\s*stars?\b|\b(?:score|rating|rated)\s+(?:of\s+)?([1-5])\b",
            )?,
            status: Regex::new(&format!(r"\b({})\b", ORDER_STATUSES.join("|")))?,
            entity: Regex::new(
                r"\b(customers?|sellers?|products?|orders?|reviews?|payments?|categories|category|items?)\b",
            )?,
            max_limit,
        })
    }

    /// Run the extractor for one slot key
    pub(crate) fn extract(&self, key: SlotKey, text: &str) -> Option<SlotValue> {
        match key {
            SlotKey::Limit => self.extract_limit(text),
            SlotKey::Granularity => self
                .first_capture(&self.granularity, text)
                .and_then(granularity_word)
                .map(|g| SlotValue::from(g.as_str())),
            SlotKey::Dimension => self.extract_dimension(text),
            SlotKey::Metric => self
                .first_capture(&self.metric, text)
                .map(|word| SlotValue::from(metric_word(word).as_str())),
            SlotKey::FilterScore => self
                .first_capture(&self.score, text)
                .and_then(|digit| digit.parse::<i64>().ok())
                .map(SlotValue::Int),
            SlotKey::FilterStatus => self
                .first_capture(&self.status, text)
                .map(SlotValue::from),
            SlotKey::Entity => self
                .first_capture(&self.entity, text)
                .map(|word| SlotValue::from(entity_table(word))),
        }
    }

    fn extract_limit(&self, text: &str) -> Option<SlotValue> {
        let raw = self.first_capture(&self.limit, text)?;
        let n = raw.parse::<i64>().ok()?;
        Some(SlotValue::Int(n.clamp(1, self.max_limit)))
    }

    /// "by X" / "per X" / "X wise" wins over a bare location word. Unknown
    /// words after "by" are passed through so the builder can reject them.
    fn extract_dimension(&self, text: &str) -> Option<SlotValue> {
        let explicit = self
            .dimension_by
            .captures_iter(text)
            .chain(self.dimension_wise.captures_iter(text))
            .filter_map(|caps| caps.get(1).map(|m| m.as_str()))
            .find(|word| !NON_DIMENSION_WORDS.contains(word) && !is_time_word(word));

        if let Some(word) = explicit {
            return Some(SlotValue::from(dimension_word(word).unwrap_or(word)));
        }

        self.first_capture(&self.location, text)
            .and_then(dimension_word)
            .map(SlotValue::from)
    }

    fn first_capture<'t>(&self, re: &Regex, text: &'t str) -> Option<&'t str> {
        re.captures(text)
            .and_then(|caps| caps.iter().skip(1).flatten().next())
            .map(|m| m.as_str())
    }
}

fn granularity_word(word: &str) -> Option<Granularity> {
    let g = match word {
        "daily" | "day" | "days" => Granularity::Day,
        "weekly" | "week" | "weeks" => Granularity::Week,
        "monthly" | "month" | "months" => Granularity::Month,
        "quarterly" | "quarter" | "quarters" => Granularity::Quarter,
        "yearly" | "year" | "years" | "annual" | "annually" => Granularity::Year,
        _ => return None,
    };
    Some(g)
}

fn is_time_word(word: &str) -> bool {
    granularity_word(word).is_some()
}

fn metric_word(word: &str) -> RankMetric {
    match word {
        "orders" | "order count" | "order volume" | "number of orders" => RankMetric::Orders,
        _ => RankMetric::Sales,
    }
}

fn dimension_word(word: &str) -> Option<&'static str> {
    match word {
        "state" | "states" | "region" | "regions" | "uf" => Some("state"),
        "city" | "cities" | "town" | "towns" | "location" | "locations" => Some("city"),
        "zip" | "zipcode" | "zipcodes" | "postcode" => Some("zip_code_prefix"),
        _ => None,
    }
}

fn entity_table(word: &str) -> &'static str {
    match word {
        "customer" | "customers" => "customers",
        "seller" | "sellers" => "sellers",
        "product" | "products" => "products",
        "order" | "orders" => "orders",
        "review" | "reviews" => "reviews",
        "payment" | "payments" => "payments",
        "category" | "categories" => "category_translation",
        _ => "order_items",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extractors() -> SlotExtractors {
        SlotExtractors::new(100).unwrap()
    }

    #[test]
    fn test_limit_forms_and_clamp() {
        let ex = extractors();
        assert_eq!(ex.extract(SlotKey::Limit, "top 10 categories by sales"), Some(SlotValue::Int(10)));
        assert_eq!(ex.extract(SlotKey::Limit, "show 5 biggest sellers"), Some(SlotValue::Int(5)));
        assert_eq!(ex.extract(SlotKey::Limit, "top 5000 customers"), Some(SlotValue::Int(100)));
        assert_eq!(ex.extract(SlotKey::Limit, "top 0 customers"), Some(SlotValue::Int(1)));
        assert_eq!(ex.extract(SlotKey::Limit, "5 star reviews"), None);
    }

    #[test]
    fn test_granularity_words() {
        let ex = extractors();
        assert_eq!(ex.extract(SlotKey::Granularity, "monthly revenue trend"), Some("month".into()));
        assert_eq!(ex.extract(SlotKey::Granularity, "revenue per quarter"), Some("quarter".into()));
        assert_eq!(ex.extract(SlotKey::Granularity, "annual sales"), Some("year".into()));
        assert_eq!(ex.extract(SlotKey::Granularity, "revenue trend"), None);
    }

    #[test]
    fn test_dimension_skips_metric_words() {
        let ex = extractors();
        assert_eq!(ex.extract(SlotKey::Dimension, "top sellers by sales"), None);
        assert_eq!(ex.extract(SlotKey::Dimension, "top seller cities"), Some("city".into()));
        assert_eq!(ex.extract(SlotKey::Dimension, "customers by state"), Some("state".into()));
        assert_eq!(ex.extract(SlotKey::Dimension, "customers state wise"), Some("state".into()));
        assert_eq!(
            ex.extract(SlotKey::Dimension, "customers by payment type"),
            Some("payment".into())
        );
    }

    #[test]
    fn test_score_status_entity() {
        let ex = extractors();
        assert_eq!(ex.extract(SlotKey::FilterScore, "5 star reviews"), Some(SlotValue::Int(5)));
        assert_eq!(ex.extract(SlotKey::FilterScore, "reviews with rating of 2"), Some(SlotValue::Int(2)));
        assert_eq!(ex.extract(SlotKey::FilterScore, "review score distribution"), None);
        assert_eq!(ex.extract(SlotKey::FilterStatus, "how many canceled orders"), Some("canceled".into()));
        assert_eq!(ex.extract(SlotKey::Entity, "how many sellers"), Some("sellers".into()));
        assert_eq!(
            ex.extract(SlotKey::Entity, "how many categories"),
            Some("category_translation".into())
        );
    }

    #[test]
    fn test_metric_orders_vs_sales() {
        let ex = extractors();
        assert_eq!(ex.extract(SlotKey::Metric, "top categories by orders"), Some("orders".into()));
        assert_eq!(ex.extract(SlotKey::Metric, "top 10 categories by sales"), Some("sales".into()));
        assert_eq!(ex.extract(SlotKey::Metric, "top categories"), None);
    }
}
