//! Documented sample questions
//!
//! These are the questions surfaced to users when nothing matched, and the
//! acceptance corpus for the rule table.

use nlq_ir::Intent;

#[derive(Debug, Clone, Copy)]
pub struct ExampleQuestion {
    pub question: &'static str,
    pub intent: Intent,
}

const fn example(question: &'static str, intent: Intent) -> ExampleQuestion {
    ExampleQuestion { question, intent }
}

pub const EXAMPLES: &[ExampleQuestion] = &[
    example("Monthly revenue trend", Intent::RevenueTrend),
    example("Top 10 categories by sales", Intent::CategoryTopN),
    example("Customer distribution by state", Intent::CustomerDistribution),
    example("Payment method breakdown", Intent::PaymentBreakdown),
    example("Review score distribution", Intent::ReviewDistribution),
    example("Average delivery time by state", Intent::DeliveryTimeByState),
    example("Top seller cities", Intent::SellerTopN),
    example("How many products and categories are there?", Intent::ProductCount),
    example("How many orders were delivered?", Intent::OrderCount),
    example("How many sellers are there?", Intent::GenericCount),
    example("Order status breakdown", Intent::OrderStatusBreakdown),
    example("Top 10 customers by spending", Intent::TopCustomers),
    example("Heaviest product categories", Intent::CategoryWeight),
    example("5 star reviews kitne hain?", Intent::ReviewDistribution),
];

/// Question texts only, in documentation order
pub fn example_questions() -> Vec<&'static str> {
    EXAMPLES.iter().map(|e| e.question).collect()
}
