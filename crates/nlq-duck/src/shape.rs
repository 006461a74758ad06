//! Result shaper: chart hints

use nlq_ir::{ChartHint, ColumnKind, ColumnMeta, Intent, SlotKey, Slots};

/// Chart hint for a demo-mode answer, decided by the intent
pub fn hint_for_intent(intent: Intent, slots: &Slots) -> ChartHint {
    match intent {
        Intent::RevenueTrend => ChartHint::Line,
        Intent::CategoryTopN
        | Intent::CustomerDistribution
        | Intent::PaymentBreakdown
        | Intent::DeliveryTimeByState
        | Intent::SellerTopN
        | Intent::OrderStatusBreakdown
        | Intent::TopCustomers
        | Intent::CategoryWeight => ChartHint::Bar,
        // a single filtered bucket reads better as a table
        Intent::ReviewDistribution if slots.contains(SlotKey::FilterScore) => ChartHint::Table,
        Intent::ReviewDistribution => ChartHint::Bar,
        Intent::ProductCount | Intent::OrderCount | Intent::GenericCount => ChartHint::Table,
    }
}

/// Chart hint from column shape alone: one temporal plus one numeric column
/// is a line, one text plus one numeric column is a bar, anything else is a
/// table.
pub fn hint_for_columns(columns: &[ColumnMeta]) -> ChartHint {
    if columns.len() != 2 {
        return ChartHint::Table;
    }

    let count = |kind: ColumnKind| columns.iter().filter(|c| c.kind == kind).count();
    match (count(ColumnKind::Temporal), count(ColumnKind::Text), count(ColumnKind::Numeric)) {
        (1, 0, 1) => ChartHint::Line,
        (0, 1, 1) => ChartHint::Bar,
        _ => ChartHint::Table,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn col(name: &str, kind: ColumnKind) -> ColumnMeta {
        ColumnMeta::new(name, "test", kind)
    }

    #[test]
    fn test_intent_hints() {
        let empty = Slots::new();
        assert_eq!(hint_for_intent(Intent::RevenueTrend, &empty), ChartHint::Line);
        assert_eq!(hint_for_intent(Intent::CategoryTopN, &empty), ChartHint::Bar);
        assert_eq!(hint_for_intent(Intent::ReviewDistribution, &empty), ChartHint::Bar);
        assert_eq!(
            hint_for_intent(
                Intent::ReviewDistribution,
                &Slots::new().with(SlotKey::FilterScore, 5)
            ),
            ChartHint::Table
        );
        assert_eq!(hint_for_intent(Intent::OrderCount, &empty), ChartHint::Table);
    }

    #[test]
    fn test_column_hints() {
        assert_eq!(
            hint_for_columns(&[col("month", ColumnKind::Temporal), col("revenue", ColumnKind::Numeric)]),
            ChartHint::Line
        );
        assert_eq!(
            hint_for_columns(&[col("state", ColumnKind::Text), col("n", ColumnKind::Numeric)]),
            ChartHint::Bar
        );
        assert_eq!(
            hint_for_columns(&[
                col("state", ColumnKind::Text),
                col("city", ColumnKind::Text),
                col("n", ColumnKind::Numeric)
            ]),
            ChartHint::Table
        );
        assert_eq!(hint_for_columns(&[col("n", ColumnKind::Numeric)]), ChartHint::Table);
        assert_eq!(hint_for_columns(&[]), ChartHint::Table);
    }
}
