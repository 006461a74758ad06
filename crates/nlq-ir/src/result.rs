//! Result sets and chart hints

use serde::{Deserialize, Serialize};

/// Presentation hint for the result set's shape
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartHint {
    Line,
    Bar,
    Table,
}

impl ChartHint {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChartHint::Line => "line",
            ChartHint::Bar => "bar",
            ChartHint::Table => "table",
        }
    }
}

/// Coarse classification of a result column, used for chart heuristics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnKind {
    Temporal,
    Numeric,
    Text,
    Boolean,
    Other,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnMeta {
    pub name: String,
    #[serde(rename = "type")]
    pub data_type: String,
    pub kind: ColumnKind,
}

impl ColumnMeta {
    pub fn new(name: impl Into<String>, data_type: impl Into<String>, kind: ColumnKind) -> Self {
        Self {
            name: name.into(),
            data_type: data_type.into(),
            kind,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryResult {
    pub columns: Vec<ColumnMeta>,
    pub rows: Vec<Vec<serde_json::Value>>,
    pub row_count: usize,
    /// Set when the row cap cut the result short
    pub truncated: bool,
    pub chart_hint: ChartHint,
}

impl QueryResult {
    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.name.as_str())
    }

    /// Rows as JSON objects keyed by column name
    pub fn rows_as_objects(&self) -> Vec<serde_json::Value> {
        self.rows
            .iter()
            .map(|row| {
                let mut obj = serde_json::Map::new();
                for (col, value) in self.columns.iter().zip(row) {
                    obj.insert(col.name.clone(), value.clone());
                }
                serde_json::Value::Object(obj)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_rows_as_objects() {
        let result = QueryResult {
            columns: vec![
                ColumnMeta::new("state", "Utf8", ColumnKind::Text),
                ColumnMeta::new("customers", "Int64", ColumnKind::Numeric),
            ],
            rows: vec![vec![json!("SP"), json!(41)], vec![json!("RJ"), json!(12)]],
            row_count: 2,
            truncated: false,
            chart_hint: ChartHint::Bar,
        };

        let objects = result.rows_as_objects();
        assert_eq!(objects[0], json!({"state": "SP", "customers": 41}));
        assert_eq!(result.column_names().collect::<Vec<_>>(), vec!["state", "customers"]);
    }

    #[test]
    fn test_column_meta_serializes_type_field() {
        let col = ColumnMeta::new("month", "Timestamp(Microsecond, None)", ColumnKind::Temporal);
        let json = serde_json::to_value(&col).unwrap();
        assert_eq!(json["type"], "Timestamp(Microsecond, None)");
        assert_eq!(json["kind"], "temporal");
    }
}
