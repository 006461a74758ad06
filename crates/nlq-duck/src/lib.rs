//! DuckDB warehouse executor for validated SQL
//!
//! Every call opens its own read-only connection, so concurrent questions
//! never share a cursor and a write attempt fails inside DuckDB even if it
//! got past the validator.

pub mod shape;

use chrono::{DateTime, NaiveDate};
use duckdb::arrow::datatypes::DataType;
use duckdb::types::{TimeUnit, Value, ValueRef};
use duckdb::{params_from_iter, AccessMode, Config, Connection};
use nlq_catalog::SchemaCatalog;
use nlq_ir::{ChartHint, ColumnKind, ColumnMeta, QueryParam, QueryResult};
use nlq_sql::ValidatedSql;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};

pub use shape::{hint_for_columns, hint_for_intent};

/// Default row cap per answer
pub const DEFAULT_MAX_ROWS: usize = 500;

/// Days from 0001-01-01 (CE) to 1970-01-01
const UNIX_EPOCH_DAYS_FROM_CE: i32 = 719_163;

#[derive(Debug, Error)]
pub enum ExecutionError {
    #[error("Failed to open warehouse {path}: {source}")]
    Open {
        path: String,
        #[source]
        source: duckdb::Error,
    },

    #[error("Write attempted on read-only warehouse: {0}")]
    WriteAttempted(String),

    #[error("Database error: {0}")]
    Engine(#[from] duckdb::Error),
}

impl ExecutionError {
    pub fn kind(&self) -> &'static str {
        match self {
            ExecutionError::Open { .. } => "open",
            ExecutionError::WriteAttempted(_) => "write_attempted",
            ExecutionError::Engine(_) => "engine_error",
        }
    }

    fn from_engine(e: duckdb::Error) -> Self {
        let message = e.to_string();
        if message.to_ascii_lowercase().contains("read-only") {
            ExecutionError::WriteAttempted(message)
        } else {
            ExecutionError::Engine(e)
        }
    }
}

/// Handle to the analytical warehouse file
#[derive(Debug, Clone)]
pub struct Warehouse {
    path: PathBuf,
    max_rows: usize,
}

impl Warehouse {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            max_rows: DEFAULT_MAX_ROWS,
        }
    }

    pub fn with_max_rows(mut self, max_rows: usize) -> Self {
        self.max_rows = max_rows.max(1);
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn max_rows(&self) -> usize {
        self.max_rows
    }

    fn connect(&self) -> Result<Connection, ExecutionError> {
        let open_err = |source| ExecutionError::Open {
            path: self.path.display().to_string(),
            source,
        };
        // no file, URL or extension access beyond the warehouse itself
        let config = Config::default()
            .access_mode(AccessMode::ReadOnly)
            .and_then(|c| c.enable_external_access(false))
            .map_err(open_err)?;
        Connection::open_with_flags(&self.path, config).map_err(open_err)
    }

    /// Run a validated statement. At most `max_rows` rows come back; if the
    /// statement produced more, `truncated` is set.
    ///
    /// The chart hint is inferred from column shape; callers that know the
    /// intent replace it.
    pub fn execute(&self, sql: &ValidatedSql) -> Result<QueryResult, ExecutionError> {
        let conn = self.connect()?;
        run(&conn, sql.sql(), &bind_values(sql), self.max_rows)
    }

    /// Live row count per catalog table; `None` when the table is missing
    /// or unreadable
    pub fn table_row_counts(
        &self,
        catalog: &SchemaCatalog,
    ) -> Result<Vec<(String, Option<i64>)>, ExecutionError> {
        let conn = self.connect()?;

        let counts = catalog
            .tables()
            .iter()
            .map(|table| {
                // table names are catalog-validated identifiers
                let sql = format!("SELECT COUNT(*) FROM {}", table.name);
                let count = conn
                    .query_row(&sql, [], |row| row.get::<_, i64>(0))
                    .map_err(|e| warn!(table = %table.name, error = %e, "Row count failed"))
                    .ok();
                (table.name.clone(), count)
            })
            .collect();

        Ok(counts)
    }
}

fn bind_values(sql: &ValidatedSql) -> Vec<Value> {
    sql.params()
        .iter()
        .map(|p| match &p.value {
            QueryParam::Int(i) => Value::BigInt(*i),
            QueryParam::Float(f) => Value::Double(*f),
            QueryParam::Text(s) => Value::Text(s.clone()),
        })
        .collect()
}

/// Fetch up to `max_rows + 1` rows so truncation can be detected without
/// materializing the rest of the result
fn run(
    conn: &Connection,
    sql: &str,
    params: &[Value],
    max_rows: usize,
) -> Result<QueryResult, ExecutionError> {
    let mut stmt = conn.prepare(sql).map_err(ExecutionError::from_engine)?;
    let mut rows = stmt
        .query(params_from_iter(params.iter()))
        .map_err(ExecutionError::from_engine)?;

    // result schema is only available while the statement is executed
    let columns: Vec<ColumnMeta> = match rows.as_ref() {
        Some(stmt) => (0..stmt.column_count())
            .map(|i| {
                let name = stmt
                    .column_name(i)
                    .map(|s| s.to_string())
                    .unwrap_or_else(|_| format!("column_{}", i));
                let data_type = stmt.column_type(i);
                ColumnMeta::new(name, format!("{:?}", data_type), column_kind(&data_type))
            })
            .collect(),
        None => Vec::new(),
    };

    let mut result_rows = Vec::new();
    let mut truncated = false;

    while let Some(row) = rows.next().map_err(ExecutionError::from_engine)? {
        if result_rows.len() == max_rows {
            truncated = true;
            break;
        }
        let mut json_row = Vec::with_capacity(columns.len());
        for i in 0..columns.len() {
            json_row.push(value_to_json(row.get_ref(i)?));
        }
        result_rows.push(json_row);
    }

    debug!(
        rows = result_rows.len(),
        truncated,
        columns = columns.len(),
        "Query executed"
    );

    let chart_hint: ChartHint = shape::hint_for_columns(&columns);
    Ok(QueryResult {
        row_count: result_rows.len(),
        rows: result_rows,
        columns,
        truncated,
        chart_hint,
    })
}

fn column_kind(data_type: &DataType) -> ColumnKind {
    match data_type {
        DataType::Date32
        | DataType::Date64
        | DataType::Timestamp(_, _)
        | DataType::Time32(_)
        | DataType::Time64(_) => ColumnKind::Temporal,
        DataType::Int8
        | DataType::Int16
        | DataType::Int32
        | DataType::Int64
        | DataType::UInt8
        | DataType::UInt16
        | DataType::UInt32
        | DataType::UInt64
        | DataType::Float16
        | DataType::Float32
        | DataType::Float64
        | DataType::Decimal128(_, _)
        | DataType::Decimal256(_, _) => ColumnKind::Numeric,
        DataType::Utf8 | DataType::LargeUtf8 | DataType::Utf8View => ColumnKind::Text,
        DataType::Boolean => ColumnKind::Boolean,
        _ => ColumnKind::Other,
    }
}

fn value_to_json(value: ValueRef<'_>) -> serde_json::Value {
    use serde_json::Value as Json;

    match value {
        ValueRef::Null => Json::Null,
        ValueRef::Boolean(b) => Json::Bool(b),
        ValueRef::TinyInt(i) => Json::from(i),
        ValueRef::SmallInt(i) => Json::from(i),
        ValueRef::Int(i) => Json::from(i),
        ValueRef::BigInt(i) => Json::from(i),
        ValueRef::HugeInt(i) => i64::try_from(i)
            .map(Json::from)
            .unwrap_or_else(|_| Json::String(i.to_string())),
        ValueRef::UTinyInt(i) => Json::from(i),
        ValueRef::USmallInt(i) => Json::from(i),
        ValueRef::UInt(i) => Json::from(i),
        ValueRef::UBigInt(i) => Json::from(i),
        ValueRef::Float(f) => float(f64::from(f)),
        ValueRef::Double(f) => float(f),
        ValueRef::Decimal(d) => d
            .to_string()
            .parse::<f64>()
            .map(float)
            .unwrap_or_else(|_| Json::String(d.to_string())),
        ValueRef::Text(bytes) => Json::String(String::from_utf8_lossy(bytes).to_string()),
        ValueRef::Timestamp(unit, v) => {
            let micros = match unit {
                TimeUnit::Second => v.saturating_mul(1_000_000),
                TimeUnit::Millisecond => v.saturating_mul(1_000),
                TimeUnit::Microsecond => v,
                TimeUnit::Nanosecond => v / 1_000,
            };
            DateTime::from_timestamp_micros(micros)
                .map(|ts| Json::String(ts.naive_utc().format("%Y-%m-%dT%H:%M:%S").to_string()))
                .unwrap_or(Json::Null)
        }
        ValueRef::Date32(days) => days
            .checked_add(UNIX_EPOCH_DAYS_FROM_CE)
            .and_then(NaiveDate::from_num_days_from_ce_opt)
            .map(|d| Json::String(d.format("%Y-%m-%d").to_string()))
            .unwrap_or(Json::Null),
        ValueRef::Blob(b) => Json::String(format!("<blob {} bytes>", b.len())),
        _ => Json::String("<unsupported>".to_string()),
    }
}

fn float(f: f64) -> serde_json::Value {
    serde_json::Number::from_f64(f)
        .map(serde_json::Value::Number)
        .unwrap_or(serde_json::Value::Null)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seeded(dir: &tempfile::TempDir) -> PathBuf {
        let path = dir.path().join("wh.duckdb");
        let conn = Connection::open(&path).unwrap();
        conn.execute_batch(
            "CREATE TABLE orders (order_id VARCHAR, order_status VARCHAR);
             INSERT INTO orders VALUES ('a', 'delivered'), ('b', 'delivered'), ('c', 'canceled');",
        )
        .unwrap();
        path
    }

    #[test]
    fn test_connection_cannot_read_files() {
        let dir = tempfile::tempdir().unwrap();
        let csv = dir.path().join("secret.csv");
        std::fs::write(&csv, "a,b\n1,2\n").unwrap();

        let conn = Warehouse::new(seeded(&dir)).connect().unwrap();
        let sql = format!("SELECT * FROM '{}'", csv.display());
        assert!(run(&conn, &sql, &[], 10).is_err());

        let result = run(&conn, "SELECT COUNT(*) FROM orders", &[], 10).unwrap();
        assert_eq!(result.rows[0][0], serde_json::json!(3));
    }

    #[test]
    fn test_run_caps_rows() {
        let dir = tempfile::tempdir().unwrap();
        let conn = Connection::open(seeded(&dir)).unwrap();

        let result = run(&conn, "SELECT order_id FROM orders ORDER BY order_id", &[], 2).unwrap();
        assert_eq!(result.row_count, 2);
        assert!(result.truncated);
        assert_eq!(result.rows[0][0], serde_json::json!("a"));

        let result = run(&conn, "SELECT order_id FROM orders", &[], 3).unwrap();
        assert_eq!(result.row_count, 3);
        assert!(!result.truncated);
    }

    #[test]
    fn test_run_binds_params() {
        let dir = tempfile::tempdir().unwrap();
        let conn = Connection::open(seeded(&dir)).unwrap();

        let result = run(
            &conn,
            "SELECT COUNT(*) AS n FROM orders WHERE order_status = ?",
            &[Value::Text("delivered".to_string())],
            10,
        )
        .unwrap();
        assert_eq!(result.rows[0][0], serde_json::json!(2));
        assert_eq!(result.columns[0].name, "n");
        assert_eq!(result.columns[0].kind, ColumnKind::Numeric);
    }

    #[test]
    fn test_write_on_read_only_connection() {
        let dir = tempfile::tempdir().unwrap();
        let path = seeded(&dir);
        let warehouse = Warehouse::new(&path);
        let conn = warehouse.connect().unwrap();

        let err = run(&conn, "DELETE FROM orders", &[], 10).unwrap_err();
        assert!(matches!(err, ExecutionError::WriteAttempted(_)), "{:?}", err);
        assert_eq!(err.kind(), "write_attempted");
    }

    #[test]
    fn test_missing_warehouse_is_open_error() {
        let dir = tempfile::tempdir().unwrap();
        let warehouse = Warehouse::new(dir.path().join("missing.duckdb"));
        assert!(matches!(warehouse.connect(), Err(ExecutionError::Open { .. })));
    }

    #[test]
    fn test_value_conversion() {
        assert_eq!(value_to_json(ValueRef::HugeInt(42)), serde_json::json!(42));
        assert_eq!(
            value_to_json(ValueRef::HugeInt(i128::MAX)),
            serde_json::json!(i128::MAX.to_string())
        );
        assert_eq!(value_to_json(ValueRef::Double(f64::NAN)), serde_json::Value::Null);
        assert_eq!(value_to_json(ValueRef::Date32(0)), serde_json::json!("1970-01-01"));
        assert_eq!(
            value_to_json(ValueRef::Timestamp(TimeUnit::Microsecond, 86_400_000_000)),
            serde_json::json!("1970-01-02T00:00:00")
        );
    }
}
