//! Candidate SQL and bound parameters

use serde::{Deserialize, Serialize};
use std::fmt;

/// Where a candidate statement came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SqlSource {
    Builder,
    Llm,
}

impl SqlSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            SqlSource::Builder => "builder",
            SqlSource::Llm => "llm",
        }
    }
}

impl fmt::Display for SqlSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Value bound to a `?` placeholder
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum QueryParam {
    Int(i64),
    Float(f64),
    Text(String),
}

/// A named parameter; position in `CandidateSql::params` matches the
/// position of its `?` placeholder in the statement text
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoundParam {
    pub name: String,
    pub value: QueryParam,
}

impl BoundParam {
    pub fn new(name: impl Into<String>, value: QueryParam) -> Self {
        Self {
            name: name.into(),
            value,
        }
    }
}

/// SQL text that has not been validated yet.
///
/// Never executed directly: it must pass the validator first, which hands
/// back the statement as a `ValidatedSql`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateSql {
    pub sql: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub params: Vec<BoundParam>,
    pub source: SqlSource,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub explanation: String,
}

impl CandidateSql {
    pub fn from_builder(sql: impl Into<String>, params: Vec<BoundParam>) -> Self {
        Self {
            sql: sql.into(),
            params,
            source: SqlSource::Builder,
            explanation: String::new(),
        }
    }

    pub fn from_llm(sql: impl Into<String>) -> Self {
        Self {
            sql: sql.into(),
            params: Vec::new(),
            source: SqlSource::Llm,
            explanation: String::new(),
        }
    }

    pub fn with_explanation(mut self, explanation: impl Into<String>) -> Self {
        self.explanation = explanation.into();
        self
    }

    /// Calculate fingerprint (SHA-256) of the statement text
    pub fn fingerprint(&self) -> String {
        crate::sha256_hex(&self.sql)
    }
}
