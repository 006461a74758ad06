//! NLQ SQL - query builder and validation gate
//!
//! The builder turns an `(Intent, Slots)` pair into parameterized DuckDB
//! SQL. The validator gates every candidate, built or LLM-generated, before
//! it may reach the warehouse.

pub mod builder;
mod lexer;
pub mod validator;

pub use builder::{BuildError, QueryBuilder, DEFAULT_MAX_LIMIT};
pub use validator::{
    SqlValidator, ValidatedSql, ValidationRejected, ValidationResult, ValidationRule, Violation,
    FORBIDDEN_KEYWORDS,
};
