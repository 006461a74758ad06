//! SQL validation gate
//!
//! Every candidate statement, from the builder or from the LLM, passes
//! through here before execution. The checks work on the token stream
//! produced by the pest lexer:
//! - exactly one statement: no `;` and no comment sequences anywhere,
//!   string literals and quoted identifiers included
//! - the statement starts with `SELECT`
//! - no DDL/DML or engine-control keyword anywhere in the text
//! - every table, column and function resolves against the catalog and the
//!   function allowlist; a string in table position (a file scan) never does
//!
//! A passing check hands back a `ValidatedSql`, the only type the executor
//! accepts.

use crate::lexer::{lex, Token, TokenKind};
use nlq_catalog::SchemaCatalog;
use nlq_ir::{BoundParam, CandidateSql, SqlSource};
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};

/// Keywords that may not appear anywhere in a statement, literals included
pub const FORBIDDEN_KEYWORDS: &[&str] = &[
    "insert", "update", "delete", "drop", "alter", "create", "truncate", "grant", "revoke",
    "merge", "attach", "detach", "copy", "export", "import", "install", "load", "pragma",
    "set", "reset", "call", "execute", "prepare", "vacuum", "checkpoint", "begin", "commit",
    "rollback", "use",
];

const KEYWORDS: &[&str] = &[
    "select", "from", "where", "group", "by", "order", "having", "limit", "offset", "as", "on",
    "join", "inner", "left", "right", "full", "outer", "cross", "natural", "using", "and", "or",
    "not", "in", "is", "null", "like", "ilike", "between", "case", "when", "then", "else", "end",
    "distinct", "all", "asc", "desc", "nulls", "first", "last", "union", "intersect", "except",
    "exists", "true", "false", "interval", "cast", "try_cast", "over", "partition", "rows",
    "range", "groups", "preceding", "following", "unbounded", "current", "row", "filter",
    "within", "lateral", "semi", "anti", "qualify", "window", "any", "some", "escape",
    "similar", "to", "at", "zone", "exclude", "current_date", "current_timestamp", "extract",
];

/// Scalar, aggregate and window functions a statement may call. Table
/// functions (`read_csv`, `read_parquet`, ...) are deliberately absent.
const FUNCTIONS: &[&str] = &[
    "count", "sum", "avg", "min", "max", "median", "mode", "stddev", "stddev_samp",
    "stddev_pop", "variance", "var_samp", "var_pop", "quantile", "quantile_cont",
    "quantile_disc", "percentile_cont", "percentile_disc", "count_if", "any_value", "arg_max",
    "arg_min", "string_agg", "array_agg", "bool_and", "bool_or", "first", "last", "round",
    "floor", "ceil", "ceiling", "abs", "sqrt", "power", "pow", "ln", "log", "log10", "exp",
    "mod", "sign", "greatest", "least", "coalesce", "nullif", "ifnull", "lower", "upper",
    "length", "trim", "ltrim", "rtrim", "substr", "substring", "concat", "concat_ws", "replace",
    "left", "right", "split_part", "starts_with", "ends_with", "contains", "strpos", "lpad",
    "rpad", "format", "date_trunc", "date_part", "datepart", "date_diff", "datediff",
    "date_add", "date_sub", "strftime", "strptime", "make_date", "epoch", "age", "year",
    "month", "day", "quarter", "week", "weekofyear", "dayofweek", "dayofyear", "hour",
    "minute", "second", "yearweek", "last_day", "dayname", "monthname", "now", "today",
    "row_number", "rank", "dense_rank", "percent_rank", "cume_dist", "ntile", "lag", "lead",
    "first_value", "last_value", "nth_value", "cast", "try_cast", "extract",
];

/// Words valid as type names after `::` or in `CAST(.. AS ..)`
const TYPE_NAMES: &[&str] = &[
    "integer", "int", "bigint", "smallint", "tinyint", "hugeint", "double", "float", "real",
    "decimal", "numeric", "varchar", "text", "string", "date", "timestamp", "time", "boolean",
    "bool",
];

/// Date-part words, e.g. `EXTRACT(month FROM ..)`
const DATE_PARTS: &[&str] = &[
    "year", "month", "day", "week", "quarter", "hour", "minute", "second", "epoch", "dow",
    "doy", "isodow", "decade", "century", "millennium",
];

/// Sequences that open or close a comment
const COMMENT_MARKERS: &[&str] = &["--", "/*", "*/"];

/// Functions whose argument list uses `FROM` as a separator
const FROM_ARG_FUNCTIONS: &[&str] = &["extract", "substring", "trim", "overlay", "position"];

/// The rule a rejected statement violated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationRule {
    Empty,
    Malformed,
    MultiStatement,
    NotSelect,
    ForbiddenKeyword,
    UnknownIdentifier,
}

impl ValidationRule {
    pub fn as_str(&self) -> &'static str {
        match self {
            ValidationRule::Empty => "empty",
            ValidationRule::Malformed => "malformed",
            ValidationRule::MultiStatement => "multi_statement",
            ValidationRule::NotSelect => "not_select",
            ValidationRule::ForbiddenKeyword => "forbidden_keyword",
            ValidationRule::UnknownIdentifier => "unknown_identifier",
        }
    }
}

impl fmt::Display for ValidationRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Violation {
    pub rule: ValidationRule,
    pub detail: String,
}

impl Violation {
    fn new(rule: ValidationRule, detail: impl Into<String>) -> Self {
        Self {
            rule,
            detail: detail.into(),
        }
    }
}

/// A statement that passed every validation rule.
///
/// Only the validator constructs this; the executor accepts nothing else.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedSql {
    sql: String,
    params: Vec<BoundParam>,
    source: SqlSource,
    explanation: String,
}

impl ValidatedSql {
    pub fn sql(&self) -> &str {
        &self.sql
    }

    pub fn params(&self) -> &[BoundParam] {
        &self.params
    }

    pub fn source(&self) -> SqlSource {
        self.source
    }

    pub fn explanation(&self) -> &str {
        &self.explanation
    }
}

/// Outcome of validation. A rejection carries no statement forward.
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationResult {
    Passed(ValidatedSql),
    Rejected(Vec<Violation>),
}

impl ValidationResult {
    pub fn is_valid(&self) -> bool {
        matches!(self, ValidationResult::Passed(_))
    }

    pub fn violations(&self) -> &[Violation] {
        match self {
            ValidationResult::Passed(_) => &[],
            ValidationResult::Rejected(v) => v,
        }
    }

    pub fn into_result(self) -> Result<ValidatedSql, ValidationRejected> {
        match self {
            ValidationResult::Passed(sql) => Ok(sql),
            ValidationResult::Rejected(violations) => Err(ValidationRejected { violations }),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ValidationRejected {
    pub violations: Vec<Violation>,
}

impl fmt::Display for ValidationRejected {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SQL rejected: {}", self.rule())
    }
}

impl std::error::Error for ValidationRejected {}

impl ValidationRejected {
    /// The first violated rule, used as the reported kind
    pub fn rule(&self) -> ValidationRule {
        self.violations
            .first()
            .map(|v| v.rule)
            .unwrap_or(ValidationRule::Malformed)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Paren {
    /// `FROM (` / `JOIN (`: a derived table
    Derived,
    /// `extract(`, `substring(` and friends
    FromArgs,
    Other,
}

/// Names in scope for one statement
#[derive(Debug, Default)]
struct Scope {
    /// table name or alias (lowercase) -> catalog table, `None` when the
    /// table itself is unknown
    tables: HashMap<String, Option<String>>,
    derived: HashSet<String>,
    output_aliases: HashSet<String>,
    /// token positions already resolved as table references or aliases
    consumed: HashSet<usize>,
}

#[derive(Debug, Clone)]
pub struct SqlValidator {
    catalog: Arc<SchemaCatalog>,
}

impl SqlValidator {
    pub fn new(catalog: Arc<SchemaCatalog>) -> Self {
        Self { catalog }
    }

    /// Check a candidate statement against every rule
    pub fn validate(&self, candidate: &CandidateSql) -> ValidationResult {
        let violations = self.check(&candidate.sql);

        if violations.is_empty() {
            debug!(source = %candidate.source, "SQL passed validation");
            ValidationResult::Passed(ValidatedSql {
                sql: candidate.sql.trim().to_string(),
                params: candidate.params.clone(),
                source: candidate.source,
                explanation: candidate.explanation.clone(),
            })
        } else {
            warn!(
                source = %candidate.source,
                rule = %violations[0].rule,
                count = violations.len(),
                "SQL rejected by validator"
            );
            ValidationResult::Rejected(violations)
        }
    }

    fn check(&self, sql: &str) -> Vec<Violation> {
        if sql.trim().is_empty() {
            return vec![Violation::new(ValidationRule::Empty, "no statement text")];
        }

        let tokens = match lex(sql) {
            Ok(tokens) => tokens,
            Err(e) => return vec![Violation::new(ValidationRule::Malformed, e.to_string())],
        };

        let mut violations = Vec::new();

        for tok in &tokens {
            match tok.kind {
                TokenKind::Unterminated => violations.push(Violation::new(
                    ValidationRule::Malformed,
                    "unterminated quote",
                )),
                TokenKind::Unknown => violations.push(Violation::new(
                    ValidationRule::Malformed,
                    format!("unexpected character '{}'", tok.text),
                )),
                _ => {}
            }
        }

        let literals: Vec<&str> = tokens
            .iter()
            .filter(|t| matches!(t.kind, TokenKind::Str | TokenKind::QuotedIdent))
            .map(|t| t.text)
            .collect();

        if tokens.iter().any(|t| t.kind == TokenKind::Semicolon)
            || literals.iter().any(|l| l.contains(';'))
        {
            violations.push(Violation::new(
                ValidationRule::MultiStatement,
                "statement separator ';'",
            ));
        }
        if tokens.iter().any(|t| t.kind == TokenKind::Comment)
            || literals
                .iter()
                .any(|l| COMMENT_MARKERS.iter().any(|m| l.contains(m)))
        {
            violations.push(Violation::new(
                ValidationRule::MultiStatement,
                "comment sequence",
            ));
        }

        if !tokens.first().is_some_and(|t| t.is_word("select")) {
            violations.push(Violation::new(
                ValidationRule::NotSelect,
                "statement must begin with SELECT",
            ));
        }

        let words = tokens
            .iter()
            .filter(|t| t.kind == TokenKind::Word)
            .map(|t| t.name())
            .chain(literals.iter().flat_map(|l| literal_words(*l)));

        let mut seen = HashSet::new();
        for word in words {
            if FORBIDDEN_KEYWORDS.contains(&word.as_str()) && seen.insert(word.clone()) {
                violations.push(Violation::new(
                    ValidationRule::ForbiddenKeyword,
                    word.to_ascii_uppercase(),
                ));
            }
        }

        violations.extend(self.check_identifiers(&tokens));
        violations
    }

    fn check_identifiers(&self, tokens: &[Token<'_>]) -> Vec<Violation> {
        let mut unknown: Vec<String> = Vec::new();
        let scope = self.collect_scope(tokens, &mut unknown);

        for (i, tok) in tokens.iter().enumerate() {
            if !tok.is_name() || scope.consumed.contains(&i) {
                continue;
            }
            let name = tok.name();
            let is_word = tok.kind == TokenKind::Word;
            let prev_dot = i > 0 && tokens[i - 1].is_punct(".");
            let next = tokens.get(i + 1);
            let next_dot = next.is_some_and(|t| t.is_punct("."));
            let next_paren = next.is_some_and(|t| t.is_punct("("));

            if prev_dot {
                let qualifier = match i.checked_sub(2).map(|q| &tokens[q]) {
                    Some(q) if q.is_name() => q.name(),
                    _ => {
                        unknown.push(name);
                        continue;
                    }
                };
                match scope.tables.get(&qualifier) {
                    Some(Some(table)) => {
                        if self.catalog.column(table, &name).is_none() {
                            unknown.push(format!("{}.{}", qualifier, name));
                        }
                    }
                    // unknown table, already reported
                    Some(None) => {}
                    None => {
                        if scope.derived.contains(&qualifier)
                            && !self.catalog.has_column_anywhere(&name)
                            && !scope.output_aliases.contains(&name)
                        {
                            unknown.push(format!("{}.{}", qualifier, name));
                        }
                    }
                }
                continue;
            }

            // forbidden words are reported on their own
            if is_word
                && (KEYWORDS.contains(&name.as_str())
                    || FORBIDDEN_KEYWORDS.contains(&name.as_str()))
            {
                continue;
            }

            if next_paren {
                if !(is_word && FUNCTIONS.contains(&name.as_str())) {
                    unknown.push(format!("{}()", name));
                }
                continue;
            }

            if next_dot {
                if !scope.tables.contains_key(&name) && !scope.derived.contains(&name) {
                    unknown.push(name);
                }
                continue;
            }

            if is_word
                && (TYPE_NAMES.contains(&name.as_str()) || DATE_PARTS.contains(&name.as_str()))
            {
                continue;
            }

            if scope.output_aliases.contains(&name)
                || scope.tables.contains_key(&name)
                || scope.derived.contains(&name)
            {
                continue;
            }

            let in_scope = scope
                .tables
                .values()
                .flatten()
                .any(|table| self.catalog.column(table, &name).is_some());
            let via_derived = !scope.derived.is_empty() && self.catalog.has_column_anywhere(&name);
            if !in_scope && !via_derived {
                unknown.push(name);
            }
        }

        let mut seen = HashSet::new();
        unknown
            .into_iter()
            .filter(|name| seen.insert(name.clone()))
            .map(|name| Violation::new(ValidationRule::UnknownIdentifier, name))
            .collect()
    }

    /// First pass: table references after FROM/JOIN, their aliases,
    /// derived-table aliases and `AS` output aliases
    fn collect_scope(&self, tokens: &[Token<'_>], unknown: &mut Vec<String>) -> Scope {
        let mut scope = Scope::default();
        let mut parens: Vec<Paren> = Vec::new();
        let mut i = 0;

        while i < tokens.len() {
            let tok = &tokens[i];

            if tok.is_punct("(") {
                let opener = i.checked_sub(1).map(|p| &tokens[p]);
                let kind = match opener {
                    Some(p) if p.is_word("from") || p.is_word("join") => Paren::Derived,
                    Some(p)
                        if p.kind == TokenKind::Word
                            && FROM_ARG_FUNCTIONS.contains(&p.name().as_str()) =>
                    {
                        Paren::FromArgs
                    }
                    _ => Paren::Other,
                };
                parens.push(kind);
            } else if tok.is_punct(")") {
                if parens.pop() == Some(Paren::Derived) {
                    if let (Some(idx), next) = alias_after(tokens, i + 1) {
                        scope.derived.insert(tokens[idx].name());
                        scope.consumed.insert(idx);
                        i = next;
                        continue;
                    }
                }
            } else if tok.is_word("from") && parens.last() != Some(&Paren::FromArgs) {
                i = self.table_refs(tokens, i + 1, true, &mut scope, unknown);
                continue;
            } else if tok.is_word("join") {
                i = self.table_refs(tokens, i + 1, false, &mut scope, unknown);
                continue;
            } else if tok.is_word("as") {
                if let Some(next) = tokens.get(i + 1).filter(|t| t.is_name()) {
                    scope.output_aliases.insert(next.name());
                }
            }

            i += 1;
        }

        scope
    }

    /// Parse `name [AS] [alias] (, name [AS] [alias])*` starting at `start`.
    /// Returns the position after the last consumed token.
    fn table_refs(
        &self,
        tokens: &[Token<'_>],
        start: usize,
        allow_list: bool,
        scope: &mut Scope,
        unknown: &mut Vec<String>,
    ) -> usize {
        let mut i = start;

        loop {
            let Some(tok) = tokens.get(i) else {
                return i;
            };
            // `FROM 'file.csv'` scans a file; `?` and numbers name no table
            if matches!(
                tok.kind,
                TokenKind::Str | TokenKind::Number | TokenKind::Placeholder
            ) {
                unknown.push(tok.text.to_string());
                let (alias, next) = alias_after(tokens, i + 1);
                if let Some(idx) = alias {
                    scope.tables.insert(tokens[idx].name(), None);
                    scope.consumed.insert(idx);
                }
                return next;
            }
            if !tok.is_name() || (tok.kind == TokenKind::Word && KEYWORDS.contains(&tok.name().as_str())) {
                return i;
            }

            let name = tok.name();
            scope.consumed.insert(i);

            // table functions such as read_csv(...)
            if tokens.get(i + 1).is_some_and(|t| t.is_punct("(")) {
                unknown.push(format!("{}()", name));
                return i + 1;
            }

            let table = self.catalog.table(&name).map(|t| t.name.clone());
            if table.is_none() {
                unknown.push(name.clone());
            }
            scope.tables.insert(name, table.clone());
            i += 1;

            let (alias, next) = alias_after(tokens, i);
            if let Some(idx) = alias {
                scope.tables.insert(tokens[idx].name(), table);
                scope.consumed.insert(idx);
            }
            i = next;

            if allow_list && tokens.get(i).is_some_and(|t| t.is_punct(",")) {
                i += 1;
                continue;
            }
            return i;
        }
    }
}

/// Lowercase words inside a literal or quoted identifier
fn literal_words(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
        .filter(|w| !w.is_empty())
        .map(|w| w.to_ascii_lowercase())
}

/// `[AS] alias` at position `i`: returns the alias position (if any) and the
/// position after it
fn alias_after(tokens: &[Token<'_>], i: usize) -> (Option<usize>, usize) {
    match tokens.get(i) {
        Some(t) if t.is_word("as") => match tokens.get(i + 1) {
            Some(a) if a.is_name() => (Some(i + 1), i + 2),
            _ => (None, i + 1),
        },
        Some(t) if t.kind == TokenKind::QuotedIdent => (Some(i), i + 1),
        Some(t) if t.kind == TokenKind::Word && !KEYWORDS.contains(&t.name().as_str()) => {
            (Some(i), i + 1)
        }
        _ => (None, i),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn validator() -> SqlValidator {
        SqlValidator::new(Arc::new(SchemaCatalog::builtin().unwrap()))
    }

    fn rules(sql: &str) -> Vec<ValidationRule> {
        validator()
            .validate(&CandidateSql::from_llm(sql))
            .violations()
            .iter()
            .map(|v| v.rule)
            .collect()
    }

    fn passes(sql: &str) -> bool {
        let result = validator().validate(&CandidateSql::from_llm(sql));
        if !result.is_valid() {
            eprintln!("{:?}", result.violations());
        }
        result.is_valid()
    }

    #[test]
    fn test_accepts_plain_select() {
        assert!(passes("SELECT order_id, order_status FROM orders LIMIT 5"));
        assert!(passes(
            "select c.customer_state, count(distinct c.customer_unique_id) as n \
             from customers c join orders o on o.customer_id = c.customer_id \
             group by 1 order by n desc"
        ));
    }

    #[test]
    fn test_accepts_derived_table_and_extract() {
        assert!(passes(
            "SELECT t.order_status, t.cnt FROM (SELECT order_status, COUNT(*) AS cnt \
             FROM orders GROUP BY order_status) AS t ORDER BY t.cnt DESC"
        ));
        assert!(passes(
            "SELECT EXTRACT(year FROM order_purchase_timestamp) AS yr, COUNT(*) \
             FROM orders GROUP BY yr"
        ));
        assert!(passes(
            "SELECT CAST(review_score AS INTEGER) AS s, review_creation_date::DATE AS d \
             FROM reviews WHERE review_comment_message LIKE '%entrega%'"
        ));
    }

    #[test]
    fn test_literal_contents_are_checked() {
        assert_eq!(
            rules("SELECT review_score FROM reviews WHERE review_comment_message LIKE '%DROP TABLE%'"),
            vec![ValidationRule::ForbiddenKeyword]
        );
        assert_eq!(
            rules("SELECT review_score FROM reviews WHERE review_comment_message = 'x; DROP TABLE orders'"),
            vec![ValidationRule::MultiStatement, ValidationRule::ForbiddenKeyword]
        );
        assert_eq!(
            rules("SELECT order_id FROM orders WHERE order_status = '--'"),
            vec![ValidationRule::MultiStatement]
        );
        assert_eq!(
            rules(r#"SELECT "/*" FROM orders"#)[0],
            ValidationRule::MultiStatement
        );
        assert!(passes("SELECT order_id FROM orders WHERE order_status = 'delivered'"));
    }

    #[test]
    fn test_string_in_table_position() {
        let result = validator().validate(&CandidateSql::from_llm("SELECT * FROM '/etc/passwd'"));
        assert_eq!(result.violations()[0].rule, ValidationRule::UnknownIdentifier);
        assert_eq!(result.violations()[0].detail, "'/etc/passwd'");

        assert_eq!(
            rules("SELECT o.order_id FROM orders o JOIN 'x.csv' t ON true"),
            vec![ValidationRule::UnknownIdentifier]
        );
        assert_eq!(
            rules("SELECT order_id FROM orders, 'x.parquet'"),
            vec![ValidationRule::UnknownIdentifier]
        );
    }

    #[test]
    fn test_stacked_statement() {
        let found = rules("SELECT * FROM orders; DROP TABLE orders;");
        assert_eq!(found[0], ValidationRule::MultiStatement);
        assert!(found.contains(&ValidationRule::ForbiddenKeyword));
    }

    #[test]
    fn test_comment_sequences() {
        assert_eq!(rules("SELECT order_id FROM orders -- hi")[0], ValidationRule::MultiStatement);
        assert_eq!(
            rules("SELECT order_id FROM orders /* x */")[0],
            ValidationRule::MultiStatement
        );
    }

    #[test]
    fn test_not_select() {
        assert_eq!(rules("DELETE FROM orders")[0], ValidationRule::NotSelect);
        assert_eq!(
            rules("WITH x AS (SELECT 1) SELECT * FROM x")[0],
            ValidationRule::NotSelect
        );
    }

    #[test]
    fn test_forbidden_keyword_mid_statement() {
        assert_eq!(
            rules("SELECT order_id FROM orders WHERE order_id IN (DELETE FROM orders)"),
            vec![ValidationRule::ForbiddenKeyword]
        );
    }

    #[test]
    fn test_unknown_identifiers() {
        let result = validator().validate(&CandidateSql::from_llm("SELECT password FROM users"));
        let details: Vec<_> = result.violations().iter().map(|v| v.detail.as_str()).collect();
        assert!(details.contains(&"users"));
        assert!(details.contains(&"password"));

        assert_eq!(
            rules("SELECT o.nope FROM orders o"),
            vec![ValidationRule::UnknownIdentifier]
        );
        assert_eq!(
            rules("SELECT * FROM read_csv('/etc/passwd')"),
            vec![ValidationRule::UnknownIdentifier]
        );
        assert_eq!(
            rules("SELECT payment_value FROM orders"),
            vec![ValidationRule::UnknownIdentifier]
        );
    }

    #[test]
    fn test_empty_and_malformed() {
        assert_eq!(rules("   "), vec![ValidationRule::Empty]);
        assert_eq!(rules("SELECT 'oops FROM orders")[0], ValidationRule::Malformed);
    }

    #[test]
    fn test_passed_result_carries_statement() {
        let candidate = CandidateSql::from_builder(
            "SELECT COUNT(*) AS order_count FROM orders WHERE order_status = ?",
            vec![BoundParam::new(
                "filter_status",
                nlq_ir::QueryParam::Text("delivered".into()),
            )],
        )
        .with_explanation("Number of orders");

        let validated = validator().validate(&candidate).into_result().unwrap();
        assert_eq!(validated.params().len(), 1);
        assert_eq!(validated.source(), SqlSource::Builder);
        assert_eq!(validated.explanation(), "Number of orders");
    }

    #[test]
    fn test_rejected_result_reports_first_rule() {
        let err = validator()
            .validate(&CandidateSql::from_llm("SELECT 1; SELECT 2"))
            .into_result()
            .unwrap_err();
        assert_eq!(err.rule(), ValidationRule::MultiStatement);
        assert_eq!(err.to_string(), "SQL rejected: multi_statement");
    }
}
