//! Question answering pipeline
//!
//! question → matcher (or LLM bridge) → candidate SQL → validator →
//! read-only executor → chart hint → response envelope. The engine holds no
//! per-request state, so one instance is shared by every connection.

use nlq_catalog::SchemaCatalog;
use nlq_duck::{hint_for_intent, Warehouse};
use nlq_intent::{example_questions, IntentMatch, IntentMatcher};
use nlq_ir::{CandidateSql, ChartHint, ColumnMeta, Intent, QueryRequest, SqlSource};
use nlq_sql::{QueryBuilder, SqlValidator};
use serde::Serialize;
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info_span, warn, Instrument, Level};
use uuid::Uuid;

use crate::config::Config;
use crate::error::{AnswerError, FailedAnswer, StartupError};
use crate::llm::{few_shot_examples, BridgeError, OpenAiTranslator, SqlTranslator};
use crate::metrics::Metrics;

const LLM_EXPLANATION: &str = "Generated by the language model from the warehouse catalog.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Demo,
    Llm,
}

impl Mode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Demo => "demo",
            Mode::Llm => "llm",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ErrorBody {
    pub kind: &'static str,
    pub reason: &'static str,
    pub message: String,
}

/// Response envelope for both transports
#[derive(Debug, Clone, Serialize)]
pub struct AnswerResponse {
    pub success: bool,
    pub request_id: Uuid,
    pub question: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sql: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<SqlSource>,
    pub demo_mode: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub intent: Option<Intent>,
    pub columns: Vec<ColumnMeta>,
    pub rows: Vec<Vec<serde_json::Value>>,
    pub row_count: usize,
    pub truncated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chart_hint: Option<ChartHint>,
    pub execution_time_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorBody>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub examples: Option<Vec<&'static str>>,
}

#[derive(Debug, Clone)]
pub struct EngineOptions {
    pub max_question_chars: usize,
    pub max_limit: i64,
    pub llm_timeout: Duration,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            max_question_chars: 500,
            max_limit: nlq_sql::DEFAULT_MAX_LIMIT,
            llm_timeout: Duration::from_secs(20),
        }
    }
}

pub struct Engine {
    catalog: Arc<SchemaCatalog>,
    catalog_summary: String,
    matcher: IntentMatcher,
    builder: QueryBuilder,
    validator: SqlValidator,
    warehouse: Warehouse,
    translator: Option<Arc<dyn SqlTranslator>>,
    metrics: Metrics,
    options: EngineOptions,
}

impl Engine {
    /// Demo-mode engine; attach a translator with [`Engine::with_translator`]
    pub fn new(
        catalog: Arc<SchemaCatalog>,
        warehouse: Warehouse,
        options: EngineOptions,
    ) -> Result<Self, StartupError> {
        Ok(Self {
            catalog_summary: catalog.summary(),
            matcher: IntentMatcher::new(options.max_limit)?,
            builder: QueryBuilder::new(catalog.clone()).with_max_limit(options.max_limit),
            validator: SqlValidator::new(catalog.clone()),
            catalog,
            warehouse,
            translator: None,
            metrics: Metrics::new()?,
            options,
        })
    }

    pub fn with_translator(mut self, translator: Arc<dyn SqlTranslator>) -> Self {
        self.translator = Some(translator);
        self
    }

    /// Engine from loaded configuration. The credential alone decides
    /// between demo and LLM mode.
    pub fn from_config(
        config: &Config,
        catalog: Arc<SchemaCatalog>,
        api_key: Option<String>,
    ) -> Result<Self, StartupError> {
        let warehouse =
            Warehouse::new(&config.warehouse.path).with_max_rows(config.warehouse.max_rows);
        let options = EngineOptions {
            max_question_chars: config.engine.max_question_chars,
            max_limit: config.engine.max_limit,
            llm_timeout: Duration::from_secs(config.llm.timeout_secs),
        };
        let engine = Self::new(catalog, warehouse, options)?;

        match api_key {
            Some(key) => {
                let few_shot = few_shot_examples(&engine.matcher, &engine.builder);
                let translator = OpenAiTranslator::new(key, &config.llm, few_shot)
                    .map_err(|e| StartupError::Llm(e.to_string()))?;
                Ok(engine.with_translator(Arc::new(translator)))
            }
            None => Ok(engine),
        }
    }

    pub fn mode(&self) -> Mode {
        if self.translator.is_some() {
            Mode::Llm
        } else {
            Mode::Demo
        }
    }

    pub fn catalog(&self) -> &SchemaCatalog {
        &self.catalog
    }

    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    /// Answer one question. Records metrics and one structured log event
    /// whatever the outcome.
    pub async fn answer(&self, question: &str) -> Result<AnswerResponse, FailedAnswer> {
        let started = Instant::now();
        let request = QueryRequest::new(question, self.matcher.normalize(question), None);
        let fingerprint = request.fingerprint();
        let mode = self.mode().as_str();

        let span = info_span!("answer", request_id = %request.id, mode);
        let result = self.resolve(&request).instrument(span).await;

        let elapsed = started.elapsed();
        let elapsed_ms = elapsed.as_millis() as u64;
        let outcome = match &result {
            Ok(_) => "ok",
            Err(e) => e.kind(),
        };
        self.metrics.observe(mode, outcome, elapsed);

        match &result {
            Ok(response) => {
                crate::log_event!(
                    level: Level::INFO,
                    event: "question_answered",
                    request_id: request.id,
                    fingerprint: fingerprint,
                    mode: mode,
                    source: response.source,
                    outcome: outcome,
                    rows: response.row_count,
                    elapsed_ms: elapsed_ms
                );
            }
            Err(e) => {
                crate::log_event!(
                    level: Level::WARN,
                    event: "question_failed",
                    request_id: request.id,
                    fingerprint: fingerprint,
                    mode: mode,
                    outcome: outcome,
                    reason: e.reason(),
                    error: e.to_string(),
                    elapsed_ms: elapsed_ms
                );
            }
        }

        result
            .map(|mut response| {
                response.execution_time_ms = elapsed_ms;
                response
            })
            .map_err(|error| FailedAnswer {
                request_id: request.id,
                elapsed_ms,
                error,
            })
    }

    async fn resolve(&self, request: &QueryRequest) -> Result<AnswerResponse, AnswerError> {
        self.check_question(&request.raw_text)?;

        let (candidate, matched) = match self.matcher.match_text(&request.normalized_text) {
            Ok(m) => (self.builder.build(m.intent, &m.slots)?, Some(m)),
            Err(no_match) => match &self.translator {
                Some(translator) => (self.translate(translator.as_ref(), &request.raw_text).await?, None),
                None => return Err(no_match.into()),
            },
        };
        debug!(source = %candidate.source, sql = %candidate.sql, "Candidate SQL");

        let validated = self.validator.validate(&candidate).into_result()?;

        let warehouse = self.warehouse.clone();
        let (validated, result) = tokio::task::spawn_blocking(move || {
            let result = warehouse.execute(&validated);
            (validated, result)
        })
        .await?;
        let mut result = result?;

        if let Some(IntentMatch { intent, slots, .. }) = &matched {
            result.chart_hint = hint_for_intent(*intent, slots);
        }

        let explanation = match validated.explanation() {
            "" => LLM_EXPLANATION.to_string(),
            text => text.to_string(),
        };

        Ok(AnswerResponse {
            success: true,
            request_id: request.id,
            question: request.raw_text.clone(),
            sql: Some(validated.sql().to_string()),
            explanation: Some(explanation),
            source: Some(validated.source()),
            demo_mode: self.mode() == Mode::Demo,
            intent: matched.map(|m| m.intent),
            columns: result.columns,
            rows: result.rows,
            row_count: result.row_count,
            truncated: result.truncated,
            chart_hint: Some(result.chart_hint),
            execution_time_ms: 0,
            error: None,
            examples: None,
        })
    }

    fn check_question(&self, question: &str) -> Result<(), AnswerError> {
        if question.trim().is_empty() {
            return Err(AnswerError::InvalidQuestion(
                "Question must not be empty".to_string(),
            ));
        }
        let max = self.options.max_question_chars;
        if question.chars().count() > max {
            return Err(AnswerError::InvalidQuestion(format!(
                "Question is longer than {} characters",
                max
            )));
        }
        Ok(())
    }

    /// Single attempt under the configured timeout
    async fn translate(
        &self,
        translator: &dyn SqlTranslator,
        question: &str,
    ) -> Result<CandidateSql, BridgeError> {
        let timeout = self.options.llm_timeout;
        match tokio::time::timeout(timeout, translator.translate(question, &self.catalog_summary))
            .await
        {
            Ok(result) => result,
            Err(_) => Err(BridgeError::Timeout(timeout)),
        }
    }

    /// Error envelope. Demo-mode misses carry the supported questions.
    pub fn failure(&self, question: &str, failed: &FailedAnswer) -> AnswerResponse {
        let err = &failed.error;
        let examples = matches!(err, AnswerError::NoMatch(_)).then(example_questions);

        AnswerResponse {
            success: false,
            request_id: failed.request_id,
            question: question.to_string(),
            sql: None,
            explanation: None,
            source: None,
            demo_mode: self.mode() == Mode::Demo,
            intent: None,
            columns: Vec::new(),
            rows: Vec::new(),
            row_count: 0,
            truncated: false,
            chart_hint: None,
            execution_time_ms: failed.elapsed_ms,
            error: Some(ErrorBody {
                kind: err.kind(),
                reason: err.reason(),
                message: err.user_message(),
            }),
            examples,
        }
    }

    /// Catalog tables with semantic column types and live row counts
    pub async fn schema(&self) -> serde_json::Value {
        let warehouse = self.warehouse.clone();
        let catalog = self.catalog.clone();
        let counts: HashMap<String, Option<i64>> =
            match tokio::task::spawn_blocking(move || warehouse.table_row_counts(&catalog)).await {
                Ok(Ok(counts)) => counts.into_iter().collect(),
                Ok(Err(e)) => {
                    warn!(error = %e, "Row counts unavailable");
                    HashMap::new()
                }
                Err(e) => {
                    warn!(error = %e, "Row count worker failed");
                    HashMap::new()
                }
            };

        let tables: Vec<_> = self
            .catalog
            .tables()
            .iter()
            .map(|table| {
                json!({
                    "name": table.name,
                    "description": table.description,
                    "row_count": counts.get(&table.name).copied().flatten(),
                    "columns": table.columns.iter().map(|c| json!({
                        "name": c.name,
                        "type": c.semantic_type,
                    })).collect::<Vec<_>>(),
                })
            })
            .collect();

        json!({
            "name": self.catalog.name,
            "tables": tables,
            "relationships": self.catalog.relationships(),
            "notes": self.catalog.notes(),
        })
    }
}
