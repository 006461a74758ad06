//! OpenAI bridge: question plus catalog summary in, candidate SQL out
//!
//! The reply is never trusted. Whatever statement is extracted here goes
//! through the validator exactly like builder output.

use async_openai::{
    config::OpenAIConfig,
    error::OpenAIError,
    types::{
        ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
        ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs,
    },
    Client,
};
use async_trait::async_trait;
use backoff::{ExponentialBackoff, ExponentialBackoffBuilder};
use nlq_intent::{IntentMatcher, EXAMPLES};
use nlq_ir::{CandidateSql, QueryParam};
use nlq_sql::QueryBuilder;
use regex::Regex;
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::LlmConfig;

const SYSTEM_PROMPT: &str = r#"You translate questions about an e-commerce analytics warehouse into a single DuckDB SQL query.

Rules:
1. Return exactly one SELECT statement. No semicolons, no comments, no CTEs.
2. Only use the tables and columns listed in the catalog below.
3. Never write INSERT, UPDATE, DELETE, DROP, ALTER, CREATE, TRUNCATE or GRANT.
4. Give every computed column a short snake_case alias.
5. Revenue and sales questions only count orders with order_status = 'delivered'.
6. Count customers with COUNT(DISTINCT customer_unique_id).
7. Prefer English category names from category_translation.
8. Add LIMIT 100 or less unless the result is a single aggregate row.

Respond with JSON only:
{"sql": "<the query>", "explanation": "<one sentence for a business user>"}"#;

#[derive(Debug, Error)]
pub enum BridgeError {
    #[error("LLM call timed out after {0:?}")]
    Timeout(Duration),

    #[error("LLM endpoint unreachable: {0}")]
    Unreachable(String),

    #[error("LLM response contained no SQL statement")]
    UnparsableResponse(String),
}

impl BridgeError {
    pub fn kind(&self) -> &'static str {
        match self {
            BridgeError::Timeout(_) => "timeout",
            BridgeError::Unreachable(_) => "unreachable",
            BridgeError::UnparsableResponse(_) => "unparsable_response",
        }
    }
}

/// A reply body that is not a chat completion is unparsable. Every other
/// failure, 5xx and rate-limit replies included, leaves the endpoint
/// unreachable for this question.
impl From<OpenAIError> for BridgeError {
    fn from(e: OpenAIError) -> Self {
        match e {
            OpenAIError::JSONDeserialize(inner) => BridgeError::UnparsableResponse(inner.to_string()),
            other => BridgeError::Unreachable(other.to_string()),
        }
    }
}

/// Backoff policy that gives up after the first failure. The client's
/// default policy retries 5xx and rate-limit replies on its own.
fn single_attempt() -> ExponentialBackoff {
    ExponentialBackoffBuilder::new()
        .with_max_elapsed_time(Some(Duration::ZERO))
        .build()
}

/// Seam between the engine and the language model.
///
/// Implementations make a single attempt; the engine bounds the call with a
/// timeout and validates whatever comes back.
#[async_trait]
pub trait SqlTranslator: Send + Sync {
    async fn translate(
        &self,
        question: &str,
        catalog_summary: &str,
    ) -> Result<CandidateSql, BridgeError>;
}

#[derive(Debug, Deserialize)]
struct JsonReply {
    sql: String,
    #[serde(default)]
    explanation: String,
}

/// Pulls one statement-shaped substring out of free-form model output
#[derive(Debug)]
pub struct ReplyParser {
    statement_start: Regex,
}

impl ReplyParser {
    pub fn new() -> Result<Self, regex::Error> {
        Ok(Self {
            statement_start: Regex::new(r"(?is)\b(?:select\b|with\s+\w+\s+as\s*\()")?,
        })
    }

    /// JSON `{sql, explanation}` first (code fences stripped), then the
    /// first `SELECT`/`WITH` to the end of the text. One trailing `;` is
    /// dropped; anything after an inner `;` is kept for the validator.
    pub fn parse(&self, content: &str) -> Result<CandidateSql, BridgeError> {
        let body = strip_code_fence(content);

        if let Ok(reply) = serde_json::from_str::<JsonReply>(body.trim()) {
            let sql = trim_statement(&reply.sql);
            if !sql.is_empty() {
                return Ok(CandidateSql::from_llm(sql).with_explanation(reply.explanation.trim()));
            }
        }

        match self.statement_start.find(body) {
            Some(m) => {
                let sql = trim_statement(&body[m.start()..]);
                Ok(CandidateSql::from_llm(sql))
            }
            None => Err(BridgeError::UnparsableResponse(content.to_string())),
        }
    }
}

fn strip_code_fence(content: &str) -> &str {
    let Some(open) = content.find("```") else {
        return content;
    };
    let after = &content[open + 3..];
    // skip a language tag such as ```sql or ```json
    let body = match after.find('\n') {
        Some(nl) => &after[nl + 1..],
        None => after,
    };
    match body.find("```") {
        Some(close) => &body[..close],
        None => body,
    }
}

fn trim_statement(sql: &str) -> String {
    let sql = sql.trim();
    sql.strip_suffix(';').unwrap_or(sql).trim_end().to_string()
}

/// Documented example questions with the SQL the builder produces for
/// them, parameters inlined, for few-shot prompting
pub fn few_shot_examples(matcher: &IntentMatcher, builder: &QueryBuilder) -> String {
    let mut out = String::new();
    for example in EXAMPLES {
        let Ok(m) = matcher.match_question(example.question) else {
            continue;
        };
        match builder.build(m.intent, &m.slots) {
            Ok(candidate) => {
                out.push_str(&format!(
                    "Question: {}\n{{\"sql\": {}, \"explanation\": {}}}\n\n",
                    example.question,
                    serde_json::Value::String(inline_params(&candidate)),
                    serde_json::Value::String(candidate.explanation.clone()),
                ));
            }
            Err(e) => warn!(question = example.question, error = %e, "Example did not build"),
        }
    }
    out
}

/// Replace each `?` with its bound value as a SQL literal. Builder SQL has
/// no `?` outside placeholders.
fn inline_params(candidate: &CandidateSql) -> String {
    let mut params = candidate.params.iter();
    let mut out = String::with_capacity(candidate.sql.len());
    for c in candidate.sql.chars() {
        if c != '?' {
            out.push(c);
            continue;
        }
        match params.next().map(|p| &p.value) {
            Some(QueryParam::Int(n)) => out.push_str(&n.to_string()),
            Some(QueryParam::Float(f)) => out.push_str(&f.to_string()),
            Some(QueryParam::Text(s)) => {
                out.push('\'');
                out.push_str(&s.replace('\'', "''"));
                out.push('\'');
            }
            None => out.push('?'),
        }
    }
    out
}

/// OpenAI chat completion translator
pub struct OpenAiTranslator {
    client: Client<OpenAIConfig>,
    model: String,
    max_tokens: u32,
    few_shot: String,
    parser: ReplyParser,
}

impl OpenAiTranslator {
    pub fn new(api_key: String, config: &LlmConfig, few_shot: String) -> Result<Self, regex::Error> {
        let openai_config = OpenAIConfig::new().with_api_key(api_key);
        info!(model = %config.model, "LLM bridge enabled");

        Ok(Self {
            client: Client::with_config(openai_config).with_backoff(single_attempt()),
            model: config.model.clone(),
            max_tokens: config.max_tokens,
            few_shot,
            parser: ReplyParser::new()?,
        })
    }

    fn system_prompt(&self, catalog_summary: &str) -> String {
        format!(
            "{}\n\n{}\n\n## Examples\n\n{}",
            SYSTEM_PROMPT, catalog_summary, self.few_shot
        )
    }
}

#[async_trait]
impl SqlTranslator for OpenAiTranslator {
    async fn translate(
        &self,
        question: &str,
        catalog_summary: &str,
    ) -> Result<CandidateSql, BridgeError> {
        let messages = vec![
            ChatCompletionRequestMessage::System(
                ChatCompletionRequestSystemMessageArgs::default()
                    .content(self.system_prompt(catalog_summary))
                    .build()?,
            ),
            ChatCompletionRequestMessage::User(
                ChatCompletionRequestUserMessageArgs::default()
                    .content(question)
                    .build()?,
            ),
        ];

        let request = CreateChatCompletionRequestArgs::default()
            .model(self.model.as_str())
            .messages(messages)
            .temperature(0.0)
            .max_completion_tokens(self.max_tokens)
            .build()?;

        let response = self.client.chat().create(request).await?;

        let content = response
            .choices
            .first()
            .and_then(|choice| choice.message.content.as_deref())
            .ok_or_else(|| BridgeError::UnparsableResponse(String::new()))?;

        debug!(reply = %content, "LLM reply");
        self.parser.parse(content)
    }
}
