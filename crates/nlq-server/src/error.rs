//! Error taxonomy surfaced to callers

use crate::llm::BridgeError;
use axum::http::StatusCode;
use nlq_catalog::CatalogError;
use nlq_duck::ExecutionError;
use nlq_intent::{MatcherError, NoMatch};
use nlq_sql::{BuildError, ValidationRejected};
use thiserror::Error;
use uuid::Uuid;

const UNSAFE_ANSWER: &str = "Could not safely answer this question";

/// Failure while answering one question. Every variant is recoverable:
/// the next request starts from scratch.
#[derive(Debug, Error)]
pub enum AnswerError {
    #[error("Invalid question: {0}")]
    InvalidQuestion(String),

    #[error(transparent)]
    NoMatch(#[from] NoMatch),

    #[error(transparent)]
    Build(#[from] BuildError),

    #[error(transparent)]
    Bridge(#[from] BridgeError),

    #[error(transparent)]
    Rejected(#[from] ValidationRejected),

    #[error(transparent)]
    Execution(#[from] ExecutionError),

    #[error("Query worker failed: {0}")]
    Worker(#[from] tokio::task::JoinError),
}

impl AnswerError {
    /// Stable tag for clients, logs and metrics
    pub fn kind(&self) -> &'static str {
        match self {
            AnswerError::InvalidQuestion(_) => "invalid_question",
            AnswerError::NoMatch(_) => "no_match",
            AnswerError::Build(_) => "build_error",
            AnswerError::Bridge(_) => "bridge_error",
            AnswerError::Rejected(_) => "validation_rejected",
            AnswerError::Execution(_) | AnswerError::Worker(_) => "execution_error",
        }
    }

    /// Finer-grained tag: the violated rule, the bridge failure, and so on
    pub fn reason(&self) -> &'static str {
        match self {
            AnswerError::InvalidQuestion(_) => "invalid_question",
            AnswerError::NoMatch(_) => "no_match",
            AnswerError::Build(e) => e.kind(),
            AnswerError::Bridge(e) => e.kind(),
            AnswerError::Rejected(e) => e.rule().as_str(),
            AnswerError::Execution(e) => e.kind(),
            AnswerError::Worker(_) => "worker_failed",
        }
    }

    /// Message safe to show an end user. Validator and bridge failures only
    /// expose the violated rule kind, never SQL.
    pub fn user_message(&self) -> String {
        match self {
            AnswerError::InvalidQuestion(reason) => reason.clone(),
            AnswerError::NoMatch(_) => {
                "I could not match that question. Try one of the example questions.".to_string()
            }
            AnswerError::Build(e) => format!("I understood the question but cannot answer it: {}", e),
            AnswerError::Bridge(_) | AnswerError::Rejected(_) => {
                format!("{} ({})", UNSAFE_ANSWER, self.reason())
            }
            AnswerError::Execution(ExecutionError::WriteAttempted(_)) => {
                format!("{} (write_attempted)", UNSAFE_ANSWER)
            }
            AnswerError::Execution(_) | AnswerError::Worker(_) => {
                "The warehouse could not run the query.".to_string()
            }
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            AnswerError::InvalidQuestion(_) => StatusCode::BAD_REQUEST,
            AnswerError::NoMatch(_) | AnswerError::Build(_) | AnswerError::Rejected(_) => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            AnswerError::Bridge(BridgeError::Timeout(_)) => StatusCode::GATEWAY_TIMEOUT,
            AnswerError::Bridge(_) => StatusCode::BAD_GATEWAY,
            AnswerError::Execution(_) | AnswerError::Worker(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

/// An answer failure tied to the request that produced it, so the error
/// envelope and the log event carry the same request id
#[derive(Debug, Error)]
#[error("request {request_id}: {error}")]
pub struct FailedAnswer {
    pub request_id: Uuid,
    pub elapsed_ms: u64,
    #[source]
    pub error: AnswerError,
}

/// Failures that stop the server from starting
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("Catalog failed to load: {0}")]
    Catalog(#[from] CatalogError),

    #[error("Matcher failed to build: {0}")]
    Matcher(#[from] MatcherError),

    #[error("Metrics registry failed: {0}")]
    Metrics(#[from] prometheus::Error),

    #[error("LLM client failed to build: {0}")]
    Llm(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use nlq_ir::{Intent, SlotKey};
    use std::time::Duration;

    #[test]
    fn test_kinds_are_stable() {
        assert_eq!(AnswerError::from(NoMatch).kind(), "no_match");
        assert_eq!(
            AnswerError::from(BuildError::MissingSlot {
                intent: Intent::GenericCount,
                slot: SlotKey::Entity,
            })
            .kind(),
            "build_error"
        );
        assert_eq!(
            AnswerError::from(BridgeError::Timeout(Duration::from_secs(20))).kind(),
            "bridge_error"
        );
        assert_eq!(
            AnswerError::InvalidQuestion("empty".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn test_bridge_message_hides_details() {
        let err = AnswerError::from(BridgeError::Unreachable("tcp connect error to 10.0.0.1".into()));
        let message = err.user_message();
        assert_eq!(message, "Could not safely answer this question (unreachable)");
        assert_eq!(err.status_code(), StatusCode::BAD_GATEWAY);
    }
}
