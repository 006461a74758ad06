//! NLQ Intermediate Representation
//!
//! Types that flow between the matcher, the builder, the validator and the
//! executor. Everything here is created and discarded within the handling
//! of a single question; only the catalog outlives a request.
//! All types are deterministically serializable so they can be logged and
//! fingerprinted.

mod intent;
mod result;
mod sql;

pub use intent::*;
pub use result::*;
pub use sql::*;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

/// A question as received from the caller.
///
/// Immutable once created: the normalized text is computed up front by the
/// matcher's normalizer and carried alongside the raw text.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryRequest {
    pub id: Uuid,
    pub raw_text: String,
    pub normalized_text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub locale: Option<String>,
    pub received_at: DateTime<Utc>,
}

impl QueryRequest {
    pub fn new(
        raw_text: impl Into<String>,
        normalized_text: impl Into<String>,
        locale: Option<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            raw_text: raw_text.into(),
            normalized_text: normalized_text.into(),
            locale,
            received_at: Utc::now(),
        }
    }

    /// SHA-256 of the normalized text; identical questions share a fingerprint
    pub fn fingerprint(&self) -> String {
        sha256_hex(&self.normalized_text)
    }
}

pub(crate) fn sha256_hex(input: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(input.as_bytes());
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_fingerprint_is_stable() {
        let a = QueryRequest::new("Monthly revenue trend!", "monthly revenue trend", None);
        let b = QueryRequest::new("monthly   REVENUE trend", "monthly revenue trend", None);

        assert_ne!(a.id, b.id);
        assert_eq!(a.fingerprint(), b.fingerprint());
        assert_eq!(a.fingerprint().len(), 64);
    }
}
