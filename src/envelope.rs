/*!
 * Envelopes
 * The uniform request/response wrapper around every operation call
 */

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ServiceError;

/// Response time format: ISO-8601, millisecond precision, UTC.
const RESPONSE_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3fZ";

/// Inbound `{version, request}` body. `request` is base64-encoded JSON.
///
/// Missing or `null` fields become empty strings so they fail inside the
/// envelope rather than at the extractor.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RequestEnvelope {
    #[serde(deserialize_with = "crate::request::null_as_default")]
    pub version: String,
    #[serde(deserialize_with = "crate::request::null_as_default")]
    pub request: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorEntry {
    pub code: String,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseEnvelope {
    pub version: String,
    pub responsetime: String,
    pub response: Value,
    pub errors: Vec<ErrorEntry>,
}

impl ResponseEnvelope {
    /// Starting point for every operation response: nothing left unset,
    /// `response` holds the empty marker and `errors` is empty.
    pub fn template(version: &str) -> Self {
        Self::template_at(version, Utc::now())
    }

    fn template_at(version: &str, now: DateTime<Utc>) -> Self {
        Self {
            version: version.to_string(),
            responsetime: now.format(RESPONSE_TIME_FORMAT).to_string(),
            response: empty_marker(),
            errors: Vec::new(),
        }
    }

    pub fn attach_result(&mut self, result: Value) {
        self.response = result;
    }

    pub fn attach_error(&mut self, code: impl Into<String>, message: impl Into<String>) {
        self.errors.push(ErrorEntry {
            code: code.into(),
            message: message.into(),
        });
    }

    pub fn fail(&mut self, err: &ServiceError) {
        self.response = empty_marker();
        self.attach_error(err.code(), err.to_string());
    }

    pub fn is_success(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Placeholder `response` value for envelopes without a result.
pub fn empty_marker() -> Value {
    Value::String(String::new())
}
