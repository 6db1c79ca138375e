//! Records stored by the drivers and the request/response envelopes
//! exchanged with the quiz client.

use chrono::Local;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

pub const NO_RESULTS_RETURNED_MSG: &str = "No results returned...";

/// Layout used for every response timestamp, e.g. `Mon Jan 2 15:04:05 2006`.
pub const TIMESTAMP_FORMAT: &str = "%a %b %-d %H:%M:%S %Y";

pub fn timestamp_now() -> String {
    Local::now().format(TIMESTAMP_FORMAT).to_string()
}

// ============================================================================
// Record
// ============================================================================

/// A single question/answer record, keyed by a caller-assigned identifier.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema, sqlx::FromRow)]
pub struct QuestionRecord {
    #[serde(rename = "questionid")]
    pub question_id: String,
    pub question: String,
    pub category: String,
    pub answer: String,
}

impl QuestionRecord {
    pub fn new(
        question_id: impl Into<String>,
        question: impl Into<String>,
        category: impl Into<String>,
        answer: impl Into<String>,
    ) -> Self {
        Self {
            question_id: question_id.into(),
            question: question.into(),
            category: category.into(),
            answer: answer.into(),
        }
    }

    /// Exact string match against the stored answer
    pub fn is_correct(&self, response: &str) -> bool {
        self.answer == response
    }
}

// ============================================================================
// Requests
// ============================================================================

/// Body of both the insert and the update request.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, ToSchema)]
pub struct QuestionRequest {
    #[serde(rename = "questionid")]
    #[validate(length(min = 1, message = "questionid is required"))]
    pub question_id: String,
    #[validate(length(min = 1, message = "question is required"))]
    pub question: String,
    #[serde(default)]
    pub category: String,
    #[validate(length(min = 1, message = "answer is required"))]
    pub answer: String,
}

impl QuestionRequest {
    pub fn into_record(self) -> QuestionRecord {
        QuestionRecord {
            question_id: self.question_id,
            question: self.question,
            category: self.category,
            answer: self.answer,
        }
    }
}

impl From<QuestionRecord> for QuestionRequest {
    fn from(record: QuestionRecord) -> Self {
        Self {
            question_id: record.question_id,
            question: record.question,
            category: record.category,
            answer: record.answer,
        }
    }
}

/// Submitted answer for a stored question.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, ToSchema)]
pub struct AnswerRequest {
    #[serde(rename = "questionid")]
    #[validate(length(min = 1, message = "questionid is required"))]
    pub question_id: String,
    #[serde(default)]
    pub response: String,
}

// ============================================================================
// Status codes
// ============================================================================

/// Datastore status reported by the status endpoint.
///
/// Serialized as an integer. `Unavailable` is pinned to `i64::MAX`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "i64", try_from = "i64")]
pub enum StatusCode {
    /// Datastore has not been started or initialized
    #[default]
    NotStarted,
    /// Datastore is ready for messages
    Running,
    /// The requested server name is not known
    InvalidServerName,
    /// The datastore never responded or refused the connection
    Unavailable,
}

impl From<StatusCode> for i64 {
    fn from(code: StatusCode) -> Self {
        match code {
            StatusCode::NotStarted => 0,
            StatusCode::Running => 1,
            StatusCode::InvalidServerName => 2,
            StatusCode::Unavailable => i64::MAX,
        }
    }
}

impl TryFrom<i64> for StatusCode {
    type Error = String;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::NotStarted),
            1 => Ok(Self::Running),
            2 => Ok(Self::InvalidServerName),
            i64::MAX => Ok(Self::Unavailable),
            other => Err(format!("unknown status code: {other}")),
        }
    }
}

// ============================================================================
// Responses
// ============================================================================

/// Common shape of every response: either a message or an error, never both.
pub trait Envelope {
    fn error(&self) -> Option<&str>;

    fn is_error(&self) -> bool {
        self.error().is_some()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct StatusResponse {
    pub timestamp: String,
    #[schema(value_type = i64)]
    pub status: StatusCode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl StatusResponse {
    pub fn running(message: impl Into<String>) -> Self {
        Self {
            timestamp: timestamp_now(),
            status: StatusCode::Running,
            message: Some(message.into()),
            ..Default::default()
        }
    }

    pub fn unavailable(error: impl Into<String>) -> Self {
        Self {
            timestamp: timestamp_now(),
            status: StatusCode::Unavailable,
            error: Some(error.into()),
            ..Default::default()
        }
    }
}

impl Envelope for StatusResponse {
    fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct QuestionResponse {
    #[serde(rename = "questionid")]
    pub question_id: String,
    pub question: String,
    pub category: String,
    pub answer: String,
    pub timestamp: String,
    pub action: String,
    #[serde(
        rename = "recordsaffected",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub records_affected: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl QuestionResponse {
    pub fn new(action: impl Into<String>) -> Self {
        Self {
            timestamp: timestamp_now(),
            action: action.into(),
            ..Default::default()
        }
    }

    pub fn succeed(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self.error = None;
        self
    }

    pub fn fail(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self.message = None;
        self
    }

    pub fn warn(mut self, warning: impl Into<String>) -> Self {
        self.warning = Some(warning.into());
        self
    }
}

impl Envelope for QuestionResponse {
    fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct AnswerResponse {
    pub question: String,
    pub category: String,
    pub answer: String,
    pub response: String,
    pub timestamp: String,
    /// Omitted when no record matched the identifier
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub correct: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl AnswerResponse {
    pub fn new(response: impl Into<String>) -> Self {
        Self {
            response: response.into(),
            timestamp: timestamp_now(),
            ..Default::default()
        }
    }

    pub fn succeed(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self.error = None;
        self
    }

    pub fn fail(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self.message = None;
        self
    }
}

impl Envelope for AnswerResponse {
    fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }
}
