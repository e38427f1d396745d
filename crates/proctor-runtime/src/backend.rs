#![forbid(unsafe_code)]

//! Backend contract: the four quiz endpoints plus finalize.
//!
//! The proctor never performs I/O itself. It emits [`Request`] values; the
//! host runs them against a [`QuizBackend`] whenever it gets to them and
//! feeds the resulting [`Response`] back as a message. Continuations such as
//! "load question 3 after this save" travel inside the request and come back
//! unchanged in the response, which is what orders dependent calls.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::submission::Trigger;

/// Backend question identifier.
pub type QuestionId = u64;

/// Failure of a single backend call. Terminal for that call only.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BackendError {
    /// Connection, DNS, TLS, or timeout failure.
    #[error("transport error: {0}")]
    Transport(String),

    /// Backend answered with a non-success status.
    #[error("backend returned status {0}")]
    Status(u16),

    /// Response body did not match the expected shape.
    #[error("malformed response: {0}")]
    Decode(String),
}

/// Question type as reported by the backend.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionKind {
    Single,
    Multiple,
    TrueFalse,
    ShortAnswer,
    #[default]
    #[serde(other)]
    Other,
}

impl QuestionKind {
    /// Whether answers are option selections.
    #[must_use]
    pub const fn is_choice(self) -> bool {
        matches!(self, Self::Single | Self::Multiple | Self::TrueFalse)
    }
}

/// Entry in the ordered question list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionRef {
    pub id: QuestionId,
    #[serde(rename = "type", default)]
    pub kind: QuestionKind,
}

/// `GET questions` body.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionList {
    #[serde(default)]
    pub questions: Vec<QuestionRef>,
}

/// One selectable option.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerOption {
    pub id: u64,
    #[serde(default)]
    pub text: String,
}

/// Full question content, opaque to the proctor apart from its options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionDetail {
    pub id: QuestionId,
    #[serde(rename = "type", default)]
    pub kind: QuestionKind,
    #[serde(default)]
    pub html: String,
    #[serde(default)]
    pub marks: f64,
    #[serde(default)]
    pub options: Vec<AnswerOption>,
}

/// `GET question(id)` body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionPayload {
    pub question: QuestionDetail,
    #[serde(default)]
    pub selected_option_ids: Vec<u64>,
    #[serde(default)]
    pub text_answer: Option<String>,
}

/// `GET status` body: authoritative countdown snapshot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusSnapshot {
    #[serde(default)]
    pub remaining_seconds: i64,
    #[serde(default)]
    pub completed: bool,
}

impl StatusSnapshot {
    /// Remaining seconds, negative values clamped to zero.
    #[must_use]
    pub fn remaining(&self) -> u64 {
        u64::try_from(self.remaining_seconds).unwrap_or(0)
    }
}

/// `POST finalize` body.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinalizeReceipt {
    #[serde(default)]
    pub redirect_url: Option<String>,
}

impl FinalizeReceipt {
    /// Redirect target, if the backend supplied a non-empty one.
    #[must_use]
    pub fn redirect(&self) -> Option<&str> {
        self.redirect_url.as_deref().filter(|url| !url.is_empty())
    }
}

/// Answer body for `POST answer(id)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnswerSubmission {
    /// Selected option ids, sent as repeated `option_ids[]` fields.
    Options(Vec<u64>),
    /// Free text, sent as `text_answer`.
    Text(String),
    /// Question type without an answer field; an empty form.
    Empty,
}

impl AnswerSubmission {
    /// Form-encoded field pairs in wire order.
    #[must_use]
    pub fn form_fields(&self) -> Vec<(&'static str, String)> {
        match self {
            Self::Options(ids) => ids.iter().map(|id| ("option_ids[]", id.to_string())).collect(),
            Self::Text(text) => vec![("text_answer", text.clone())],
            Self::Empty => Vec::new(),
        }
    }
}

/// Synchronous quiz backend.
///
/// Every call is independent and idempotent from the proctor's point of
/// view; failures are reported, never retried.
pub trait QuizBackend {
    fn questions(&mut self) -> Result<QuestionList, BackendError>;

    fn question(&mut self, id: QuestionId) -> Result<QuestionPayload, BackendError>;

    fn save_answer(
        &mut self,
        id: QuestionId,
        submission: &AnswerSubmission,
    ) -> Result<(), BackendError>;

    fn status(&mut self) -> Result<StatusSnapshot, BackendError>;

    fn finalize(&mut self) -> Result<FinalizeReceipt, BackendError>;
}

/// What to do once a save completes, successfully or not.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AfterSave {
    /// Load the question at this index.
    Load(usize),
    /// Only refresh the navigation state.
    RefreshNav,
    /// Proceed to finalize for this trigger.
    Finalize(Trigger),
}

/// A backend call requested by the proctor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    Questions,
    Question {
        index: usize,
        id: QuestionId,
    },
    SaveAnswer {
        id: QuestionId,
        submission: AnswerSubmission,
        then: AfterSave,
    },
    Status,
    Finalize {
        trigger: Trigger,
    },
}

impl Request {
    /// Short stable name, used as a tracing field.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Questions => "questions",
            Self::Question { .. } => "question",
            Self::SaveAnswer { .. } => "save_answer",
            Self::Status => "status",
            Self::Finalize { .. } => "finalize",
        }
    }

    /// Run the request and package the result with its continuation.
    pub fn execute<B: QuizBackend + ?Sized>(self, backend: &mut B) -> Response {
        match self {
            Self::Questions => Response::Questions(backend.questions()),
            Self::Question { index, id } => Response::Question {
                index,
                id,
                result: backend.question(id),
            },
            Self::SaveAnswer {
                id,
                submission,
                then,
            } => Response::AnswerSaved {
                id,
                then,
                result: backend.save_answer(id, &submission),
            },
            Self::Status => Response::Status(backend.status()),
            Self::Finalize { trigger } => Response::Finalized {
                trigger,
                result: backend.finalize(),
            },
        }
    }
}

/// Result of a [`Request`], carrying the request's continuation.
#[derive(Debug, Clone, PartialEq)]
pub enum Response {
    Questions(Result<QuestionList, BackendError>),
    Question {
        index: usize,
        id: QuestionId,
        result: Result<QuestionPayload, BackendError>,
    },
    AnswerSaved {
        id: QuestionId,
        then: AfterSave,
        result: Result<(), BackendError>,
    },
    Status(Result<StatusSnapshot, BackendError>),
    Finalized {
        trigger: Trigger,
        result: Result<FinalizeReceipt, BackendError>,
    },
}
