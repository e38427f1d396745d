#![forbid(unsafe_code)]

//! Proctor Runtime
//!
//! The quiz proctoring engine: violation tracking, countdown, submission,
//! and question navigation, driven as an update/command model.
//!
//! # Key Components
//!
//! - [`Proctor`] - The model; owns the session and routes every message
//! - [`Msg`] / [`Cmd`] - Inputs and side-effect descriptions
//! - [`ViolationTracker`] - Warning counter with debounce and limit handling
//! - [`ExamTimer`] - Countdown reconciled against the backend status
//! - [`SubmissionCoordinator`] - Save-then-finalize, at most once
//! - [`QuestionNavigator`] - Question order, drafts, and save-before-move
//! - [`WarningStore`] - Persisted warning count over a [`SessionStore`]
//! - [`QuizBackend`] - The backend contract hosts implement
//!
//! # How it fits in the system
//! `proctor-core` supplies events, policies, and the session context.
//! This crate decides what they mean. Hosts (`proctor-web`) execute the
//! returned commands, and backends (`proctor-client`) answer requests.

pub mod backend;
pub mod lockdown;
pub mod navigation;
pub mod persistence;
pub mod proctor;
pub mod program;
pub mod submission;
pub mod timer;
pub mod violation;

pub use backend::{
    AfterSave, AnswerSubmission, BackendError, FinalizeReceipt, QuestionDetail, QuestionId,
    QuestionKind, QuestionList, QuestionPayload, QuestionRef, QuizBackend, Request, Response,
    StatusSnapshot,
};
pub use lockdown::{LockdownRules, Verdict};
pub use navigation::{AnswerDraft, NavStatus, QuestionNavigator};
#[cfg(feature = "file-store")]
pub use persistence::FileStore;
pub use persistence::{MemoryStore, SessionStore, StorageError, StorageResult, WarningStore};
pub use proctor::{Proctor, ProctorView, WarningBadge};
pub use program::{Cmd, FocusProbe, IntervalId, Msg, UserAction};
pub use submission::{FinalizeOutcome, SubmissionCoordinator, SubmissionPhase, Trigger};
pub use timer::{ExamTimer, TimerEvent, TimerPhase};
pub use violation::{ViolationTracker, WarningOutcome};
