#![forbid(unsafe_code)]

//! Submission coordinator: the single path to finalize.
//!
//! Three triggers converge here. Admission is a synchronous check-and-set on
//! the session's submission gate, so whichever trigger arrives first wins and
//! the others are refused before any request exists.
//!
//! # Sequence
//!
//! 1. Save the current answer (if any) and wait for its response, success or
//!    failure.
//! 2. Send finalize. Exactly one finalize request per attempt; never retried.
//! 3. On success follow the returned redirect, if any. Timer expiry shows a
//!    notice first and redirects after [`EXPIRY_REDIRECT_DELAY`].
//!
//! | Failure            | Effect                                   |
//! |--------------------|------------------------------------------|
//! | save fails         | logged, finalize proceeds                |
//! | finalize fails     | logged, student stays on the page        |
//! | attempt completed  | admission refused, nothing sent          |

use core::time::Duration;

use proctor_core::notice::Notice;
use proctor_core::session::SessionContext;

use crate::backend::{
    AfterSave, AnswerSubmission, BackendError, FinalizeReceipt, QuestionId, Request,
};

/// Delay between the time-expired notice and the redirect.
pub const EXPIRY_REDIRECT_DELAY: Duration = Duration::from_millis(2000);

/// What started the submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Trigger {
    /// Finalize button, after confirmation.
    User,
    /// Warning limit reached with auto-submit.
    ViolationLimit,
    /// Countdown reached zero.
    TimerExpired,
}

impl Trigger {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::ViolationLimit => "violation_limit",
            Self::TimerExpired => "timer_expired",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SubmissionPhase {
    #[default]
    Idle,
    Saving(Trigger),
    Finalizing(Trigger),
    Finalized(Trigger),
    Failed(Trigger),
}

/// Result of a finalize response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FinalizeOutcome {
    /// The backend accepted the submission.
    Completed {
        trigger: Trigger,
        redirect: Option<String>,
        delay: Duration,
        notice: Option<Notice>,
    },
    /// Finalize failed; nothing further happens.
    Failed(BackendError),
    /// Response did not match the pending finalize.
    Stale,
}

#[derive(Debug, Clone, Default)]
pub struct SubmissionCoordinator {
    phase: SubmissionPhase,
    finalize_requests: u32,
}

impl SubmissionCoordinator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub const fn phase(&self) -> SubmissionPhase {
        self.phase
    }

    /// Finalize requests issued so far. Never exceeds one.
    #[must_use]
    pub const fn finalize_requests(&self) -> u32 {
        self.finalize_requests
    }

    /// Try to start a submission.
    ///
    /// `pending_save` is the current question's answer. Returns the first
    /// request to issue, or `None` if the submission was refused.
    pub fn begin(
        &mut self,
        session: &mut SessionContext,
        trigger: Trigger,
        pending_save: Option<(QuestionId, AnswerSubmission)>,
    ) -> Option<Request> {
        if session.is_completed() {
            tracing::debug!(trigger = trigger.as_str(), "attempt already completed");
            return None;
        }
        if !session.begin_submitting() {
            tracing::debug!(trigger = trigger.as_str(), "submission already in progress");
            return None;
        }
        tracing::info!(
            attempt = %session.attempt(),
            trigger = trigger.as_str(),
            "submitting attempt"
        );

        match pending_save {
            Some((id, submission)) => {
                self.phase = SubmissionPhase::Saving(trigger);
                Some(Request::SaveAnswer {
                    id,
                    submission,
                    then: AfterSave::Finalize(trigger),
                })
            }
            None => Some(self.finalize(trigger)),
        }
    }

    /// The pre-finalize save resolved.
    pub fn on_saved(
        &mut self,
        trigger: Trigger,
        result: &Result<(), BackendError>,
    ) -> Option<Request> {
        if self.phase != SubmissionPhase::Saving(trigger) {
            return None;
        }
        if let Err(err) = result {
            tracing::warn!(error = %err, "saving answer before finalize failed");
        }
        Some(self.finalize(trigger))
    }

    /// The finalize request resolved.
    pub fn on_finalized(
        &mut self,
        trigger: Trigger,
        result: Result<FinalizeReceipt, BackendError>,
    ) -> FinalizeOutcome {
        if self.phase != SubmissionPhase::Finalizing(trigger) {
            return FinalizeOutcome::Stale;
        }
        match result {
            Ok(receipt) => {
                self.phase = SubmissionPhase::Finalized(trigger);
                let redirect = receipt.redirect().map(str::to_owned);
                tracing::info!(
                    trigger = trigger.as_str(),
                    redirect = redirect.as_deref().unwrap_or(""),
                    "attempt finalized"
                );
                let (delay, notice) = match trigger {
                    Trigger::TimerExpired if redirect.is_some() => {
                        (EXPIRY_REDIRECT_DELAY, Some(Notice::TimeExpired))
                    }
                    _ => (Duration::ZERO, None),
                };
                FinalizeOutcome::Completed {
                    trigger,
                    redirect,
                    delay,
                    notice,
                }
            }
            Err(err) => {
                self.phase = SubmissionPhase::Failed(trigger);
                tracing::error!(trigger = trigger.as_str(), error = %err, "finalize failed");
                FinalizeOutcome::Failed(err)
            }
        }
    }

    fn finalize(&mut self, trigger: Trigger) -> Request {
        debug_assert_eq!(self.finalize_requests, 0);
        self.phase = SubmissionPhase::Finalizing(trigger);
        self.finalize_requests += 1;
        Request::Finalize { trigger }
    }
}
