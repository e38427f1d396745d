#![forbid(unsafe_code)]

//! Per-attempt session context.
//!
//! One [`SessionContext`] exists per quiz attempt. It is created when the
//! page loads, optionally seeded with a restored warning count, and dropped
//! when the page navigates away.
//!
//! # Invariants
//!
//! 1. `warning_count` never decreases.
//! 2. `is_submitting` goes false → true once and is never reset.
//! 3. After `is_submitting`, no further warnings are counted.

use core::fmt;
use core::time::Duration;

/// Opaque attempt identifier assigned by the backend.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct AttemptId(String);

impl AttemptId {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AttemptId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Mutable state of one quiz attempt.
#[derive(Debug, Clone)]
pub struct SessionContext {
    attempt: AttemptId,
    warning_count: u32,
    is_submitting: bool,
    remaining_seconds: u64,
    last_warning_at: Option<Duration>,
    completed: bool,
    document_hidden: bool,
    window_focused: bool,
    fullscreen_active: bool,
}

impl SessionContext {
    /// Fresh session: no warnings, nothing submitted, page visible and focused.
    #[must_use]
    pub fn new(attempt: AttemptId) -> Self {
        Self {
            attempt,
            warning_count: 0,
            is_submitting: false,
            remaining_seconds: 0,
            last_warning_at: None,
            completed: false,
            document_hidden: false,
            window_focused: true,
            fullscreen_active: false,
        }
    }

    #[must_use]
    pub fn attempt(&self) -> &AttemptId {
        &self.attempt
    }

    // --- Warnings ---

    #[must_use]
    pub const fn warning_count(&self) -> u32 {
        self.warning_count
    }

    #[must_use]
    pub const fn last_warning_at(&self) -> Option<Duration> {
        self.last_warning_at
    }

    /// Count one warning observed at `now`. Returns the new count.
    pub fn record_warning_at(&mut self, now: Duration) -> u32 {
        self.last_warning_at = Some(now);
        self.warning_count = self.warning_count.saturating_add(1);
        self.warning_count
    }

    /// Apply a count restored from storage. Never lowers the current count.
    pub fn restore_warning_count(&mut self, count: u32) {
        self.warning_count = self.warning_count.max(count);
    }

    // --- Submission gate ---

    #[must_use]
    pub const fn is_submitting(&self) -> bool {
        self.is_submitting
    }

    /// Check-and-set the submission gate.
    ///
    /// Returns `true` if this call closed the gate, `false` if it was
    /// already closed.
    pub fn begin_submitting(&mut self) -> bool {
        if self.is_submitting {
            return false;
        }
        self.is_submitting = true;
        true
    }

    // --- Countdown ---

    #[must_use]
    pub const fn remaining_seconds(&self) -> u64 {
        self.remaining_seconds
    }

    pub fn set_remaining_seconds(&mut self, seconds: u64) {
        self.remaining_seconds = seconds;
    }

    /// Decrement the countdown by one second if it is above zero.
    /// Returns `true` if this decrement reached zero.
    pub fn decrement_remaining(&mut self) -> bool {
        if self.remaining_seconds == 0 {
            return false;
        }
        self.remaining_seconds -= 1;
        self.remaining_seconds == 0
    }

    /// Whether the backend reported the attempt as closed.
    #[must_use]
    pub const fn is_completed(&self) -> bool {
        self.completed
    }

    pub fn mark_completed(&mut self) {
        self.completed = true;
    }

    // --- Tracked page environment ---

    #[must_use]
    pub const fn document_hidden(&self) -> bool {
        self.document_hidden
    }

    pub fn set_document_hidden(&mut self, hidden: bool) {
        self.document_hidden = hidden;
    }

    #[must_use]
    pub const fn window_focused(&self) -> bool {
        self.window_focused
    }

    pub fn set_window_focused(&mut self, focused: bool) {
        self.window_focused = focused;
    }

    #[must_use]
    pub const fn fullscreen_active(&self) -> bool {
        self.fullscreen_active
    }

    pub fn set_fullscreen_active(&mut self, active: bool) {
        self.fullscreen_active = active;
    }
}
