#![forbid(unsafe_code)]

//! Countdown reconciled against the backend status snapshot.
//!
//! The local countdown ticks once per second; every status poll overwrites
//! it with the authoritative value. Whichever path reaches zero first fires
//! expiration, and only once.
//!
//! ```text
//! Running ──(0 via tick or status)──▶ Expiring ──(finalize resolved)──▶ Expired
//!    │
//!    └──(status.completed)──▶ Closed
//! ```

use proctor_core::session::SessionContext;

use crate::backend::StatusSnapshot;

/// Remaining time at or below which the display uses the warning style.
pub const WARNING_THRESHOLD_SECS: u64 = 60;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TimerPhase {
    #[default]
    Running,
    /// Reached zero; finalize has been handed off.
    Expiring,
    /// Expiration finalize resolved.
    Expired,
    /// The backend reports the attempt as completed.
    Closed,
}

/// What a tick or reconcile changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerEvent {
    /// Nothing to do.
    Idle,
    /// Remaining time changed; refresh the display.
    Updated,
    /// The countdown just reached zero.
    Expire,
    /// The attempt was closed by the backend.
    Closed,
}

#[derive(Debug, Clone, Default)]
pub struct ExamTimer {
    phase: TimerPhase,
}

impl ExamTimer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub const fn phase(&self) -> TimerPhase {
        self.phase
    }

    /// One local countdown second.
    pub fn tick(&mut self, session: &mut SessionContext) -> TimerEvent {
        if self.phase != TimerPhase::Running {
            return TimerEvent::Idle;
        }
        if session.remaining_seconds() == 0 {
            return TimerEvent::Idle;
        }
        if session.decrement_remaining() {
            self.expire()
        } else {
            TimerEvent::Updated
        }
    }

    /// Apply an authoritative status snapshot, overriding local drift.
    pub fn reconcile(&mut self, session: &mut SessionContext, status: &StatusSnapshot) -> TimerEvent {
        session.set_remaining_seconds(status.remaining());

        if status.completed {
            session.mark_completed();
            if self.phase == TimerPhase::Closed {
                return TimerEvent::Updated;
            }
            tracing::info!(attempt = %session.attempt(), "attempt closed by backend");
            self.phase = TimerPhase::Closed;
            return TimerEvent::Closed;
        }

        if self.phase == TimerPhase::Running && session.remaining_seconds() == 0 {
            return self.expire();
        }
        TimerEvent::Updated
    }

    /// Expiration finalize resolved, successfully or not.
    pub fn mark_expired(&mut self) {
        if self.phase == TimerPhase::Expiring {
            self.phase = TimerPhase::Expired;
        }
    }

    fn expire(&mut self) -> TimerEvent {
        tracing::info!("countdown reached zero");
        self.phase = TimerPhase::Expiring;
        TimerEvent::Expire
    }
}

/// Render seconds as `m:ss`.
#[must_use]
pub fn format_clock(seconds: u64) -> String {
    format!("{}:{:02}", seconds / 60, seconds % 60)
}

/// Whether the countdown display should use the warning style.
#[must_use]
pub const fn is_warning(seconds: u64) -> bool {
    seconds <= WARNING_THRESHOLD_SECS
}
