#![forbid(unsafe_code)]

//! Violation tracker: warning counter, debounce, and the limit decision.
//!
//! # Algorithm
//!
//! 1. Submission in flight, or attempt already closed by the backend →
//!    ignored.
//! 2. No warning source enabled → ignored.
//! 3. Less than [`WARNING_DEBOUNCE`] since the last counted warning →
//!    ignored. One user action often fires several browser events (a tab
//!    switch raises both `visibilitychange` and `blur`).
//! 4. Otherwise count it, persist the count, and either surface a warning
//!    notice or report that the limit was reached.
//!
//! The debounce compares against the last counted warning only; it is not a
//! sliding window.
//!
//! The tracker never fails. Storage problems are logged by [`WarningStore`].

use core::time::Duration;

use proctor_core::notice::Notice;
use proctor_core::policy::ViolationPolicy;
use proctor_core::session::SessionContext;

use crate::persistence::WarningStore;

/// Minimum spacing between two counted warnings.
pub const WARNING_DEBOUNCE: Duration = Duration::from_millis(2000);

/// Why a warning was not counted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    Submitting,
    /// The backend reported the attempt as completed.
    Completed,
    Disabled,
    Debounced,
}

/// Result of [`ViolationTracker::record_warning`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WarningOutcome {
    /// Nothing changed.
    Ignored(IgnoreReason),
    /// Counted, still under the limit.
    Counted { count: u32, notice: Notice },
    /// Counted and the limit is now reached.
    LimitReached { count: u32, auto_submit: bool },
}

impl WarningOutcome {
    /// Whether the warning incremented the counter.
    #[must_use]
    pub const fn counted(&self) -> bool {
        !matches!(self, Self::Ignored(_))
    }
}

/// Owns the violation policy and the persisted count for one attempt.
#[derive(Debug)]
pub struct ViolationTracker {
    policy: ViolationPolicy,
    store: WarningStore,
}

impl ViolationTracker {
    #[must_use]
    pub fn new(policy: ViolationPolicy, store: WarningStore) -> Self {
        Self { policy, store }
    }

    #[must_use]
    pub const fn policy(&self) -> &ViolationPolicy {
        &self.policy
    }

    /// Apply a count persisted by an earlier page load.
    ///
    /// Only restores when tab-switch monitoring is on. Returns the restored
    /// value, if any.
    pub fn restore(&self, session: &mut SessionContext) -> Option<u32> {
        if !self.policy.monitor_tab_switching {
            return None;
        }
        let count = self.store.restore()?;
        session.restore_warning_count(count);
        Some(count)
    }

    /// Count a warning for `reason`, observed at `now`.
    pub fn record_warning(
        &mut self,
        session: &mut SessionContext,
        reason: &str,
        now: Duration,
    ) -> WarningOutcome {
        if session.is_submitting() {
            return WarningOutcome::Ignored(IgnoreReason::Submitting);
        }
        if session.is_completed() {
            return WarningOutcome::Ignored(IgnoreReason::Completed);
        }
        if !self.policy.warnings_enabled() {
            return WarningOutcome::Ignored(IgnoreReason::Disabled);
        }
        if let Some(last) = session.last_warning_at()
            && now.saturating_sub(last) < WARNING_DEBOUNCE
        {
            tracing::debug!(reason, "ignored duplicate warning (debounce)");
            return WarningOutcome::Ignored(IgnoreReason::Debounced);
        }

        let count = session.record_warning_at(now);
        self.store.persist(count);
        tracing::info!(
            attempt = %session.attempt(),
            count,
            max = self.policy.max_warnings,
            reason,
            "recorded warning"
        );

        if self.policy.limit_reached(count) {
            tracing::warn!(
                attempt = %session.attempt(),
                count,
                auto_submit = self.policy.auto_submit_on_limit,
                "warning limit reached"
            );
            WarningOutcome::LimitReached {
                count,
                auto_submit: self.policy.auto_submit_on_limit,
            }
        } else {
            WarningOutcome::Counted {
                count,
                notice: Notice::Warning {
                    reason: reason.to_owned(),
                    remaining: self.policy.allowance(count),
                },
            }
        }
    }

    /// Whether a restored count already meets the limit.
    #[must_use]
    pub fn limit_reached(&self, session: &SessionContext) -> bool {
        self.policy.limit_reached(session.warning_count())
    }

    /// Notice for the limit, according to the policy.
    #[must_use]
    pub const fn limit_notice(&self) -> Notice {
        Notice::LimitReached {
            auto_submit: self.policy.auto_submit_on_limit,
        }
    }

    /// Drop the persisted count once the attempt was auto-submitted.
    pub fn clear_persisted(&self) {
        self.store.clear();
    }
}
