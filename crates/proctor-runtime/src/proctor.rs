#![forbid(unsafe_code)]

//! The proctor model.
//!
//! [`Proctor`] owns the session context and every component that reads or
//! writes it. Each [`Msg`] is routed to a named handler; handlers mutate
//! state synchronously and describe I/O as a [`Cmd`]. Nothing here blocks or
//! spawns.
//!
//! # Startup
//!
//! Construction restores the persisted warning count. [`Msg::Start`] then
//! polls status once, starts the countdown and status intervals, loads the
//! question list, enters fullscreen when enforced, and runs limit handling if
//! the restored count is already at the limit.

use std::sync::Arc;

use proctor_core::clock::Clock;
use proctor_core::config::ProctorConfig;
use proctor_core::event::BrowserEvent;
use proctor_core::notice::Notice;
use proctor_core::session::SessionContext;

use crate::backend::{
    AfterSave, BackendError, FinalizeReceipt, QuestionDetail, Request, Response,
};
use crate::lockdown::{FOCUS_CONFIRM_DELAY, LockdownRules};
use crate::navigation::{NavStatus, QuestionNavigator};
use crate::persistence::{SessionStore, WarningStore};
use crate::program::{Cmd, FocusProbe, IntervalId, Msg, UserAction};
use crate::submission::{FinalizeOutcome, SubmissionCoordinator, Trigger};
use crate::timer::{ExamTimer, TimerEvent, format_clock, is_warning};
use crate::violation::{ViolationTracker, WarningOutcome};

/// Prompt shown before a student-initiated submission.
pub const SUBMIT_PROMPT: &str =
    "Are you sure you want to submit your quiz? You cannot change answers after submission.";

/// Warning counter badge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WarningBadge {
    pub count: u32,
    /// One warning from the limit, or past it.
    pub critical: bool,
}

/// Snapshot of everything the host renders.
#[derive(Debug, Clone, PartialEq)]
pub struct ProctorView {
    pub timer_text: String,
    pub timer_warning: bool,
    /// Hidden when monitoring is off or no warning was counted yet.
    pub warning_badge: Option<WarningBadge>,
    pub nav: Vec<NavStatus>,
    pub current_index: usize,
    pub question: Option<QuestionDetail>,
    pub prev_disabled: bool,
    pub next_disabled: bool,
    pub clear_disabled: bool,
    pub finalize_visible: bool,
    /// Navigation, editing, and finalize are disabled.
    pub controls_locked: bool,
}

pub struct Proctor<C: Clock> {
    config: ProctorConfig,
    clock: C,
    session: SessionContext,
    tracker: ViolationTracker,
    rules: LockdownRules,
    timer: ExamTimer,
    coordinator: SubmissionCoordinator,
    navigator: QuestionNavigator,
    started: bool,
}

impl<C: Clock> Proctor<C> {
    /// Create the proctor for one attempt and restore its warning count.
    pub fn new(config: ProctorConfig, clock: C, store: Arc<dyn SessionStore>) -> Self {
        let mut session = SessionContext::new(config.attempt.clone());
        let tracker = ViolationTracker::new(config.violation, WarningStore::new(store, &config.attempt));
        if let Some(count) = tracker.restore(&mut session) {
            tracing::debug!(attempt = %config.attempt, count, "restored warning count");
        }
        let rules = LockdownRules::new(config.violation, config.lockdown);
        Self {
            config,
            clock,
            session,
            tracker,
            rules,
            timer: ExamTimer::new(),
            coordinator: SubmissionCoordinator::new(),
            navigator: QuestionNavigator::new(),
            started: false,
        }
    }

    #[must_use]
    pub fn config(&self) -> &ProctorConfig {
        &self.config
    }

    #[must_use]
    pub fn session(&self) -> &SessionContext {
        &self.session
    }

    #[must_use]
    pub fn timer(&self) -> &ExamTimer {
        &self.timer
    }

    #[must_use]
    pub fn coordinator(&self) -> &SubmissionCoordinator {
        &self.coordinator
    }

    #[must_use]
    pub fn navigator(&self) -> &QuestionNavigator {
        &self.navigator
    }

    #[must_use]
    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn clock_mut(&mut self) -> &mut C {
        &mut self.clock
    }

    #[must_use]
    pub const fn is_started(&self) -> bool {
        self.started
    }

    /// Whether the quiz controls accept input.
    #[must_use]
    pub fn controls_locked(&self) -> bool {
        self.session.is_completed() || self.session.is_submitting()
    }

    pub fn update(&mut self, msg: Msg) -> Cmd {
        match msg {
            Msg::Start => self.handle_start(),
            Msg::Browser(event) => self.handle_browser(&event),
            Msg::User(action) => self.handle_user(action),
            Msg::Interval(id) => self.handle_interval(id),
            Msg::FocusCheck(probe) => self.handle_focus_check(probe),
            Msg::Response(response) => self.handle_response(response),
        }
    }

    #[must_use]
    pub fn view(&self) -> ProctorView {
        let remaining = self.session.remaining_seconds();
        let count = self.session.warning_count();
        let policy = self.tracker.policy();
        let warning_badge = (policy.monitor_tab_switching && count > 0).then(|| WarningBadge {
            count,
            critical: policy.is_critical(count),
        });
        let locked = self.controls_locked();
        let empty = self.navigator.is_empty();

        ProctorView {
            timer_text: format_clock(remaining),
            timer_warning: is_warning(remaining),
            warning_badge,
            nav: self.navigator.statuses(),
            current_index: self.navigator.current_index(),
            question: self.navigator.detail().cloned(),
            prev_disabled: locked || self.navigator.current_index() == 0,
            next_disabled: locked || empty,
            clear_disabled: locked || empty,
            finalize_visible: self.navigator.is_last(),
            controls_locked: locked,
        }
    }

    // ─── Handlers ───────────────────────────────────────────────────────

    pub fn handle_start(&mut self) -> Cmd {
        if self.started {
            return Cmd::none();
        }
        self.started = true;
        tracing::info!(
            attempt = %self.session.attempt(),
            warnings = self.session.warning_count(),
            "quiz started"
        );

        let mut cmds = vec![
            Cmd::request(Request::Status),
            Cmd::Every(IntervalId::Countdown),
            Cmd::Every(IntervalId::StatusPoll),
            Cmd::request(Request::Questions),
        ];
        if self.config.violation.enforce_fullscreen {
            cmds.push(Cmd::RequestFullscreen);
            cmds.push(Cmd::Every(IntervalId::FullscreenGuard));
        }
        if self.tracker.limit_reached(&self.session) {
            tracing::warn!(
                count = self.session.warning_count(),
                "restored warning count already at limit"
            );
            cmds.push(self.handle_violation_limit());
        }
        Cmd::batch(cmds)
    }

    pub fn handle_browser(&mut self, event: &BrowserEvent) -> Cmd {
        if !self.started {
            return Cmd::none();
        }
        tracing::trace!(event = event.kind(), "browser event");
        let verdict = self.rules.screen(&mut self.session, event);

        let mut cmds = Vec::new();
        if verdict.prevent_default {
            cmds.push(Cmd::PreventDefault);
        }
        if verdict.hold_unload {
            cmds.push(Cmd::HoldUnload);
        }
        if let Some(message) = verdict.info {
            cmds.push(Cmd::notify(Notice::Info(message.to_owned())));
        }
        if let Some(reason) = verdict.warning {
            cmds.push(self.record_warning(reason));
        }
        if verdict.request_fullscreen {
            cmds.push(Cmd::RequestFullscreen);
        }
        if let Some(probe) = verdict.probe {
            cmds.push(Cmd::After(FOCUS_CONFIRM_DELAY, Msg::FocusCheck(probe)));
        }
        Cmd::batch(cmds)
    }

    pub fn handle_focus_check(&mut self, probe: FocusProbe) -> Cmd {
        match self.rules.confirm_away(&self.session, probe) {
            Some(reason) => self.record_warning(reason),
            None => Cmd::none(),
        }
    }

    pub fn handle_interval(&mut self, id: IntervalId) -> Cmd {
        match id {
            IntervalId::Countdown => match self.timer.tick(&mut self.session) {
                TimerEvent::Expire => self.handle_expiration(),
                TimerEvent::Idle | TimerEvent::Updated | TimerEvent::Closed => Cmd::none(),
            },
            IntervalId::StatusPoll => Cmd::request(Request::Status),
            IntervalId::FullscreenGuard => {
                if self.rules.needs_fullscreen(&self.session) {
                    Cmd::RequestFullscreen
                } else {
                    Cmd::none()
                }
            }
        }
    }

    pub fn handle_user(&mut self, action: UserAction) -> Cmd {
        if self.controls_locked() && !matches!(action, UserAction::AcknowledgeNotice) {
            tracing::debug!(?action, "controls locked");
            return Cmd::none();
        }
        match action {
            UserAction::Next => Cmd::maybe_request(self.navigator.next()),
            UserAction::Prev => Cmd::maybe_request(self.navigator.prev()),
            UserAction::GoTo(index) => Cmd::maybe_request(self.navigator.go_to(index)),
            UserAction::Clear => Cmd::maybe_request(self.navigator.clear()),
            UserAction::SelectOption { option_id, checked } => {
                self.navigator.select_option(option_id, checked);
                Cmd::none()
            }
            UserAction::EditText(text) => {
                self.navigator.edit_text(text);
                Cmd::none()
            }
            UserAction::RequestSubmit => Cmd::Confirm {
                prompt: SUBMIT_PROMPT.to_owned(),
                on_confirm: Box::new(Msg::User(UserAction::SubmitConfirmed)),
            },
            UserAction::SubmitConfirmed => self.begin_submission(Trigger::User),
            UserAction::AcknowledgeNotice => {
                let mut cmds = vec![Cmd::HideNotice];
                if self.config.violation.enforce_fullscreen {
                    cmds.push(Cmd::RequestFullscreen);
                }
                Cmd::batch(cmds)
            }
        }
    }

    pub fn handle_response(&mut self, response: Response) -> Cmd {
        match response {
            Response::Questions(result) => Cmd::maybe_request(self.navigator.on_questions(result)),
            Response::Question { index, id, result } => {
                self.navigator.on_question(index, id, result);
                Cmd::none()
            }
            Response::AnswerSaved { id, then, result } => match then {
                AfterSave::Finalize(trigger) => {
                    Cmd::maybe_request(self.coordinator.on_saved(trigger, &result))
                }
                AfterSave::Load(index) => {
                    if let Err(err) = result {
                        tracing::warn!(question = id, error = %err, "saving answer failed");
                    }
                    Cmd::maybe_request(self.navigator.load(index))
                }
                AfterSave::RefreshNav => {
                    if let Err(err) = result {
                        tracing::warn!(question = id, error = %err, "saving answer failed");
                    }
                    Cmd::none()
                }
            },
            Response::Status(Ok(status)) => match self.timer.reconcile(&mut self.session, &status) {
                TimerEvent::Expire => self.handle_expiration(),
                TimerEvent::Idle | TimerEvent::Updated | TimerEvent::Closed => Cmd::none(),
            },
            Response::Status(Err(err)) => {
                tracing::warn!(error = %err, "status poll failed");
                Cmd::none()
            }
            Response::Finalized { trigger, result } => self.handle_finalized(trigger, result),
        }
    }

    // ─── Internals ──────────────────────────────────────────────────────

    fn record_warning(&mut self, reason: &str) -> Cmd {
        let now = self.clock.now_mono();
        match self.tracker.record_warning(&mut self.session, reason, now) {
            WarningOutcome::Ignored(_) => Cmd::none(),
            WarningOutcome::Counted { notice, .. } => Cmd::notify(notice),
            WarningOutcome::LimitReached { .. } => self.handle_violation_limit(),
        }
    }

    fn handle_violation_limit(&mut self) -> Cmd {
        let notice = Cmd::notify(self.tracker.limit_notice());
        if self.tracker.policy().auto_submit_on_limit {
            let submit = self.begin_submission(Trigger::ViolationLimit);
            Cmd::batch(vec![notice, submit])
        } else {
            notice
        }
    }

    fn handle_expiration(&mut self) -> Cmd {
        if self.session.is_submitting() {
            tracing::debug!("countdown expired during submission");
            return Cmd::none();
        }
        self.begin_submission(Trigger::TimerExpired)
    }

    fn begin_submission(&mut self, trigger: Trigger) -> Cmd {
        let pending = self.navigator.current_submission();
        Cmd::maybe_request(self.coordinator.begin(&mut self.session, trigger, pending))
    }

    fn handle_finalized(
        &mut self,
        trigger: Trigger,
        result: Result<FinalizeReceipt, BackendError>,
    ) -> Cmd {
        let outcome = self.coordinator.on_finalized(trigger, result);
        if trigger == Trigger::TimerExpired {
            self.timer.mark_expired();
        }
        match outcome {
            FinalizeOutcome::Completed {
                trigger,
                redirect,
                delay,
                notice,
            } => {
                if trigger == Trigger::ViolationLimit {
                    self.tracker.clear_persisted();
                }
                let mut cmds = Vec::new();
                if let Some(notice) = notice {
                    cmds.push(Cmd::notify(notice));
                }
                if let Some(url) = redirect {
                    cmds.push(Cmd::Redirect { url, delay });
                }
                Cmd::batch(cmds)
            }
            FinalizeOutcome::Failed(_) | FinalizeOutcome::Stale => Cmd::none(),
        }
    }
}

impl<C: Clock + core::fmt::Debug> core::fmt::Debug for Proctor<C> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Proctor")
            .field("attempt", self.session.attempt())
            .field("started", &self.started)
            .field("warnings", &self.session.warning_count())
            .field("submitting", &self.session.is_submitting())
            .field("clock", &self.clock)
            .finish_non_exhaustive()
    }
}
