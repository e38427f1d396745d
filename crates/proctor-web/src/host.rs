#![forbid(unsafe_code)]

//! Step-based host for the proctor.
//!
//! [`ProctorHost`] drives a [`Proctor`] without threads or blocking. The page
//! controls the loop:
//!
//! 1. Push browser events via [`ProctorHost::push_event`] (or run them
//!    synchronously with [`ProctorHost::dispatch`] when the page needs to
//!    know whether to cancel the DOM event).
//! 2. Advance time via [`ProctorHost::advance_time`].
//! 3. Call [`ProctorHost::step`] to resolve in-flight requests, process
//!    queued messages, fire due timers, and present.
//!
//! # Request ordering
//!
//! Requests issued during a step stay in flight until the next step. A
//! request issued in response to another (finalize after save, load after
//! save) therefore always resolves at least one step later, which is the
//! ordering the proctor relies on.

use core::time::Duration;
use std::collections::{BTreeMap, VecDeque};
use std::sync::Arc;

use proctor_core::clock::{Clock, DeterministicClock};
use proctor_core::config::ProctorConfig;
use proctor_core::event::BrowserEvent;
use proctor_runtime::backend::{QuizBackend, Request};
use proctor_runtime::persistence::SessionStore;
use proctor_runtime::proctor::Proctor;
use proctor_runtime::program::{Cmd, IntervalId, Msg, UserAction};

use crate::Surface;

/// How the page should treat the DOM event it just dispatched.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Disposition {
    /// Call `preventDefault()`.
    pub prevent_default: bool,
    /// Set `returnValue` so the browser shows its leave prompt.
    pub hold_unload: bool,
}

/// Result of a single [`ProctorHost::step`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepResult {
    /// Whether the host is still running (false after navigating away).
    pub running: bool,
    /// Whether a view was presented during this step.
    pub presented: bool,
    /// Queued messages processed during this step.
    pub messages_processed: u32,
    /// Backend requests resolved during this step.
    pub requests_resolved: u32,
    /// Timers and interval ticks fired during this step.
    pub timers_fired: u32,
    /// Current step index (monotonically increasing).
    pub step_idx: u64,
}

#[derive(Debug)]
enum Scheduled {
    Deliver(Msg),
    Navigate(String),
}

#[derive(Debug)]
struct Timer {
    due: Duration,
    seq: u64,
    action: Scheduled,
}

/// Host-driven, non-blocking runner for the proctor.
///
/// # Lifecycle
///
/// 1. [`ProctorHost::new`] - create with configuration, storage, page, and backend.
/// 2. [`ProctorHost::start`] - queue the start message (start button).
/// 3. [`ProctorHost::step`] - call repeatedly from the page loop.
pub struct ProctorHost<S: Surface, B: QuizBackend> {
    proctor: Proctor<DeterministicClock>,
    surface: S,
    backend: B,
    queue: VecDeque<Msg>,
    in_flight: VecDeque<Request>,
    timers: Vec<Timer>,
    intervals: BTreeMap<IntervalId, Duration>,
    next_seq: u64,
    running: bool,
    dirty: bool,
    step_idx: u64,
}

impl<S: Surface, B: QuizBackend> ProctorHost<S, B> {
    /// Create a host. The persisted warning count is restored immediately.
    pub fn new(config: ProctorConfig, store: Arc<dyn SessionStore>, surface: S, backend: B) -> Self {
        Self {
            proctor: Proctor::new(config, DeterministicClock::new(), store),
            surface,
            backend,
            queue: VecDeque::new(),
            in_flight: VecDeque::new(),
            timers: Vec::new(),
            intervals: BTreeMap::new(),
            next_seq: 0,
            running: true,
            dirty: true,
            step_idx: 0,
        }
    }

    /// Queue the start message.
    pub fn start(&mut self) {
        self.queue.push_back(Msg::Start);
    }

    /// Queue a browser event for the next step.
    pub fn push_event(&mut self, event: BrowserEvent) {
        self.queue.push_back(Msg::Browser(event));
    }

    /// Queue a student action for the next step.
    pub fn push_action(&mut self, action: UserAction) {
        self.queue.push_back(Msg::User(action));
    }

    /// Handle a browser event now and report how to treat the DOM event.
    pub fn dispatch(&mut self, event: BrowserEvent) -> Disposition {
        let mut disposition = Disposition::default();
        if !self.running {
            return disposition;
        }
        let cmd = self.proctor.update(Msg::Browser(event));
        self.dirty = true;
        self.execute_cmd(cmd, &mut disposition);
        disposition
    }

    /// Advance the deterministic clock by `dt`.
    pub fn advance_time(&mut self, dt: Duration) {
        self.proctor.clock_mut().advance(dt);
    }

    /// Set the deterministic clock to an absolute time.
    pub fn set_time(&mut self, now: Duration) {
        self.proctor.clock_mut().set(now);
    }

    /// Current host time.
    #[must_use]
    pub fn now(&self) -> Duration {
        self.proctor.clock().now_mono()
    }

    /// Resolve in-flight requests, process queued messages, fire due timers,
    /// and present if anything changed.
    pub fn step(&mut self) -> StepResult {
        if !self.running {
            return self.result(false, 0, 0, 0);
        }
        self.step_idx += 1;

        // 1. Resolve requests issued before this step.
        let mut requests_resolved = 0;
        let pending = self.in_flight.len();
        for _ in 0..pending {
            let Some(request) = self.in_flight.pop_front() else {
                break;
            };
            tracing::debug!(request = request.name(), "resolving request");
            let response = request.execute(&mut self.backend);
            requests_resolved += 1;
            self.handle(Msg::Response(response));
            if !self.running {
                break;
            }
        }

        // 2. Process queued messages.
        let mut messages_processed = 0;
        while self.running
            && let Some(msg) = self.queue.pop_front()
        {
            messages_processed += 1;
            self.handle(msg);
        }

        // 3. Fire due timers and intervals.
        let timers_fired = self.fire_due();

        // 4. Present.
        let presented = if self.running && self.dirty {
            self.surface.present(&self.proctor.view());
            self.dirty = false;
            true
        } else {
            false
        };

        self.result(presented, messages_processed, requests_resolved, timers_fired)
    }

    /// Access the proctor model.
    pub fn proctor(&self) -> &Proctor<DeterministicClock> {
        &self.proctor
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    /// Requests waiting for the next step.
    pub fn in_flight(&self) -> impl Iterator<Item = &Request> {
        self.in_flight.iter()
    }

    /// Number of one-shot timers still pending.
    pub fn pending_timers(&self) -> usize {
        self.timers.len()
    }

    /// Whether an interval is registered.
    pub fn has_interval(&self, id: IntervalId) -> bool {
        self.intervals.contains_key(&id)
    }

    /// Whether the host is still running.
    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Current step index.
    pub fn step_idx(&self) -> u64 {
        self.step_idx
    }

    // --- Private helpers ---

    fn result(
        &self,
        presented: bool,
        messages_processed: u32,
        requests_resolved: u32,
        timers_fired: u32,
    ) -> StepResult {
        StepResult {
            running: self.running,
            presented,
            messages_processed,
            requests_resolved,
            timers_fired,
            step_idx: self.step_idx,
        }
    }

    fn handle(&mut self, msg: Msg) {
        let cmd = self.proctor.update(msg);
        self.dirty = true;
        // Dispositions only matter for synchronously dispatched events.
        self.execute_cmd(cmd, &mut Disposition::default());
    }

    fn fire_due(&mut self) -> u32 {
        let now = self.now();
        let mut fired = 0;
        while self.running {
            let timer = self
                .timers
                .iter()
                .enumerate()
                .filter(|(_, t)| t.due <= now)
                .min_by_key(|(_, t)| (t.due, t.seq))
                .map(|(i, t)| (i, t.due));
            let interval = self
                .intervals
                .iter()
                .filter(|(_, due)| **due <= now)
                .min_by_key(|(_, due)| **due)
                .map(|(id, due)| (*id, *due));

            match (timer, interval) {
                (None, None) => break,
                (Some((index, due)), Some((_, interval_due))) if due <= interval_due => {
                    self.fire_timer(index);
                }
                (Some((index, _)), None) => self.fire_timer(index),
                (_, Some((id, due))) => {
                    self.intervals.insert(id, due + id.period());
                    self.handle(Msg::Interval(id));
                }
            }
            fired += 1;
        }
        fired
    }

    fn fire_timer(&mut self, index: usize) {
        let timer = self.timers.swap_remove(index);
        match timer.action {
            Scheduled::Deliver(msg) => self.handle(msg),
            Scheduled::Navigate(url) => self.navigate(&url),
        }
    }

    fn schedule(&mut self, delay: Duration, action: Scheduled) {
        let due = self.now().saturating_add(delay);
        self.timers.push(Timer {
            due,
            seq: self.next_seq,
            action,
        });
        self.next_seq += 1;
    }

    fn navigate(&mut self, url: &str) {
        tracing::info!(url, "leaving quiz page");
        self.surface.navigate(url);
        self.running = false;
    }

    fn execute_cmd(&mut self, cmd: Cmd, disposition: &mut Disposition) {
        match cmd {
            Cmd::None => {}
            Cmd::Batch(cmds) => {
                for c in cmds {
                    self.execute_cmd(c, disposition);
                    if !self.running {
                        break;
                    }
                }
            }
            Cmd::Msg(msg) => {
                let cmd = self.proctor.update(msg);
                self.execute_cmd(cmd, disposition);
            }
            Cmd::After(delay, msg) => self.schedule(delay, Scheduled::Deliver(msg)),
            Cmd::Every(id) => {
                let due = self.now().saturating_add(id.period());
                self.intervals.entry(id).or_insert(due);
            }
            Cmd::Request(request) => self.in_flight.push_back(request),
            Cmd::Notify(notice) => {
                if let Err(err) = self.surface.show_notice(&notice) {
                    tracing::warn!(error = %err, "notice fell back to alert");
                    self.surface.alert(&notice.message());
                }
            }
            Cmd::HideNotice => self.surface.hide_notice(),
            Cmd::RequestFullscreen => {
                if let Err(err) = self.surface.request_fullscreen() {
                    tracing::debug!(error = %err, "fullscreen request failed");
                }
            }
            Cmd::Confirm { prompt, on_confirm } => {
                if self.surface.confirm(&prompt) {
                    let cmd = self.proctor.update(*on_confirm);
                    self.execute_cmd(cmd, disposition);
                }
            }
            Cmd::Redirect { url, delay } => {
                if delay.is_zero() {
                    self.navigate(&url);
                } else {
                    self.schedule(delay, Scheduled::Navigate(url));
                }
            }
            Cmd::PreventDefault => disposition.prevent_default = true,
            Cmd::HoldUnload => disposition.hold_unload = true,
        }
    }
}
