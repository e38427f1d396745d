#![forbid(unsafe_code)]

//! Messages and commands for the proctor model.
//!
//! The proctor follows an update/command loop: every input arrives as a
//! [`Msg`], [`crate::proctor::Proctor::update`] mutates the session
//! synchronously and returns a [`Cmd`] describing side effects. The host owns
//! all I/O, timers, and the display, and feeds results back as messages.
//!
//! # Ordering
//!
//! `Cmd::Batch` is executed in order. Requests are asynchronous from the
//! model's point of view: the answer arrives later as `Msg::Response`.

use core::time::Duration;

use proctor_core::event::BrowserEvent;
use proctor_core::notice::Notice;

use crate::backend::{Request, Response};

/// Inputs to the proctor.
#[derive(Debug, Clone, PartialEq)]
pub enum Msg {
    /// The student pressed the start button.
    Start,
    /// A browser notification.
    Browser(BrowserEvent),
    /// A student action on the quiz controls.
    User(UserAction),
    /// A periodic interval elapsed.
    Interval(IntervalId),
    /// A delayed focus-loss confirmation is due.
    FocusCheck(FocusProbe),
    /// A backend request completed.
    Response(Response),
}

impl From<BrowserEvent> for Msg {
    fn from(event: BrowserEvent) -> Self {
        Self::Browser(event)
    }
}

impl From<UserAction> for Msg {
    fn from(action: UserAction) -> Self {
        Self::User(action)
    }
}

impl From<Response> for Msg {
    fn from(response: Response) -> Self {
        Self::Response(response)
    }
}

/// Student actions on the quiz controls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserAction {
    Next,
    Prev,
    GoTo(usize),
    /// Clear the current question's answer.
    Clear,
    /// An option input changed.
    SelectOption { option_id: u64, checked: bool },
    /// The free-text answer changed.
    EditText(String),
    /// The finalize button was pressed; asks for confirmation first.
    RequestSubmit,
    /// The student confirmed the submit prompt.
    SubmitConfirmed,
    /// The student dismissed the current notice.
    AcknowledgeNotice,
}

/// Periodic intervals the proctor runs once started.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum IntervalId {
    /// Local one-second countdown.
    Countdown,
    /// Authoritative status poll.
    StatusPoll,
    /// Re-request fullscreen while it is not active.
    FullscreenGuard,
}

impl IntervalId {
    /// Interval period.
    #[must_use]
    pub const fn period(self) -> Duration {
        match self {
            Self::Countdown | Self::FullscreenGuard => Duration::from_secs(1),
            Self::StatusPoll => Duration::from_secs(10),
        }
    }
}

/// Which focus-loss signal a delayed check confirms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FocusProbe {
    /// Document became hidden.
    Visibility,
    /// Window lost focus.
    Blur,
}

/// Side effects requested by the proctor.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Cmd {
    /// No operation.
    #[default]
    None,
    /// Execute commands in order.
    Batch(Vec<Cmd>),
    /// Deliver a message to the model immediately.
    Msg(Msg),
    /// Deliver a message once `delay` has elapsed.
    After(Duration, Msg),
    /// Start a periodic interval (idempotent per id).
    Every(IntervalId),
    /// Issue a backend request.
    Request(Request),
    /// Show a notice.
    Notify(Notice),
    /// Hide the current notice.
    HideNotice,
    /// Ask the browser to enter fullscreen.
    RequestFullscreen,
    /// Ask the student to confirm; deliver `on_confirm` if they agree.
    Confirm { prompt: String, on_confirm: Box<Msg> },
    /// Navigate away after `delay`.
    Redirect { url: String, delay: Duration },
    /// Suppress the browser's default handling of the current event.
    PreventDefault,
    /// Hold the current unload behind the browser's leave prompt.
    HoldUnload,
}

impl Cmd {
    /// No-op command.
    #[must_use]
    pub const fn none() -> Self {
        Self::None
    }

    /// Batch commands, dropping no-ops and collapsing singletons.
    #[must_use]
    pub fn batch(cmds: Vec<Self>) -> Self {
        let mut cmds: Vec<Self> = cmds.into_iter().filter(|c| !c.is_none()).collect();
        match cmds.len() {
            0 => Self::None,
            1 => cmds.swap_remove(0),
            _ => Self::Batch(cmds),
        }
    }

    /// Issue a backend request.
    #[must_use]
    pub const fn request(request: Request) -> Self {
        Self::Request(request)
    }

    /// Wrap an optional request.
    #[must_use]
    pub fn maybe_request(request: Option<Request>) -> Self {
        request.map_or(Self::None, Self::Request)
    }

    /// Show a notice.
    #[must_use]
    pub const fn notify(notice: Notice) -> Self {
        Self::Notify(notice)
    }

    /// Whether this is a no-op.
    #[must_use]
    pub const fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }

    /// Count of commands, flattening batches. Handy in tests.
    #[must_use]
    pub fn count(&self) -> usize {
        match self {
            Self::None => 0,
            Self::Batch(cmds) => cmds.iter().map(Self::count).sum(),
            _ => 1,
        }
    }

    /// Visit every leaf command in execution order.
    pub fn for_each(&self, f: &mut impl FnMut(&Self)) {
        match self {
            Self::None => {}
            Self::Batch(cmds) => {
                for cmd in cmds {
                    cmd.for_each(f);
                }
            }
            leaf => f(leaf),
        }
    }

    /// Requests contained in this command, in order.
    #[must_use]
    pub fn requests(&self) -> Vec<&Request> {
        let mut out = Vec::new();
        self.collect_requests(&mut out);
        out
    }

    fn collect_requests<'a>(&'a self, out: &mut Vec<&'a Request>) {
        match self {
            Self::Request(r) => out.push(r),
            Self::Batch(cmds) => {
                for cmd in cmds {
                    cmd.collect_requests(out);
                }
            }
            _ => {}
        }
    }

    /// Notices contained in this command, in order.
    #[must_use]
    pub fn notices(&self) -> Vec<&Notice> {
        let mut out = Vec::new();
        self.collect_notices(&mut out);
        out
    }

    fn collect_notices<'a>(&'a self, out: &mut Vec<&'a Notice>) {
        match self {
            Self::Notify(n) => out.push(n),
            Self::Batch(cmds) => {
                for cmd in cmds {
                    cmd.collect_notices(out);
                }
            }
            _ => {}
        }
    }
}
