#![forbid(unsafe_code)]

//! `proctor-web` runs the quiz proctor inside a host-driven page.
//!
//! Design goals:
//! - **Host-driven I/O**: the embedding page pushes browser events and user
//!   actions; backend calls are queued and resolved on the next step.
//! - **Deterministic time**: the host advances a monotonic clock explicitly,
//!   and delayed checks, intervals, and redirects fire from it.
//! - **No blocking / no threads**: suitable for `wasm32-unknown-unknown`.
//!
//! The page itself (modal, fullscreen API, `confirm`, `location`) sits behind
//! the [`Surface`] trait. [`WebSurface`] captures everything into
//! [`WebOutputs`] for tests and for bridges that replay it into the DOM.

pub mod host;

use proctor_core::notice::Notice;
use proctor_runtime::proctor::ProctorView;

pub use host::{Disposition, ProctorHost, StepResult};

/// Surface error type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SurfaceError {
    /// The page element or API is not available.
    Unavailable(&'static str),
    /// The browser refused the request.
    Rejected(String),
}

impl core::fmt::Display for SurfaceError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Unavailable(what) => write!(f, "unavailable: {what}"),
            Self::Rejected(reason) => write!(f, "rejected: {reason}"),
        }
    }
}

impl std::error::Error for SurfaceError {}

/// The page the proctor drives.
pub trait Surface {
    /// Show a notice in the modal.
    fn show_notice(&mut self, notice: &Notice) -> Result<(), SurfaceError>;

    /// Blocking fallback when the modal is unavailable.
    fn alert(&mut self, message: &str);

    fn hide_notice(&mut self);

    fn request_fullscreen(&mut self) -> Result<(), SurfaceError>;

    /// Ask the student a yes/no question.
    fn confirm(&mut self, prompt: &str) -> bool;

    /// Leave the quiz page.
    fn navigate(&mut self, url: &str);

    /// Render the current state.
    fn present(&mut self, view: &ProctorView);
}

/// Captured page effects for host consumption.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct WebOutputs {
    /// Notices shown in the modal, in order.
    pub notices: Vec<Notice>,
    /// Messages that fell back to `alert`.
    pub alerts: Vec<String>,
    /// Whether the modal is currently open.
    pub notice_visible: bool,
    pub fullscreen_requests: u32,
    /// Confirmation prompts asked.
    pub prompts: Vec<String>,
    /// Navigation targets, in order.
    pub navigations: Vec<String>,
    /// Last presented view.
    pub last_view: Option<ProctorView>,
}

/// Capturing [`Surface`].
#[derive(Debug, Clone)]
pub struct WebSurface {
    outputs: WebOutputs,
    modal_available: bool,
    fullscreen_available: bool,
    confirm_answer: bool,
}

impl WebSurface {
    /// A page with a modal and fullscreen support that confirms every prompt.
    #[must_use]
    pub fn new() -> Self {
        Self {
            outputs: WebOutputs::default(),
            modal_available: true,
            fullscreen_available: true,
            confirm_answer: true,
        }
    }

    /// A page without the modal element; notices fall back to `alert`.
    #[must_use]
    pub fn without_modal(mut self) -> Self {
        self.modal_available = false;
        self
    }

    /// A page where fullscreen requests are refused.
    #[must_use]
    pub fn without_fullscreen(mut self) -> Self {
        self.fullscreen_available = false;
        self
    }

    /// Answer to give on the next `confirm` prompts.
    pub fn set_confirm_answer(&mut self, answer: bool) {
        self.confirm_answer = answer;
    }

    #[must_use]
    pub const fn outputs(&self) -> &WebOutputs {
        &self.outputs
    }

    /// Take the captured outputs, leaving empty defaults.
    pub fn take_outputs(&mut self) -> WebOutputs {
        std::mem::take(&mut self.outputs)
    }
}

impl Default for WebSurface {
    fn default() -> Self {
        Self::new()
    }
}

impl Surface for WebSurface {
    fn show_notice(&mut self, notice: &Notice) -> Result<(), SurfaceError> {
        if !self.modal_available {
            return Err(SurfaceError::Unavailable("warning modal"));
        }
        self.outputs.notices.push(notice.clone());
        self.outputs.notice_visible = true;
        Ok(())
    }

    fn alert(&mut self, message: &str) {
        self.outputs.alerts.push(message.to_owned());
    }

    fn hide_notice(&mut self) {
        self.outputs.notice_visible = false;
    }

    fn request_fullscreen(&mut self) -> Result<(), SurfaceError> {
        self.outputs.fullscreen_requests += 1;
        if self.fullscreen_available {
            Ok(())
        } else {
            Err(SurfaceError::Rejected("permission denied".to_owned()))
        }
    }

    fn confirm(&mut self, prompt: &str) -> bool {
        self.outputs.prompts.push(prompt.to_owned());
        self.confirm_answer
    }

    fn navigate(&mut self, url: &str) {
        self.outputs.navigations.push(url.to_owned());
    }

    fn present(&mut self, view: &ProctorView) {
        self.outputs.last_view = Some(view.clone());
    }
}
