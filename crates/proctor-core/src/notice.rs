#![forbid(unsafe_code)]

//! Notices shown to the student through the host's modal surface.

use core::fmt;

/// Warnings remaining before the violation limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Allowance {
    Limited(u32),
    Unlimited,
}

impl fmt::Display for Allowance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Limited(n) => write!(f, "{n}"),
            Self::Unlimited => f.write_str("∞"),
        }
    }
}

const LIMIT_MESSAGE: &str = "You have reached the maximum number of warnings.";

/// A modal notice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    /// A counted warning below the limit. Dismissed by acknowledging.
    Warning { reason: String, remaining: Allowance },

    /// The warning limit was reached.
    ///
    /// With `auto_submit` the notice is terminal (no acknowledge control);
    /// otherwise it must be acknowledged and the quiz continues.
    LimitReached { auto_submit: bool },

    /// The countdown hit zero and the attempt was submitted.
    TimeExpired,

    /// A blocked action; informational only.
    Info(String),
}

impl Notice {
    /// Body text for the modal.
    #[must_use]
    pub fn message(&self) -> String {
        match self {
            Self::Warning { reason, .. } => reason.clone(),
            Self::LimitReached { auto_submit: true } => {
                format!("{LIMIT_MESSAGE} Your quiz is being submitted automatically.")
            }
            Self::LimitReached { auto_submit: false } => {
                format!("{LIMIT_MESSAGE} No automatic submission is configured.")
            }
            Self::TimeExpired => {
                "Time has expired! Your quiz has been automatically submitted.".to_owned()
            }
            Self::Info(text) => text.clone(),
        }
    }

    /// Remaining-warnings figure shown in the modal footer, if any.
    #[must_use]
    pub fn remaining(&self) -> Option<Allowance> {
        match self {
            Self::Warning { remaining, .. } => Some(*remaining),
            Self::LimitReached { auto_submit: false } => Some(Allowance::Limited(0)),
            _ => None,
        }
    }

    /// Whether the modal offers an acknowledge control.
    #[must_use]
    pub const fn acknowledgeable(&self) -> bool {
        !matches!(
            self,
            Self::LimitReached { auto_submit: true } | Self::TimeExpired
        )
    }
}
