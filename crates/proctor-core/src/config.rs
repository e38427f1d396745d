#![forbid(unsafe_code)]

//! Proctor configuration.
//!
//! The quiz page carries its configuration as data attributes on the app
//! element (`data-attempt`, `data-max-tab-switches`, ...). Hosts pass the
//! resulting `dataset` map (camelCase keys) to [`ProctorConfig::from_dataset`].
//! With the `serde` feature the same structure can be loaded from JSON.
//!
//! Parsing mirrors what the page expects: booleans are on only for the
//! literal `"true"`, integers take the leading digits and fall back to `0`.

use std::collections::HashMap;

use crate::policy::{LockdownPolicy, ViolationPolicy};
use crate::session::AttemptId;

/// Placeholder segment in the per-question URL templates.
const ID_PLACEHOLDER: &str = "/0/";

/// Backend endpoint URLs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct Endpoints {
    pub questions: String,
    pub status: String,
    /// Question URL template containing a `/0/` segment.
    pub question_base: String,
    /// Answer URL template containing a `/0/` segment.
    pub answer_base: String,
    pub finalize: String,
}

impl Endpoints {
    /// URL for one question.
    #[must_use]
    pub fn question_url(&self, question_id: u64) -> String {
        fill_template(&self.question_base, question_id)
    }

    /// URL that accepts an answer for one question.
    #[must_use]
    pub fn answer_url(&self, question_id: u64) -> String {
        fill_template(&self.answer_base, question_id)
    }
}

fn fill_template(template: &str, question_id: u64) -> String {
    template.replacen(ID_PLACEHOLDER, &format!("/{question_id}/"), 1)
}

/// Everything the proctor needs to know about one attempt.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ProctorConfig {
    pub attempt: AttemptId,
    pub violation: ViolationPolicy,
    pub lockdown: LockdownPolicy,
    pub endpoints: Endpoints,
}

impl ProctorConfig {
    /// Build a configuration from the app element's `dataset`.
    ///
    /// Missing keys take the same defaults as a page without the attribute.
    /// Fullscreen enforcement is always on.
    #[must_use]
    pub fn from_dataset(dataset: &HashMap<String, String>) -> Self {
        let text = |key: &str| dataset.get(key).cloned().unwrap_or_default();
        let flag = |key: &str| dataset.get(key).is_some_and(|v| v == "true");

        let violation = ViolationPolicy {
            max_warnings: dataset
                .get("maxTabSwitches")
                .map_or(0, |raw| parse_leading_u32(raw)),
            auto_submit_on_limit: flag("autoSubmitOnViolations"),
            monitor_tab_switching: flag("monitorTabSwitching"),
            enforce_fullscreen: true,
        };
        let lockdown = LockdownPolicy {
            disable_right_click: flag("disableRightClick"),
            disable_copy_paste: flag("disableCopyPaste"),
            prevent_browser_back: flag("preventBrowserBack"),
        };
        let endpoints = Endpoints {
            questions: text("questionsUrl"),
            status: text("statusUrl"),
            question_base: text("questionBaseUrl"),
            answer_base: text("answerBaseUrl"),
            finalize: text("finalizeUrl"),
        };

        let config = Self {
            attempt: AttemptId::new(text("attempt")),
            violation,
            lockdown,
            endpoints,
        };
        tracing::debug!(
            attempt = %config.attempt,
            max_warnings = config.violation.max_warnings,
            auto_submit = config.violation.auto_submit_on_limit,
            monitor_tab_switching = config.violation.monitor_tab_switching,
            "loaded proctor configuration"
        );
        config
    }
}

/// Leading-digit integer parse: `"3"` → 3, `"4px"` → 4, `"-2"`/`""`/`"x"` → 0.
fn parse_leading_u32(raw: &str) -> u32 {
    let trimmed = raw.trim_start();
    let unsigned = trimmed.strip_prefix('+').unwrap_or(trimmed);
    if unsigned.starts_with('-') {
        return 0;
    }
    let digits: String = unsigned.chars().take_while(char::is_ascii_digit).collect();
    if digits.is_empty() {
        return 0;
    }
    digits.parse().unwrap_or_else(|_| {
        tracing::warn!(value = raw, "warning limit out of range, treating as unlimited");
        0
    })
}
