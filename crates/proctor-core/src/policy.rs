#![forbid(unsafe_code)]

//! Per-attempt policies, fixed when the session starts.

use crate::notice::Allowance;

/// Warning limits and which browser signals count as violations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ViolationPolicy {
    /// Warnings allowed before the limit is reached. `0` means unlimited.
    pub max_warnings: u32,
    /// Finalize the attempt automatically once the limit is reached.
    pub auto_submit_on_limit: bool,
    /// Count tab switches, window blurs, and unloads.
    pub monitor_tab_switching: bool,
    /// Keep the page in fullscreen and count exits.
    pub enforce_fullscreen: bool,
}

impl Default for ViolationPolicy {
    fn default() -> Self {
        Self {
            max_warnings: 0,
            auto_submit_on_limit: false,
            monitor_tab_switching: false,
            enforce_fullscreen: true,
        }
    }
}

impl ViolationPolicy {
    /// Whether any warning source is active at all.
    #[must_use]
    pub const fn warnings_enabled(&self) -> bool {
        self.monitor_tab_switching || self.enforce_fullscreen
    }

    /// Whether `count` has reached a configured limit.
    #[must_use]
    pub const fn limit_reached(&self, count: u32) -> bool {
        self.max_warnings > 0 && count >= self.max_warnings
    }

    /// Warnings left before the limit, given the current count.
    #[must_use]
    pub const fn allowance(&self, count: u32) -> Allowance {
        if self.max_warnings == 0 {
            Allowance::Unlimited
        } else {
            Allowance::Limited(self.max_warnings.saturating_sub(count))
        }
    }

    /// Whether the indicator should use the danger style: one warning away
    /// from the limit, or past it.
    #[must_use]
    pub const fn is_critical(&self, count: u32) -> bool {
        self.max_warnings > 0 && count >= self.max_warnings.saturating_sub(1)
    }
}

/// Input restrictions that block actions without counting warnings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct LockdownPolicy {
    pub disable_right_click: bool,
    pub disable_copy_paste: bool,
    /// Hold page unloads behind a confirmation prompt.
    pub prevent_browser_back: bool,
}
