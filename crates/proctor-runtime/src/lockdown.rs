#![forbid(unsafe_code)]

//! Lockdown rules: which browser events count as violations and which are
//! simply blocked.
//!
//! [`LockdownRules::screen`] records the page environment carried by the
//! event in the session, then returns a [`Verdict`]. It never counts
//! warnings itself; the proctor forwards verdict warnings to the tracker.
//!
//! Focus loss is not counted immediately. Hidden or blurred pages are
//! re-checked after [`FOCUS_CONFIRM_DELAY`] and only count if the student is
//! still away, so a brief flicker does not cost a warning.

use core::time::Duration;

use proctor_core::event::BrowserEvent;
use proctor_core::policy::{LockdownPolicy, ViolationPolicy};
use proctor_core::session::SessionContext;

use crate::program::FocusProbe;

/// Delay before a focus loss is confirmed.
pub const FOCUS_CONFIRM_DELAY: Duration = Duration::from_millis(800);

pub const TAB_SWITCH_REASON: &str = "You switched to another tab or minimized the browser.";
pub const WINDOW_BLUR_REASON: &str =
    "You clicked outside the quiz window or switched applications.";
pub const FULLSCREEN_EXIT_REASON: &str = "You exited fullscreen mode.";
pub const UNLOAD_REASON: &str = "You refreshed the page or navigated away.";
pub const RIGHT_CLICK_BLOCKED: &str = "Right-click is disabled during the quiz.";
pub const SHORTCUT_BLOCKED: &str = "This action is not allowed during the quiz.";

/// Prompt shown by the browser when an unload is held.
pub const LEAVE_PROMPT: &str = "Are you sure you want to leave?";

/// Decision for one browser event.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Verdict {
    /// Count a warning now.
    pub warning: Option<&'static str>,
    /// Schedule a delayed focus check.
    pub probe: Option<FocusProbe>,
    /// Show an informational notice.
    pub info: Option<&'static str>,
    pub prevent_default: bool,
    pub hold_unload: bool,
    pub request_fullscreen: bool,
}

impl Verdict {
    fn blocked(message: &'static str) -> Self {
        Self {
            info: Some(message),
            prevent_default: true,
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct LockdownRules {
    violation: ViolationPolicy,
    lockdown: LockdownPolicy,
}

impl LockdownRules {
    #[must_use]
    pub const fn new(violation: ViolationPolicy, lockdown: LockdownPolicy) -> Self {
        Self {
            violation,
            lockdown,
        }
    }

    /// Record the environment change and decide what to do about it.
    pub fn screen(&self, session: &mut SessionContext, event: &BrowserEvent) -> Verdict {
        match *event {
            BrowserEvent::VisibilityChanged { hidden } => {
                session.set_document_hidden(hidden);
                if hidden && self.violation.monitor_tab_switching {
                    Verdict {
                        probe: Some(FocusProbe::Visibility),
                        ..Verdict::default()
                    }
                } else {
                    Verdict::default()
                }
            }
            BrowserEvent::WindowBlur => {
                session.set_window_focused(false);
                if self.violation.monitor_tab_switching {
                    Verdict {
                        probe: Some(FocusProbe::Blur),
                        ..Verdict::default()
                    }
                } else {
                    Verdict::default()
                }
            }
            BrowserEvent::WindowFocus => {
                session.set_window_focused(true);
                Verdict::default()
            }
            BrowserEvent::FullscreenChanged { active } => {
                session.set_fullscreen_active(active);
                if !active && self.violation.enforce_fullscreen {
                    Verdict {
                        warning: Some(FULLSCREEN_EXIT_REASON),
                        request_fullscreen: true,
                        ..Verdict::default()
                    }
                } else {
                    Verdict::default()
                }
            }
            BrowserEvent::BeforeUnload => {
                if session.is_submitting() {
                    return Verdict::default();
                }
                Verdict {
                    warning: Some(UNLOAD_REASON),
                    hold_unload: self.lockdown.prevent_browser_back,
                    ..Verdict::default()
                }
            }
            BrowserEvent::ContextMenu if self.lockdown.disable_right_click => {
                Verdict::blocked(RIGHT_CLICK_BLOCKED)
            }
            BrowserEvent::Clipboard(action) if self.lockdown.disable_copy_paste => {
                Verdict::blocked(action.blocked_message())
            }
            BrowserEvent::Key(key) if key.is_devtools_shortcut() => {
                Verdict::blocked(SHORTCUT_BLOCKED)
            }
            BrowserEvent::ContextMenu | BrowserEvent::Clipboard(_) | BrowserEvent::Key(_) => {
                Verdict::default()
            }
        }
    }

    /// Delayed focus check. Returns the warning reason if the student is
    /// still away.
    #[must_use]
    pub fn confirm_away(&self, session: &SessionContext, probe: FocusProbe) -> Option<&'static str> {
        match probe {
            FocusProbe::Visibility if session.document_hidden() => Some(TAB_SWITCH_REASON),
            FocusProbe::Blur if !session.window_focused() || session.document_hidden() => {
                Some(WINDOW_BLUR_REASON)
            }
            FocusProbe::Visibility | FocusProbe::Blur => None,
        }
    }

    /// Whether the fullscreen guard should re-request fullscreen.
    #[must_use]
    pub fn needs_fullscreen(&self, session: &SessionContext) -> bool {
        self.violation.enforce_fullscreen && !session.fullscreen_active()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proctor_core::event::{ClipboardAction, KeyCode, KeyEvent, Modifiers};
    use proctor_core::session::AttemptId;

    fn rules(monitor: bool, lockdown: LockdownPolicy) -> LockdownRules {
        LockdownRules::new(
            ViolationPolicy {
                max_warnings: 3,
                auto_submit_on_limit: false,
                monitor_tab_switching: monitor,
                enforce_fullscreen: true,
            },
            lockdown,
        )
    }

    fn strict() -> LockdownPolicy {
        LockdownPolicy {
            disable_right_click: true,
            disable_copy_paste: true,
            prevent_browser_back: true,
        }
    }

    fn session() -> SessionContext {
        SessionContext::new(AttemptId::new("l"))
    }

    #[test]
    fn hidden_page_schedules_visibility_probe() {
        let r = rules(true, LockdownPolicy::default());
        let mut s = session();
        let v = r.screen(&mut s, &BrowserEvent::VisibilityChanged { hidden: true });
        assert_eq!(v.probe, Some(FocusProbe::Visibility));
        assert_eq!(v.warning, None);
        assert_eq!(r.confirm_away(&s, FocusProbe::Visibility), Some(TAB_SWITCH_REASON));

        r.screen(&mut s, &BrowserEvent::VisibilityChanged { hidden: false });
        assert_eq!(r.confirm_away(&s, FocusProbe::Visibility), None);
    }

    #[test]
    fn blur_probe_clears_on_focus() {
        let r = rules(true, LockdownPolicy::default());
        let mut s = session();
        let v = r.screen(&mut s, &BrowserEvent::WindowBlur);
        assert_eq!(v.probe, Some(FocusProbe::Blur));
        assert_eq!(r.confirm_away(&s, FocusProbe::Blur), Some(WINDOW_BLUR_REASON));
        r.screen(&mut s, &BrowserEvent::WindowFocus);
        assert_eq!(r.confirm_away(&s, FocusProbe::Blur), None);
    }

    #[test]
    fn focus_events_ignored_without_monitoring() {
        let r = rules(false, LockdownPolicy::default());
        let mut s = session();
        assert_eq!(r.screen(&mut s, &BrowserEvent::WindowBlur), Verdict::default());
        assert!(!s.window_focused());
    }

    #[test]
    fn fullscreen_exit_warns_and_requests() {
        let r = rules(false, LockdownPolicy::default());
        let mut s = session();
        let v = r.screen(&mut s, &BrowserEvent::FullscreenChanged { active: false });
        assert_eq!(v.warning, Some(FULLSCREEN_EXIT_REASON));
        assert!(v.request_fullscreen);
        assert!(r.needs_fullscreen(&s));

        let v = r.screen(&mut s, &BrowserEvent::FullscreenChanged { active: true });
        assert_eq!(v, Verdict::default());
        assert!(!r.needs_fullscreen(&s));
    }

    #[test]
    fn unload_warns_and_holds_unless_submitting() {
        let r = rules(true, strict());
        let mut s = session();
        let v = r.screen(&mut s, &BrowserEvent::BeforeUnload);
        assert_eq!(v.warning, Some(UNLOAD_REASON));
        assert!(v.hold_unload);

        s.begin_submitting();
        assert_eq!(r.screen(&mut s, &BrowserEvent::BeforeUnload), Verdict::default());
    }

    #[test]
    fn blocked_inputs_prevent_default() {
        let r = rules(true, strict());
        let mut s = session();
        let v = r.screen(&mut s, &BrowserEvent::Clipboard(ClipboardAction::Paste));
        assert!(v.prevent_default);
        assert_eq!(v.info, Some("Pasting is disabled during the quiz."));
        assert_eq!(
            r.screen(&mut s, &BrowserEvent::ContextMenu).info,
            Some(RIGHT_CLICK_BLOCKED)
        );

        let lenient = rules(true, LockdownPolicy::default());
        assert_eq!(lenient.screen(&mut s, &BrowserEvent::ContextMenu), Verdict::default());
    }

    #[test]
    fn devtools_shortcuts_always_blocked() {
        let r = rules(false, LockdownPolicy::default());
        let mut s = session();
        let f12 = BrowserEvent::Key(KeyEvent::new(KeyCode::F(12)));
        assert!(r.screen(&mut s, &f12).prevent_default);

        let inspect = BrowserEvent::Key(
            KeyEvent::new(KeyCode::Char('i')).with_modifiers(Modifiers::CTRL | Modifiers::SHIFT),
        );
        assert_eq!(r.screen(&mut s, &inspect).info, Some(SHORTCUT_BLOCKED));

        let plain = BrowserEvent::Key(KeyEvent::new(KeyCode::Char('u')));
        assert_eq!(r.screen(&mut s, &plain), Verdict::default());
    }
}
