#![forbid(unsafe_code)]

//! Canonical browser events.
//!
//! The host translates DOM notifications (`visibilitychange`, `blur`,
//! `fullscreenchange`, `keydown`, clipboard events, ...) into [`BrowserEvent`]
//! values and hands them to the proctor. Nothing here touches a real browser,
//! so handlers can be driven directly from tests with synthetic events.
//!
//! # Design Notes
//!
//! - Vendor-prefixed fullscreen notifications collapse into one
//!   [`BrowserEvent::FullscreenChanged`].
//! - Key codes only model what the lockdown rules inspect; everything else
//!   is [`KeyCode::Other`].

use bitflags::bitflags;

/// Canonical browser event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BrowserEvent {
    /// Page visibility changed. `hidden = true` when the tab is backgrounded
    /// or the window minimized.
    VisibilityChanged {
        /// Current value of `document.hidden`.
        hidden: bool,
    },

    /// The window lost focus.
    WindowBlur,

    /// The window regained focus.
    WindowFocus,

    /// Fullscreen state changed.
    FullscreenChanged {
        /// Whether a fullscreen element is present after the change.
        active: bool,
    },

    /// The page is about to unload (refresh, close, navigation).
    BeforeUnload,

    /// Context menu requested (right click).
    ContextMenu,

    /// Copy, cut, or paste.
    Clipboard(ClipboardAction),

    /// A key was pressed.
    Key(KeyEvent),
}

impl BrowserEvent {
    /// Short stable name, used as a tracing field.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::VisibilityChanged { .. } => "visibility",
            Self::WindowBlur => "blur",
            Self::WindowFocus => "focus",
            Self::FullscreenChanged { .. } => "fullscreen",
            Self::BeforeUnload => "beforeunload",
            Self::ContextMenu => "contextmenu",
            Self::Clipboard(_) => "clipboard",
            Self::Key(_) => "key",
        }
    }
}

/// Clipboard operation kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClipboardAction {
    Copy,
    Cut,
    Paste,
}

impl ClipboardAction {
    /// Message shown when the action is blocked.
    #[must_use]
    pub const fn blocked_message(self) -> &'static str {
        match self {
            Self::Copy => "Copying is disabled during the quiz.",
            Self::Cut => "Cutting is disabled during the quiz.",
            Self::Paste => "Pasting is disabled during the quiz.",
        }
    }
}

/// A keyboard event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyEvent {
    /// The key that was pressed.
    pub code: KeyCode,

    /// Modifier keys held during the event.
    pub modifiers: Modifiers,
}

impl KeyEvent {
    /// Create a key event with no modifiers.
    #[must_use]
    pub const fn new(code: KeyCode) -> Self {
        Self {
            code,
            modifiers: Modifiers::NONE,
        }
    }

    /// Create a key event with modifiers.
    #[must_use]
    pub const fn with_modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = modifiers;
        self
    }

    /// Check if Ctrl modifier is held.
    #[must_use]
    pub const fn ctrl(&self) -> bool {
        self.modifiers.contains(Modifiers::CTRL)
    }

    /// Check if Shift modifier is held.
    #[must_use]
    pub const fn shift(&self) -> bool {
        self.modifiers.contains(Modifiers::SHIFT)
    }

    /// Check for a letter key, case-insensitively.
    #[must_use]
    pub fn is_letter(&self, letter: char) -> bool {
        matches!(self.code, KeyCode::Char(c) if c.eq_ignore_ascii_case(&letter))
    }

    /// Whether this combination opens developer tools or page source:
    /// F12, Ctrl+Shift+I, Ctrl+Shift+J, Ctrl+U.
    #[must_use]
    pub fn is_devtools_shortcut(&self) -> bool {
        if self.code == KeyCode::F(12) {
            return true;
        }
        if !self.ctrl() {
            return false;
        }
        if self.shift() && (self.is_letter('i') || self.is_letter('j')) {
            return true;
        }
        self.is_letter('u')
    }
}

/// Key codes the proctor distinguishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyCode {
    /// A printable character.
    Char(char),
    /// Function key `F1..F24`.
    F(u8),
    /// Any other key.
    Other,
}

bitflags! {
    /// Modifier keys that can be held during a key event.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Modifiers: u8 {
        /// No modifiers.
        const NONE  = 0b0000;
        /// Shift key.
        const SHIFT = 0b0001;
        /// Alt/Option key.
        const ALT   = 0b0010;
        /// Control key.
        const CTRL  = 0b0100;
        /// Meta/Command key.
        const META  = 0b1000;
    }
}
