#![forbid(unsafe_code)]

//! Core: browser events, clock capability, policies, and the per-attempt
//! session context shared by the proctor runtime and its hosts.

pub mod clock;
pub mod config;
pub mod event;
pub mod notice;
pub mod policy;
pub mod session;

pub use clock::{Clock, DeterministicClock, MonotonicClock};
pub use config::{Endpoints, ProctorConfig};
pub use event::{BrowserEvent, ClipboardAction, KeyCode, KeyEvent, Modifiers};
pub use notice::{Allowance, Notice};
pub use policy::{LockdownPolicy, ViolationPolicy};
pub use session::{AttemptId, SessionContext};
