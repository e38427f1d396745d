//! Proctor E2E Tests
//!
//! Drives a [`Proctor`] through a scripted host and backend.
//!
//! # Running Tests
//!
//! ```sh
//! cargo test -p proctor-runtime --test proctor_e2e
//! ```
//!
//! # Invariants
//!
//! 1. **Debounce**: events within 2000 ms of the last counted warning add at
//!    most one increment
//! 2. **Limit**: reaching the limit finalizes once with auto-submit, never
//!    without
//! 3. **Single finalize**: user submit, limit, and expiry together send one
//!    finalize
//! 4. **Restore**: a persisted count is applied before any event
//! 5. **Expiry**: the countdown fires expiration exactly once
//! 6. **Manual limit**: without auto-submit the quiz continues
//! 7. **Auto-submit ordering**: the gate closes before any request resolves;
//!    storage is cleared only after finalize succeeds

mod common;

use std::time::Duration;

use common::{Harness, WARNING_KEY, config};
use pretty_assertions::assert_eq;
use proctor_core::event::BrowserEvent;
use proctor_core::notice::Notice;
use proctor_runtime::backend::{AfterSave, AnswerSubmission, Request, Response, StatusSnapshot};
use proctor_runtime::persistence::{MemoryStore, SessionStore};
use proctor_runtime::program::{FocusProbe, Msg, UserAction};
use proctor_runtime::submission::Trigger;
use proctor_runtime::timer::TimerPhase;

fn millis(ms: u64) -> Duration {
    Duration::from_millis(ms)
}

// ============================================================================
// 1. Debounce
// ============================================================================

#[test]
fn burst_of_events_counts_once() {
    let mut h = Harness::started(config(0, false));

    h.exit_fullscreen();
    for _ in 0..5 {
        h.advance(millis(300));
        h.exit_fullscreen();
    }
    assert_eq!(h.proctor.session().warning_count(), 1);

    h.advance(millis(500));
    h.exit_fullscreen();
    assert_eq!(h.proctor.session().warning_count(), 2);
}

#[test]
fn tab_switch_firing_visibility_and_blur_counts_once() {
    let mut h = Harness::started(config(0, false));

    h.event(BrowserEvent::VisibilityChanged { hidden: true });
    h.event(BrowserEvent::WindowBlur);
    h.advance(millis(800));
    h.send(Msg::FocusCheck(FocusProbe::Visibility));
    h.send(Msg::FocusCheck(FocusProbe::Blur));

    assert_eq!(h.proctor.session().warning_count(), 1);
    assert_eq!(
        h.notices.last().map(Notice::message).as_deref(),
        Some("You switched to another tab or minimized the browser.")
    );
}

#[test]
fn brief_blur_is_not_counted() {
    let mut h = Harness::started(config(0, false));

    h.event(BrowserEvent::WindowBlur);
    h.advance(millis(200));
    h.event(BrowserEvent::WindowFocus);
    h.advance(millis(600));
    h.send(Msg::FocusCheck(FocusProbe::Blur));

    assert_eq!(h.proctor.session().warning_count(), 0);
}

// ============================================================================
// 2 & 6. Limit handling
// ============================================================================

#[test]
fn limit_with_auto_submit_finalizes_once() {
    let mut h = Harness::started(config(2, true));

    h.exit_fullscreen();
    h.advance(millis(2_500));
    h.exit_fullscreen();
    h.resolve_all();

    assert_eq!(h.finalize_sent, 1);
    assert_eq!(h.backend.finalize_calls, 1);
    assert_eq!(
        h.redirects,
        vec![("/quiz/result/42/".to_owned(), Duration::ZERO)]
    );
}

#[test]
fn limit_without_auto_submit_continues_quiz() {
    let mut h = Harness::started(config(3, false));

    for _ in 0..3 {
        h.exit_fullscreen();
        h.advance(millis(2_000));
    }
    h.resolve_all();

    assert_eq!(h.proctor.session().warning_count(), 3);
    assert_eq!(
        h.notices.last(),
        Some(&Notice::LimitReached { auto_submit: false })
    );
    assert!(!h.proctor.session().is_submitting());
    assert_eq!(h.finalize_sent, 0);

    // Controls still work.
    h.send(Msg::User(UserAction::Next));
    assert_eq!(h.pending_names(), vec!["save_answer"]);
}

#[test]
fn closed_attempt_ignores_violations_past_limit() {
    let mut h = Harness::started(config(1, true));
    h.send(Msg::Response(Response::Status(Ok(StatusSnapshot {
        remaining_seconds: 100,
        completed: true,
    }))));
    let notices_before = h.notices.len();

    for _ in 0..3 {
        h.exit_fullscreen();
        h.advance(millis(3_000));
    }
    h.resolve_all();

    assert_eq!(h.proctor.session().warning_count(), 0);
    assert_eq!(h.notices.len(), notices_before);
    assert!(
        !h.notices
            .iter()
            .any(|n| matches!(n, Notice::LimitReached { .. }))
    );
    assert_eq!(h.stored_count(), None);
    assert_eq!(h.finalize_sent, 0);
}

// ============================================================================
// 3. Finalize at most once
// ============================================================================

#[test]
fn concurrent_triggers_finalize_once() {
    let mut h = Harness::started(config(1, true));
    h.backend.status = StatusSnapshot {
        remaining_seconds: 0,
        completed: false,
    };

    h.send(Msg::User(UserAction::SubmitConfirmed));
    h.send(Msg::Interval(proctor_runtime::program::IntervalId::StatusPoll));
    h.exit_fullscreen();
    h.resolve_all();

    assert_eq!(h.finalize_sent, 1);
    assert_eq!(h.backend.finalize_calls, 1);
    assert_eq!(h.proctor.session().warning_count(), 0);
}

// ============================================================================
// 4. Restore
// ============================================================================

#[test]
fn persisted_count_is_restored_before_events() {
    let store = MemoryStore::new().shared();
    store.set(WARNING_KEY, "2").unwrap();

    let h = Harness::with_store(config(5, false), store);
    assert_eq!(h.proctor.session().warning_count(), 2);
}

#[test]
fn restored_count_at_limit_submits_on_start() {
    let store = MemoryStore::new().shared();
    store.set(WARNING_KEY, "3").unwrap();

    let mut h = Harness::with_store(config(3, true), store);
    h.send(Msg::Start);
    assert!(h.proctor.session().is_submitting());
    assert_eq!(
        h.notices,
        vec![Notice::LimitReached { auto_submit: true }]
    );
    h.resolve_all();
    assert_eq!(h.finalize_sent, 1);
}

// ============================================================================
// 5. Expiry
// ============================================================================

#[test]
fn three_ticks_from_three_seconds_expire_once() {
    let mut h = Harness::new(config(0, false));
    h.backend.status = StatusSnapshot {
        remaining_seconds: 3,
        completed: false,
    };
    h.send(Msg::Start);
    // Only the status poll resolves; no question is loaded.
    assert!(h.resolve_next());
    h.in_flight.clear();

    h.tick();
    h.tick();
    assert_eq!(h.finalize_sent, 0);
    h.tick();
    assert_eq!(h.finalize_sent, 1);
    h.tick();
    h.tick();
    assert_eq!(h.finalize_sent, 1);
    assert_eq!(h.proctor.timer().phase(), TimerPhase::Expiring);
}

#[test]
fn expiry_shows_notice_and_delays_redirect() {
    let mut h = Harness::started(config(0, false));
    h.backend.status.remaining_seconds = 0;
    h.send(Msg::Interval(proctor_runtime::program::IntervalId::StatusPoll));
    h.resolve_all();

    assert_eq!(h.notices.last(), Some(&Notice::TimeExpired));
    assert_eq!(
        h.redirects,
        vec![("/quiz/result/42/".to_owned(), Duration::from_millis(2_000))]
    );
    assert_eq!(h.proctor.timer().phase(), TimerPhase::Expired);
}

// ============================================================================
// 7. Auto-submit ordering
// ============================================================================

#[test]
fn auto_submit_closes_gate_before_requests_resolve() {
    let mut h = Harness::started(config(2, true));
    h.send(Msg::User(UserAction::SelectOption {
        option_id: 7,
        checked: true,
    }));

    h.exit_fullscreen();
    h.advance(millis(2_000));
    h.exit_fullscreen();

    assert!(h.proctor.session().is_submitting());
    assert_eq!(
        h.in_flight.front(),
        Some(&Request::SaveAnswer {
            id: 1,
            submission: AnswerSubmission::Options(vec![7]),
            then: AfterSave::Finalize(Trigger::ViolationLimit),
        })
    );
    assert_eq!(h.finalize_sent, 0);

    // Save resolves; finalize now in flight, storage untouched.
    assert!(h.resolve_next());
    assert_eq!(h.pending_names(), vec!["finalize"]);
    assert_eq!(h.stored_count().as_deref(), Some("2"));

    assert!(h.resolve_next());
    assert_eq!(h.stored_count(), None);
}

#[test]
fn failed_save_still_finalizes() {
    let mut h = Harness::started(config(1, true));
    h.backend.fail_save = true;

    h.exit_fullscreen();
    h.resolve_all();

    assert_eq!(h.backend.saved.len(), 1);
    assert_eq!(h.backend.finalize_calls, 1);
}

#[test]
fn failed_finalize_keeps_storage_and_page() {
    let mut h = Harness::started(config(1, true));
    h.backend.fail_finalize = true;

    h.exit_fullscreen();
    h.resolve_all();

    assert_eq!(h.backend.finalize_calls, 1);
    assert!(h.redirects.is_empty());
    assert_eq!(h.stored_count().as_deref(), Some("1"));
}

// ============================================================================
// Navigation
// ============================================================================

#[test]
fn next_saves_before_loading() {
    let mut h = Harness::started(config(0, false));
    h.send(Msg::User(UserAction::SelectOption {
        option_id: 3,
        checked: true,
    }));
    h.send(Msg::User(UserAction::Next));

    assert_eq!(h.pending_names(), vec!["save_answer"]);
    h.resolve_next();
    assert_eq!(h.pending_names(), vec!["question"]);
    h.resolve_all();

    assert_eq!(h.backend.saved, vec![(1, AnswerSubmission::Options(vec![3]))]);
    let view = h.proctor.view();
    assert_eq!(view.current_index, 1);
    assert!(view.finalize_visible);
    assert_eq!(view.question.map(|q| q.id), Some(2));
}

#[test]
fn user_submit_saves_then_redirects() {
    let mut h = Harness::started(config(0, false));
    h.send(Msg::User(UserAction::RequestSubmit));
    assert!(h.in_flight.is_empty());

    h.send(Msg::User(UserAction::SubmitConfirmed));
    assert_eq!(h.pending_names(), vec!["save_answer"]);
    h.resolve_all();

    assert_eq!(
        h.redirects,
        vec![("/quiz/result/42/".to_owned(), Duration::ZERO)]
    );
}
