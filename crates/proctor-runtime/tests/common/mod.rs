//! Shared harness for proctor integration tests.
//!
//! Plays the host: collects commands, keeps backend requests in flight until
//! a test resolves them, and records notices and redirects.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use proctor_core::clock::DeterministicClock;
use proctor_core::config::ProctorConfig;
use proctor_core::event::BrowserEvent;
use proctor_core::notice::Notice;
use proctor_core::policy::{LockdownPolicy, ViolationPolicy};
use proctor_core::session::AttemptId;
use proctor_runtime::backend::{
    AnswerSubmission, BackendError, FinalizeReceipt, QuestionDetail, QuestionId, QuestionKind,
    QuestionList, QuestionPayload, QuestionRef, QuizBackend, Request, StatusSnapshot,
};
use proctor_runtime::persistence::{MemoryStore, SessionStore};
use proctor_runtime::program::{Cmd, IntervalId, Msg};
use proctor_runtime::proctor::Proctor;

pub const ATTEMPT: &str = "42";
pub const WARNING_KEY: &str = "quiz_warnings_42";

pub fn config(max_warnings: u32, auto_submit: bool) -> ProctorConfig {
    ProctorConfig {
        attempt: AttemptId::new(ATTEMPT),
        violation: ViolationPolicy {
            max_warnings,
            auto_submit_on_limit: auto_submit,
            monitor_tab_switching: true,
            enforce_fullscreen: true,
        },
        lockdown: LockdownPolicy::default(),
        ..ProctorConfig::default()
    }
}

/// In-memory backend with scripted answers.
#[derive(Debug)]
pub struct FakeBackend {
    pub questions: Vec<QuestionRef>,
    pub status: StatusSnapshot,
    pub fail_save: bool,
    pub fail_finalize: bool,
    pub redirect: Option<String>,
    pub saved: Vec<(QuestionId, AnswerSubmission)>,
    pub finalize_calls: usize,
}

impl Default for FakeBackend {
    fn default() -> Self {
        Self {
            questions: vec![
                QuestionRef {
                    id: 1,
                    kind: QuestionKind::Single,
                },
                QuestionRef {
                    id: 2,
                    kind: QuestionKind::ShortAnswer,
                },
            ],
            status: StatusSnapshot {
                remaining_seconds: 600,
                completed: false,
            },
            fail_save: false,
            fail_finalize: false,
            redirect: Some("/quiz/result/42/".to_owned()),
            saved: Vec::new(),
            finalize_calls: 0,
        }
    }
}

impl QuizBackend for FakeBackend {
    fn questions(&mut self) -> Result<QuestionList, BackendError> {
        Ok(QuestionList {
            questions: self.questions.clone(),
        })
    }

    fn question(&mut self, id: QuestionId) -> Result<QuestionPayload, BackendError> {
        let kind = self
            .questions
            .iter()
            .find(|q| q.id == id)
            .map(|q| q.kind)
            .ok_or(BackendError::Status(404))?;
        Ok(QuestionPayload {
            question: QuestionDetail {
                id,
                kind,
                html: format!("<p>Question {id}</p>"),
                marks: 1.0,
                options: Vec::new(),
            },
            selected_option_ids: Vec::new(),
            text_answer: None,
        })
    }

    fn save_answer(
        &mut self,
        id: QuestionId,
        submission: &AnswerSubmission,
    ) -> Result<(), BackendError> {
        self.saved.push((id, submission.clone()));
        if self.fail_save {
            Err(BackendError::Status(500))
        } else {
            Ok(())
        }
    }

    fn status(&mut self) -> Result<StatusSnapshot, BackendError> {
        Ok(self.status)
    }

    fn finalize(&mut self) -> Result<FinalizeReceipt, BackendError> {
        self.finalize_calls += 1;
        if self.fail_finalize {
            return Err(BackendError::Transport("connection reset".to_owned()));
        }
        Ok(FinalizeReceipt {
            redirect_url: self.redirect.clone(),
        })
    }
}

pub struct Harness {
    pub proctor: Proctor<DeterministicClock>,
    pub store: Arc<MemoryStore>,
    pub backend: FakeBackend,
    pub in_flight: VecDeque<Request>,
    pub notices: Vec<Notice>,
    pub redirects: Vec<(String, Duration)>,
    pub finalize_sent: usize,
}

impl Harness {
    pub fn new(config: ProctorConfig) -> Self {
        Self::with_store(config, MemoryStore::new().shared())
    }

    pub fn with_store(config: ProctorConfig, store: Arc<MemoryStore>) -> Self {
        let proctor = Proctor::new(config, DeterministicClock::new(), store.clone());
        Self {
            proctor,
            store,
            backend: FakeBackend::default(),
            in_flight: VecDeque::new(),
            notices: Vec::new(),
            redirects: Vec::new(),
            finalize_sent: 0,
        }
    }

    /// Start the quiz and answer every startup request.
    pub fn started(config: ProctorConfig) -> Self {
        let mut h = Self::new(config);
        h.send(Msg::Start);
        h.resolve_all();
        h
    }

    pub fn send(&mut self, msg: Msg) {
        let cmd = self.proctor.update(msg);
        self.absorb(cmd);
    }

    pub fn event(&mut self, event: BrowserEvent) {
        self.send(Msg::Browser(event));
    }

    pub fn tick(&mut self) {
        self.advance(Duration::from_secs(1));
        self.send(Msg::Interval(IntervalId::Countdown));
    }

    pub fn advance(&mut self, dt: Duration) {
        self.proctor.clock_mut().advance(dt);
    }

    /// A counted-warning source: leaving fullscreen.
    pub fn exit_fullscreen(&mut self) {
        self.event(BrowserEvent::FullscreenChanged { active: false });
    }

    /// Resolve the oldest in-flight request. Returns `false` if none.
    pub fn resolve_next(&mut self) -> bool {
        let Some(request) = self.in_flight.pop_front() else {
            return false;
        };
        let response = request.execute(&mut self.backend);
        self.send(Msg::Response(response));
        true
    }

    pub fn resolve_all(&mut self) {
        while self.resolve_next() {}
    }

    pub fn pending_names(&self) -> Vec<&'static str> {
        self.in_flight.iter().map(Request::name).collect()
    }

    pub fn stored_count(&self) -> Option<String> {
        self.store.get(WARNING_KEY).ok().flatten()
    }

    fn absorb(&mut self, cmd: Cmd) {
        let mut immediate = Vec::new();
        cmd.for_each(&mut |c| match c {
            Cmd::Request(request) => {
                if matches!(request, Request::Finalize { .. }) {
                    self.finalize_sent += 1;
                }
                self.in_flight.push_back(request.clone());
            }
            Cmd::Notify(notice) => self.notices.push(notice.clone()),
            Cmd::Redirect { url, delay } => self.redirects.push((url.clone(), *delay)),
            Cmd::Msg(msg) => immediate.push(msg.clone()),
            _ => {}
        });
        for msg in immediate {
            self.send(msg);
        }
    }
}
