#![forbid(unsafe_code)]

//! Question navigation and local answer drafts.
//!
//! Every move (next, prev, jump, clear) saves the current draft first. The
//! follow-up load rides on the save request as [`AfterSave`], so the next
//! question is only fetched once the save has answered.

use std::collections::{HashMap, HashSet};

use crate::backend::{
    AfterSave, AnswerSubmission, BackendError, QuestionDetail, QuestionId, QuestionKind,
    QuestionList, QuestionPayload, QuestionRef, Request,
};

/// Local answer state for one question.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnswerDraft {
    /// Selected option ids, in selection order.
    pub options: Vec<u64>,
    pub text: String,
}

impl AnswerDraft {
    /// Whether anything counts as an answer.
    #[must_use]
    pub fn is_answered(&self) -> bool {
        !self.options.is_empty() || !self.text.trim().is_empty()
    }

    fn submission(&self, kind: QuestionKind) -> AnswerSubmission {
        match kind {
            QuestionKind::Single | QuestionKind::Multiple | QuestionKind::TrueFalse => {
                AnswerSubmission::Options(self.options.clone())
            }
            QuestionKind::ShortAnswer => AnswerSubmission::Text(self.text.clone()),
            QuestionKind::Other => AnswerSubmission::Empty,
        }
    }
}

/// Navigation button state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavStatus {
    Current,
    Answered,
    Unanswered,
}

#[derive(Debug, Default)]
pub struct QuestionNavigator {
    order: Vec<QuestionRef>,
    current: usize,
    drafts: HashMap<QuestionId, AnswerDraft>,
    seeded: HashSet<QuestionId>,
    detail: Option<QuestionDetail>,
}

impl QuestionNavigator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.order.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    #[must_use]
    pub const fn current_index(&self) -> usize {
        self.current
    }

    #[must_use]
    pub fn current(&self) -> Option<&QuestionRef> {
        self.order.get(self.current)
    }

    /// Content of the displayed question, once loaded.
    #[must_use]
    pub fn detail(&self) -> Option<&QuestionDetail> {
        self.detail.as_ref()
    }

    #[must_use]
    pub fn draft(&self, id: QuestionId) -> Option<&AnswerDraft> {
        self.drafts.get(&id)
    }

    #[must_use]
    pub fn is_last(&self) -> bool {
        !self.order.is_empty() && self.current + 1 == self.order.len()
    }

    // ─── Responses ──────────────────────────────────────────────────────

    /// Apply the question list. Returns the request for the first question.
    pub fn on_questions(&mut self, result: Result<QuestionList, BackendError>) -> Option<Request> {
        match result {
            Ok(list) => {
                tracing::debug!(count = list.questions.len(), "question list loaded");
                self.order = list.questions;
                self.current = 0;
                self.drafts = self
                    .order
                    .iter()
                    .map(|q| (q.id, AnswerDraft::default()))
                    .collect();
                self.load(0)
            }
            Err(err) => {
                tracing::error!(error = %err, "loading questions failed");
                None
            }
        }
    }

    /// Make `index` current and request its content.
    pub fn load(&mut self, index: usize) -> Option<Request> {
        let id = self.order.get(index)?.id;
        self.current = index;
        Some(Request::Question { index, id })
    }

    /// Apply a loaded question. Returns `true` if it is now displayed.
    ///
    /// The first load of a question seeds its draft from the backend's saved
    /// answer; later loads keep the local draft.
    pub fn on_question(
        &mut self,
        index: usize,
        id: QuestionId,
        result: Result<QuestionPayload, BackendError>,
    ) -> bool {
        let payload = match result {
            Ok(payload) => payload,
            Err(err) => {
                tracing::error!(question = id, error = %err, "loading question failed");
                return false;
            }
        };

        if self.seeded.insert(id) {
            let draft = self.drafts.entry(id).or_default();
            draft.options = payload.selected_option_ids;
            draft.text = payload.text_answer.unwrap_or_default();
        }

        if index == self.current && self.current().is_some_and(|q| q.id == id) {
            self.detail = Some(payload.question);
            true
        } else {
            false
        }
    }

    // ─── Moves ──────────────────────────────────────────────────────────

    /// Save the current draft, then run `then`.
    #[must_use]
    pub fn save_current(&self, then: AfterSave) -> Option<Request> {
        let (id, submission) = self.current_submission()?;
        Some(Request::SaveAnswer {
            id,
            submission,
            then,
        })
    }

    /// The current question's id and encoded draft.
    #[must_use]
    pub fn current_submission(&self) -> Option<(QuestionId, AnswerSubmission)> {
        let question = self.current()?;
        let submission = self
            .drafts
            .get(&question.id)
            .map_or(AnswerSubmission::Empty, |d| d.submission(question.kind));
        Some((question.id, submission))
    }

    pub fn next(&self) -> Option<Request> {
        if self.current + 1 >= self.order.len() {
            return None;
        }
        self.save_current(AfterSave::Load(self.current + 1))
    }

    pub fn prev(&self) -> Option<Request> {
        if self.current == 0 {
            return None;
        }
        self.save_current(AfterSave::Load(self.current - 1))
    }

    pub fn go_to(&self, index: usize) -> Option<Request> {
        if index >= self.order.len() {
            return None;
        }
        self.save_current(AfterSave::Load(index))
    }

    /// Reset the current draft and save the empty answer.
    pub fn clear(&mut self) -> Option<Request> {
        let id = self.current()?.id;
        self.drafts.insert(id, AnswerDraft::default());
        self.save_current(AfterSave::RefreshNav)
    }

    // ─── Draft edits ────────────────────────────────────────────────────

    /// An option input changed.
    ///
    /// Multiple-choice toggles; single and true/false replace the selection.
    pub fn select_option(&mut self, option_id: u64, checked: bool) {
        let Some(&QuestionRef { id, kind }) = self.current() else {
            return;
        };
        if !kind.is_choice() {
            return;
        }
        let draft = self.drafts.entry(id).or_default();
        match (kind, checked) {
            (QuestionKind::Multiple, true) => {
                if !draft.options.contains(&option_id) {
                    draft.options.push(option_id);
                }
            }
            (_, false) => draft.options.retain(|&o| o != option_id),
            (_, true) => draft.options = vec![option_id],
        }
    }

    /// The free-text answer changed.
    pub fn edit_text(&mut self, text: String) {
        let Some(&QuestionRef { id, kind }) = self.current() else {
            return;
        };
        if kind != QuestionKind::ShortAnswer {
            return;
        }
        self.drafts.entry(id).or_default().text = text;
    }

    /// Status for every navigation button, in order.
    #[must_use]
    pub fn statuses(&self) -> Vec<NavStatus> {
        self.order
            .iter()
            .enumerate()
            .map(|(i, q)| {
                if i == self.current {
                    NavStatus::Current
                } else if self.drafts.get(&q.id).is_some_and(AnswerDraft::is_answered) {
                    NavStatus::Answered
                } else {
                    NavStatus::Unanswered
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::AnswerOption;
    use pretty_assertions::assert_eq;

    fn list() -> QuestionList {
        QuestionList {
            questions: vec![
                QuestionRef {
                    id: 10,
                    kind: QuestionKind::Single,
                },
                QuestionRef {
                    id: 11,
                    kind: QuestionKind::Multiple,
                },
                QuestionRef {
                    id: 12,
                    kind: QuestionKind::ShortAnswer,
                },
            ],
        }
    }

    fn payload(id: QuestionId, kind: QuestionKind, selected: Vec<u64>, text: Option<&str>) -> QuestionPayload {
        QuestionPayload {
            question: QuestionDetail {
                id,
                kind,
                html: format!("<p>Q{id}</p>"),
                marks: 1.0,
                options: vec![
                    AnswerOption { id: 1, text: "a".into() },
                    AnswerOption { id: 2, text: "b".into() },
                ],
            },
            selected_option_ids: selected,
            text_answer: text.map(str::to_owned),
        }
    }

    fn loaded() -> QuestionNavigator {
        let mut nav = QuestionNavigator::new();
        nav.on_questions(Ok(list()));
        nav.on_question(0, 10, Ok(payload(10, QuestionKind::Single, vec![], None)));
        nav
    }

    #[test]
    fn question_list_requests_first_question() {
        let mut nav = QuestionNavigator::new();
        assert_eq!(
            nav.on_questions(Ok(list())),
            Some(Request::Question { index: 0, id: 10 })
        );
        assert_eq!(nav.len(), 3);
    }

    #[test]
    fn empty_or_failed_list_requests_nothing() {
        let mut nav = QuestionNavigator::new();
        assert_eq!(nav.on_questions(Ok(QuestionList::default())), None);
        assert_eq!(nav.on_questions(Err(BackendError::Status(500))), None);
        assert!(nav.is_empty());
        assert_eq!(nav.next(), None);
        assert_eq!(nav.clear(), None);
    }

    #[test]
    fn first_load_seeds_draft_later_loads_keep_it() {
        let mut nav = QuestionNavigator::new();
        nav.on_questions(Ok(list()));
        nav.on_question(0, 10, Ok(payload(10, QuestionKind::Single, vec![2], None)));
        assert_eq!(nav.draft(10).unwrap().options, vec![2]);

        nav.select_option(1, true);
        nav.on_question(0, 10, Ok(payload(10, QuestionKind::Single, vec![2], None)));
        assert_eq!(nav.draft(10).unwrap().options, vec![1]);
    }

    #[test]
    fn next_saves_then_loads() {
        let mut nav = loaded();
        nav.select_option(2, true);
        assert_eq!(
            nav.next(),
            Some(Request::SaveAnswer {
                id: 10,
                submission: AnswerSubmission::Options(vec![2]),
                then: AfterSave::Load(1),
            })
        );
        assert_eq!(nav.prev(), None);
    }

    #[test]
    fn single_replaces_multiple_toggles() {
        let mut nav = loaded();
        nav.select_option(1, true);
        nav.select_option(2, true);
        assert_eq!(nav.draft(10).unwrap().options, vec![2]);

        nav.load(1);
        nav.on_question(1, 11, Ok(payload(11, QuestionKind::Multiple, vec![], None)));
        nav.select_option(1, true);
        nav.select_option(2, true);
        nav.select_option(1, false);
        assert_eq!(nav.draft(11).unwrap().options, vec![2]);
    }

    #[test]
    fn short_answer_saves_text() {
        let mut nav = loaded();
        nav.load(2);
        nav.on_question(2, 12, Ok(payload(12, QuestionKind::ShortAnswer, vec![], Some("old"))));
        nav.edit_text("new".into());
        assert!(nav.is_last());
        assert_eq!(
            nav.current_submission(),
            Some((12, AnswerSubmission::Text("new".into())))
        );
    }

    #[test]
    fn clear_resets_and_saves_empty() {
        let mut nav = loaded();
        nav.select_option(1, true);
        assert_eq!(
            nav.clear(),
            Some(Request::SaveAnswer {
                id: 10,
                submission: AnswerSubmission::Options(vec![]),
                then: AfterSave::RefreshNav,
            })
        );
        assert!(!nav.draft(10).unwrap().is_answered());
    }

    #[test]
    fn late_response_for_other_index_does_not_replace_display() {
        let mut nav = loaded();
        assert!(!nav.on_question(1, 11, Ok(payload(11, QuestionKind::Multiple, vec![1], None))));
        assert_eq!(nav.current_index(), 0);
        assert_eq!(nav.detail().unwrap().id, 10);
        assert_eq!(nav.draft(11).unwrap().options, vec![1]);
    }

    #[test]
    fn statuses_mark_current_and_answered() {
        let mut nav = loaded();
        nav.load(1);
        nav.on_question(1, 11, Ok(payload(11, QuestionKind::Multiple, vec![1], None)));
        nav.load(0);
        nav.on_question(0, 10, Ok(payload(10, QuestionKind::Single, vec![], None)));
        assert_eq!(
            nav.statuses(),
            vec![NavStatus::Current, NavStatus::Answered, NavStatus::Unanswered]
        );
    }

    #[test]
    fn whitespace_text_is_not_an_answer() {
        let draft = AnswerDraft {
            options: vec![],
            text: "   ".into(),
        };
        assert!(!draft.is_answered());
    }
}
