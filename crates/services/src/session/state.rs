use std::collections::BTreeMap;

use quiz_core::model::{AnswerSnapshot, QuizDefinition, QuizId};

use crate::error::SessionError;

//
// ─── STATUS ────────────────────────────────────────────────────────────────────
//

/// Lifecycle phase of a single attempt.
///
/// Transitions are one-directional: `NotStarted` → `InProgress` → `Submitted`.
/// The single tagged status replaces separate started/finished flags so an
/// invalid combination cannot be represented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionStatus {
    #[default]
    NotStarted,
    InProgress,
    Submitted,
}

/// Aggregated view of attempt progress, useful for UI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionProgress {
    pub total: usize,
    pub answered: usize,
    pub current: usize,
    pub is_complete: bool,
}

//
// ─── SESSION STATE ─────────────────────────────────────────────────────────────
//

/// Mutable state of one attempt: cursor, answer map, elapsed time, status.
///
/// Purely synchronous; the controller owns one instance per attempt and is
/// the only mutator. Option counts are captured from the quiz definition up
/// front so answer validation never needs the definition again.
#[derive(Debug, Clone)]
pub struct SessionState {
    quiz_id: QuizId,
    option_counts: Vec<usize>,
    current: usize,
    answers: BTreeMap<usize, usize>,
    elapsed_secs: u64,
    status: SessionStatus,
}

impl SessionState {
    #[must_use]
    pub fn new(quiz: &QuizDefinition) -> Self {
        Self {
            quiz_id: quiz.id(),
            option_counts: quiz.questions().iter().map(|q| q.options().len()).collect(),
            current: 0,
            answers: BTreeMap::new(),
            elapsed_secs: 0,
            status: SessionStatus::NotStarted,
        }
    }

    #[must_use]
    pub fn quiz_id(&self) -> QuizId {
        self.quiz_id
    }

    #[must_use]
    pub fn status(&self) -> SessionStatus {
        self.status
    }

    #[must_use]
    pub fn current_question(&self) -> usize {
        self.current
    }

    #[must_use]
    pub fn elapsed_secs(&self) -> u64 {
        self.elapsed_secs
    }

    #[must_use]
    pub fn total_questions(&self) -> usize {
        self.option_counts.len()
    }

    #[must_use]
    pub fn answered_count(&self) -> usize {
        self.answers.len()
    }

    /// The recorded answer for a question, if any.
    #[must_use]
    pub fn answer_for(&self, question: usize) -> Option<usize> {
        self.answers.get(&question).copied()
    }

    #[must_use]
    pub fn progress(&self) -> SessionProgress {
        SessionProgress {
            total: self.total_questions(),
            answered: self.answered_count(),
            current: self.current,
            is_complete: self.status == SessionStatus::Submitted,
        }
    }

    fn ensure_in_progress(&self) -> Result<(), SessionError> {
        match self.status {
            SessionStatus::InProgress => Ok(()),
            SessionStatus::NotStarted => Err(SessionError::NotStarted),
            SessionStatus::Submitted => Err(SessionError::AlreadySubmitted),
        }
    }

    /// Begins the attempt: `NotStarted` → `InProgress`, zeroed counters.
    ///
    /// # Errors
    ///
    /// Returns `AlreadyStarted` / `AlreadySubmitted` when called out of order.
    pub fn begin(&mut self) -> Result<(), SessionError> {
        match self.status {
            SessionStatus::NotStarted => {
                self.current = 0;
                self.answers.clear();
                self.elapsed_secs = 0;
                self.status = SessionStatus::InProgress;
                Ok(())
            }
            SessionStatus::InProgress => Err(SessionError::AlreadyStarted),
            SessionStatus::Submitted => Err(SessionError::AlreadySubmitted),
        }
    }

    /// Records or overwrites the answer for a question. Re-selecting replaces
    /// the prior choice; nothing is additive.
    ///
    /// # Errors
    ///
    /// Returns a transition error outside `InProgress` (the frozen map is
    /// never touched after submission) or a bounds error for either index.
    pub fn select_answer(&mut self, question: usize, option: usize) -> Result<(), SessionError> {
        self.ensure_in_progress()?;

        let total = self.total_questions();
        let Some(&options) = self.option_counts.get(question) else {
            return Err(SessionError::QuestionOutOfRange {
                index: question,
                total,
            });
        };
        if option >= options {
            return Err(SessionError::OptionOutOfRange {
                question,
                index: option,
                total: options,
            });
        }

        self.answers.insert(question, option);
        Ok(())
    }

    /// Jumps to a question by index. Out-of-range indices are rejected, not
    /// wrapped or clamped.
    ///
    /// # Errors
    ///
    /// Returns a transition error outside `InProgress` or
    /// `QuestionOutOfRange` for an invalid index.
    pub fn go_to(&mut self, index: usize) -> Result<(), SessionError> {
        self.ensure_in_progress()?;
        if index >= self.total_questions() {
            return Err(SessionError::QuestionOutOfRange {
                index,
                total: self.total_questions(),
            });
        }
        self.current = index;
        Ok(())
    }

    /// Advances to the next question, staying put on the last one.
    ///
    /// # Errors
    ///
    /// Returns a transition error outside `InProgress`.
    pub fn next(&mut self) -> Result<(), SessionError> {
        self.ensure_in_progress()?;
        if self.current + 1 < self.total_questions() {
            self.current += 1;
        }
        Ok(())
    }

    /// Moves to the previous question, staying put on the first one.
    ///
    /// # Errors
    ///
    /// Returns a transition error outside `InProgress`.
    pub fn prev(&mut self) -> Result<(), SessionError> {
        self.ensure_in_progress()?;
        self.current = self.current.saturating_sub(1);
        Ok(())
    }

    /// Accounts one elapsed second. Ticks outside `InProgress` are stale
    /// deliveries and are ignored so the frozen value never moves.
    pub fn tick(&mut self) {
        if self.status == SessionStatus::InProgress {
            self.elapsed_secs += 1;
        }
    }

    /// The commit point: `InProgress` → `Submitted`, returning an immutable
    /// copy of the answer map. Exactly one caller can succeed; any later
    /// attempt sees `AlreadySubmitted`.
    ///
    /// # Errors
    ///
    /// Returns `NotStarted` or `AlreadySubmitted` outside `InProgress`.
    pub fn freeze(&mut self) -> Result<AnswerSnapshot, SessionError> {
        self.ensure_in_progress()?;
        self.status = SessionStatus::Submitted;
        Ok(AnswerSnapshot::new(self.answers.clone()))
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use quiz_core::model::{Difficulty, Question, QuestionId};

    fn build_quiz() -> QuizDefinition {
        let questions = vec![
            Question::new(
                QuestionId::new(1),
                "Q1",
                vec!["a".to_owned(), "b".to_owned()],
                0,
                10,
            )
            .unwrap(),
            Question::new(
                QuestionId::new(2),
                "Q2",
                vec!["a".to_owned(), "b".to_owned(), "c".to_owned()],
                1,
                20,
            )
            .unwrap(),
        ];
        QuizDefinition::new(
            QuizId::new(1),
            "Algebra",
            "",
            "Math",
            5,
            Difficulty::Easy,
            questions,
        )
        .unwrap()
    }

    fn started_state() -> SessionState {
        let mut state = SessionState::new(&build_quiz());
        state.begin().unwrap();
        state
    }

    #[test]
    fn begin_is_single_shot() {
        let mut state = SessionState::new(&build_quiz());
        assert_eq!(state.status(), SessionStatus::NotStarted);

        state.begin().unwrap();
        assert_eq!(state.status(), SessionStatus::InProgress);
        assert!(matches!(state.begin(), Err(SessionError::AlreadyStarted)));

        state.freeze().unwrap();
        assert!(matches!(state.begin(), Err(SessionError::AlreadySubmitted)));
    }

    #[test]
    fn operations_require_a_started_session() {
        let mut state = SessionState::new(&build_quiz());
        assert!(matches!(
            state.select_answer(0, 0),
            Err(SessionError::NotStarted)
        ));
        assert!(matches!(state.go_to(1), Err(SessionError::NotStarted)));
        assert!(matches!(state.freeze(), Err(SessionError::NotStarted)));
    }

    #[test]
    fn reselecting_replaces_the_answer() {
        let mut state = started_state();

        state.select_answer(1, 0).unwrap();
        assert_eq!(state.answer_for(1), Some(0));

        state.select_answer(1, 2).unwrap();
        assert_eq!(state.answer_for(1), Some(2));
        assert_eq!(state.answered_count(), 1);
    }

    #[test]
    fn select_answer_validates_both_indices() {
        let mut state = started_state();

        assert!(matches!(
            state.select_answer(5, 0),
            Err(SessionError::QuestionOutOfRange { index: 5, total: 2 })
        ));
        // question 0 has 2 options
        assert!(matches!(
            state.select_answer(0, 2),
            Err(SessionError::OptionOutOfRange {
                question: 0,
                index: 2,
                total: 2
            })
        ));
        assert_eq!(state.answered_count(), 0);
    }

    #[test]
    fn navigation_clamps_and_rejects() {
        let mut state = started_state();

        state.prev().unwrap();
        assert_eq!(state.current_question(), 0);

        state.next().unwrap();
        assert_eq!(state.current_question(), 1);
        state.next().unwrap();
        assert_eq!(state.current_question(), 1);

        assert!(matches!(
            state.go_to(2),
            Err(SessionError::QuestionOutOfRange { index: 2, total: 2 })
        ));
        state.go_to(0).unwrap();
        assert_eq!(state.current_question(), 0);
    }

    #[test]
    fn navigation_does_not_touch_answers_or_elapsed() {
        let mut state = started_state();
        state.select_answer(0, 1).unwrap();
        state.tick();

        state.next().unwrap();
        state.prev().unwrap();
        state.go_to(1).unwrap();

        assert_eq!(state.answer_for(0), Some(1));
        assert_eq!(state.elapsed_secs(), 1);
    }

    #[test]
    fn ticks_only_count_while_in_progress() {
        let mut state = SessionState::new(&build_quiz());
        state.tick();
        assert_eq!(state.elapsed_secs(), 0);

        state.begin().unwrap();
        state.tick();
        state.tick();
        assert_eq!(state.elapsed_secs(), 2);

        state.freeze().unwrap();
        state.tick();
        assert_eq!(state.elapsed_secs(), 2);
    }

    #[test]
    fn freeze_commits_exactly_once() {
        let mut state = started_state();
        state.select_answer(0, 0).unwrap();

        let snapshot = state.freeze().unwrap();
        assert_eq!(snapshot.answer_for(0), Some(0));
        assert_eq!(state.status(), SessionStatus::Submitted);

        assert!(matches!(state.freeze(), Err(SessionError::AlreadySubmitted)));
    }

    #[test]
    fn frozen_snapshot_is_decoupled_from_later_calls() {
        let mut state = started_state();
        state.select_answer(0, 0).unwrap();
        let snapshot = state.freeze().unwrap();

        assert!(matches!(
            state.select_answer(0, 1),
            Err(SessionError::AlreadySubmitted)
        ));
        assert_eq!(snapshot.answer_for(0), Some(0));
        assert_eq!(state.answer_for(0), Some(0));
    }

    #[test]
    fn progress_reflects_the_attempt() {
        let mut state = started_state();
        state.select_answer(0, 0).unwrap();
        state.next().unwrap();

        let progress = state.progress();
        assert_eq!(
            progress,
            SessionProgress {
                total: 2,
                answered: 1,
                current: 1,
                is_complete: false
            }
        );

        state.freeze().unwrap();
        assert!(state.progress().is_complete);
    }
}
