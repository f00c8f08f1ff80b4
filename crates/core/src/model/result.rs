use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use thiserror::Error;

use crate::model::ids::{QuizId, ResultId};
use crate::scoring::ScoreBreakdown;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ResultError {
    #[error("score {0} exceeds 100")]
    ScoreOutOfRange(u8),

    #[error("earned points ({earned}) exceed total points ({total})")]
    EarnedExceedsTotal { earned: u32, total: u32 },
}

//
// ─── ANSWER SNAPSHOT ───────────────────────────────────────────────────────────
//

/// Immutable copy of an attempt's answer map, taken at submission time.
///
/// Keys are question indices, values the selected option index for that
/// question. Once frozen it is decoupled from the live session state, so a
/// stray `select_answer` arriving after submission cannot change what was
/// scored.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AnswerSnapshot {
    answers: BTreeMap<usize, usize>,
}

impl AnswerSnapshot {
    #[must_use]
    pub fn new(answers: BTreeMap<usize, usize>) -> Self {
        Self { answers }
    }

    /// The selected option index for a question, if one was recorded.
    #[must_use]
    pub fn answer_for(&self, question: usize) -> Option<usize> {
        self.answers.get(&question).copied()
    }

    #[must_use]
    pub fn answered_count(&self) -> usize {
        self.answers.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.answers.is_empty()
    }

    /// Iterates `(question index, selected option index)` pairs in question order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.answers.iter().map(|(q, a)| (*q, *a))
    }
}

//
// ─── RESULT ────────────────────────────────────────────────────────────────────
//

/// A scored attempt waiting for the result repository to assign its identity.
///
/// The repository's `create_result` turns a draft into a `QuizResult` by
/// assigning the `ResultId` and the completion timestamp.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultDraft {
    quiz_id: QuizId,
    score: u8,
    total_points: u32,
    earned_points: u32,
    time_spent_secs: u64,
    answers: AnswerSnapshot,
}

impl ResultDraft {
    /// Creates a validated result draft.
    ///
    /// # Errors
    ///
    /// Returns `ResultError` if the score exceeds 100 or earned points exceed
    /// total points.
    pub fn new(
        quiz_id: QuizId,
        score: u8,
        total_points: u32,
        earned_points: u32,
        time_spent_secs: u64,
        answers: AnswerSnapshot,
    ) -> Result<Self, ResultError> {
        if score > 100 {
            return Err(ResultError::ScoreOutOfRange(score));
        }
        if earned_points > total_points {
            return Err(ResultError::EarnedExceedsTotal {
                earned: earned_points,
                total: total_points,
            });
        }

        Ok(Self {
            quiz_id,
            score,
            total_points,
            earned_points,
            time_spent_secs,
            answers,
        })
    }

    /// Builds a draft from a score breakdown.
    ///
    /// # Errors
    ///
    /// Returns `ResultError` if the breakdown violates the score invariants;
    /// breakdowns produced by `score_attempt` always satisfy them.
    pub fn from_breakdown(
        quiz_id: QuizId,
        breakdown: &ScoreBreakdown,
        time_spent_secs: u64,
        answers: AnswerSnapshot,
    ) -> Result<Self, ResultError> {
        Self::new(
            quiz_id,
            breakdown.score,
            breakdown.total_points,
            breakdown.earned_points,
            time_spent_secs,
            answers,
        )
    }

    #[must_use]
    pub fn quiz_id(&self) -> QuizId {
        self.quiz_id
    }

    #[must_use]
    pub fn score(&self) -> u8 {
        self.score
    }

    #[must_use]
    pub fn total_points(&self) -> u32 {
        self.total_points
    }

    #[must_use]
    pub fn earned_points(&self) -> u32 {
        self.earned_points
    }

    #[must_use]
    pub fn time_spent_secs(&self) -> u64 {
        self.time_spent_secs
    }

    #[must_use]
    pub fn answers(&self) -> &AnswerSnapshot {
        &self.answers
    }

    /// Attaches the repository-assigned identity, producing the final result.
    #[must_use]
    pub fn assign(self, id: ResultId, completed_at: DateTime<Utc>) -> QuizResult {
        QuizResult {
            id,
            quiz_id: self.quiz_id,
            score: self.score,
            total_points: self.total_points,
            earned_points: self.earned_points,
            completed_at,
            time_spent_secs: self.time_spent_secs,
            answers: self.answers,
        }
    }
}

/// A persisted attempt outcome, as returned by the result repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizResult {
    id: ResultId,
    quiz_id: QuizId,
    score: u8,
    total_points: u32,
    earned_points: u32,
    completed_at: DateTime<Utc>,
    time_spent_secs: u64,
    answers: AnswerSnapshot,
}

impl QuizResult {
    #[must_use]
    pub fn id(&self) -> ResultId {
        self.id
    }

    #[must_use]
    pub fn quiz_id(&self) -> QuizId {
        self.quiz_id
    }

    /// Integer percentage score, 0-100 inclusive.
    #[must_use]
    pub fn score(&self) -> u8 {
        self.score
    }

    #[must_use]
    pub fn total_points(&self) -> u32 {
        self.total_points
    }

    #[must_use]
    pub fn earned_points(&self) -> u32 {
        self.earned_points
    }

    #[must_use]
    pub fn completed_at(&self) -> DateTime<Utc> {
        self.completed_at
    }

    #[must_use]
    pub fn time_spent_secs(&self) -> u64 {
        self.time_spent_secs
    }

    #[must_use]
    pub fn answers(&self) -> &AnswerSnapshot {
        &self.answers
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::fixed_now;

    fn snapshot(pairs: &[(usize, usize)]) -> AnswerSnapshot {
        AnswerSnapshot::new(pairs.iter().copied().collect())
    }

    #[test]
    fn draft_rejects_score_over_100() {
        let err = ResultDraft::new(QuizId::new(1), 101, 30, 30, 60, AnswerSnapshot::default())
            .unwrap_err();
        assert_eq!(err, ResultError::ScoreOutOfRange(101));
    }

    #[test]
    fn draft_rejects_earned_over_total() {
        let err = ResultDraft::new(QuizId::new(1), 100, 20, 30, 60, AnswerSnapshot::default())
            .unwrap_err();
        assert!(matches!(
            err,
            ResultError::EarnedExceedsTotal { earned: 30, total: 20 }
        ));
    }

    #[test]
    fn assign_produces_persisted_result() {
        let draft = ResultDraft::new(
            QuizId::new(3),
            50,
            40,
            20,
            125,
            snapshot(&[(0, 1), (2, 0)]),
        )
        .unwrap();

        let result = draft.assign(ResultId::new(9), fixed_now());

        assert_eq!(result.id(), ResultId::new(9));
        assert_eq!(result.quiz_id(), QuizId::new(3));
        assert_eq!(result.score(), 50);
        assert_eq!(result.completed_at(), fixed_now());
        assert_eq!(result.time_spent_secs(), 125);
        assert_eq!(result.answers().answer_for(2), Some(0));
        assert_eq!(result.answers().answer_for(1), None);
    }

    #[test]
    fn snapshot_iterates_in_question_order() {
        let snap = snapshot(&[(2, 0), (0, 1)]);
        let pairs: Vec<_> = snap.iter().collect();
        assert_eq!(pairs, vec![(0, 1), (2, 0)]);
        assert_eq!(snap.answered_count(), 2);
    }
}
