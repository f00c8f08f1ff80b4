//! Pure partial-credit scoring for a quiz attempt.
//!
//! Deliberately free of any session or timer dependency: the same inputs
//! always produce the same breakdown, which keeps submission reproducible
//! and the function trivially testable.

use crate::model::{AnswerSnapshot, Question};

/// Outcome of scoring one attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScoreBreakdown {
    /// Integer percentage, 0-100, rounded half-up.
    pub score: u8,
    pub earned_points: u32,
    pub total_points: u32,
    /// Questions answered with the correct option.
    pub correct_count: usize,
    /// Questions with any recorded answer.
    pub answered_count: usize,
}

/// Scores a frozen answer snapshot against the quiz's questions.
///
/// Each question contributes its `points` to `earned_points` when the stored
/// answer equals its correct index; unanswered questions contribute 0. A quiz
/// whose questions carry 0 total points scores 0 rather than dividing by zero.
#[must_use]
pub fn score_attempt(questions: &[Question], answers: &AnswerSnapshot) -> ScoreBreakdown {
    let mut earned_points = 0_u32;
    let mut total_points = 0_u32;
    let mut correct_count = 0_usize;
    let mut answered_count = 0_usize;

    for (index, question) in questions.iter().enumerate() {
        total_points = total_points.saturating_add(question.points());

        let Some(selected) = answers.answer_for(index) else {
            continue;
        };
        answered_count += 1;
        if question.is_correct(selected) {
            earned_points = earned_points.saturating_add(question.points());
            correct_count += 1;
        }
    }

    let score = if total_points == 0 {
        0
    } else {
        percentage(earned_points, total_points)
    };

    ScoreBreakdown {
        score,
        earned_points,
        total_points,
        correct_count,
        answered_count,
    }
}

/// `earned / total * 100`, rounded half-up. Requires `total > 0`.
fn percentage(earned: u32, total: u32) -> u8 {
    let ratio = (f64::from(earned) / f64::from(total)) * 100.0;
    // round() is half-away-from-zero, which is half-up for non-negative input
    ratio.round() as u8
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
