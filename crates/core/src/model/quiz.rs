use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::ids::{QuestionId, QuizId};

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuestionError {
    #[error("question text cannot be empty")]
    EmptyText,

    #[error("question needs at least 2 non-empty options, got {0}")]
    TooFewOptions(usize),

    #[error("correct answer index {index} is out of range for {options} options")]
    CorrectAnswerOutOfRange { index: usize, options: usize },

    #[error("question points must be > 0")]
    ZeroPoints,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuizError {
    #[error("quiz title cannot be empty")]
    EmptyTitle,

    #[error("quiz time limit must be > 0 minutes")]
    ZeroTimeLimit,

    #[error("quiz needs at least one question")]
    NoQuestions,

    #[error("unknown difficulty label: {0}")]
    InvalidDifficulty(String),
}

//
// ─── DIFFICULTY ────────────────────────────────────────────────────────────────
//

/// Three-level difficulty rating shown on quiz cards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    /// Parses a difficulty from its display label.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::InvalidDifficulty` for unknown labels.
    pub fn from_label(label: &str) -> Result<Self, QuizError> {
        match label {
            "Easy" => Ok(Self::Easy),
            "Medium" => Ok(Self::Medium),
            "Hard" => Ok(Self::Hard),
            other => Err(QuizError::InvalidDifficulty(other.to_owned())),
        }
    }

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Difficulty::Easy => "Easy",
            Difficulty::Medium => "Medium",
            Difficulty::Hard => "Hard",
        }
    }
}

//
// ─── QUESTION ──────────────────────────────────────────────────────────────────
//

/// A single multiple-choice question with per-question point weight.
///
/// Options are stored in display order; the option index doubles as the
/// answer value recorded during a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question {
    id: QuestionId,
    text: String,
    options: Vec<String>,
    correct_answer: usize,
    points: u32,
}

impl Question {
    /// Creates a validated question.
    ///
    /// Empty or whitespace-only options are filtered out before validation;
    /// `correct_answer` indexes into the surviving options.
    ///
    /// # Errors
    ///
    /// Returns `QuestionError` if the text is empty, fewer than 2 options
    /// survive filtering, the correct index is out of range, or points is 0.
    pub fn new(
        id: QuestionId,
        text: impl Into<String>,
        options: Vec<String>,
        correct_answer: usize,
        points: u32,
    ) -> Result<Self, QuestionError> {
        let text = text.into();
        if text.trim().is_empty() {
            return Err(QuestionError::EmptyText);
        }

        let options: Vec<String> = options
            .into_iter()
            .filter(|opt| !opt.trim().is_empty())
            .collect();
        if options.len() < 2 {
            return Err(QuestionError::TooFewOptions(options.len()));
        }
        if correct_answer >= options.len() {
            return Err(QuestionError::CorrectAnswerOutOfRange {
                index: correct_answer,
                options: options.len(),
            });
        }
        if points == 0 {
            return Err(QuestionError::ZeroPoints);
        }

        Ok(Self {
            id,
            text,
            options,
            correct_answer,
            points,
        })
    }

    #[must_use]
    pub fn id(&self) -> QuestionId {
        self.id
    }

    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    #[must_use]
    pub fn options(&self) -> &[String] {
        &self.options
    }

    #[must_use]
    pub fn correct_answer(&self) -> usize {
        self.correct_answer
    }

    #[must_use]
    pub fn points(&self) -> u32 {
        self.points
    }

    /// Returns true when the given option index is the correct answer.
    #[must_use]
    pub fn is_correct(&self, option: usize) -> bool {
        option == self.correct_answer
    }
}

//
// ─── QUIZ DEFINITION ───────────────────────────────────────────────────────────
//

/// An authored quiz: metadata plus its ordered question list.
///
/// Question order is significant — it defines the question indices a session
/// navigates by. The definition is immutable once an attempt starts; the
/// session layer only ever borrows it read-only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizDefinition {
    id: QuizId,
    title: String,
    description: String,
    subject: String,
    time_limit_minutes: u32,
    difficulty: Difficulty,
    questions: Vec<Question>,
}

impl QuizDefinition {
    /// Creates a validated quiz definition.
    ///
    /// # Errors
    ///
    /// Returns `QuizError` if the title is empty, the time limit is 0, or
    /// there are no questions.
    pub fn new(
        id: QuizId,
        title: impl Into<String>,
        description: impl Into<String>,
        subject: impl Into<String>,
        time_limit_minutes: u32,
        difficulty: Difficulty,
        questions: Vec<Question>,
    ) -> Result<Self, QuizError> {
        let title = title.into();
        if title.trim().is_empty() {
            return Err(QuizError::EmptyTitle);
        }
        if time_limit_minutes == 0 {
            return Err(QuizError::ZeroTimeLimit);
        }
        if questions.is_empty() {
            return Err(QuizError::NoQuestions);
        }

        Ok(Self {
            id,
            title,
            description: description.into(),
            subject: subject.into(),
            time_limit_minutes,
            difficulty,
            questions,
        })
    }

    #[must_use]
    pub fn id(&self) -> QuizId {
        self.id
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    #[must_use]
    pub fn subject(&self) -> &str {
        &self.subject
    }

    #[must_use]
    pub fn time_limit_minutes(&self) -> u32 {
        self.time_limit_minutes
    }

    /// Time limit converted to whole seconds.
    #[must_use]
    pub fn time_limit_secs(&self) -> u64 {
        u64::from(self.time_limit_minutes) * 60
    }

    #[must_use]
    pub fn difficulty(&self) -> Difficulty {
        self.difficulty
    }

    #[must_use]
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    #[must_use]
    pub fn question_count(&self) -> usize {
        self.questions.len()
    }

    /// Sum of points over all questions.
    #[must_use]
    pub fn total_points(&self) -> u32 {
        self.questions
            .iter()
            .fold(0_u32, |acc, q| acc.saturating_add(q.points()))
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;

    fn opts(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| (*s).to_owned()).collect()
    }

    #[test]
    fn question_filters_empty_options() {
        let q = Question::new(
            QuestionId::new(1),
            "Pick one",
            opts(&["a", "   ", "b", ""]),
            1,
            10,
        )
        .unwrap();

        assert_eq!(q.options(), &["a".to_owned(), "b".to_owned()]);
        assert!(q.is_correct(1));
    }

    #[test]
    fn question_rejects_too_few_options() {
        let err = Question::new(QuestionId::new(1), "Pick one", opts(&["a", " "]), 0, 10)
            .unwrap_err();
        assert_eq!(err, QuestionError::TooFewOptions(1));
    }

    #[test]
    fn question_rejects_correct_index_out_of_range() {
        let err =
            Question::new(QuestionId::new(1), "Pick one", opts(&["a", "b"]), 2, 10).unwrap_err();
        assert!(matches!(
            err,
            QuestionError::CorrectAnswerOutOfRange { index: 2, options: 2 }
        ));
    }

    #[test]
    fn question_rejects_zero_points() {
        let err =
            Question::new(QuestionId::new(1), "Pick one", opts(&["a", "b"]), 0, 0).unwrap_err();
        assert_eq!(err, QuestionError::ZeroPoints);
    }

    #[test]
    fn question_rejects_empty_text() {
        let err = Question::new(QuestionId::new(1), "  ", opts(&["a", "b"]), 0, 5).unwrap_err();
        assert_eq!(err, QuestionError::EmptyText);
    }

    #[test]
    fn quiz_validates_metadata() {
        let question =
            Question::new(QuestionId::new(1), "Q", opts(&["a", "b"]), 0, 10).unwrap();

        let err = QuizDefinition::new(
            QuizId::new(1),
            " ",
            "",
            "Math",
            10,
            Difficulty::Easy,
            vec![question.clone()],
        )
        .unwrap_err();
        assert_eq!(err, QuizError::EmptyTitle);

        let err = QuizDefinition::new(
            QuizId::new(1),
            "Algebra",
            "",
            "Math",
            0,
            Difficulty::Easy,
            vec![question],
        )
        .unwrap_err();
        assert_eq!(err, QuizError::ZeroTimeLimit);

        let err = QuizDefinition::new(
            QuizId::new(1),
            "Algebra",
            "",
            "Math",
            10,
            Difficulty::Easy,
            Vec::new(),
        )
        .unwrap_err();
        assert_eq!(err, QuizError::NoQuestions);
    }

    #[test]
    fn quiz_totals_and_time_limit() {
        let questions = vec![
            Question::new(QuestionId::new(1), "Q1", opts(&["a", "b"]), 0, 10).unwrap(),
            Question::new(QuestionId::new(2), "Q2", opts(&["a", "b", "c"]), 2, 20).unwrap(),
        ];
        let quiz = QuizDefinition::new(
            QuizId::new(7),
            "Algebra basics",
            "Linear equations",
            "Math",
            5,
            Difficulty::Medium,
            questions,
        )
        .unwrap();

        assert_eq!(quiz.total_points(), 30);
        assert_eq!(quiz.time_limit_secs(), 300);
        assert_eq!(quiz.question_count(), 2);
    }

    #[test]
    fn difficulty_round_trips_labels() {
        for difficulty in [Difficulty::Easy, Difficulty::Medium, Difficulty::Hard] {
            assert_eq!(Difficulty::from_label(difficulty.label()).unwrap(), difficulty);
        }
        assert!(matches!(
            Difficulty::from_label("Impossible"),
            Err(QuizError::InvalidDifficulty(_))
        ));
    }
}
