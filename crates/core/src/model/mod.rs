mod ids;
mod quiz;
mod result;

pub use ids::{QuestionId, QuizId, ResultId};

pub use quiz::{Difficulty, Question, QuestionError, QuizDefinition, QuizError};
pub use result::{AnswerSnapshot, QuizResult, ResultDraft, ResultError};
