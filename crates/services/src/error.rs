//! Shared error types for the services crate.

use thiserror::Error;

use quiz_core::model::ResultError;
use storage::repository::StorageError;

/// Errors emitted by the session engine.
///
/// The transition variants (`NotStarted`, `AlreadyStarted`, `AlreadySubmitted`)
/// reject an operation attempted in the wrong session state without mutating
/// anything; the `Storage` wrapper carries both quiz lookup failures at start
/// and result persistence failures at submit.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SessionError {
    #[error("session has not been started")]
    NotStarted,

    #[error("session was already started")]
    AlreadyStarted,

    #[error("session was already submitted")]
    AlreadySubmitted,

    #[error("question index {index} out of range (quiz has {total} questions)")]
    QuestionOutOfRange { index: usize, total: usize },

    #[error("option index {index} out of range for question {question} ({total} options)")]
    OptionOutOfRange {
        question: usize,
        index: usize,
        total: usize,
    },

    #[error("no failed submission to retry")]
    NothingToRetry,

    #[error(transparent)]
    Result(#[from] ResultError),

    #[error(transparent)]
    Storage(#[from] StorageError),
}
