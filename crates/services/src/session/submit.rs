use std::sync::Arc;

use log::info;

use quiz_core::model::{QuizId, QuizResult, ResultDraft};
use storage::repository::ResultRepository;

use crate::error::SessionError;
use crate::session::controller::SubmissionOutcome;

/// Persists a frozen submission outcome through the result repository.
///
/// One call, one `create_result`. Failures propagate to the caller as a
/// retryable condition; the submitter itself never retries, so a flaky
/// backend cannot be tricked into creating duplicate results. The frozen
/// outcome is reused verbatim on a user-initiated retry — never rescored.
pub struct ResultSubmitter {
    results: Arc<dyn ResultRepository>,
}

impl ResultSubmitter {
    #[must_use]
    pub fn new(results: Arc<dyn ResultRepository>) -> Self {
        Self { results }
    }

    /// Builds the result draft from the frozen outcome and persists it.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Storage` if the repository rejects the create.
    pub async fn submit(
        &self,
        quiz_id: QuizId,
        outcome: &SubmissionOutcome,
    ) -> Result<QuizResult, SessionError> {
        let draft = ResultDraft::from_breakdown(
            quiz_id,
            &outcome.breakdown,
            outcome.time_spent_secs,
            outcome.answers.clone(),
        )?;

        let result = self.results.create_result(draft).await?;
        info!(
            "persisted result {} for quiz {}: {}% ({} of {} points)",
            result.id(),
            quiz_id,
            result.score(),
            result.earned_points(),
            result.total_points()
        );
        Ok(result)
    }
}
