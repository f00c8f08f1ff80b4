use async_trait::async_trait;
use quiz_core::Clock;
use quiz_core::model::{QuizDefinition, QuizId, QuizResult, ResultDraft, ResultId};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("not found")]
    NotFound,

    #[error("conflict")]
    Conflict,

    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Repository contract for quiz definitions.
///
/// The session engine only ever reads quizzes; authoring CRUD lives in an
/// external layer behind the same trait.
#[async_trait]
pub trait QuizRepository: Send + Sync {
    /// Fetch a quiz by ID.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if missing, or other storage errors.
    async fn get_quiz(&self, id: QuizId) -> Result<QuizDefinition, StorageError>;

    /// List all quizzes, ordered by ID.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the listing cannot be read.
    async fn list_quizzes(&self) -> Result<Vec<QuizDefinition>, StorageError>;
}

/// Repository contract for persisted attempt results.
#[async_trait]
pub trait ResultRepository: Send + Sync {
    /// Persist a scored attempt, assigning its ID and completion timestamp.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the result cannot be stored.
    async fn create_result(&self, draft: ResultDraft) -> Result<QuizResult, StorageError>;

    /// Fetch all results recorded for a quiz, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the listing cannot be read.
    async fn results_for_quiz(&self, quiz_id: QuizId) -> Result<Vec<QuizResult>, StorageError>;
}

/// Simple in-memory repository implementation for testing and prototyping.
#[derive(Clone)]
pub struct InMemoryRepository {
    clock: Clock,
    quizzes: Arc<Mutex<HashMap<QuizId, QuizDefinition>>>,
    results: Arc<Mutex<Vec<QuizResult>>>,
    next_result_id: Arc<AtomicU64>,
}

impl Default for InMemoryRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::with_clock(Clock::default_clock())
    }

    /// In-memory repository stamping `completed_at` from the given clock.
    #[must_use]
    pub fn with_clock(clock: Clock) -> Self {
        Self {
            clock,
            quizzes: Arc::new(Mutex::new(HashMap::new())),
            results: Arc::new(Mutex::new(Vec::new())),
            next_result_id: Arc::new(AtomicU64::new(1)),
        }
    }

    /// Seed a quiz definition, replacing any existing quiz with the same ID.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Connection` if the map lock is poisoned.
    pub fn insert_quiz(&self, quiz: QuizDefinition) -> Result<(), StorageError> {
        let mut guard = self
            .quizzes
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.insert(quiz.id(), quiz);
        Ok(())
    }
}

#[async_trait]
impl QuizRepository for InMemoryRepository {
    async fn get_quiz(&self, id: QuizId) -> Result<QuizDefinition, StorageError> {
        let guard = self
            .quizzes
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.get(&id).cloned().ok_or(StorageError::NotFound)
    }

    async fn list_quizzes(&self) -> Result<Vec<QuizDefinition>, StorageError> {
        let guard = self
            .quizzes
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        let mut quizzes: Vec<QuizDefinition> = guard.values().cloned().collect();
        quizzes.sort_by_key(QuizDefinition::id);
        Ok(quizzes)
    }
}

#[async_trait]
impl ResultRepository for InMemoryRepository {
    async fn create_result(&self, draft: ResultDraft) -> Result<QuizResult, StorageError> {
        let id = ResultId::new(self.next_result_id.fetch_add(1, Ordering::Relaxed));
        let result = draft.assign(id, self.clock.now());

        let mut guard = self
            .results
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.push(result.clone());
        Ok(result)
    }

    async fn results_for_quiz(&self, quiz_id: QuizId) -> Result<Vec<QuizResult>, StorageError> {
        let guard = self
            .results
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(guard
            .iter()
            .filter(|r| r.quiz_id() == quiz_id)
            .cloned()
            .collect())
    }
}

/// Aggregates quiz and result repositories behind trait objects for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub quizzes: Arc<dyn QuizRepository>,
    pub results: Arc<dyn ResultRepository>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        Self::with_in_memory(InMemoryRepository::new())
    }

    /// Wrap an existing in-memory repository, typically one seeded by tests.
    #[must_use]
    pub fn with_in_memory(repo: InMemoryRepository) -> Self {
        let quizzes: Arc<dyn QuizRepository> = Arc::new(repo.clone());
        let results: Arc<dyn ResultRepository> = Arc::new(repo);
        Self { quizzes, results }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quiz_core::model::{AnswerSnapshot, Difficulty, Question, QuestionId};
    use quiz_core::time::{fixed_clock, fixed_now};

    fn build_quiz(id: u64) -> QuizDefinition {
        let questions = vec![
            Question::new(
                QuestionId::new(1),
                "Q1",
                vec!["a".to_owned(), "b".to_owned()],
                0,
                10,
            )
            .unwrap(),
        ];
        QuizDefinition::new(
            QuizId::new(id),
            format!("Quiz {id}"),
            "",
            "Math",
            5,
            Difficulty::Easy,
            questions,
        )
        .unwrap()
    }

    fn build_draft(quiz_id: u64) -> ResultDraft {
        ResultDraft::new(
            QuizId::new(quiz_id),
            100,
            10,
            10,
            42,
            AnswerSnapshot::default(),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn missing_quiz_is_not_found() {
        let repo = InMemoryRepository::new();
        let err = repo.get_quiz(QuizId::new(99)).await.unwrap_err();
        assert!(matches!(err, StorageError::NotFound));
    }

    #[tokio::test]
    async fn seeded_quiz_round_trips() {
        let repo = InMemoryRepository::new();
        let quiz = build_quiz(1);
        repo.insert_quiz(quiz.clone()).unwrap();

        let fetched = repo.get_quiz(quiz.id()).await.unwrap();
        assert_eq!(fetched, quiz);

        repo.insert_quiz(build_quiz(2)).unwrap();
        let listed = repo.list_quizzes().await.unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].id(), QuizId::new(1));
        assert_eq!(listed[1].id(), QuizId::new(2));
    }

    #[tokio::test]
    async fn create_result_assigns_identity_and_timestamp() {
        let repo = InMemoryRepository::with_clock(fixed_clock());

        let first = repo.create_result(build_draft(1)).await.unwrap();
        let second = repo.create_result(build_draft(1)).await.unwrap();

        assert_eq!(first.id(), ResultId::new(1));
        assert_eq!(second.id(), ResultId::new(2));
        assert_eq!(first.completed_at(), fixed_now());
    }

    #[tokio::test]
    async fn results_are_filtered_by_quiz() {
        let repo = InMemoryRepository::new();
        repo.create_result(build_draft(1)).await.unwrap();
        repo.create_result(build_draft(2)).await.unwrap();
        repo.create_result(build_draft(1)).await.unwrap();

        let results = repo.results_for_quiz(QuizId::new(1)).await.unwrap();
        assert_eq!(results.len(), 2);
        assert!(results.iter().all(|r| r.quiz_id() == QuizId::new(1)));
    }
}
