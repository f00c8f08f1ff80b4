use std::sync::Arc;

use log::{error, info, warn};
use tokio::sync::Mutex;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::task::JoinHandle;

use quiz_core::model::{AnswerSnapshot, QuizDefinition, QuizId, QuizResult};
use quiz_core::scoring::{ScoreBreakdown, score_attempt};
use storage::repository::{QuizRepository, ResultRepository, Storage};

use crate::error::SessionError;
use crate::session::countdown::{ClockEvent, CountdownClock};
use crate::session::state::{SessionProgress, SessionState, SessionStatus};
use crate::session::submit::ResultSubmitter;

//
// ─── SUBMISSION TYPES ──────────────────────────────────────────────────────────
//

/// What caused a submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitTrigger {
    /// The user pressed submit.
    Manual,
    /// The countdown expired.
    Timeout,
}

/// The frozen outcome of the single successful submit.
///
/// Captured in full before any persistence await, so a failed or retried
/// persistence step always replays exactly this data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionOutcome {
    pub trigger: SubmitTrigger,
    pub breakdown: ScoreBreakdown,
    pub time_spent_secs: u64,
    pub answers: AnswerSnapshot,
}

//
// ─── CONTROLLER ────────────────────────────────────────────────────────────────
//

struct Inner {
    quiz: Option<Arc<QuizDefinition>>,
    state: Option<SessionState>,
    countdown: Option<CountdownClock>,
    outcome: Option<SubmissionOutcome>,
    persisted: Option<QuizResult>,
}

/// Owns the lifecycle of one attempt: start → answer/navigate → submit.
///
/// All session mutation funnels through a single async mutex; the countdown's
/// event-loop task is the only background activity. The submit commit guard
/// (`SessionState::freeze`) flips the status and snapshots the answers before
/// the first await point, so a manual submit racing the timeout — or two
/// rapid submit calls — can never persist two results.
#[derive(Clone)]
pub struct SessionController {
    quizzes: Arc<dyn QuizRepository>,
    results: Arc<dyn ResultRepository>,
    inner: Arc<Mutex<Inner>>,
    // serializes persistence attempts so overlapping retries cannot each create a result
    persist_gate: Arc<Mutex<()>>,
    event_loop: Arc<Mutex<Option<JoinHandle<()>>>>,
}

impl SessionController {
    /// Wires the controller to its repositories. Dependencies are explicit so
    /// tests can hand in fakes.
    #[must_use]
    pub fn new(storage: &Storage) -> Self {
        Self::with_repositories(Arc::clone(&storage.quizzes), Arc::clone(&storage.results))
    }

    #[must_use]
    pub fn with_repositories(
        quizzes: Arc<dyn QuizRepository>,
        results: Arc<dyn ResultRepository>,
    ) -> Self {
        Self {
            quizzes,
            results,
            inner: Arc::new(Mutex::new(Inner {
                quiz: None,
                state: None,
                countdown: None,
                outcome: None,
                persisted: None,
            })),
            persist_gate: Arc::new(Mutex::new(())),
            event_loop: Arc::new(Mutex::new(None)),
        }
    }

    /// Loads the quiz and begins the attempt: elapsed 0, cursor 0, empty
    /// answer map, countdown running with the quiz's time limit.
    ///
    /// # Errors
    ///
    /// Returns `Storage(NotFound)` before any state change when the quiz does
    /// not exist, or a transition error if an attempt was already started.
    pub async fn start(&self, quiz_id: QuizId) -> Result<(), SessionError> {
        {
            let inner = self.inner.lock().await;
            if inner.state.is_some() {
                return Err(SessionError::AlreadyStarted);
            }
        }

        let quiz = Arc::new(self.quizzes.get_quiz(quiz_id).await?);

        let mut inner = self.inner.lock().await;
        // a concurrent start may have won while the quiz was loading
        if inner.state.is_some() {
            return Err(SessionError::AlreadyStarted);
        }

        let mut state = SessionState::new(&quiz);
        state.begin()?;

        let countdown = CountdownClock::new(quiz.time_limit_minutes());
        let events = countdown.start();

        info!(
            "attempt started for quiz {} ({} questions, {} min)",
            quiz.id(),
            quiz.question_count(),
            quiz.time_limit_minutes()
        );

        inner.quiz = Some(quiz);
        inner.state = Some(state);
        inner.countdown = Some(countdown);
        drop(inner);

        self.spawn_event_loop(events).await;
        Ok(())
    }

    /// Records or overwrites the answer for a question.
    ///
    /// # Errors
    ///
    /// Returns a transition error outside `InProgress` — after submission the
    /// frozen snapshot is untouched — or a bounds error for either index.
    pub async fn select_answer(&self, question: usize, option: usize) -> Result<(), SessionError> {
        let mut inner = self.inner.lock().await;
        let state = inner.state.as_mut().ok_or(SessionError::NotStarted)?;
        state.select_answer(question, option)
    }

    /// Jumps to a question by index; out-of-range is rejected.
    ///
    /// # Errors
    ///
    /// Returns a transition error outside `InProgress` or `QuestionOutOfRange`.
    pub async fn go_to(&self, index: usize) -> Result<(), SessionError> {
        let mut inner = self.inner.lock().await;
        let state = inner.state.as_mut().ok_or(SessionError::NotStarted)?;
        state.go_to(index)
    }

    /// Advances to the next question, staying put on the last one.
    ///
    /// # Errors
    ///
    /// Returns a transition error outside `InProgress`.
    pub async fn next(&self) -> Result<(), SessionError> {
        let mut inner = self.inner.lock().await;
        let state = inner.state.as_mut().ok_or(SessionError::NotStarted)?;
        state.next()
    }

    /// Moves to the previous question, staying put on the first one.
    ///
    /// # Errors
    ///
    /// Returns a transition error outside `InProgress`.
    pub async fn prev(&self) -> Result<(), SessionError> {
        let mut inner = self.inner.lock().await;
        let state = inner.state.as_mut().ok_or(SessionError::NotStarted)?;
        state.prev()
    }

    /// Pauses the countdown without resetting remaining time.
    ///
    /// # Errors
    ///
    /// Returns a transition error outside `InProgress`.
    pub async fn pause(&self) -> Result<(), SessionError> {
        let inner = self.inner.lock().await;
        Self::in_progress_clock(&inner)?.pause();
        Ok(())
    }

    /// Resumes the countdown from the preserved remaining time.
    ///
    /// # Errors
    ///
    /// Returns a transition error outside `InProgress`.
    pub async fn resume(&self) -> Result<(), SessionError> {
        let inner = self.inner.lock().await;
        Self::in_progress_clock(&inner)?.resume();
        Ok(())
    }

    /// Submits the attempt. Idempotent: the first caller to observe
    /// `InProgress` commits; every later call — manual after timeout, a
    /// double click, a stale expiry — gets the same frozen outcome back and
    /// persists nothing new.
    ///
    /// The freeze, the clock cancellation, and the score computation all
    /// happen under the session lock before the persistence await. A failure
    /// in persistence leaves the session submitted locally; `retry_persist`
    /// replays only the persistence step.
    ///
    /// # Errors
    ///
    /// Returns `NotStarted` if no attempt is running, or `Storage` when the
    /// result repository rejects the create.
    pub async fn submit(&self, trigger: SubmitTrigger) -> Result<SubmissionOutcome, SessionError> {
        let outcome = {
            let mut inner = self.inner.lock().await;
            if let Some(existing) = inner.outcome.clone() {
                return Ok(existing);
            }

            let quiz = inner.quiz.clone().ok_or(SessionError::NotStarted)?;
            let state = inner.state.as_mut().ok_or(SessionError::NotStarted)?;

            // commit guard: only one caller gets past this line
            let answers = state.freeze()?;
            let time_spent_secs = state.elapsed_secs();

            if let Some(countdown) = inner.countdown.as_ref() {
                countdown.cancel();
            }

            let breakdown = score_attempt(quiz.questions(), &answers);
            let outcome = SubmissionOutcome {
                trigger,
                breakdown,
                time_spent_secs,
                answers,
            };
            inner.outcome = Some(outcome.clone());

            info!(
                "attempt for quiz {} submitted ({trigger:?}): {}% in {}s",
                quiz.id(),
                breakdown.score,
                time_spent_secs
            );
            outcome
        };

        self.persist_outcome(&outcome).await?;
        Ok(outcome)
    }

    /// Retries the persistence step of an already-submitted attempt.
    ///
    /// The stored outcome is replayed as-is; nothing is rescored. If the
    /// result already made it to the repository, that result is returned
    /// without another create. Concurrent retries queue behind the
    /// in-flight attempt; the losers get the winner's result.
    ///
    /// # Errors
    ///
    /// Returns `NothingToRetry` if no submission happened yet, or `Storage`
    /// when persistence fails again.
    pub async fn retry_persist(&self) -> Result<QuizResult, SessionError> {
        let outcome = {
            let inner = self.inner.lock().await;
            if let Some(result) = inner.persisted.clone() {
                return Ok(result);
            }
            inner.outcome.clone().ok_or(SessionError::NothingToRetry)?
        };

        self.persist_outcome(&outcome).await
    }

    /// Tears the attempt down without producing a result, e.g. when the user
    /// navigates away. Cancelling the clock here guarantees a stale expiry
    /// can never submit a session the user already left. Idempotent.
    ///
    /// Once a submission has committed, the event loop is left to finish on
    /// its own: aborting it could kill a timeout submission mid-persistence
    /// and lose track of a result the backend already stored.
    pub async fn abandon(&self) {
        let committed = {
            let mut inner = self.inner.lock().await;
            if let Some(countdown) = inner.countdown.take() {
                countdown.cancel();
            }
            inner.outcome.is_some()
        };
        if let Some(handle) = self.event_loop.lock().await.take() {
            if !committed {
                handle.abort();
            }
        }
    }

    pub async fn status(&self) -> SessionStatus {
        let inner = self.inner.lock().await;
        inner
            .state
            .as_ref()
            .map_or(SessionStatus::NotStarted, SessionState::status)
    }

    pub async fn elapsed_secs(&self) -> u64 {
        let inner = self.inner.lock().await;
        inner.state.as_ref().map_or(0, SessionState::elapsed_secs)
    }

    /// Seconds left on the countdown; 0 when no attempt is running.
    pub async fn remaining_secs(&self) -> u64 {
        let inner = self.inner.lock().await;
        inner
            .countdown
            .as_ref()
            .map_or(0, CountdownClock::remaining_secs)
    }

    /// Progress of the running or submitted attempt, if any.
    pub async fn progress(&self) -> Option<SessionProgress> {
        let inner = self.inner.lock().await;
        inner.state.as_ref().map(SessionState::progress)
    }

    /// The frozen outcome of the submission, once one happened.
    pub async fn outcome(&self) -> Option<SubmissionOutcome> {
        self.inner.lock().await.outcome.clone()
    }

    /// The repository-assigned result, once persistence succeeded.
    pub async fn persisted_result(&self) -> Option<QuizResult> {
        self.inner.lock().await.persisted.clone()
    }

    fn in_progress_clock(inner: &Inner) -> Result<&CountdownClock, SessionError> {
        let state = inner.state.as_ref().ok_or(SessionError::NotStarted)?;
        match state.status() {
            SessionStatus::InProgress => {
                inner.countdown.as_ref().ok_or(SessionError::NotStarted)
            }
            SessionStatus::NotStarted => Err(SessionError::NotStarted),
            SessionStatus::Submitted => Err(SessionError::AlreadySubmitted),
        }
    }

    /// Runs the single persistence step. At most one attempt is in flight at
    /// a time: callers queue on the gate, and whoever arrives after a winner
    /// finished re-reads the stored result instead of creating a second one.
    async fn persist_outcome(&self, outcome: &SubmissionOutcome) -> Result<QuizResult, SessionError> {
        let _in_flight = self.persist_gate.lock().await;

        let quiz_id = {
            let inner = self.inner.lock().await;
            if let Some(result) = inner.persisted.clone() {
                return Ok(result);
            }
            inner
                .quiz
                .as_ref()
                .map(|quiz| quiz.id())
                .ok_or(SessionError::NotStarted)?
        };

        let submitter = ResultSubmitter::new(Arc::clone(&self.results));
        let result = submitter.submit(quiz_id, outcome).await.map_err(|err| {
            error!("failed to persist result for quiz {quiz_id}: {err}");
            err
        })?;

        self.inner.lock().await.persisted = Some(result.clone());
        Ok(result)
    }

    /// Consumes clock events for the lifetime of one attempt: ticks advance
    /// elapsed time, expiry triggers the automatic timeout submission.
    async fn spawn_event_loop(&self, mut events: UnboundedReceiver<ClockEvent>) {
        let controller = self.clone();
        let handle = tokio::spawn(async move {
            while let Some(event) = events.recv().await {
                match event {
                    ClockEvent::Tick { .. } => {
                        let mut inner = controller.inner.lock().await;
                        let Some(state) = inner.state.as_mut() else {
                            break;
                        };
                        if state.status() != SessionStatus::InProgress {
                            break;
                        }
                        state.tick();
                    }
                    ClockEvent::Expired => {
                        info!("countdown expired, submitting attempt");
                        if let Err(err) = controller.submit(SubmitTrigger::Timeout).await {
                            // session stays submitted locally; the user can retry persistence
                            warn!("timeout submission could not be persisted: {err}");
                        }
                        break;
                    }
                }
            }
        });

        let mut guard = self.event_loop.lock().await;
        if let Some(old) = guard.replace(handle) {
            old.abort();
        }
    }
}
