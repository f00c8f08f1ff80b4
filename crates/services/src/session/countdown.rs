use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;
use tokio::time;

/// Event emitted by the countdown ticker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClockEvent {
    /// One second elapsed; `remaining_secs` is the count after this tick.
    Tick { remaining_secs: u64 },
    /// Remaining time reached zero. Emitted exactly once, after the final tick.
    Expired,
}

#[derive(Debug)]
struct ClockInner {
    remaining_secs: u64,
    active: bool,
    expired: bool,
    cancelled: bool,
}

/// Cancellable, pausable 1-second countdown.
///
/// `start` spawns the ticker task and hands back the event stream. While
/// active, one `Tick` is sent per second with the remaining count down to
/// zero, followed by a single `Expired`, after which the ticker stops for
/// good. Pausing keeps the remaining count; cancelling guarantees that no
/// event is delivered afterwards, even one already scheduled — the
/// cancelled flag and every send happen under the same lock.
#[derive(Clone)]
pub struct CountdownClock {
    inner: Arc<Mutex<ClockInner>>,
    ticker: Arc<Mutex<Option<JoinHandle<()>>>>,
}

impl CountdownClock {
    /// A clock for a time budget of whole minutes, initially paused.
    #[must_use]
    pub fn new(minutes: u32) -> Self {
        Self {
            inner: Arc::new(Mutex::new(ClockInner {
                remaining_secs: u64::from(minutes) * 60,
                active: false,
                expired: false,
                cancelled: false,
            })),
            ticker: Arc::new(Mutex::new(None)),
        }
    }

    /// Activates the clock and spawns the ticker task.
    ///
    /// Returns the receiving end of the event stream. Calling `start` again
    /// replaces the previous ticker and its stream.
    pub fn start(&self) -> UnboundedReceiver<ClockEvent> {
        let (tx, rx) = mpsc::unbounded_channel();

        {
            let mut inner = lock(&self.inner);
            inner.active = true;
        }

        let shared = Arc::clone(&self.inner);
        let handle = tokio::spawn(async move {
            run_ticker(shared, tx).await;
        });

        let mut guard = lock(&self.ticker);
        if let Some(old) = guard.replace(handle) {
            old.abort();
        }

        rx
    }

    /// Pauses ticking without resetting the remaining time.
    pub fn pause(&self) {
        lock(&self.inner).active = false;
    }

    /// Resumes ticking from the preserved remaining count.
    pub fn resume(&self) {
        lock(&self.inner).active = true;
    }

    /// Stops the clock permanently. No tick or expiry is delivered after
    /// this returns.
    pub fn cancel(&self) {
        {
            let mut inner = lock(&self.inner);
            inner.cancelled = true;
            inner.active = false;
        }
        if let Some(handle) = lock(&self.ticker).take() {
            handle.abort();
        }
    }

    #[must_use]
    pub fn remaining_secs(&self) -> u64 {
        lock(&self.inner).remaining_secs
    }

    #[must_use]
    pub fn is_expired(&self) -> bool {
        lock(&self.inner).expired
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        lock(&self.inner).cancelled
    }
}

async fn run_ticker(shared: Arc<Mutex<ClockInner>>, tx: UnboundedSender<ClockEvent>) {
    let mut interval = time::interval(Duration::from_secs(1));
    // the first interval tick completes immediately; real ticks start a second in
    interval.tick().await;

    loop {
        interval.tick().await;

        let done = {
            let mut inner = lock(&shared);
            if inner.cancelled || inner.expired {
                true
            } else if !inner.active {
                // paused second: no event, remaining unchanged
                false
            } else {
                inner.remaining_secs = inner.remaining_secs.saturating_sub(1);
                let remaining = inner.remaining_secs;
                if tx
                    .send(ClockEvent::Tick {
                        remaining_secs: remaining,
                    })
                    .is_err()
                {
                    true
                } else if remaining == 0 {
                    inner.expired = true;
                    let _ = tx.send(ClockEvent::Expired);
                    true
                } else {
                    false
                }
            }
        };

        if done {
            break;
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    // the lock is only ever held for plain field updates, so a poisoned
    // guard still carries consistent state
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
