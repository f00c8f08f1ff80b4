mod controller;
mod countdown;
mod state;
mod submit;

// Public API of the session engine.
pub use crate::error::SessionError;
pub use controller::{SessionController, SubmissionOutcome, SubmitTrigger};
pub use countdown::{ClockEvent, CountdownClock};
pub use state::{SessionProgress, SessionState, SessionStatus};
pub use submit::ResultSubmitter;
