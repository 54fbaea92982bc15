// Candidate session: the interview state machine, its countdown timers and
// score aggregation. HTTP handlers for the interviewee flow live alongside.

use thiserror::Error;
use uuid::Uuid;

use crate::intelligence::IntelligenceError;
use crate::persistence::StoreError;

pub mod controller;
pub mod guard;
pub mod handlers;
pub mod stats;
#[cfg(test)]
pub mod testing;
pub mod timer;

pub use controller::{CompleteInfo, GenerationOutcome, SessionController, SubmitOutcome};

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("candidate {0} not found")]
    NotFound(Uuid),

    #[error("access denied")]
    Forbidden,

    #[error("{0}")]
    Validation(String),

    #[error("cannot {action} while candidate is {status}")]
    InvalidTransition {
        action: &'static str,
        status: &'static str,
    },

    #[error(transparent)]
    Intelligence(#[from] IntelligenceError),

    #[error(transparent)]
    Store(#[from] StoreError),
}
