//! Run-level error taxonomy.
//!
//! Callers need to distinguish three things: bad input (never retryable),
//! an unavailable backend (retries already spent), and a producer that
//! could not be coerced into valid structured output. Each gets its own
//! variant; nothing downstream of a failure executes.

use thiserror::Error;

use crate::structured::StructuredOutputError;
use lead_ledger::StorageError;
use outreach_research::ResearchError;

/// Errors that terminate an agent run.
#[derive(Debug, Error)]
pub enum AgentError {
    /// The supplied domain string is malformed; checked before any
    /// backend call, so no retry attempts are spent on it.
    #[error("invalid domain: {input:?}")]
    InvalidDomain { input: String },

    /// Research kept failing until the retry budget was spent; carries the
    /// last underlying failure unchanged.
    #[error("research failed after {attempts} attempts")]
    ResearchExhausted {
        attempts: u32,
        #[source]
        source: ResearchError,
    },

    /// The producer never yielded valid structured output, even after the
    /// bounded repair rounds.
    #[error(transparent)]
    StructuredOutput(#[from] StructuredOutputError),

    /// The single atomic persistence write failed; surfaced untouched and
    /// never retried here.
    #[error(transparent)]
    Persistence(#[from] StorageError),

    /// The injected policy is unusable (for example a zero retry budget).
    #[error("invalid agent policy: {0}")]
    Policy(String),
}

impl AgentError {
    /// Whether the failure was caused by caller input rather than any
    /// backend; API surfaces map this to a client error.
    pub fn is_client_error(&self) -> bool {
        matches!(self, AgentError::InvalidDomain { .. })
    }
}
