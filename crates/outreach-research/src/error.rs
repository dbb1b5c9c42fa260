//! Error types for the research capability.

use thiserror::Error;

/// Errors raised while researching a company domain.
///
/// `InvalidDomain` is a client-input error and must never be retried;
/// `Fetch` is a generic backend failure and is safe to retry.
#[derive(Debug, Error)]
pub enum ResearchError {
    /// The supplied domain string cannot be normalized into a host.
    #[error("invalid domain: {input:?}")]
    InvalidDomain { input: String },

    /// Fetching the homepage failed (connect, timeout, non-success status).
    #[error("homepage fetch failed: {0}")]
    Fetch(#[from] reqwest::Error),

    /// Generic backend failure from a non-HTTP researcher implementation.
    #[error("research backend failure: {0}")]
    Backend(String),
}

impl ResearchError {
    /// Whether this failure was caused by bad caller input rather than the
    /// network or the remote site.
    pub fn is_client_error(&self) -> bool {
        matches!(self, ResearchError::InvalidDomain { .. })
    }
}
