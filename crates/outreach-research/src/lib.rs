//! Company research capability for the outreach agent.
//!
//! Given a canonical domain, [`HomepageResearcher`] fetches the public
//! homepage and derives the structured context ([`ResearchContext`]) that
//! seeds every downstream prompt. Domain validation lives in
//! [`normalize_domain`] and is intentionally separate from fetching so the
//! orchestrator can reject bad input before spending retry attempts on the
//! network.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info};

mod domain;
mod error;
mod page;

pub use domain::normalize_domain;
pub use error::ResearchError;

const RAW_EXCERPT_CAP: usize = 2_000;

/// Structured company context produced once per agent run.
///
/// Immutable after production; the orchestrator owns it for the run's
/// lifetime and persists it verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResearchContext {
    /// Canonical domain (lowercase, no scheme/path).
    pub domain: String,
    pub company_name: String,
    pub summary: String,
    pub pain_points: Vec<String>,
    pub value_props: Vec<String>,
    /// URLs the context was derived from.
    pub sources: Vec<String>,
    /// Bounded excerpt of the visible homepage text.
    pub raw_excerpt: String,
}

/// Research capability consumed by the orchestrator.
#[async_trait]
pub trait CompanyResearcher: Send + Sync {
    /// Derive outreach context for an already-normalized domain.
    async fn research(&self, domain: &str) -> Result<ResearchContext, ResearchError>;
}

/// Lightweight deterministic researcher based on public homepage HTML.
pub struct HomepageResearcher {
    client: reqwest::Client,
}

impl HomepageResearcher {
    /// Build a researcher with the given fetch timeout.
    pub fn new(timeout: Duration) -> Result<Self, ResearchError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .redirect(reqwest::redirect::Policy::limited(10))
            .user_agent("Mozilla/5.0")
            .build()?;
        Ok(HomepageResearcher { client })
    }

    /// Download homepage HTML with redirect support.
    async fn fetch_text(&self, url: &str) -> Result<String, ResearchError> {
        let response = self.client.get(url).send().await?.error_for_status()?;
        Ok(response.text().await?)
    }
}

impl Default for HomepageResearcher {
    fn default() -> Self {
        // The builder only fails on TLS backend misconfiguration, which the
        // rustls feature rules out.
        Self::new(Duration::from_secs(10)).unwrap_or_else(|_| HomepageResearcher {
            client: reqwest::Client::new(),
        })
    }
}

#[async_trait]
impl CompanyResearcher for HomepageResearcher {
    async fn research(&self, domain: &str) -> Result<ResearchContext, ResearchError> {
        let homepage_url = format!("https://{domain}");
        debug!(url = %homepage_url, "fetching homepage");
        let html = self.fetch_text(&homepage_url).await?;

        let title = page::extract_title(&html);
        let visible = page::visible_text(&html);

        let company_name = page::infer_company_name(domain, &title);
        info!(domain = %domain, company = %company_name, "homepage research done");

        Ok(ResearchContext {
            domain: domain.to_string(),
            company_name: company_name.clone(),
            summary: page::build_summary(&company_name, &visible),
            pain_points: page::pain_point_signals(&visible),
            value_props: page::value_prop_signals(&visible),
            sources: vec![homepage_url],
            raw_excerpt: visible.chars().take(RAW_EXCERPT_CAP).collect(),
        })
    }
}
