//! Outreach Agent CLI
//!
//! The `outreach` command drives the SDR pipeline and inspects the CRM.
//!
//! ## Commands
//!
//! - `run`: execute one research → draft → reflect → evaluate → persist run
//! - `metrics`: 7-day aggregate evaluation metrics
//! - `trends`: dimension-level quality trends
//! - `crm recent` / `crm full`: stored CRM records
//! - `regression`: recent-vs-baseline quality comparison

use std::sync::Arc;

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::{info, Level};

use lead_ledger::{LeadStore, SurrealLeadStore};
use outreach_agent::{AgentPolicy, OutreachAgent};
use outreach_llm::{build_generator, LlmConfig};
use outreach_research::HomepageResearcher;

mod telemetry;

#[derive(Parser)]
#[command(name = "outreach")]
#[command(author = "Fathom Labs")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Autonomous SDR outreach pipeline", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one agent execution for a single domain input
    Run {
        /// Company domain or homepage URL (e.g. stripe.com)
        domain: String,
    },

    /// Show 7-day aggregate evaluation metrics
    Metrics,

    /// Show dimension-level quality trends
    Trends {
        /// Trailing window in days (clamped to 3-90)
        #[arg(long, default_value_t = 14)]
        days: u32,
    },

    /// Inspect stored CRM records
    Crm {
        #[command(subcommand)]
        action: CrmAction,
    },

    /// Compare recent quality window against the baseline window
    Regression {
        /// Average-score drop that counts as a regression
        #[arg(long, default_value_t = 0.5)]
        threshold_drop: f64,
    },
}

#[derive(Subcommand)]
enum CrmAction {
    /// Compact recent-run list for quick summaries
    Recent {
        #[arg(long, default_value_t = 10)]
        limit: u32,
    },

    /// Full-fidelity records with research, email, and eval fields
    Full {
        #[arg(long, default_value_t = 500)]
        limit: u32,
    },
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    telemetry::init_tracing(cli.json, level);

    let store = Arc::new(SurrealLeadStore::from_env().await?);

    match cli.command {
        Commands::Run { domain } => {
            let llm = build_generator(&LlmConfig::from_env()?)?;
            let researcher = Arc::new(HomepageResearcher::default());
            let agent = OutreachAgent::new(llm, researcher, store, AgentPolicy::from_env());

            info!(domain = %domain, "received run request");
            match agent.run(&domain).await {
                Ok(result) => print_json(&result)?,
                Err(err) if err.is_client_error() => bail!("rejected input: {err}"),
                Err(err) => return Err(err.into()),
            }
        }
        Commands::Metrics => print_json(&store.metrics_7d().await?)?,
        Commands::Trends { days } => print_json(&store.dimension_trends(days).await?)?,
        Commands::Crm { action } => match action {
            CrmAction::Recent { limit } => print_json(&store.recent_records(limit).await?)?,
            CrmAction::Full { limit } => print_json(&store.full_records(limit).await?)?,
        },
        Commands::Regression { threshold_drop } => {
            print_json(&store.regression_status(threshold_drop).await?)?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn run_subcommand_parses_domain() {
        let cli = Cli::parse_from(["outreach", "run", "stripe.com"]);
        match cli.command {
            Commands::Run { domain } => assert_eq!(domain, "stripe.com"),
            _ => panic!("expected run subcommand"),
        }
    }

    #[test]
    fn crm_limits_have_defaults() {
        let cli = Cli::parse_from(["outreach", "crm", "recent"]);
        match cli.command {
            Commands::Crm {
                action: CrmAction::Recent { limit },
            } => assert_eq!(limit, 10),
            _ => panic!("expected crm recent subcommand"),
        }
    }
}
