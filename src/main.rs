mod collectors;
mod config;
mod dedup;
mod error;
mod filters;
mod models;
mod notifier;
mod runner;
mod writer;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::config::Config;
use crate::runner::RunOutcome;

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let config = Config::parse();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("job_alerts=info"));
    if config.log_json {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }

    tracing::info!("Starting job alert run...");
    match runner::run(&config).await? {
        RunOutcome::NoPostings => tracing::info!("No postings found, exiting"),
        RunOutcome::AllFiltered { dropped } => {
            tracing::info!("All {dropped} postings filtered out, nothing to report")
        }
        RunOutcome::NothingNew { kept } => {
            tracing::info!("None of {kept} matching postings are new, nothing to report")
        }
        RunOutcome::DryRun { new } => {
            tracing::info!("Dry run found {new} new job(s); nothing sent or saved")
        }
        RunOutcome::Reported { new, notified } => {
            if !notified {
                tracing::warn!("Notification was not delivered; jobs were still saved");
            }
            tracing::info!("Done, reported {new} new job(s)");
        }
    }

    Ok(())
}
