use anyhow::Context;

use crate::collectors::{self, JobCollector};
use crate::config::Config;
use crate::dedup::SeenStore;
use crate::filters::{FilterOutcome, apply_filters};
use crate::models::posting::Posting;
use crate::notifier::Notifier;
use crate::writer::JobLog;

/// How a run ended. Every empty stage ends the run early.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    NoPostings,
    AllFiltered { dropped: usize },
    NothingNew { kept: usize },
    DryRun { new: usize },
    Reported { new: usize, notified: bool },
}

/// One full pass: scrape, filter, dedup, notify, persist.
pub async fn run(config: &Config) -> anyhow::Result<RunOutcome> {
    let sources = collectors::build_collectors(&config.scrape_plan());

    let notifier =
        Notifier::new(config.notifier_settings()).context("Failed to build notifier client")?;
    process_run(config, &sources, &notifier).await
}

async fn process_run(
    config: &Config,
    sources: &[Box<dyn JobCollector>],
    notifier: &Notifier,
) -> anyhow::Result<RunOutcome> {
    tracing::info!("Scraping job boards...");
    let raw = collectors::scrape_all(sources, &config.scrape_plan()).await;
    tracing::info!("{} raw postings retrieved", raw.len());
    if raw.is_empty() {
        return Ok(RunOutcome::NoPostings);
    }

    let FilterOutcome {
        kept: filtered,
        dropped,
    } = apply_filters(raw, &config.filter_rules());
    if filtered.is_empty() {
        return Ok(RunOutcome::AllFiltered { dropped });
    }

    let kept = filtered.len();
    let store = SeenStore::new(config.seen_jobs_path());
    let new = store
        .filter_new(filtered)
        .with_context(|| format!("Failed to read {}", store.path().display()))?;
    if new.is_empty() {
        return Ok(RunOutcome::NothingNew { kept });
    }

    let postings: Vec<&Posting> = new.iter().map(|n| &n.posting).collect();

    if config.dry_run {
        for p in &postings {
            tracing::info!("[dry run] {} @ {} {}", p.title(), p.company(), p.job_url());
        }
        return Ok(RunOutcome::DryRun { new: new.len() });
    }

    let notified = notifier.notify(&postings).await;

    let log = JobLog::new(config.jobs_path());
    log.append(postings.iter().copied())
        .with_context(|| format!("Failed to append to {}", log.path().display()))?;
    store
        .mark_seen(&new)
        .with_context(|| format!("Failed to update {}", store.path().display()))?;

    Ok(RunOutcome::Reported {
        new: new.len(),
        notified,
    })
}
