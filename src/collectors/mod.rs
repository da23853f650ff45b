// Collector module.
// Defines the trait for job board sources and the scrape pass that fans a
// search plan out over every configured board.

pub mod linkedin;
pub mod ziprecruiter;

use std::collections::HashSet;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{NaiveDate, TimeDelta, Utc};

use crate::error::AppError;
use crate::models::posting::{IsRemote, Posting};

const REMOTE_MARKERS: [&str; 3] = ["remote", "work from home", "wfh"];

/// Parameters of a single board call.
#[derive(Debug, Clone)]
pub struct SearchQuery {
    pub search_term: String,
    pub location: String,
    pub country: String,
    pub results_wanted: usize,
    pub hours_old: u32,
    pub is_remote: bool,
}

/// Everything a scrape run needs: terms, locations, boards and limits.
#[derive(Debug, Clone)]
pub struct ScrapePlan {
    pub search_terms: Vec<String>,
    pub location: String,
    pub remote_location: String,
    pub country: String,
    pub sites: Vec<String>,
    pub hours_old: u32,
    pub results_wanted: usize,
    pub timeout: Duration,
}

impl ScrapePlan {
    /// Two queries per term: the local location, then remote nationwide.
    pub fn queries(&self) -> Vec<SearchQuery> {
        self.search_terms
            .iter()
            .flat_map(|term| {
                [(self.location.as_str(), false), (self.remote_location.as_str(), true)].map(
                    |(location, is_remote)| SearchQuery {
                        search_term: term.clone(),
                        location: location.to_string(),
                        country: self.country.clone(),
                        results_wanted: self.results_wanted,
                        hours_old: self.hours_old,
                        is_remote,
                    },
                )
            })
            .collect()
    }
}

/// Trait that all job board sources must implement.
#[async_trait]
pub trait JobCollector: Send + Sync {
    /// Board identifier, also stored in `Posting::site`.
    fn name(&self) -> &str;

    /// Fetch postings for one query.
    async fn collect(&self, query: &SearchQuery) -> Result<Vec<Posting>, AppError>;
}

/// Resolve a board identifier to its collector.
pub fn get_collector(name: &str, timeout: Duration) -> Result<Box<dyn JobCollector>, AppError> {
    match name.trim().to_lowercase().as_str() {
        "linkedin" => Ok(Box::new(linkedin::LinkedIn::new(timeout)?)),
        "zip_recruiter" | "ziprecruiter" => {
            Ok(Box::new(ziprecruiter::ZipRecruiter::new(timeout)?))
        }
        other => Err(AppError::UnknownSite(other.to_string())),
    }
}

/// Build collectors for the plan's boards. Unknown boards are skipped.
pub fn build_collectors(plan: &ScrapePlan) -> Vec<Box<dyn JobCollector>> {
    let mut collectors = Vec::new();
    for site in &plan.sites {
        match get_collector(site, plan.timeout) {
            Ok(c) => collectors.push(c),
            Err(e) => tracing::warn!("Skipping board '{site}': {e}"),
        }
    }
    collectors
}

/// Run the plan against the given collectors. A failing call contributes no
/// rows. The result is de-duplicated and stripped of stale rows.
pub async fn scrape_all(collectors: &[Box<dyn JobCollector>], plan: &ScrapePlan) -> Vec<Posting> {
    let mut rows = Vec::new();

    for query in plan.queries() {
        for collector in collectors {
            match collector.collect(&query).await {
                Ok(found) => {
                    tracing::debug!(
                        "{} returned {} for '{}' ({})",
                        collector.name(),
                        found.len(),
                        query.search_term,
                        query.location
                    );
                    rows.extend(found);
                }
                Err(e) => {
                    tracing::warn!(
                        "{} failed for '{}' ({}): {e}",
                        collector.name(),
                        query.search_term,
                        query.location
                    );
                }
            }
        }
    }

    let cutoff = (Utc::now() - TimeDelta::hours(i64::from(plan.hours_old))).date_naive();
    let fresh = rows.into_iter().filter(|p| !is_stale(p, cutoff));
    merge(fresh)
}

/// Collapse duplicates by URL, or by (title, company) when the URL is
/// missing. The first occurrence wins.
pub fn merge(rows: impl IntoIterator<Item = Posting>) -> Vec<Posting> {
    let mut keys = HashSet::new();
    rows.into_iter()
        .filter(|p| keys.insert(p.merge_key()))
        .collect()
}

fn is_stale(posting: &Posting, cutoff: NaiveDate) -> bool {
    posting.date_posted.is_some_and(|d| d < cutoff)
}

/// Remote flag for a scraped row. Rows from a remote-constrained call are
/// remote; otherwise look for remote markers in the text fields.
pub fn detect_remote(
    remote_query: bool,
    title: &str,
    location: &str,
    description: Option<&str>,
) -> IsRemote {
    if remote_query {
        return IsRemote::True;
    }
    let text = format!("{title} {location} {}", description.unwrap_or_default()).to_lowercase();
    IsRemote::from(REMOTE_MARKERS.iter().any(|m| text.contains(m)))
}
