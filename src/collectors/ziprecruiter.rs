use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate};
use scraper::Html;
use serde::Deserialize;

use crate::collectors::{JobCollector, SearchQuery, detect_remote};
use crate::error::AppError;
use crate::models::posting::Posting;

const API_URL: &str = "https://api.ziprecruiter.com/jobs-app/jobs";
const JOB_URL: &str = "https://www.ziprecruiter.com/jobs//j";
const RADIUS_MILES: u32 = 25;
const MAX_PAGES: usize = 10;
const PAGE_DELAY: Duration = Duration::from_secs(2);

pub struct ZipRecruiter {
    client: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    jobs: Vec<ZipJob>,
    #[serde(rename = "continue")]
    continue_from: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ZipJob {
    name: Option<String>,
    listing_key: Option<String>,
    hiring_company: Option<HiringCompany>,
    job_city: Option<String>,
    job_state: Option<String>,
    job_country: Option<String>,
    job_description: Option<String>,
    employment_type: Option<String>,
    posted_time: Option<String>,
}

#[derive(Debug, Deserialize)]
struct HiringCompany {
    name: Option<String>,
}

impl ZipRecruiter {
    pub fn new(timeout: Duration) -> Result<Self, AppError> {
        let client = reqwest::Client::builder()
            .user_agent("Job Search/87.0 (iPhone; CPU iOS 16_6_1 like Mac OS X)")
            .timeout(timeout)
            .build()?;
        Ok(Self { client })
    }

    async fn fetch_page(
        &self,
        query: &SearchQuery,
        continue_from: Option<&str>,
    ) -> Result<SearchResponse, AppError> {
        let resp = self
            .client
            .get(API_URL)
            .query(&search_params(query, continue_from))
            .header("Accept", "*/*")
            .header("Accept-Language", "en-US,en;q=0.9")
            .send()
            .await?;

        if resp.status().as_u16() == 429 {
            return Err(AppError::Source(
                "ZipRecruiter returned 429 Too Many Requests".to_string(),
            ));
        }
        if !resp.status().is_success() {
            return Err(AppError::Source(format!(
                "ZipRecruiter returned {}",
                resp.status()
            )));
        }

        Ok(resp.json().await?)
    }
}

#[async_trait]
impl JobCollector for ZipRecruiter {
    fn name(&self) -> &str {
        "zip_recruiter"
    }

    async fn collect(&self, query: &SearchQuery) -> Result<Vec<Posting>, AppError> {
        if !covers_country(&query.country) {
            return Err(AppError::Source(format!(
                "ZipRecruiter does not cover country '{}'",
                query.country
            )));
        }

        let mut jobs = Vec::new();
        let mut token: Option<String> = None;

        for page in 0..MAX_PAGES {
            if page > 0 {
                tokio::time::sleep(PAGE_DELAY).await;
            }

            let resp = match self.fetch_page(query, token.as_deref()).await {
                Ok(resp) => resp,
                Err(e) if !jobs.is_empty() => {
                    tracing::warn!("ZipRecruiter paging stopped after page {page}: {e}");
                    break;
                }
                Err(e) => return Err(e),
            };

            let found = resp.jobs.len();
            jobs.extend(
                resp.jobs
                    .into_iter()
                    .filter_map(|j| parse_job(j, query.is_remote)),
            );

            token = resp.continue_from;
            if found == 0 || token.is_none() || jobs.len() >= query.results_wanted {
                break;
            }
        }

        jobs.truncate(query.results_wanted);
        Ok(jobs)
    }
}

fn search_params(query: &SearchQuery, continue_from: Option<&str>) -> Vec<(&'static str, String)> {
    // The API filters by whole days.
    let days = query.hours_old.div_ceil(24).max(1);

    let mut params = vec![
        ("search", query.search_term.clone()),
        ("location", query.location.clone()),
        ("days", days.to_string()),
        ("radius", RADIUS_MILES.to_string()),
    ];
    if query.is_remote {
        params.push(("refine_by_location_type", "only_remote".to_string()));
    }
    if let Some(token) = continue_from {
        params.push(("continue_from", token.to_string()));
    }
    params
}

fn parse_job(job: ZipJob, remote_query: bool) -> Option<Posting> {
    let listing_key = job.listing_key.filter(|k| !k.is_empty())?;
    let title = job.name.unwrap_or_else(|| "N/A".to_string());

    let location = [job.job_city, job.job_state, job.job_country]
        .into_iter()
        .flatten()
        .filter(|part| !part.trim().is_empty())
        .collect::<Vec<_>>()
        .join(", ");
    let location = (!location.is_empty()).then_some(location);

    let description = job.job_description.as_deref().map(strip_html);
    let is_remote = detect_remote(
        remote_query,
        &title,
        location.as_deref().unwrap_or(""),
        description.as_deref(),
    );

    // "full_time" -> "fulltime", matching the other boards' spelling.
    let job_type = job
        .employment_type
        .map(|t| t.replace(['_', ' '], "").to_lowercase())
        .filter(|t| !t.is_empty());

    let date_posted = job
        .posted_time
        .as_deref()
        .and_then(|t| DateTime::parse_from_rfc3339(t).ok())
        .map(|t| t.date_naive())
        .or_else(|| {
            job.posted_time
                .as_deref()
                .and_then(|t| NaiveDate::parse_from_str(t.get(..10)?, "%Y-%m-%d").ok())
        });

    Some(Posting {
        title: Some(title),
        company: job.hiring_company.and_then(|c| c.name),
        location,
        is_remote,
        job_url: Some(format!("{JOB_URL}?lvk={listing_key}")),
        description,
        job_type,
        site: Some("zip_recruiter".to_string()),
        company_num_employees: None,
        date_posted,
    })
}

/// ZipRecruiter only lists US and Canadian jobs.
fn covers_country(country: &str) -> bool {
    matches!(
        country.trim().to_lowercase().as_str(),
        "usa" | "us" | "united states" | "canada" | "ca"
    )
}

fn strip_html(html: &str) -> String {
    let fragment = Html::parse_fragment(html);
    fragment
        .root_element()
        .text()
        .collect::<Vec<_>>()
        .join(" ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::posting::IsRemote;

    const RESPONSE: &str = r#"{
        "jobs": [
            {
                "name": "Python Developer",
                "listing_key": "abc123",
                "hiring_company": {"name": "Acme"},
                "job_city": "Austin",
                "job_state": "TX",
                "job_country": "US",
                "job_description": "<p>Build <b>Python</b> services.</p><p>Hybrid in Austin.</p>",
                "employment_type": "full_time",
                "posted_time": "2026-10-18T14:03:00Z"
            },
            {
                "name": "Orphan",
                "hiring_company": {"name": "NoKey"}
            },
            {
                "name": "Remote Engineer",
                "listing_key": "xyz",
                "job_description": "Fully remote role",
                "employment_type": "Part Time"
            }
        ],
        "continue": "next-token"
    }"#;

    #[test]
    fn parses_search_response() {
        let resp: SearchResponse = serde_json::from_str(RESPONSE).unwrap();
        assert_eq!(resp.continue_from.as_deref(), Some("next-token"));

        let jobs: Vec<Posting> = resp
            .jobs
            .into_iter()
            .filter_map(|j| parse_job(j, false))
            .collect();
        assert_eq!(jobs.len(), 2);

        let first = &jobs[0];
        assert_eq!(first.company(), "Acme");
        assert_eq!(first.location(), "Austin, TX, US");
        assert_eq!(first.job_url(), "https://www.ziprecruiter.com/jobs//j?lvk=abc123");
        assert_eq!(first.description(), "Build Python services. Hybrid in Austin.");
        assert_eq!(first.job_type(), "fulltime");
        assert_eq!(first.is_remote, IsRemote::False);
        assert_eq!(first.date_posted, NaiveDate::from_ymd_opt(2026, 10, 18));

        let second = &jobs[1];
        assert_eq!(second.location, None);
        assert_eq!(second.company, None);
        assert_eq!(second.job_type(), "parttime");
        assert_eq!(second.is_remote, IsRemote::True);
    }

    #[test]
    fn search_params_use_25_mile_radius_and_whole_days() {
        let query = SearchQuery {
            search_term: "python".into(),
            location: "United States".into(),
            country: "USA".into(),
            results_wanted: 20,
            hours_old: 30,
            is_remote: true,
        };
        let params = search_params(&query, Some("tok"));
        let get = |k: &str| {
            params
                .iter()
                .find(|(name, _)| *name == k)
                .map(|(_, v)| v.as_str())
        };
        assert_eq!(get("radius"), Some("25"));
        assert_eq!(get("days"), Some("2"));
        assert_eq!(get("refine_by_location_type"), Some("only_remote"));
        assert_eq!(get("continue_from"), Some("tok"));

        let local = SearchQuery {
            is_remote: false,
            hours_old: 0,
            ..query
        };
        let params = search_params(&local, None);
        assert!(params.iter().all(|(name, _)| *name != "refine_by_location_type"));
        assert!(params.contains(&("days", "1".to_string())));
    }

    #[test]
    fn country_coverage() {
        assert!(covers_country("USA"));
        assert!(covers_country(" Canada "));
        assert!(!covers_country("Germany"));
    }

    #[test]
    fn missing_continue_token_is_none() {
        let resp: SearchResponse = serde_json::from_str(r#"{"jobs": []}"#).unwrap();
        assert!(resp.jobs.is_empty());
        assert!(resp.continue_from.is_none());
    }
}
