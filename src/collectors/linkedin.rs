use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use scraper::{ElementRef, Html, Selector};

use crate::collectors::{JobCollector, SearchQuery, detect_remote};
use crate::error::AppError;
use crate::models::posting::Posting;

const SEARCH_URL: &str = "https://www.linkedin.com/jobs-guest/jobs/api/seeMoreJobPostings/search";
const VIEW_URL: &str = "https://www.linkedin.com/jobs/view";
const PAGE_SIZE: usize = 25;
/// The guest endpoint stops returning cards past this offset.
const MAX_OFFSET: usize = 1000;
const PAGE_DELAY: Duration = Duration::from_secs(2);

pub struct LinkedIn {
    client: reqwest::Client,
}

impl LinkedIn {
    pub fn new(timeout: Duration) -> Result<Self, AppError> {
        let client = reqwest::Client::builder()
            .user_agent("Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36")
            .timeout(timeout)
            .build()?;
        Ok(Self { client })
    }

    async fn fetch_page(&self, query: &SearchQuery, start: usize) -> Result<String, AppError> {
        let mut params = vec![
            ("keywords", query.search_term.clone()),
            ("location", query.location.clone()),
            ("distance", "50".to_string()),
            ("pageNum", "0".to_string()),
            ("start", start.to_string()),
        ];
        if query.hours_old > 0 {
            params.push(("f_TPR", format!("r{}", u64::from(query.hours_old) * 3600)));
        }
        if query.is_remote {
            params.push(("f_WT", "2".to_string()));
        }

        let resp = self
            .client
            .get(SEARCH_URL)
            .query(&params)
            .header("Accept", "text/html,application/xhtml+xml,*/*;q=0.8")
            .header("Accept-Language", "en-US,en;q=0.9")
            .send()
            .await?;

        if resp.status().as_u16() == 429 {
            return Err(AppError::Source("LinkedIn returned 429 Too Many Requests".to_string()));
        }
        if !resp.status().is_success() {
            return Err(AppError::Source(format!("LinkedIn returned {}", resp.status())));
        }

        Ok(resp.text().await?)
    }
}

#[async_trait]
impl JobCollector for LinkedIn {
    fn name(&self) -> &str {
        "linkedin"
    }

    async fn collect(&self, query: &SearchQuery) -> Result<Vec<Posting>, AppError> {
        let mut jobs: Vec<Posting> = Vec::new();
        let mut start = 0;

        while jobs.len() < query.results_wanted && start < MAX_OFFSET {
            let html = match self.fetch_page(query, start).await {
                Ok(html) => html,
                // Keep what earlier pages produced.
                Err(e) if !jobs.is_empty() => {
                    tracing::warn!("LinkedIn paging stopped at offset {start}: {e}");
                    break;
                }
                Err(e) => return Err(e),
            };

            let page = parse_cards(&html, query.is_remote)?;
            if page.is_empty() {
                break;
            }
            start += page.len().max(PAGE_SIZE);
            jobs.extend(page);

            if jobs.len() < query.results_wanted {
                tokio::time::sleep(PAGE_DELAY).await;
            }
        }

        jobs.truncate(query.results_wanted);
        Ok(jobs)
    }
}

/// Selectors for the guest search card markup.
struct CardSelectors {
    card: Selector,
    link: Selector,
    title: Selector,
    title_fallback: Selector,
    company: Selector,
    location: Selector,
    time: Selector,
}

impl CardSelectors {
    fn new() -> Result<Self, AppError> {
        let parse = |css: &str| {
            Selector::parse(css)
                .map_err(|e| AppError::Source(format!("Invalid selector '{css}': {e}")))
        };
        Ok(Self {
            card: parse("div.base-search-card")?,
            link: parse("a.base-card__full-link")?,
            title: parse("h3.base-search-card__title")?,
            title_fallback: parse("span.sr-only")?,
            company: parse("h4.base-search-card__subtitle")?,
            location: parse("span.job-search-card__location")?,
            time: parse("time")?,
        })
    }
}

/// Parse the job cards of one guest search page.
fn parse_cards(html: &str, remote_query: bool) -> Result<Vec<Posting>, AppError> {
    let selectors = CardSelectors::new()?;
    let document = Html::parse_document(html);
    Ok(document
        .select(&selectors.card)
        .filter_map(|c| parse_card(c, &selectors, remote_query))
        .collect())
}

fn parse_card(card: ElementRef<'_>, sel: &CardSelectors, remote_query: bool) -> Option<Posting> {
    let href = card
        .select(&sel.link)
        .next()
        .and_then(|a| a.value().attr("href"))?;
    let job_url = canonical_url(href);

    let title = text_of(card, &sel.title)
        .or_else(|| text_of(card, &sel.title_fallback))
        .unwrap_or_else(|| "N/A".to_string());
    let company = text_of(card, &sel.company);
    let location = text_of(card, &sel.location);

    let date_posted = card
        .select(&sel.time)
        .next()
        .and_then(|t| t.value().attr("datetime"))
        .and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok());

    let is_remote = detect_remote(remote_query, &title, location.as_deref().unwrap_or(""), None);

    Some(Posting {
        title: Some(title),
        company,
        location,
        is_remote,
        job_url: Some(job_url),
        description: None,
        job_type: None,
        site: Some("linkedin".to_string()),
        company_num_employees: None,
        date_posted,
    })
}

/// `https://www.linkedin.com/jobs/view/python-dev-at-acme-4012345?refId=..`
/// becomes `https://www.linkedin.com/jobs/view/4012345`.
fn canonical_url(href: &str) -> String {
    let path = href.split('?').next().unwrap_or(href).trim_end_matches('/');
    let slug = path.rsplit('/').next().unwrap_or(path);
    let id = slug.rsplit('-').next().unwrap_or(slug);
    if !id.is_empty() && id.chars().all(|c| c.is_ascii_digit()) {
        format!("{VIEW_URL}/{id}")
    } else {
        path.to_string()
    }
}

fn text_of(el: ElementRef<'_>, selector: &Selector) -> Option<String> {
    let text = el
        .select(selector)
        .next()?
        .text()
        .collect::<Vec<_>>()
        .join(" ");
    let text = text.split_whitespace().collect::<Vec<_>>().join(" ");
    (!text.is_empty()).then_some(text)
}
