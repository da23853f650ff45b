use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

use crate::collectors::ScrapePlan;
use crate::filters::FilterRules;
use crate::notifier::NotifierSettings;

#[derive(Parser, Debug, Clone)]
#[command(name = "job-alerts", about = "Scrape, filter and push new job postings")]
pub struct Config {
    /// Search terms; each is queried once locally and once remote
    #[arg(
        long,
        env = "JOB_ALERTS_SEARCH_TERMS",
        value_delimiter = ',',
        default_values = [
            "Python backend engineer",
            "Python software engineer",
            "Python developer",
            "backend engineer Python",
        ]
    )]
    pub search_terms: Vec<String>,

    /// Location for the local (on-site/hybrid) pass
    #[arg(long, env = "JOB_ALERTS_SEARCH_LOCATION", default_value = "Austin, TX")]
    pub location: String,

    /// Location for the remote pass
    #[arg(long, env = "JOB_ALERTS_SEARCH_REMOTE_LOCATION", default_value = "United States")]
    pub remote_location: String,

    /// Country context passed to boards that need one
    #[arg(long, env = "JOB_ALERTS_SEARCH_COUNTRY", default_value = "USA")]
    pub country: String,

    /// Boards to query
    #[arg(long, env = "JOB_ALERTS_JOB_SITES", value_delimiter = ',', default_values = ["linkedin", "zip_recruiter"])]
    pub sites: Vec<String>,

    /// Drop postings whose source board contains any of these
    #[arg(long, env = "JOB_ALERTS_JOB_SITES_EXCLUDE", value_delimiter = ',', default_values = ["dice", "indeed"])]
    pub sites_exclude: Vec<String>,

    /// Only keep postings newer than this many hours
    #[arg(long, env = "JOB_ALERTS_HOURS_OLD", default_value = "24")]
    pub hours_old: u32,

    /// Max results per (board, search term, pass) call
    #[arg(long, env = "JOB_ALERTS_RESULTS_WANTED", default_value = "20")]
    pub results_wanted: usize,

    /// Substrings marking a posting as contract / non-fulltime
    #[arg(
        long,
        env = "JOB_ALERTS_CONTRACT_KEYWORDS",
        value_delimiter = ',',
        default_values = [
            "consultant",
            "consulting",
            "contract",
            "contractor",
            "c2c",
            "corp-to-corp",
            "corp to corp",
            "1099",
            "w2 only",
            "temporary",
            " temp ",
            "part-time",
            "part time",
            "freelance",
            "contingent",
            "fixed-term",
        ]
    )]
    pub contract_keywords: Vec<String>,

    /// Description substrings suggesting a startup
    #[arg(
        long,
        env = "JOB_ALERTS_STARTUP_KEYWORDS",
        value_delimiter = ',',
        default_values = [
            "series a",
            "series b",
            "seed stage",
            "seed round",
            "early stage",
            "founding team",
            "ground floor",
            "fast-paced startup",
            "our startup",
            "we're a startup",
            "we are a startup",
            "pre-ipo",
        ]
    )]
    pub startup_keywords: Vec<String>,

    /// Companies never shown, regardless of any other rule
    #[arg(
        long,
        env = "JOB_ALERTS_COMPANY_EXCLUDE",
        value_delimiter = ',',
        default_values = [
            "microsoft",
            "google",
            "amazon",
            "netflix",
            "gitlab",
            "apple",
            "meta",
            "linkedin",
        ]
    )]
    pub company_exclude: Vec<String>,

    /// Companies that are never treated as startups
    #[arg(long, env = "JOB_ALERTS_COMPANY_ALLOWLIST", value_delimiter = ',')]
    pub company_allowlist: Vec<String>,

    /// Companies always treated as startups
    #[arg(long, env = "JOB_ALERTS_COMPANY_DENYLIST", value_delimiter = ',')]
    pub company_denylist: Vec<String>,

    /// Employee count below which a company counts as a startup
    #[arg(long, env = "JOB_ALERTS_MIN_COMPANY_SIZE", default_value = "500")]
    pub min_company_size: f64,

    /// Language that must appear in title or description
    #[arg(long, env = "JOB_ALERTS_TARGET_KEYWORD", default_value = "python")]
    pub target_keyword: String,

    /// Language that disqualifies a title lacking the target keyword
    #[arg(long, env = "JOB_ALERTS_COMPETING_KEYWORD", default_value = "java")]
    pub competing_keyword: String,

    /// City name accepted by the location rule
    #[arg(long, env = "JOB_ALERTS_TARGET_CITY", default_value = "austin")]
    pub target_city: String,

    /// Directory holding seen_jobs.csv and jobs.csv
    #[arg(long, env = "JOB_ALERTS_DATA_DIR", default_value = "data")]
    pub data_dir: PathBuf,

    /// ntfy server base URL
    #[arg(long, env = "JOB_ALERTS_NTFY_SERVER", default_value = "https://ntfy.sh")]
    pub ntfy_server: String,

    /// ntfy topic
    #[arg(long, env = "JOB_ALERTS_NTFY_TOPIC", default_value = "job-alerts")]
    pub ntfy_topic: String,

    #[arg(long, env = "JOB_ALERTS_NTFY_PRIORITY", default_value = "default")]
    pub ntfy_priority: String,

    #[arg(long, env = "JOB_ALERTS_NTFY_TAGS", default_value = "snake,briefcase")]
    pub ntfy_tags: String,

    /// Notification timeout in seconds
    #[arg(long, env = "JOB_ALERTS_NOTIFY_TIMEOUT", default_value = "10")]
    pub notify_timeout: u64,

    /// Per-request scrape timeout in seconds
    #[arg(long, env = "JOB_ALERTS_SCRAPE_TIMEOUT", default_value = "30")]
    pub scrape_timeout: u64,

    /// Scrape, filter and dedup, but do not notify or persist
    #[arg(long, env = "JOB_ALERTS_DRY_RUN", default_value = "false")]
    pub dry_run: bool,

    /// Emit logs as JSON lines
    #[arg(long, env = "JOB_ALERTS_LOG_JSON", default_value = "false")]
    pub log_json: bool,
}

impl Config {
    pub fn seen_jobs_path(&self) -> PathBuf {
        self.data_dir.join("seen_jobs.csv")
    }

    pub fn jobs_path(&self) -> PathBuf {
        self.data_dir.join("jobs.csv")
    }

    pub fn filter_rules(&self) -> FilterRules {
        FilterRules {
            sites_exclude: lowercase(&self.sites_exclude),
            company_exclude: lowercase(&self.company_exclude),
            company_allowlist: lowercase(&self.company_allowlist),
            company_denylist: lowercase(&self.company_denylist),
            contract_keywords: lowercase(&self.contract_keywords),
            startup_keywords: lowercase(&self.startup_keywords),
            min_company_size: self.min_company_size,
            target_keyword: self.target_keyword.to_lowercase(),
            competing_keyword: self.competing_keyword.to_lowercase(),
            target_city: self.target_city.to_lowercase(),
        }
    }

    pub fn scrape_plan(&self) -> ScrapePlan {
        ScrapePlan {
            search_terms: self.search_terms.clone(),
            location: self.location.clone(),
            remote_location: self.remote_location.clone(),
            country: self.country.clone(),
            sites: self.sites.clone(),
            hours_old: self.hours_old,
            results_wanted: self.results_wanted,
            timeout: Duration::from_secs(self.scrape_timeout),
        }
    }

    pub fn notifier_settings(&self) -> NotifierSettings {
        NotifierSettings {
            url: format!(
                "{}/{}",
                self.ntfy_server.trim_end_matches('/'),
                self.ntfy_topic
            ),
            priority: self.ntfy_priority.clone(),
            tags: self.ntfy_tags.clone(),
            timeout: Duration::from_secs(self.notify_timeout),
            language: self.target_keyword.clone(),
        }
    }
}

/// Drop blanks and lowercase, so matching can assume lowercase needles.
fn lowercase(values: &[String]) -> Vec<String> {
    values
        .iter()
        .filter(|v| !v.trim().is_empty())
        .map(|v| v.to_lowercase())
        .collect()
}
