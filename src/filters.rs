// Filtering pipeline for scraped postings.
// Each predicate returns true when the posting should be DROPPED; a posting
// survives only if no predicate fires.

use crate::models::posting::Posting;

const FULLTIME_SPELLINGS: [&str; 3] = ["fulltime", "full_time", "full-time"];
const PART_TIME_SIGNALS: [&str; 4] = ["part-time", "part time", "parttime", "per diem"];

/// Rule set consumed by the predicates. Every string is expected lowercase.
#[derive(Debug, Clone, Default)]
pub struct FilterRules {
    pub sites_exclude: Vec<String>,
    pub company_exclude: Vec<String>,
    pub company_allowlist: Vec<String>,
    pub company_denylist: Vec<String>,
    pub contract_keywords: Vec<String>,
    pub startup_keywords: Vec<String>,
    pub min_company_size: f64,
    pub target_keyword: String,
    pub competing_keyword: String,
    pub target_city: String,
}

pub type Predicate = fn(&Posting, &FilterRules) -> bool;

/// Drop predicates in evaluation order, named for logging.
pub const PREDICATES: [(&str, Predicate); 9] = [
    ("excluded_site", is_excluded_site),
    ("excluded_company", is_excluded_company),
    ("lacks_keyword", lacks_keyword),
    ("fullstack_without_backend", is_fullstack_without_backend),
    ("competing_without_target", is_competing_without_target),
    ("contract", is_contract),
    ("startup", is_startup),
    ("wrong_location", is_wrong_location),
    ("not_fulltime", is_not_fulltime),
];

/// Outcome of a filter pass.
#[derive(Debug)]
pub struct FilterOutcome {
    pub kept: Vec<Posting>,
    pub dropped: usize,
}

/// Keep only postings for which no predicate fires. Order is preserved.
pub fn apply_filters(postings: Vec<Posting>, rules: &FilterRules) -> FilterOutcome {
    let total = postings.len();
    let kept: Vec<Posting> = postings
        .into_iter()
        .filter(|p| match drop_reason(p, rules) {
            Some(reason) => {
                tracing::debug!("Dropped '{}' @ '{}': {reason}", p.title(), p.company());
                false
            }
            None => true,
        })
        .collect();

    let dropped = total - kept.len();
    tracing::info!("Kept {} / {total} postings ({dropped} dropped)", kept.len());
    FilterOutcome { kept, dropped }
}

/// Name of the first predicate that drops this posting, if any.
pub fn drop_reason(posting: &Posting, rules: &FilterRules) -> Option<&'static str> {
    PREDICATES
        .iter()
        .find(|(_, predicate)| predicate(posting, rules))
        .map(|(name, _)| *name)
}

fn contains_any(haystack: &str, needles: &[String]) -> bool {
    needles.iter().any(|n| haystack.contains(n.as_str()))
}

pub fn is_excluded_site(posting: &Posting, rules: &FilterRules) -> bool {
    contains_any(&posting.site().to_lowercase(), &rules.sites_exclude)
}

pub fn is_excluded_company(posting: &Posting, rules: &FilterRules) -> bool {
    contains_any(&posting.company().to_lowercase(), &rules.company_exclude)
}

pub fn lacks_keyword(posting: &Posting, rules: &FilterRules) -> bool {
    let keyword = rules.target_keyword.as_str();
    !posting.title().to_lowercase().contains(keyword)
        && !posting.description().to_lowercase().contains(keyword)
}

pub fn is_fullstack_without_backend(posting: &Posting, _rules: &FilterRules) -> bool {
    let title = posting.title().to_lowercase();
    title.contains("full stack") && !title.contains("backend")
}

pub fn is_competing_without_target(posting: &Posting, rules: &FilterRules) -> bool {
    let title = posting.title().to_lowercase();
    title.contains(rules.competing_keyword.as_str())
        && !title.contains(rules.target_keyword.as_str())
}

pub fn is_contract(posting: &Posting, rules: &FilterRules) -> bool {
    let haystack = [posting.title(), posting.description(), posting.job_type()]
        .join(" ")
        .to_lowercase();
    contains_any(&haystack, &rules.contract_keywords)
}

/// First match wins: allowlist, denylist, description signals, headcount.
pub fn is_startup(posting: &Posting, rules: &FilterRules) -> bool {
    let company = posting.company().to_lowercase();

    if contains_any(&company, &rules.company_allowlist) {
        return false;
    }

    if contains_any(&company, &rules.company_denylist) {
        return true;
    }

    if contains_any(&posting.description().to_lowercase(), &rules.startup_keywords) {
        return true;
    }

    // Non-numeric headcounts are treated as absent.
    if let Some(size) = posting
        .company_num_employees
        .as_deref()
        .and_then(|s| s.trim().parse::<f64>().ok())
        && size < rules.min_company_size
    {
        return true;
    }

    false
}

pub fn is_wrong_location(posting: &Posting, rules: &FilterRules) -> bool {
    if posting.is_remote.is_true() {
        return false;
    }

    let city = rules.target_city.as_str();
    if posting.location().to_lowercase().contains(city) {
        return false;
    }

    // Hybrid roles are sometimes only labelled in the description.
    let desc = posting.description().to_lowercase();
    !(desc.contains(city) && desc.contains("hybrid"))
}

pub fn is_not_fulltime(posting: &Posting, _rules: &FilterRules) -> bool {
    let job_type = posting.job_type().trim().to_lowercase();

    if !job_type.is_empty() && job_type != "nan" && job_type != "none" {
        return !FULLTIME_SPELLINGS.iter().any(|s| job_type.contains(s));
    }

    let desc = posting.description().to_lowercase();
    PART_TIME_SIGNALS.iter().any(|s| desc.contains(s))
}
