use chrono::NaiveDate;

/// Whether a board flagged the posting as remote.
/// `Unknown` is treated the same as `False` by every consumer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum IsRemote {
    True,
    False,
    #[default]
    Unknown,
}

impl IsRemote {
    pub fn is_true(self) -> bool {
        matches!(self, IsRemote::True)
    }

    /// Rendering used in the output log: `True`, `False` or empty.
    pub fn as_cell(self) -> &'static str {
        match self {
            IsRemote::True => "True",
            IsRemote::False => "False",
            IsRemote::Unknown => "",
        }
    }
}

impl From<bool> for IsRemote {
    fn from(value: bool) -> Self {
        if value { IsRemote::True } else { IsRemote::False }
    }
}

/// One scraped job listing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Posting {
    pub title: Option<String>,
    pub company: Option<String>,
    pub location: Option<String>,
    pub is_remote: IsRemote,
    pub job_url: Option<String>,
    pub description: Option<String>,
    pub job_type: Option<String>,
    pub site: Option<String>,
    pub company_num_employees: Option<String>,
    pub date_posted: Option<NaiveDate>,
}

impl Posting {
    pub fn title(&self) -> &str {
        self.title.as_deref().unwrap_or_default()
    }

    pub fn company(&self) -> &str {
        self.company.as_deref().unwrap_or_default()
    }

    pub fn location(&self) -> &str {
        self.location.as_deref().unwrap_or_default()
    }

    pub fn job_url(&self) -> &str {
        self.job_url.as_deref().unwrap_or_default()
    }

    pub fn description(&self) -> &str {
        self.description.as_deref().unwrap_or_default()
    }

    pub fn job_type(&self) -> &str {
        self.job_type.as_deref().unwrap_or_default()
    }

    pub fn site(&self) -> &str {
        self.site.as_deref().unwrap_or_default()
    }

    /// Key used to collapse duplicates across scrape passes: the URL when
    /// present, otherwise the (title, company) pair.
    pub fn merge_key(&self) -> MergeKey {
        match self.job_url.as_deref().filter(|u| !u.is_empty()) {
            Some(url) => MergeKey::Url(url.to_string()),
            None => MergeKey::TitleCompany(self.title().to_string(), self.company().to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum MergeKey {
    Url(String),
    TitleCompany(String, String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_is_not_remote() {
        assert!(IsRemote::True.is_true());
        assert!(!IsRemote::False.is_true());
        assert!(!IsRemote::Unknown.is_true());
        assert_eq!(IsRemote::default(), IsRemote::Unknown);
    }

    #[test]
    fn merge_key_prefers_url() {
        let with_url = Posting {
            title: Some("Dev".into()),
            company: Some("Acme".into()),
            job_url: Some("https://example.com/1".into()),
            ..Default::default()
        };
        assert_eq!(
            with_url.merge_key(),
            MergeKey::Url("https://example.com/1".into())
        );

        let without_url = Posting {
            job_url: Some(String::new()),
            ..with_url.clone()
        };
        assert_eq!(
            without_url.merge_key(),
            MergeKey::TitleCompany("Dev".into(), "Acme".into())
        );
    }
}
