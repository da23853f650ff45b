use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::models::posting::Posting;

/// A row of the seen-jobs store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeenRecord {
    pub id: String,
    pub title: String,
    pub company: String,
    pub job_url: String,
}

/// A posting that passed dedup, carrying the identity it will be stored under.
#[derive(Debug, Clone, PartialEq)]
pub struct NewPosting {
    pub id: String,
    pub posting: Posting,
}

impl NewPosting {
    pub fn tag(posting: Posting) -> Self {
        Self {
            id: identity_hash(&posting),
            posting,
        }
    }

    pub fn to_record(&self) -> SeenRecord {
        SeenRecord {
            id: self.id.clone(),
            title: self.posting.title().to_string(),
            company: self.posting.company().to_string(),
            job_url: self.posting.job_url().to_string(),
        }
    }
}

/// Stable identity of a posting: hex SHA-256 of `job_url|title|company`,
/// absent fields hashed as empty strings.
pub fn identity_hash(posting: &Posting) -> String {
    let key = [posting.job_url(), posting.title(), posting.company()].join("|");
    let mut hasher = Sha256::new();
    hasher.update(key.as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::posting::IsRemote;

    fn posting(url: &str, title: &str, company: &str) -> Posting {
        Posting {
            job_url: Some(url.into()),
            title: Some(title.into()),
            company: Some(company.into()),
            ..Default::default()
        }
    }

    #[test]
    fn hash_is_deterministic() {
        let a = posting("https://jobs/1", "Python Dev", "Acme");
        assert_eq!(identity_hash(&a), identity_hash(&a.clone()));
        assert_eq!(identity_hash(&a).len(), 64);
    }

    #[test]
    fn hash_changes_with_each_identity_field() {
        let base = identity_hash(&posting("https://jobs/1", "Python Dev", "Acme"));
        assert_ne!(base, identity_hash(&posting("https://jobs/2", "Python Dev", "Acme")));
        assert_ne!(base, identity_hash(&posting("https://jobs/1", "Python Eng", "Acme")));
        assert_ne!(base, identity_hash(&posting("https://jobs/1", "Python Dev", "Beta")));
    }

    #[test]
    fn hash_ignores_non_identity_fields() {
        let a = posting("https://jobs/1", "Python Dev", "Acme");
        let b = Posting {
            description: Some("now full-time".into()),
            job_type: Some("fulltime".into()),
            is_remote: IsRemote::True,
            ..a.clone()
        };
        assert_eq!(identity_hash(&a), identity_hash(&b));
    }

    #[test]
    fn absent_fields_hash_as_empty() {
        let absent = Posting::default();
        let empty = posting("", "", "");
        assert_eq!(identity_hash(&absent), identity_hash(&empty));
    }
}
