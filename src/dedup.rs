use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::AppError;
use crate::models::posting::Posting;
use crate::models::seen::{NewPosting, SeenRecord};

/// CSV-backed record of every posting already notified about,
/// keyed by identity hash. A missing file is an empty store.
#[derive(Debug, Clone)]
pub struct SeenStore {
    path: PathBuf,
}

impl SeenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Return the postings whose identity is not in the store, in input
    /// order, each tagged with its identity hash.
    pub fn filter_new(&self, postings: Vec<Posting>) -> Result<Vec<NewPosting>, AppError> {
        if postings.is_empty() {
            return Ok(Vec::new());
        }

        let seen = self.load_ids()?;
        let total = postings.len();
        let new: Vec<NewPosting> = postings
            .into_iter()
            .map(NewPosting::tag)
            .filter(|p| !seen.contains(&p.id))
            .collect();

        tracing::info!("{} new / {total} total after dedup", new.len());
        Ok(new)
    }

    /// Record postings as seen. Merges with the existing file and keeps one
    /// row per id, so repeated calls with the same input are idempotent.
    pub fn mark_seen(&self, postings: &[NewPosting]) -> Result<(), AppError> {
        if postings.is_empty() {
            return Ok(());
        }

        let mut records = self.load()?;
        records.extend(postings.iter().map(NewPosting::to_record));

        let mut ids = HashSet::new();
        records.retain(|r| ids.insert(r.id.clone()));

        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }

        let mut writer = csv::Writer::from_path(&self.path)?;
        for record in &records {
            writer.serialize(record)?;
        }
        writer.flush()?;

        tracing::info!(
            "Marked {} job(s) as seen -> {}",
            postings.len(),
            self.path.display()
        );
        Ok(())
    }

    /// All stored records, in file order.
    pub fn load(&self) -> Result<Vec<SeenRecord>, AppError> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let mut reader = csv::Reader::from_path(&self.path)?;
        let records = reader
            .deserialize::<SeenRecord>()
            .collect::<Result<Vec<_>, _>>()?;
        Ok(records)
    }

    fn load_ids(&self) -> Result<HashSet<String>, AppError> {
        Ok(self
            .load()?
            .into_iter()
            .map(|r| r.id)
            .filter(|id| !id.is_empty())
            .collect())
    }
}
