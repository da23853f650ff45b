use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::error::AppError;
use crate::models::posting::Posting;

/// Column projection written to the output log.
#[derive(Debug, Serialize)]
struct LogRow<'a> {
    title: &'a str,
    company: &'a str,
    location: &'a str,
    is_remote: &'static str,
    job_url: &'a str,
}

impl<'a> From<&'a Posting> for LogRow<'a> {
    fn from(p: &'a Posting) -> Self {
        Self {
            title: p.title(),
            company: p.company(),
            location: p.location(),
            is_remote: p.is_remote.as_cell(),
            job_url: p.job_url(),
        }
    }
}

/// Append-only CSV log of accepted postings. The header is written only
/// when the file is created.
#[derive(Debug, Clone)]
pub struct JobLog {
    path: PathBuf,
}

impl JobLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn append<'a, I>(&self, postings: I) -> Result<usize, AppError>
    where
        I: IntoIterator<Item = &'a Posting>,
    {
        let mut postings = postings.into_iter().peekable();
        if postings.peek().is_none() {
            return Ok(0);
        }

        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }

        // A missing or zero-length file still needs the header.
        let write_header = fs::metadata(&self.path)
            .map(|m| m.len() == 0)
            .unwrap_or(true);
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        let mut writer = csv::WriterBuilder::new()
            .has_headers(write_header)
            .from_writer(file);

        let mut count = 0;
        for posting in postings {
            writer.serialize(LogRow::from(posting))?;
            count += 1;
        }
        writer.flush()?;

        tracing::info!("Appended {count} job(s) -> {}", self.path.display());
        Ok(count)
    }
}
