//! Run persistence
//!
//! Each run is saved as one pretty-printed JSON document named
//! `<source>_<id>.json`, or `<source>_<id>_partial.json` when the run
//! aborted before completing. The directory is created on first save.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Result, ScoutError};
use crate::scrape::record::RunSummary;
use crate::scrape::target::FetchTarget;

/// On-disk store for run summaries.
#[derive(Debug, Clone)]
pub struct RunStore {
    dir: PathBuf,
}

impl RunStore {
    /// Create a store rooted at `dir`. The directory is created lazily
    /// by [`save`](Self::save).
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    /// Directory this store writes into.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File path a summary saves to, derived from its source, id, and
    /// partial flag.
    pub fn path_for(&self, summary: &RunSummary) -> PathBuf {
        let suffix = if summary.partial { "_partial" } else { "" };
        self.dir
            .join(format!("{}_{}{}.json", summary.source, summary.id, suffix))
    }

    /// Persist a summary and return the path written.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created, the summary
    /// cannot be serialized, or the file cannot be written.
    pub fn save(&self, summary: &RunSummary) -> Result<PathBuf> {
        fs::create_dir_all(&self.dir)?;
        let path = self.path_for(summary);
        let json = serde_json::to_string_pretty(summary)?;
        fs::write(&path, json)?;
        Ok(path)
    }

    /// List saved runs, newest first (run ids are lexically sortable).
    ///
    /// # Errors
    ///
    /// Returns an error if the directory exists but cannot be read, or
    /// a run file cannot be parsed. A missing directory is an empty
    /// store, not an error.
    pub fn list(&self) -> Result<Vec<RunSummary>> {
        if !self.dir.exists() {
            return Ok(Vec::new());
        }
        let mut runs = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let json = fs::read_to_string(&path)?;
            let summary: RunSummary = serde_json::from_str(&json).map_err(|e| {
                ScoutError::Storage(format!("invalid run file {}: {}", path.display(), e))
            })?;
            runs.push(summary);
        }
        runs.sort_by(|a, b| b.id.cmp(&a.id));
        Ok(runs)
    }

    /// Load a single run by id.
    ///
    /// # Errors
    ///
    /// Returns [`ScoutError::Storage`] when no saved run carries the id.
    pub fn load(&self, id: &str) -> Result<RunSummary> {
        self.list()?
            .into_iter()
            .find(|r| r.id == id)
            .ok_or_else(|| ScoutError::Storage(format!("no saved run with id {}", id)).into())
    }

    /// Turn every link collected in a previous run into a follow-up
    /// fetch target. Duplicate links across records are kept once.
    pub fn targets_from_run(&self, id: &str) -> Result<Vec<FetchTarget>> {
        let summary = self.load(id)?;
        let mut seen = std::collections::HashSet::new();
        let mut targets = Vec::new();
        for record in &summary.records {
            for link in &record.links {
                if seen.insert(link.clone()) {
                    let label = format!("{} link {}", record.label, targets.len() + 1);
                    targets.push(FetchTarget::new(label, link.clone()));
                }
            }
        }
        Ok(targets)
    }
}
