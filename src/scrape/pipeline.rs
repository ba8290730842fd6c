//! Extraction pipeline
//!
//! Orchestrates one authenticate-then-fetch-many run and persists the
//! outcome. Per-target errors are already absorbed by the fetcher; the
//! only fatal failures here are authentication failures, which trigger a
//! best-effort partial save before propagating.

use crate::error::Result;
use crate::scrape::fetcher::ContentFetcher;
use crate::scrape::record::{now_rfc3339, ExtractedRecord, RunSummary};
use crate::scrape::target::FetchTarget;
use crate::session::SessionManager;
use crate::storage::RunStore;

/// One-shot pipeline: owns the session manager, fetcher, and run store
/// for the duration of a single run.
pub struct ExtractionPipeline {
    manager: SessionManager,
    fetcher: ContentFetcher,
    store: RunStore,
}

impl ExtractionPipeline {
    /// Assemble a pipeline for one run.
    pub fn new(manager: SessionManager, fetcher: ContentFetcher, store: RunStore) -> Self {
        Self {
            manager,
            fetcher,
            store,
        }
    }

    /// Execute the run: authenticate once, fetch every target in order,
    /// persist the summary.
    ///
    /// # Arguments
    ///
    /// * `source` - Source name recorded in the summary and file name
    /// * `targets` - Targets to fetch, in order
    ///
    /// # Errors
    ///
    /// Propagates authentication failures (after writing a partial
    /// document) and storage failures for the final save. Per-target
    /// extraction failures never surface here.
    pub async fn run(mut self, source: &str, targets: &[FetchTarget]) -> Result<RunSummary> {
        let started_at = now_rfc3339();
        tracing::info!("Starting {} run with {} target(s)", source, targets.len());

        if let Err(e) = self.manager.authenticate().await {
            tracing::error!("Authentication failed, aborting run: {:#}", e);
            self.save_partial(source, started_at, Vec::new(), &e);
            return Err(e);
        }

        let mut records: Vec<ExtractedRecord> = Vec::with_capacity(targets.len());
        for (index, target) in targets.iter().enumerate() {
            if index > 0 {
                self.fetcher.polite_delay().await;
            }
            let record = self.fetcher.fetch(&mut self.manager, index, target).await;
            records.push(record);
        }

        let summary = RunSummary::completed(source, started_at, records);
        let path = self.store.save(&summary)?;
        tracing::info!(
            "Run {} finished: {}/{} targets succeeded, saved to {}",
            summary.id,
            summary.successful,
            summary.total,
            path.display()
        );
        Ok(summary)
    }

    /// Best-effort partial save; a failing save only logs, the original
    /// run-level error is what propagates to the caller.
    fn save_partial(
        &self,
        source: &str,
        started_at: String,
        records: Vec<ExtractedRecord>,
        error: &anyhow::Error,
    ) {
        let partial = RunSummary::partial(source, started_at, records, format!("{:#}", error));
        match self.store.save(&partial) {
            Ok(path) => tracing::warn!("Partial run document saved to {}", path.display()),
            Err(save_err) => tracing::error!("Failed to save partial run: {:#}", save_err),
        }
    }
}
