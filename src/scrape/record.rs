//! Run records
//!
//! [`ExtractedRecord`] is the result of one fetch; [`RunSummary`] aggregates
//! one pipeline execution. Both are created once and never mutated after
//! creation; the summary is serialized to storage as the durable outcome of
//! the run.

use crate::scrape::target::FetchTarget;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use ulid::Ulid;

/// Structured contact sub-fields extracted from a professor page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactFields {
    /// Email addresses found on the page
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub emails: Vec<String>,

    /// Phone numbers found on the page
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub phones: Vec<String>,

    /// Office/room designations found on the page
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub offices: Vec<String>,
}

impl ContactFields {
    /// Whether no field was extracted.
    pub fn is_empty(&self) -> bool {
        self.emails.is_empty() && self.phones.is_empty() && self.offices.is_empty()
    }
}

/// The result of one fetch.
///
/// On failure the record carries the error description and empty content;
/// `index`, `label`, and `url` are always preserved from the input target.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractedRecord {
    /// Position of the target in the run's input list
    pub index: usize,

    /// Label of the originating target
    pub label: String,

    /// URL of the originating target
    pub url: String,

    /// Extraction timestamp (RFC-3339)
    pub fetched_at: String,

    /// Page title, empty on failure
    #[serde(default)]
    pub title: String,

    /// Normalized main-content text, empty on failure
    #[serde(default)]
    pub content: String,

    /// Outbound links, deduplicated by URL and capped
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub links: Vec<String>,

    /// Contact sub-fields, present only for contact extractions
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact: Option<ContactFields>,

    /// Error marker; `Some` means the fetch failed and `content` is empty
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ExtractedRecord {
    /// Build a failure record preserving the target's identity.
    pub fn failed(index: usize, target: &FetchTarget, error: impl Into<String>) -> Self {
        Self {
            index,
            label: target.label.clone(),
            url: target.url.clone(),
            fetched_at: now_rfc3339(),
            title: String::new(),
            content: String::new(),
            links: Vec::new(),
            contact: None,
            error: Some(error.into()),
        }
    }

    /// Whether the fetch behind this record failed.
    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}

/// Aggregate result of one pipeline execution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    /// Run identifier (ULID, sortable by creation time)
    pub id: String,

    /// Scrape source name ("announcements", "professors", ...)
    pub source: String,

    /// Run start timestamp (RFC-3339)
    pub started_at: String,

    /// Run end timestamp (RFC-3339)
    pub finished_at: String,

    /// Total number of targets in the run
    pub total: usize,

    /// Number of targets extracted without error
    pub successful: usize,

    /// Number of targets recorded with an error marker
    pub failed: usize,

    /// True when the run aborted before all targets were attempted
    #[serde(default)]
    pub partial: bool,

    /// Fatal run-level error, set only on partial documents
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// Extracted records in target order
    pub records: Vec<ExtractedRecord>,
}

impl RunSummary {
    /// Aggregate records of a completed run.
    ///
    /// Counts are derived from the records so the
    /// `successful + failed == total == records.len()` invariant holds by
    /// construction.
    pub fn completed(
        source: impl Into<String>,
        started_at: String,
        records: Vec<ExtractedRecord>,
    ) -> Self {
        let failed = records.iter().filter(|r| r.is_error()).count();
        Self {
            id: new_run_id(),
            source: source.into(),
            started_at,
            finished_at: now_rfc3339(),
            total: records.len(),
            successful: records.len() - failed,
            failed,
            partial: false,
            error: None,
            records,
        }
    }

    /// Aggregate whatever records exist after a fatal run-level failure.
    pub fn partial(
        source: impl Into<String>,
        started_at: String,
        records: Vec<ExtractedRecord>,
        error: impl Into<String>,
    ) -> Self {
        let mut summary = Self::completed(source, started_at, records);
        summary.partial = true;
        summary.error = Some(error.into());
        summary
    }
}

/// Generate a new run identifier.
///
/// ULIDs sort by timestamp, which keeps run listings chronological
/// without a separate index.
pub fn new_run_id() -> String {
    Ulid::new().to_string()
}

/// Current UTC time as an RFC-3339 formatted string.
///
/// Used consistently for all run and record timestamps.
///
/// # Examples
///
/// ```
/// use campus_scout::scrape::record::now_rfc3339;
///
/// let timestamp = now_rfc3339();
/// assert!(timestamp.contains("T"));
/// assert!(chrono::DateTime::parse_from_rfc3339(&timestamp).is_ok());
/// ```
pub fn now_rfc3339() -> String {
    Utc::now().to_rfc3339()
}
