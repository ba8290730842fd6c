//! Fetch targets
//!
//! A [`FetchTarget`] identifies one resource to visit and extract: a URL
//! plus a human-readable label. Targets are immutable once built; they come
//! from source builders, explicit CLI pairs, or a prior run's discovered
//! links.

use crate::error::{Result, ScoutError};
use serde::{Deserialize, Serialize};

/// One URL/label pair to be visited and extracted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchTarget {
    /// Human-readable label carried into the extracted record
    pub label: String,
    /// Resource URL
    pub url: String,
}

impl FetchTarget {
    /// Create a target.
    pub fn new(label: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            url: url.into(),
        }
    }

    /// Parse a `LABEL=URL` command-line pair.
    ///
    /// # Errors
    ///
    /// Returns `ScoutError::Config` when the pair is malformed or the URL
    /// does not parse.
    pub fn parse_pair(pair: &str) -> Result<Self> {
        let (label, url) = pair.split_once('=').ok_or_else(|| {
            ScoutError::Config(format!("Target must be LABEL=URL, got: {}", pair))
        })?;

        if label.trim().is_empty() {
            return Err(ScoutError::Config(format!("Target label is empty in: {}", pair)).into());
        }

        url::Url::parse(url)
            .map_err(|e| ScoutError::Config(format!("Invalid target URL {}: {}", url, e)))?;

        Ok(Self::new(label.trim(), url))
    }

    /// Parse a list of `LABEL=URL` pairs, preserving order.
    pub fn parse_pairs(pairs: &[String]) -> Result<Vec<Self>> {
        pairs.iter().map(|p| Self::parse_pair(p)).collect()
    }
}
