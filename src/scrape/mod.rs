//! Authenticated extraction pipeline
//!
//! One run is: authenticate once ([`crate::session::SessionManager`]), fetch
//! each [`FetchTarget`] strictly sequentially over the shared session
//! ([`ContentFetcher`]), aggregate into a [`RunSummary`], persist. Per-target
//! failures are recorded inline and never abort the run; authentication
//! failures abort the run after a best-effort partial save.

pub mod extract;
pub mod fetcher;
pub mod pipeline;
pub mod record;
pub mod sources;
pub mod target;

pub use fetcher::ContentFetcher;
pub use pipeline::ExtractionPipeline;
pub use record::{ContactFields, ExtractedRecord, RunSummary};
pub use target::FetchTarget;
