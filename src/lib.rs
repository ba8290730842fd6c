//! Campus Scout - campus assistant CLI library
//!
//! This library provides the core functionality for Campus Scout:
//! authenticated portal scraping, run persistence, a navigation chat
//! endpoint, and corridor map checks.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//!
//! - `browser`: Browsing-context abstraction (WebDriver and fake)
//! - `session`: Authenticated session establishment and reuse
//! - `scrape`: Content fetcher, extraction helpers, and the pipeline
//! - `storage`: Persisted run documents
//! - `chat`: Chat provider and HTTP endpoint
//! - `map`: Corridor GeoJSON validation and nearest-node lookup
//! - `config`: Configuration management and validation
//! - `error`: Error types and result aliases
//! - `cli`: Command-line interface definition
//!
//! # Example
//!
//! ```no_run
//! use campus_scout::config::Config;
//!
//! # fn main() -> anyhow::Result<()> {
//! let config = Config::default();
//! config.validate()?;
//! # Ok(())
//! # }
//! ```

pub mod browser;
pub mod chat;
pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod map;
pub mod scrape;
pub mod session;
pub mod storage;

// Re-export commonly used types
pub use config::{Config, Credentials};
pub use error::{Result, ScoutError};
pub use scrape::{ExtractedRecord, ExtractionPipeline, FetchTarget, RunSummary};
pub use session::SessionManager;
pub use storage::RunStore;
