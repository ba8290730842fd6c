//! Command-line interface definition for Campus Scout
//!
//! This module defines the CLI structure using clap's derive API,
//! providing commands for scraping, the chat endpoint, corridor map
//! checks, and run inspection.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Campus Scout - campus assistant CLI
///
/// Scrape course announcements, professor contacts, and campus events
/// from the college portal; serve a navigation chat endpoint; validate
/// the building corridor map.
#[derive(Parser, Debug, Clone)]
#[command(name = "campus-scout")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config/config.yaml")]
    pub config: Option<String>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands for Campus Scout
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Run an authenticated scraping pipeline against the portal
    Scrape {
        /// What to scrape
        #[arg(value_enum)]
        source: ScrapeSource,

        /// Also write the run document to this path
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Override the configured course identifier
        #[arg(long)]
        course: Option<String>,

        /// Reuse the discovered links of a prior run as targets (run id)
        #[arg(long)]
        from_run: Option<String>,

        /// Explicit target as LABEL=URL (repeatable; implies source-agnostic run)
        #[arg(long = "target", value_name = "LABEL=URL")]
        targets: Vec<String>,

        /// Capture a screenshot after each fetch for debugging
        #[arg(long)]
        debug_screenshot: bool,
    },

    /// Serve the navigation/announcement chat endpoint
    Serve {
        /// Bind address (overrides config)
        #[arg(short, long)]
        bind: Option<String>,
    },

    /// Corridor map utilities
    Map {
        /// Map subcommand
        #[command(subcommand)]
        command: MapCommand,
    },

    /// Inspect persisted runs
    Runs {
        /// Runs subcommand
        #[command(subcommand)]
        command: RunsCommand,
    },
}

/// Scrape sources
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrapeSource {
    /// Course announcements from the LMS
    Announcements,
    /// Professor contact pages from the faculty directory
    Professors,
    /// Campus events from the SharePoint list
    Events,
    /// Only explicit --target pairs or --from-run links
    Custom,
}

impl ScrapeSource {
    /// Stable name used in run documents and file names
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Announcements => "announcements",
            Self::Professors => "professors",
            Self::Events => "events",
            Self::Custom => "custom",
        }
    }
}

/// Corridor map subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum MapCommand {
    /// Validate coordinates and connectivity of a corridor GeoJSON file
    Validate {
        /// Path to the GeoJSON corridor file
        #[arg(short, long)]
        file: PathBuf,
    },

    /// Find the corridor node nearest to a coordinate
    Nearest {
        /// Path to the GeoJSON corridor file
        #[arg(short, long)]
        file: PathBuf,

        /// Longitude of the query point
        #[arg(long, allow_negative_numbers = true)]
        lon: f64,

        /// Latitude of the query point
        #[arg(long, allow_negative_numbers = true)]
        lat: f64,
    },
}

/// Run inspection subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum RunsCommand {
    /// List persisted runs (newest first)
    List,

    /// Show one run document
    Show {
        /// Run identifier
        #[arg(short, long)]
        id: String,
    },
}

impl Cli {
    /// Parse command line arguments
    ///
    /// # Returns
    ///
    /// Returns the parsed CLI structure
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
