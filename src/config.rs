//! Configuration management for Campus Scout
//!
//! This module handles loading, parsing, validating, and managing
//! configuration from files, environment variables, and CLI overrides.
//!
//! Portal credentials are never stored in the config file; they are read
//! exclusively from the `CAMPUS_SCOUT_USERNAME` and `CAMPUS_SCOUT_PASSWORD`
//! environment variables.

use crate::error::{Result, ScoutError};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Environment variable holding the portal account identifier
pub const ENV_USERNAME: &str = "CAMPUS_SCOUT_USERNAME";

/// Environment variable holding the portal account secret
pub const ENV_PASSWORD: &str = "CAMPUS_SCOUT_PASSWORD";

/// Main configuration structure for Campus Scout
///
/// This structure holds all configuration needed for scraping runs,
/// the chat endpoint, and run persistence.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Portal endpoints and identifiers (LMS, SharePoint)
    #[serde(default)]
    pub portal: PortalConfig,

    /// Authentication flow timing
    #[serde(default)]
    pub auth: AuthConfig,

    /// Scraping behavior (link caps, politeness window, WebDriver endpoint)
    #[serde(default)]
    pub scrape: ScrapeConfig,

    /// Chat endpoint and provider settings
    #[serde(default)]
    pub chat: ChatConfig,

    /// Run persistence settings
    #[serde(default)]
    pub storage: StorageConfig,
}

/// Portal endpoint configuration
///
/// All site-specific identifiers live here so that nothing in the
/// extraction code depends on module-level constants.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PortalConfig {
    /// Base URL of the learning-management system
    #[serde(default = "default_lms_base_url")]
    pub lms_base_url: String,

    /// Course identifier for announcement scraping
    #[serde(default = "default_course_id")]
    pub course_id: String,

    /// Identity-provider domain; a URL leaving this domain signals that
    /// an out-of-band two-factor approval has landed
    #[serde(default = "default_idp_domain")]
    pub idp_domain: String,

    /// SharePoint site URL for campus events
    #[serde(default)]
    pub sharepoint_site_url: String,

    /// SharePoint list identifier for the events list
    #[serde(default)]
    pub sharepoint_events_list_id: String,

    /// Faculty directory pages (label, URL) for professor contact scraping
    #[serde(default)]
    pub faculty_pages: Vec<LabeledUrl>,
}

/// A labeled URL entry in the configuration file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LabeledUrl {
    /// Human-readable label
    pub label: String,
    /// Page URL
    pub url: String,
}

fn default_lms_base_url() -> String {
    "https://learn.example.edu".to_string()
}

fn default_course_id() -> String {
    "6606".to_string()
}

fn default_idp_domain() -> String {
    "login.microsoftonline.com".to_string()
}

impl Default for PortalConfig {
    fn default() -> Self {
        Self {
            lms_base_url: default_lms_base_url(),
            course_id: default_course_id(),
            idp_domain: default_idp_domain(),
            sharepoint_site_url: String::new(),
            sharepoint_events_list_id: String::new(),
            faculty_pages: Vec::new(),
        }
    }
}

/// Authentication flow timing configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Ceiling for the two-factor wait loop (seconds)
    #[serde(default = "default_two_factor_timeout")]
    pub two_factor_timeout_seconds: u64,

    /// Poll interval inside the two-factor wait loop (seconds)
    #[serde(default = "default_two_factor_poll")]
    pub two_factor_poll_seconds: u64,

    /// Bound for each synchronous login step (seconds)
    #[serde(default = "default_step_timeout")]
    pub step_timeout_seconds: u64,

    /// Accept the "stay signed in" interstitial when it appears
    #[serde(default = "default_keep_signed_in")]
    pub keep_signed_in: bool,
}

fn default_two_factor_timeout() -> u64 {
    300
}

fn default_two_factor_poll() -> u64 {
    2
}

fn default_step_timeout() -> u64 {
    30
}

fn default_keep_signed_in() -> bool {
    true
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            two_factor_timeout_seconds: default_two_factor_timeout(),
            two_factor_poll_seconds: default_two_factor_poll(),
            step_timeout_seconds: default_step_timeout(),
            keep_signed_in: default_keep_signed_in(),
        }
    }
}

/// Scraping behavior configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScrapeConfig {
    /// WebDriver endpoint the browser session is created against
    #[serde(default = "default_webdriver_url")]
    pub webdriver_url: String,

    /// Maximum outbound links recorded per page (deduplicated by URL)
    #[serde(default = "default_max_links")]
    pub max_links_per_page: usize,

    /// Lower bound of the inter-fetch politeness delay (milliseconds)
    #[serde(default = "default_delay_min_ms")]
    pub delay_min_ms: u64,

    /// Upper bound of the inter-fetch politeness delay (milliseconds)
    #[serde(default = "default_delay_max_ms")]
    pub delay_max_ms: u64,
}

fn default_webdriver_url() -> String {
    "http://localhost:4444".to_string()
}

fn default_max_links() -> usize {
    50
}

fn default_delay_min_ms() -> u64 {
    800
}

fn default_delay_max_ms() -> u64 {
    2500
}

impl Default for ScrapeConfig {
    fn default() -> Self {
        Self {
            webdriver_url: default_webdriver_url(),
            max_links_per_page: default_max_links(),
            delay_min_ms: default_delay_min_ms(),
            delay_max_ms: default_delay_max_ms(),
        }
    }
}

/// Chat endpoint configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatConfig {
    /// Chat-completions API base URL
    #[serde(default = "default_chat_api_base")]
    pub api_base: String,

    /// Model identifier sent with each completion request
    #[serde(default = "default_chat_model")]
    pub model: String,

    /// Bind address for the chat HTTP server
    #[serde(default = "default_chat_bind")]
    pub bind: String,
}

fn default_chat_api_base() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_chat_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_chat_bind() -> String {
    "127.0.0.1:8080".to_string()
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            api_base: default_chat_api_base(),
            model: default_chat_model(),
            bind: default_chat_bind(),
        }
    }
}

/// Run persistence configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Directory run documents are written into
    #[serde(default = "default_runs_dir")]
    pub runs_dir: String,
}

fn default_runs_dir() -> String {
    directories::ProjectDirs::from("edu", "campus-scout", "campus-scout")
        .map(|dirs| dirs.data_dir().join("runs").to_string_lossy().to_string())
        .unwrap_or_else(|| "runs".to_string())
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            runs_dir: default_runs_dir(),
        }
    }
}

/// Portal credential pair, read from the environment
///
/// Loaded up front so that a missing credential fails before any
/// network action is taken.
#[derive(Debug, Clone)]
pub struct Credentials {
    /// Account identifier (email or username)
    pub username: String,
    /// Account secret
    pub password: String,
}

impl Credentials {
    /// Read credentials from the environment
    ///
    /// # Errors
    ///
    /// Returns `ScoutError::MissingCredentials` naming the missing variable.
    pub fn from_env() -> Result<Self> {
        let username = std::env::var(ENV_USERNAME)
            .map_err(|_| ScoutError::MissingCredentials(ENV_USERNAME.to_string()))?;
        let password = std::env::var(ENV_PASSWORD)
            .map_err(|_| ScoutError::MissingCredentials(ENV_PASSWORD.to_string()))?;

        if username.trim().is_empty() {
            return Err(ScoutError::MissingCredentials(ENV_USERNAME.to_string()).into());
        }
        if password.trim().is_empty() {
            return Err(ScoutError::MissingCredentials(ENV_PASSWORD.to_string()).into());
        }

        Ok(Self { username, password })
    }
}

impl Config {
    /// Load configuration from file with environment and CLI overrides
    ///
    /// # Arguments
    ///
    /// * `path` - Path to configuration file
    /// * `cli` - CLI arguments for overrides
    ///
    /// # Returns
    ///
    /// Returns the loaded and merged configuration
    ///
    /// # Errors
    ///
    /// Returns error if file cannot be read or parsed
    pub fn load(path: &str, cli: &crate::cli::Cli) -> Result<Self> {
        let mut config = if Path::new(path).exists() {
            Self::from_file(path)?
        } else {
            tracing::warn!("Config file not found at {}, using defaults", path);
            Self::default()
        };

        config.apply_env_vars();
        config.apply_cli_overrides(cli);

        Ok(config)
    }

    fn from_file(path: &str) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ScoutError::Config(format!("Failed to read config file: {}", e)))?;
        serde_yaml::from_str(&contents)
            .map_err(|e| ScoutError::Config(format!("Failed to parse config: {}", e)).into())
    }

    fn apply_env_vars(&mut self) {
        if let Ok(base) = std::env::var("CAMPUS_SCOUT_LMS_BASE_URL") {
            self.portal.lms_base_url = base;
        }

        if let Ok(course) = std::env::var("CAMPUS_SCOUT_COURSE_ID") {
            self.portal.course_id = course;
        }

        if let Ok(webdriver) = std::env::var("CAMPUS_SCOUT_WEBDRIVER_URL") {
            self.scrape.webdriver_url = webdriver;
        }

        if let Ok(runs_dir) = std::env::var("CAMPUS_SCOUT_RUNS_DIR") {
            self.storage.runs_dir = runs_dir;
        }

        if let Ok(timeout) = std::env::var("CAMPUS_SCOUT_2FA_TIMEOUT_SECONDS") {
            if let Ok(value) = timeout.parse() {
                self.auth.two_factor_timeout_seconds = value;
            } else {
                tracing::warn!("Invalid CAMPUS_SCOUT_2FA_TIMEOUT_SECONDS: {}", timeout);
            }
        }

        if let Ok(api_base) = std::env::var("CAMPUS_SCOUT_CHAT_API_BASE") {
            self.chat.api_base = api_base;
        }

        if let Ok(model) = std::env::var("CAMPUS_SCOUT_CHAT_MODEL") {
            self.chat.model = model;
        }
    }

    fn apply_cli_overrides(&mut self, cli: &crate::cli::Cli) {
        if cli.verbose {
            tracing::debug!("Verbose mode enabled via CLI");
        }
    }

    /// Validate the configuration
    ///
    /// # Errors
    ///
    /// Returns `ScoutError::Config` describing the first invalid field found.
    pub fn validate(&self) -> Result<()> {
        if self.portal.lms_base_url.trim().is_empty() {
            return Err(ScoutError::Config("portal.lms_base_url must not be empty".to_string()).into());
        }

        if url::Url::parse(&self.portal.lms_base_url).is_err() {
            return Err(ScoutError::Config(format!(
                "portal.lms_base_url is not a valid URL: {}",
                self.portal.lms_base_url
            ))
            .into());
        }

        if self.auth.two_factor_poll_seconds == 0 {
            return Err(
                ScoutError::Config("auth.two_factor_poll_seconds must be > 0".to_string()).into(),
            );
        }

        if self.auth.two_factor_timeout_seconds < self.auth.two_factor_poll_seconds {
            return Err(ScoutError::Config(
                "auth.two_factor_timeout_seconds must be >= auth.two_factor_poll_seconds"
                    .to_string(),
            )
            .into());
        }

        if self.scrape.delay_max_ms < self.scrape.delay_min_ms {
            return Err(ScoutError::Config(
                "scrape.delay_max_ms must be >= scrape.delay_min_ms".to_string(),
            )
            .into());
        }

        if self.scrape.max_links_per_page == 0 {
            return Err(
                ScoutError::Config("scrape.max_links_per_page must be > 0".to_string()).into(),
            );
        }

        Ok(())
    }
}
