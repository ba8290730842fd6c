//! Scrape command handler
//!
//! Resolves the target list for the requested source, opens a WebDriver
//! session, runs the extraction pipeline, and prints a run summary.

use std::path::PathBuf;
use std::sync::Arc;

use colored::Colorize;

use crate::browser::WebDriverBrowser;
use crate::cli::ScrapeSource;
use crate::config::{Config, Credentials};
use crate::error::{Result, ScoutError};
use crate::scrape::{sources, ContentFetcher, ExtractionPipeline, FetchTarget, RunSummary};
use crate::session::SessionManager;
use crate::storage::RunStore;

/// Options the CLI passes through to the scrape handler.
#[derive(Debug, Clone)]
pub struct ScrapeOptions {
    pub source: ScrapeSource,
    pub output: Option<PathBuf>,
    pub course: Option<String>,
    pub from_run: Option<String>,
    pub targets: Vec<String>,
    pub debug_screenshot: bool,
}

/// Execute a scraping run.
///
/// # Errors
///
/// Fails on missing credentials, unresolvable targets, WebDriver
/// connection problems, and authentication failures. Per-target
/// extraction failures are recorded in the run document instead.
pub async fn run_scrape(config: Config, options: ScrapeOptions) -> Result<()> {
    // Credentials are checked before any network action.
    let credentials = Credentials::from_env()?;

    let store = RunStore::new(PathBuf::from(&config.storage.runs_dir));
    let targets = resolve_targets(&config, &store, &options)?;

    println!(
        "{}",
        format!(
            "Scraping {} ({} target{})",
            options.source.as_str(),
            targets.len(),
            if targets.len() == 1 { "" } else { "s" }
        )
        .cyan()
    );

    let browser = Arc::new(WebDriverBrowser::connect(&config.scrape.webdriver_url).await?);

    let home_url = targets
        .first()
        .map(|t| t.url.clone())
        .unwrap_or_else(|| config.portal.lms_base_url.clone());
    let manager = SessionManager::new(
        browser.clone(),
        credentials,
        config.auth.clone(),
        config.portal.idp_domain.clone(),
        home_url,
    );

    let mut fetcher = ContentFetcher::new(browser.clone(), config.scrape.clone());
    if matches!(options.source, ScrapeSource::Professors) {
        fetcher = fetcher.with_contact_extraction();
    }
    if options.debug_screenshot {
        fetcher = fetcher.with_screenshots(store.dir().join("screenshots"));
    }

    let pipeline = ExtractionPipeline::new(manager, fetcher, store.clone());
    let outcome = pipeline.run(options.source.as_str(), &targets).await;

    // The WebDriver session is closed in both outcomes; a close failure
    // only logs because the run result matters more.
    if let Err(e) = browser.close().await {
        tracing::warn!("Could not close WebDriver session: {:#}", e);
    }

    let summary = outcome?;
    print_summary(&summary, &store);

    if let Some(output) = &options.output {
        std::fs::write(output, serde_json::to_string_pretty(&summary)?)?;
        println!("Copy written to {}", output.display().to_string().cyan());
    }

    Ok(())
}

/// Turn the CLI options into a concrete target list. Explicit
/// `--target` pairs win, then `--from-run`, then the source recipe.
fn resolve_targets(
    config: &Config,
    store: &RunStore,
    options: &ScrapeOptions,
) -> Result<Vec<FetchTarget>> {
    if !options.targets.is_empty() {
        return FetchTarget::parse_pairs(&options.targets);
    }
    if let Some(run_id) = &options.from_run {
        return store.targets_from_run(run_id);
    }
    match options.source {
        ScrapeSource::Announcements => Ok(sources::announcements(
            &config.portal,
            options.course.as_deref(),
        )),
        ScrapeSource::Professors => sources::professors(&config.portal),
        ScrapeSource::Events => sources::events(&config.portal),
        ScrapeSource::Custom => Err(ScoutError::Config(
            "the custom source needs --target LABEL=URL or --from-run".to_string(),
        )
        .into()),
    }
}

fn print_summary(summary: &RunSummary, store: &RunStore) {
    for record in &summary.records {
        if let Some(error) = &record.error {
            println!(
                "  {} {} ({})",
                "failed".red(),
                record.label,
                error.dimmed()
            );
        } else {
            println!("  {} {}", "fetched".green(), record.label);
        }
    }
    println!(
        "{}",
        format!(
            "Run {}: {}/{} succeeded, saved to {}",
            summary.id,
            summary.successful,
            summary.total,
            store.path_for(summary).display()
        )
        .green()
    );
}
