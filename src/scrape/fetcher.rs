//! Content fetcher
//!
//! Given the run's authenticated session and one [`FetchTarget`], navigate
//! and extract an [`ExtractedRecord`]. Every failure is caught per target
//! and recorded inline so one bad target never loses the rest of the run.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use rand::Rng;

use crate::browser::Browser;
use crate::config::ScrapeConfig;
use crate::error::{Result, ScoutError};
use crate::scrape::extract::{dedup_links, normalize_text, CONTENT_SELECTORS};
use crate::scrape::record::{now_rfc3339, ExtractedRecord};
use crate::scrape::target::FetchTarget;
use crate::session::SessionManager;

/// Fetches and extracts one target at a time over the shared session.
pub struct ContentFetcher {
    browser: Arc<dyn Browser>,
    config: ScrapeConfig,
    /// Extract contact sub-fields from page text (professor pages)
    extract_contact: bool,
    /// Capture a screenshot after each fetch, written next to the run output
    screenshot_dir: Option<PathBuf>,
}

impl ContentFetcher {
    /// Create a fetcher over the run's browsing context.
    pub fn new(browser: Arc<dyn Browser>, config: ScrapeConfig) -> Self {
        Self {
            browser,
            config,
            extract_contact: false,
            screenshot_dir: None,
        }
    }

    /// Also extract contact sub-fields from each page.
    pub fn with_contact_extraction(mut self) -> Self {
        self.extract_contact = true;
        self
    }

    /// Capture a debug screenshot after each fetch into the given directory.
    pub fn with_screenshots(mut self, dir: PathBuf) -> Self {
        self.screenshot_dir = Some(dir);
        self
    }

    /// Fetch one target.
    ///
    /// Never returns an error: any failure is recorded in the returned
    /// record's `error` field with `index`/`label`/`url` preserved.
    pub async fn fetch(
        &self,
        manager: &mut SessionManager,
        index: usize,
        target: &FetchTarget,
    ) -> ExtractedRecord {
        match self.try_fetch(manager, index, target).await {
            Ok(record) => record,
            Err(e) => {
                tracing::warn!("Target {} ({}) failed: {:#}", index, target.label, e);
                ExtractedRecord::failed(index, target, format!("{:#}", e))
            }
        }
    }

    async fn try_fetch(
        &self,
        manager: &mut SessionManager,
        index: usize,
        target: &FetchTarget,
    ) -> Result<ExtractedRecord> {
        tracing::info!("Fetching [{}] {} -> {}", index, target.label, target.url);
        self.browser.goto(&target.url).await?;

        // The session may have expired between fetches; one re-login per
        // target, then retry the navigation once. A bounce back to the
        // identity provider after that fresh login is a per-target failure,
        // never a reason to extract the login page.
        if manager.ensure_authenticated().await? {
            self.browser.goto(&target.url).await?;
            if manager.on_idp().await? {
                return Err(ScoutError::Extraction(format!(
                    "still redirected to the identity provider after re-login: {}",
                    target.url
                ))
                .into());
            }
        }

        let title = self.browser.title().await.unwrap_or_default();
        let content = self.main_content().await?;
        let links = self.outbound_links().await?;

        let contact = if self.extract_contact {
            Some(crate::scrape::extract::extract_contact(&content))
        } else {
            None
        };

        if let Some(dir) = &self.screenshot_dir {
            if let Err(e) = tokio::fs::create_dir_all(dir).await {
                tracing::debug!("Could not create screenshot dir: {:#}", e);
            }
            let path = dir.join(format!("target_{:03}.png", index));
            if let Err(e) = self.browser.screenshot(&path).await {
                tracing::debug!("Screenshot for target {} failed: {:#}", index, e);
            }
        }

        Ok(ExtractedRecord {
            index,
            label: target.label.clone(),
            url: target.url.clone(),
            fetched_at: now_rfc3339(),
            title,
            content,
            links,
            contact,
            error: None,
        })
    }

    /// Text of the first known content container with any text.
    async fn main_content(&self) -> Result<String> {
        for selector in CONTENT_SELECTORS {
            if let Some(raw) = self.browser.text_of(selector).await? {
                let normalized = normalize_text(&raw);
                if !normalized.is_empty() {
                    return Ok(normalized);
                }
            }
        }
        Ok(String::new())
    }

    /// Outbound links of the page, deduplicated and capped.
    async fn outbound_links(&self) -> Result<Vec<String>> {
        let hrefs = self.browser.attr_of_all("a[href]", "href").await?;
        Ok(dedup_links(hrefs, self.config.max_links_per_page))
    }

    /// Sleep a randomized politeness delay between fetches.
    ///
    /// A zero-width window disables the delay entirely (tests).
    pub async fn polite_delay(&self) {
        let (min, max) = (self.config.delay_min_ms, self.config.delay_max_ms);
        if max == 0 {
            return;
        }
        let millis = if max > min {
            rand::rng().random_range(min..=max)
        } else {
            min
        };
        tracing::debug!("Politeness delay: {}ms", millis);
        tokio::time::sleep(Duration::from_millis(millis)).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::browser::{FakeBrowser, FakePage};
    use crate::config::{AuthConfig, Credentials};

    fn no_delay_config() -> ScrapeConfig {
        ScrapeConfig {
            webdriver_url: String::new(),
            max_links_per_page: 3,
            delay_min_ms: 0,
            delay_max_ms: 0,
        }
    }

    fn open_manager(browser: Arc<FakeBrowser>) -> SessionManager {
        SessionManager::new(
            browser,
            Credentials {
                username: "u".to_string(),
                password: "p".to_string(),
            },
            AuthConfig {
                two_factor_timeout_seconds: 2,
                two_factor_poll_seconds: 1,
                step_timeout_seconds: 1,
                keep_signed_in: true,
            },
            "idp.test",
            "https://portal.test/home",
        )
    }

    #[tokio::test]
    async fn test_fetch_extracts_title_content_links() {
        let browser = Arc::new(FakeBrowser::new());
        browser.add_page(
            "https://x/a",
            FakePage::new("Announcements")
                .with_text("div.d2l-widget-content", "  First item \n\n\n Second item ")
                .with_links(vec![
                    "https://x/1".to_string(),
                    "https://x/1".to_string(),
                    "https://x/2".to_string(),
                ]),
        );

        let fetcher = ContentFetcher::new(browser.clone(), no_delay_config());
        let mut manager = open_manager(browser);
        let target = FetchTarget::new("A", "https://x/a");
        let record = fetcher.fetch(&mut manager, 0, &target).await;

        assert!(!record.is_error());
        assert_eq!(record.title, "Announcements");
        assert_eq!(record.content, "First item\n\nSecond item");
        assert_eq!(record.links, vec!["https://x/1".to_string(), "https://x/2".to_string()]);
    }

    #[tokio::test]
    async fn test_fetch_falls_through_content_selectors() {
        let browser = Arc::new(FakeBrowser::new());
        browser.add_page(
            "https://x/plain",
            FakePage::new("Plain").with_text("main", "from main region"),
        );

        let fetcher = ContentFetcher::new(browser.clone(), no_delay_config());
        let mut manager = open_manager(browser);
        let record = fetcher
            .fetch(&mut manager, 0, &FetchTarget::new("P", "https://x/plain"))
            .await;

        assert_eq!(record.content, "from main region");
    }

    #[tokio::test]
    async fn test_fetch_failure_is_recorded_not_raised() {
        let browser = Arc::new(FakeBrowser::new());
        browser.add_page("https://x/broken", FakePage::new("B").failing());

        let fetcher = ContentFetcher::new(browser.clone(), no_delay_config());
        let mut manager = open_manager(browser);
        let target = FetchTarget::new("Broken", "https://x/broken");
        let record = fetcher.fetch(&mut manager, 4, &target).await;

        assert!(record.is_error());
        assert_eq!(record.index, 4);
        assert_eq!(record.label, "Broken");
        assert_eq!(record.url, "https://x/broken");
        assert!(record.content.is_empty());
    }

    #[tokio::test]
    async fn test_fetch_records_error_when_relogin_still_bounces() {
        use crate::browser::{FakeIdp, TwoFactorScript};
        use crate::session::LoginSelectors;

        let selectors = LoginSelectors::default();
        let browser = Arc::new(FakeBrowser::with_idp(FakeIdp {
            login_url: "https://idp.test/signin".to_string(),
            username_input: selectors.username_input,
            username_submit: selectors.username_submit,
            password_input: selectors.password_input,
            password_submit: selectors.password_submit,
            stay_signed_in_button: selectors.stay_signed_in_button,
            code_display: selectors.code_display,
            code_input: selectors.code_input,
            code_submit: selectors.code_submit,
            stay_signed_in_prompt: false,
            omit_password_field: false,
            two_factor: TwoFactorScript::None,
        }));
        browser.add_page(
            "https://x/guarded",
            FakePage::new("Guarded").with_text("main", "never served"),
        );
        // The portal rejects the fresh session: the retried navigation
        // bounces right back to the login page.
        browser.force_session_rejection();

        let fetcher = ContentFetcher::new(browser.clone(), no_delay_config());
        let mut manager = open_manager(browser);
        let target = FetchTarget::new("Guarded", "https://x/guarded");
        let record = fetcher.fetch(&mut manager, 2, &target).await;

        assert!(record.is_error());
        assert!(record
            .error
            .as_deref()
            .unwrap()
            .contains("identity provider"));
        assert_eq!(record.index, 2);
        assert_eq!(record.url, "https://x/guarded");
        // The login page itself must never be extracted as content.
        assert!(record.title.is_empty());
        assert!(record.content.is_empty());
    }

    #[tokio::test]
    async fn test_fetch_caps_links() {
        let browser = Arc::new(FakeBrowser::new());
        browser.add_page(
            "https://x/many",
            FakePage::new("Many").with_links(
                (0..10).map(|i| format!("https://x/{}", i)).collect(),
            ),
        );

        let fetcher = ContentFetcher::new(browser.clone(), no_delay_config());
        let mut manager = open_manager(browser);
        let record = fetcher
            .fetch(&mut manager, 0, &FetchTarget::new("M", "https://x/many"))
            .await;

        assert_eq!(record.links.len(), 3);
    }

    #[tokio::test]
    async fn test_fetch_extracts_contact_when_enabled() {
        let browser = Arc::new(FakeBrowser::new());
        browser.add_page(
            "https://x/prof",
            FakePage::new("Prof").with_text("main", "Email: g@college.edu\nOffice: L-205"),
        );

        let fetcher =
            ContentFetcher::new(browser.clone(), no_delay_config()).with_contact_extraction();
        let mut manager = open_manager(browser);
        let record = fetcher
            .fetch(&mut manager, 0, &FetchTarget::new("P", "https://x/prof"))
            .await;

        let contact = record.contact.expect("contact fields");
        assert_eq!(contact.emails, vec!["g@college.edu".to_string()]);
        assert_eq!(contact.offices, vec!["L-205".to_string()]);
    }

    #[tokio::test]
    async fn test_fetch_takes_debug_screenshot() {
        let browser = Arc::new(FakeBrowser::new());
        browser.add_page("https://x/a", FakePage::new("A").with_text("main", "x"));

        let dir = std::env::temp_dir();
        let fetcher =
            ContentFetcher::new(browser.clone(), no_delay_config()).with_screenshots(dir.clone());
        let mut manager = open_manager(browser.clone());
        fetcher
            .fetch(&mut manager, 7, &FetchTarget::new("A", "https://x/a"))
            .await;

        assert_eq!(browser.screenshots(), vec![dir.join("target_007.png")]);
    }

    #[tokio::test]
    async fn test_polite_delay_zero_window_returns_immediately() {
        let browser = Arc::new(FakeBrowser::new());
        let fetcher = ContentFetcher::new(browser, no_delay_config());
        tokio::time::timeout(Duration::from_millis(50), fetcher.polite_delay())
            .await
            .expect("zero-width delay must not sleep");
    }
}
