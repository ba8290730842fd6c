use std::sync::Arc;

use tempfile::TempDir;

use campus_scout::browser::{FakeBrowser, FakeIdp, FakePage, TwoFactorScript};
use campus_scout::config::{AuthConfig, Credentials, ScrapeConfig};
use campus_scout::scrape::ContentFetcher;
use campus_scout::session::{LoginSelectors, SessionManager};
use campus_scout::storage::RunStore;

#[allow(dead_code)]
pub const HOME: &str = "https://learn.test.edu/d2l/home";
#[allow(dead_code)]
pub const IDP_DOMAIN: &str = "idp.test";
#[allow(dead_code)]
pub const LOGIN_URL: &str = "https://idp.test/signin";

/// Fake identity provider wired to the default login selectors.
#[allow(dead_code)]
pub fn fake_idp(two_factor: TwoFactorScript) -> FakeIdp {
    let selectors = LoginSelectors::default();
    FakeIdp {
        login_url: LOGIN_URL.to_string(),
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
        two_factor,
    }
}

/// Timing configuration that keeps test runs fast.
#[allow(dead_code)]
pub fn fast_auth() -> AuthConfig {
    AuthConfig {
        two_factor_timeout_seconds: 2,
        two_factor_poll_seconds: 1,
        step_timeout_seconds: 1,
        keep_signed_in: true,
    }
}

#[allow(dead_code)]
pub fn test_credentials() -> Credentials {
    Credentials {
        username: "student@college.edu".to_string(),
        password: "hunter2".to_string(),
    }
}

/// Scrape configuration with the politeness delay disabled.
#[allow(dead_code)]
pub fn no_delay_scrape() -> ScrapeConfig {
    ScrapeConfig {
        webdriver_url: "http://localhost:4444".to_string(),
        max_links_per_page: 50,
        delay_min_ms: 0,
        delay_max_ms: 0,
    }
}

#[allow(dead_code)]
pub fn session_manager(browser: Arc<FakeBrowser>) -> SessionManager {
    SessionManager::new(browser, test_credentials(), fast_auth(), IDP_DOMAIN, HOME)
}

#[allow(dead_code)]
pub fn content_fetcher(browser: Arc<FakeBrowser>) -> ContentFetcher {
    ContentFetcher::new(browser, no_delay_scrape())
}

#[allow(dead_code)]
pub fn temp_store() -> (RunStore, TempDir) {
    let dir = TempDir::new().expect("failed to create tempdir");
    let store = RunStore::new(dir.path().to_path_buf());
    (store, dir)
}

/// A protected page carrying body text under the `main` selector.
#[allow(dead_code)]
pub fn content_page(title: &str, body: &str) -> FakePage {
    FakePage::new(title).with_text("main", body)
}
