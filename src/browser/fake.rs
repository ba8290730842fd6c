//! In-process fake browser for unit and integration tests
//!
//! [`FakeBrowser`] replaces the WebDriver-backed browsing context in tests.
//! It serves scripted pages keyed by URL and, optionally, simulates an
//! identity-provider login flow ([`FakeIdp`]) in front of them: username and
//! password steps, a "stay signed in" interstitial, and a two-factor stage
//! that either approves out-of-band after a number of URL polls, displays a
//! numeric code to be filled back in, or never approves at all.
//!
//! The fake knows nothing about which selectors the session manager uses;
//! tests pass the selector strings in when building the [`FakeIdp`], so the
//! same fake exercises both the login state machine and content extraction.
//!
//! # Example
//!
//! ```
//! use campus_scout::browser::{Browser, FakeBrowser, FakePage};
//!
//! # #[tokio::main]
//! # async fn main() {
//! let browser = FakeBrowser::new();
//! browser.add_page(
//!     "https://x/a",
//!     FakePage::new("Page A").with_text("#content", "hello"),
//! );
//!
//! browser.goto("https://x/a").await.unwrap();
//! assert_eq!(browser.title().await.unwrap(), "Page A");
//! assert_eq!(
//!     browser.text_of("#content").await.unwrap(),
//!     Some("hello".to_string())
//! );
//! # }
//! ```

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::browser::Browser;
use crate::error::{Result, ScoutError};

/// One scripted page served by the fake browser.
#[derive(Debug, Clone, Default)]
pub struct FakePage {
    /// Page title
    pub title: String,
    /// Text returned by `text_of(selector)`, keyed by selector
    pub texts: HashMap<String, String>,
    /// Values returned by `attr_of_all("a[href]", "href")`
    pub links: Vec<String>,
    /// When true, navigating to this page reaches it without authentication
    pub public: bool,
    /// When true, `goto` fails with a browser error
    pub fail_navigation: bool,
}

impl FakePage {
    /// Create a page with the given title.
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Default::default()
        }
    }

    /// Script the text returned for a selector.
    pub fn with_text(mut self, selector: impl Into<String>, text: impl Into<String>) -> Self {
        self.texts.insert(selector.into(), text.into());
        self
    }

    /// Script the outbound links of the page.
    pub fn with_links(mut self, links: Vec<String>) -> Self {
        self.links = links;
        self
    }

    /// Mark the page as reachable without authentication.
    pub fn public(mut self) -> Self {
        self.public = true;
        self
    }

    /// Make navigation to this page fail outright.
    pub fn failing(mut self) -> Self {
        self.fail_navigation = true;
        self
    }
}

/// How the fake identity provider resolves the two-factor stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TwoFactorScript {
    /// No two-factor challenge; login completes after the password step
    None,
    /// Out-of-band approval lands after this many `current_url` polls
    ApproveAfterPolls(u32),
    /// A numeric code is displayed and must be filled back in
    DisplayCode(String),
    /// The challenge is never approved (forces the timeout path)
    NeverApproved,
}

/// Scripted identity-provider login flow placed in front of the pages.
///
/// All selector strings are supplied by the test so the fake carries no
/// knowledge of any real vendor markup.
#[derive(Debug, Clone)]
pub struct FakeIdp {
    /// URL unauthenticated navigations are redirected to
    pub login_url: String,
    /// Username input selector
    pub username_input: String,
    /// Username submit selector
    pub username_submit: String,
    /// Password input selector
    pub password_input: String,
    /// Password submit selector
    pub password_submit: String,
    /// "Stay signed in" accept-button selector
    pub stay_signed_in_button: String,
    /// Displayed two-factor code selector
    pub code_display: String,
    /// Two-factor code input selector
    pub code_input: String,
    /// Two-factor code submit selector
    pub code_submit: String,
    /// Whether the "stay signed in" interstitial appears
    pub stay_signed_in_prompt: bool,
    /// Simulate UI drift: the password field never appears
    pub omit_password_field: bool,
    /// Two-factor behavior
    pub two_factor: TwoFactorScript,
}

/// Login flow stage the fake identity provider is currently in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum IdpStage {
    EnterUsername,
    EnterPassword,
    StaySignedIn,
    TwoFactor,
    Done,
}

#[derive(Debug)]
struct FakeState {
    authenticated: bool,
    reject_new_sessions: bool,
    current_url: String,
    pending_destination: Option<String>,
    stage: IdpStage,
    polls_remaining: u32,
    visited: Vec<String>,
    fills: Vec<(String, String)>,
    clicks: Vec<String>,
    screenshots: Vec<PathBuf>,
}

/// In-process scripted browser.
///
/// Shared-state methods take `&self`; tests typically hold an
/// `Arc<FakeBrowser>` and hand a clone of the `Arc` (as `Arc<dyn Browser>`)
/// to the code under test, keeping their own handle for assertions.
#[derive(Debug)]
pub struct FakeBrowser {
    pages: Mutex<HashMap<String, FakePage>>,
    idp: Option<FakeIdp>,
    state: Mutex<FakeState>,
}

impl FakeBrowser {
    /// Create a fake browser with no login flow: every page is reachable.
    pub fn new() -> Self {
        Self::build(None)
    }

    /// Create a fake browser whose pages sit behind the given login flow.
    pub fn with_idp(idp: FakeIdp) -> Self {
        Self::build(Some(idp))
    }

    fn build(idp: Option<FakeIdp>) -> Self {
        Self {
            pages: Mutex::new(HashMap::new()),
            idp,
            state: Mutex::new(FakeState {
                authenticated: false,
                reject_new_sessions: false,
                current_url: "about:blank".to_string(),
                pending_destination: None,
                stage: IdpStage::EnterUsername,
                polls_remaining: 0,
                visited: Vec::new(),
                fills: Vec::new(),
                clicks: Vec::new(),
                screenshots: Vec::new(),
            }),
        }
    }

    /// Register a scripted page.
    pub fn add_page(&self, url: impl Into<String>, page: FakePage) {
        self.pages.lock().unwrap().insert(url.into(), page);
    }

    /// Drop authentication so the next protected navigation redirects to
    /// the login page again (simulates session expiry mid-run).
    pub fn force_expire(&self) {
        let mut state = self.state.lock().unwrap();
        state.authenticated = false;
        state.stage = IdpStage::EnterUsername;
    }

    /// Keep redirecting protected navigations to the login page even after
    /// a login flow completes (simulates a portal that rejects the new
    /// session, so every retry bounces straight back).
    pub fn force_session_rejection(&self) {
        self.state.lock().unwrap().reject_new_sessions = true;
    }

    /// URLs passed to `goto`, in call order.
    pub fn visited(&self) -> Vec<String> {
        self.state.lock().unwrap().visited.clone()
    }

    /// Selectors passed to `click`, in call order.
    pub fn clicks(&self) -> Vec<String> {
        self.state.lock().unwrap().clicks.clone()
    }

    /// `(selector, text)` pairs passed to `fill`, in call order.
    pub fn fills(&self) -> Vec<(String, String)> {
        self.state.lock().unwrap().fills.clone()
    }

    /// Paths passed to `screenshot`, in call order.
    pub fn screenshots(&self) -> Vec<PathBuf> {
        self.state.lock().unwrap().screenshots.clone()
    }

    fn on_login_page(&self, state: &FakeState) -> bool {
        match &self.idp {
            Some(idp) => state.current_url == idp.login_url,
            None => false,
        }
    }

    /// Whether a selector exists in the current login stage.
    fn login_selector_exists(&self, idp: &FakeIdp, stage: IdpStage, selector: &str) -> bool {
        match stage {
            IdpStage::EnterUsername => {
                selector == idp.username_input || selector == idp.username_submit
            }
            IdpStage::EnterPassword => {
                !idp.omit_password_field
                    && (selector == idp.password_input || selector == idp.password_submit)
            }
            IdpStage::StaySignedIn => selector == idp.stay_signed_in_button,
            IdpStage::TwoFactor => match &idp.two_factor {
                TwoFactorScript::DisplayCode(_) => {
                    selector == idp.code_display
                        || selector == idp.code_input
                        || selector == idp.code_submit
                }
                _ => false,
            },
            IdpStage::Done => false,
        }
    }

    fn complete_login(&self, state: &mut FakeState) {
        state.authenticated = true;
        state.stage = IdpStage::Done;
        if let Some(dest) = state.pending_destination.take() {
            state.current_url = dest;
        }
    }

    /// Advance past the password step according to the scripted flow.
    fn after_password(&self, idp: &FakeIdp, state: &mut FakeState) {
        if idp.stay_signed_in_prompt {
            state.stage = IdpStage::StaySignedIn;
        } else {
            self.after_stay_signed_in(idp, state);
        }
    }

    fn after_stay_signed_in(&self, idp: &FakeIdp, state: &mut FakeState) {
        match &idp.two_factor {
            TwoFactorScript::None => self.complete_login(state),
            TwoFactorScript::ApproveAfterPolls(n) => {
                state.stage = IdpStage::TwoFactor;
                state.polls_remaining = *n;
            }
            TwoFactorScript::DisplayCode(_) | TwoFactorScript::NeverApproved => {
                state.stage = IdpStage::TwoFactor;
            }
        }
    }
}

impl Default for FakeBrowser {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl Browser for FakeBrowser {
    async fn goto(&self, url: &str) -> Result<()> {
        // Lock order everywhere: state before pages.
        let mut state = self.state.lock().unwrap();
        let pages = self.pages.lock().unwrap();
        state.visited.push(url.to_string());

        if let Some(page) = pages.get(url) {
            if page.fail_navigation {
                return Err(ScoutError::Browser(format!("net::ERR_FAILED loading {}", url)).into());
            }
        }

        let public = pages.get(url).map(|p| p.public).unwrap_or(false);
        let bounced = !state.authenticated || state.reject_new_sessions;
        match &self.idp {
            Some(idp) if bounced && !public && url != idp.login_url => {
                // Unauthenticated access bounces to the login page.
                state.pending_destination = Some(url.to_string());
                state.current_url = idp.login_url.clone();
                state.stage = IdpStage::EnterUsername;
            }
            _ => {
                state.current_url = url.to_string();
            }
        }
        Ok(())
    }

    async fn current_url(&self) -> Result<String> {
        let mut state = self.state.lock().unwrap();

        // Out-of-band approval lands after the scripted number of polls.
        if state.stage == IdpStage::TwoFactor {
            if let Some(idp) = &self.idp {
                if matches!(idp.two_factor, TwoFactorScript::ApproveAfterPolls(_)) {
                    if state.polls_remaining == 0 {
                        self.complete_login(&mut state);
                    } else {
                        state.polls_remaining -= 1;
                    }
                }
            }
        }

        Ok(state.current_url.clone())
    }

    async fn title(&self) -> Result<String> {
        let state = self.state.lock().unwrap();
        if self.on_login_page(&state) {
            return Ok("Sign in".to_string());
        }
        let pages = self.pages.lock().unwrap();
        Ok(pages
            .get(&state.current_url)
            .map(|p| p.title.clone())
            .unwrap_or_default())
    }

    async fn exists(&self, selector: &str) -> Result<bool> {
        let state = self.state.lock().unwrap();
        if self.on_login_page(&state) {
            let idp = self.idp.as_ref().unwrap();
            return Ok(self.login_selector_exists(idp, state.stage, selector));
        }

        let pages = self.pages.lock().unwrap();
        let page = match pages.get(&state.current_url) {
            Some(page) => page,
            None => return Ok(false),
        };
        if selector == "a[href]" {
            return Ok(!page.links.is_empty());
        }
        Ok(page.texts.contains_key(selector))
    }

    async fn text_of(&self, selector: &str) -> Result<Option<String>> {
        let state = self.state.lock().unwrap();
        if self.on_login_page(&state) {
            let idp = self.idp.as_ref().unwrap();
            if state.stage == IdpStage::TwoFactor && selector == idp.code_display {
                if let TwoFactorScript::DisplayCode(code) = &idp.two_factor {
                    return Ok(Some(code.clone()));
                }
            }
            return Ok(None);
        }

        let pages = self.pages.lock().unwrap();
        Ok(pages
            .get(&state.current_url)
            .and_then(|p| p.texts.get(selector))
            .cloned())
    }

    async fn attr_of_all(&self, selector: &str, attr: &str) -> Result<Vec<String>> {
        let state = self.state.lock().unwrap();
        if selector != "a[href]" || attr != "href" {
            return Ok(Vec::new());
        }
        let pages = self.pages.lock().unwrap();
        Ok(pages
            .get(&state.current_url)
            .map(|p| p.links.clone())
            .unwrap_or_default())
    }

    async fn fill(&self, selector: &str, text: &str) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        if self.on_login_page(&state) {
            let idp = self.idp.as_ref().unwrap();
            if !self.login_selector_exists(idp, state.stage, selector) {
                return Err(
                    ScoutError::Browser(format!("no such element: {}", selector)).into(),
                );
            }
        }
        state.fills.push((selector.to_string(), text.to_string()));
        Ok(())
    }

    async fn click(&self, selector: &str) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.clicks.push(selector.to_string());

        if !self.on_login_page(&state) {
            return Ok(());
        }
        let idp = self.idp.as_ref().unwrap().clone();
        if !self.login_selector_exists(&idp, state.stage, selector) {
            return Err(ScoutError::Browser(format!("no such element: {}", selector)).into());
        }

        match state.stage {
            IdpStage::EnterUsername if selector == idp.username_submit => {
                state.stage = IdpStage::EnterPassword;
            }
            IdpStage::EnterPassword if selector == idp.password_submit => {
                self.after_password(&idp, &mut state);
            }
            IdpStage::StaySignedIn if selector == idp.stay_signed_in_button => {
                self.after_stay_signed_in(&idp, &mut state);
            }
            IdpStage::TwoFactor if selector == idp.code_submit => {
                // Accept the click when the displayed code was filled in.
                if let TwoFactorScript::DisplayCode(code) = &idp.two_factor {
                    let filled = state
                        .fills
                        .iter()
                        .any(|(sel, text)| sel == &idp.code_input && text == code);
                    if filled {
                        self.complete_login(&mut state);
                    }
                }
            }
            _ => {}
        }
        Ok(())
    }

    async fn screenshot(&self, path: &Path) -> Result<()> {
        self.state
            .lock()
            .unwrap()
            .screenshots
            .push(path.to_path_buf());
        Ok(())
    }
}
