//! Portal session management
//!
//! One [`SessionManager`] owns the login state machine for one run:
//! `Unauthenticated -> CredentialsSubmitted -> {StaySignedInPrompt?} ->
//! {TwoFactorPending?} -> Authenticated`. Only `TwoFactorPending` suspends;
//! every other step is bounded by the configured per-step timeout.
//!
//! The two-factor wait polls on a fixed interval until either the current
//! URL leaves the identity-provider domain (out-of-band approval) or a
//! displayed numeric code can be auto-filled into a detected input. The
//! same wait loop used to be duplicated across every scraper script; it
//! lives here once.

use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::browser::Browser;
use crate::config::{AuthConfig, Credentials};
use crate::error::{Result, ScoutError};
use crate::scrape::record::now_rfc3339;

/// Authoritative login states of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthState {
    /// No credentials submitted yet
    Unauthenticated,
    /// Identifier and secret submitted, outcome pending
    CredentialsSubmitted,
    /// The "stay signed in" interstitial was shown
    StaySignedInPrompt,
    /// Waiting for out-of-band approval or a code challenge
    TwoFactorPending,
    /// The browsing context is authenticated
    Authenticated,
}

/// An authenticated browsing session for one pipeline run.
///
/// Owned exclusively by the [`SessionManager`]; destroyed when the run
/// ends together with the underlying browsing context.
#[derive(Debug, Clone)]
pub struct Session {
    /// Current authentication state
    pub state: AuthState,
    /// RFC-3339 timestamp of the moment authentication completed
    pub established_at: Option<String>,
    /// Number of login flows performed (initial plus re-authentications)
    pub logins_performed: u32,
}

impl Session {
    fn new() -> Self {
        Self {
            state: AuthState::Unauthenticated,
            established_at: None,
            logins_performed: 0,
        }
    }
}

/// CSS selectors of the identity-provider login markup.
///
/// Vendor-specific by nature; kept in one place so UI drift means one
/// update. The defaults match the Microsoft login pages the college
/// portal fronts with.
#[derive(Debug, Clone)]
pub struct LoginSelectors {
    /// Identifier (email) input on the first login step
    pub username_input: String,
    /// Submit button on the first login step
    pub username_submit: String,
    /// Secret input on the second login step
    pub password_input: String,
    /// Submit button on the second login step
    pub password_submit: String,
    /// Accept button of the "stay signed in" interstitial
    pub stay_signed_in_button: String,
    /// Element displaying the two-factor challenge number
    pub code_display: String,
    /// Input the challenge number can be typed into
    pub code_input: String,
    /// Submit button of the code challenge form
    pub code_submit: String,
}

impl Default for LoginSelectors {
    fn default() -> Self {
        Self {
            username_input: "input[type=email]".to_string(),
            username_submit: "input[type=submit]".to_string(),
            password_input: "input[name=passwd]".to_string(),
            password_submit: "input[type=submit]".to_string(),
            stay_signed_in_button: "#idSIButton9".to_string(),
            code_display: "#idRichContext_DisplaySign".to_string(),
            code_input: "input[name=otc]".to_string(),
            code_submit: "#idSubmit_SAOTCC_Continue".to_string(),
        }
    }
}

/// Produces and maintains one authenticated session per run.
///
/// Exactly one login flow is in flight at any time; the manager owns the
/// browsing context's authentication state for the duration of the run.
pub struct SessionManager {
    browser: Arc<dyn Browser>,
    credentials: Credentials,
    auth: AuthConfig,
    idp_domain: String,
    home_url: String,
    selectors: LoginSelectors,
    session: Session,
}

impl SessionManager {
    /// Create a session manager over an (unauthenticated) browsing context.
    ///
    /// # Arguments
    ///
    /// * `browser` - The browsing context to authenticate
    /// * `credentials` - Portal credential pair (already validated non-empty)
    /// * `auth` - Timing configuration for the login flow
    /// * `idp_domain` - Identity-provider domain; leaving it signals approval
    /// * `home_url` - Portal page used to trigger and verify authentication
    pub fn new(
        browser: Arc<dyn Browser>,
        credentials: Credentials,
        auth: AuthConfig,
        idp_domain: impl Into<String>,
        home_url: impl Into<String>,
    ) -> Self {
        Self {
            browser,
            credentials,
            auth,
            idp_domain: idp_domain.into(),
            home_url: home_url.into(),
            selectors: LoginSelectors::default(),
            session: Session::new(),
        }
    }

    /// Override the login selectors (used by tests and non-default portals).
    pub fn with_selectors(mut self, selectors: LoginSelectors) -> Self {
        self.selectors = selectors;
        self
    }

    /// Current session snapshot.
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Establish the authenticated session.
    ///
    /// Navigates to the portal home page; if it loads directly the session
    /// is already authenticated and no credentials are submitted. Otherwise
    /// the full login flow runs.
    ///
    /// # Errors
    ///
    /// * `ScoutError::AuthenticationUiMismatch` - a login selector never
    ///   appeared within the step timeout (upstream UI drift, do not retry)
    /// * `ScoutError::AuthenticationTimeout` - the two-factor challenge was
    ///   not approved within the configured ceiling
    pub async fn authenticate(&mut self) -> Result<()> {
        tracing::info!("Opening portal home page: {}", self.home_url);
        self.browser.goto(&self.home_url).await?;

        if !self.on_idp().await? {
            tracing::info!("Portal reachable without login; session already authenticated");
            self.mark_authenticated();
            return Ok(());
        }

        self.login_flow().await
    }

    /// Re-authenticate only if the context has been bounced back to the
    /// identity provider. Idempotent and side-effect-free when the session
    /// is still live.
    ///
    /// # Returns
    ///
    /// Returns `true` when a login flow actually ran.
    pub async fn ensure_authenticated(&mut self) -> Result<bool> {
        if !self.on_idp().await? {
            return Ok(false);
        }
        tracing::warn!("Session expired; re-running login flow");
        self.session.state = AuthState::Unauthenticated;
        self.login_flow().await?;
        Ok(true)
    }

    /// Run the credential submission and two-factor flow from the login page.
    async fn login_flow(&mut self) -> Result<()> {
        let step = Duration::from_secs(self.auth.step_timeout_seconds);

        // Step one: identifier.
        if !self.wait_for(&self.selectors.username_input.clone(), step).await? {
            return Err(ScoutError::AuthenticationUiMismatch(
                self.selectors.username_input.clone(),
            )
            .into());
        }
        self.browser
            .fill(&self.selectors.username_input, &self.credentials.username)
            .await?;
        self.browser.click(&self.selectors.username_submit).await?;
        tracing::debug!("Submitted account identifier");

        // Step two: secret.
        if !self.wait_for(&self.selectors.password_input.clone(), step).await? {
            return Err(ScoutError::AuthenticationUiMismatch(
                self.selectors.password_input.clone(),
            )
            .into());
        }
        self.browser
            .fill(&self.selectors.password_input, &self.credentials.password)
            .await?;
        self.browser.click(&self.selectors.password_submit).await?;
        self.session.state = AuthState::CredentialsSubmitted;
        tracing::debug!("Submitted account secret");

        // The interstitial does not always appear; probe briefly.
        if self.auth.keep_signed_in {
            let probe = Duration::from_secs(self.auth.step_timeout_seconds.min(3));
            if self
                .wait_for(&self.selectors.stay_signed_in_button.clone(), probe)
                .await?
            {
                self.session.state = AuthState::StaySignedInPrompt;
                self.browser
                    .click(&self.selectors.stay_signed_in_button)
                    .await?;
                tracing::debug!("Accepted stay-signed-in prompt");
            }
        }

        if !self.on_idp().await? {
            self.mark_authenticated();
            return Ok(());
        }

        self.wait_for_two_factor().await
    }

    /// Bounded two-factor wait: poll for out-of-band approval (URL leaves
    /// the identity-provider domain) or a displayed code to auto-fill.
    async fn wait_for_two_factor(&mut self) -> Result<()> {
        self.session.state = AuthState::TwoFactorPending;
        let ceiling = Duration::from_secs(self.auth.two_factor_timeout_seconds);
        let interval = Duration::from_secs(self.auth.two_factor_poll_seconds);
        let started = Instant::now();

        tracing::info!(
            "Two-factor challenge pending; waiting up to {}s for approval",
            self.auth.two_factor_timeout_seconds
        );

        let mut code_submitted = false;
        while started.elapsed() < ceiling {
            if !self.on_idp().await? {
                self.mark_authenticated();
                return Ok(());
            }

            // A displayed number plus an input field means the challenge can
            // be answered in-page.
            if !code_submitted {
                if let Some(code) = self.displayed_code().await? {
                    if self.browser.exists(&self.selectors.code_input).await? {
                        tracing::info!("Auto-filling displayed two-factor code");
                        self.browser.fill(&self.selectors.code_input, &code).await?;
                        self.browser.click(&self.selectors.code_submit).await?;
                        code_submitted = true;
                    } else {
                        tracing::info!("Approve sign-in on your device; number shown: {}", code);
                    }
                }
            }

            tokio::time::sleep(interval).await;
        }

        Err(ScoutError::AuthenticationTimeout {
            waited_seconds: started.elapsed().as_secs(),
        }
        .into())
    }

    /// Read the displayed challenge number, if any, reduced to its digits.
    async fn displayed_code(&self) -> Result<Option<String>> {
        let raw = match self.browser.text_of(&self.selectors.code_display).await? {
            Some(raw) => raw,
            None => return Ok(None),
        };
        let digits: String = raw.chars().filter(|c| c.is_ascii_digit()).collect();
        if digits.is_empty() {
            Ok(None)
        } else {
            Ok(Some(digits))
        }
    }

    /// Poll for a selector until it appears or the bound elapses.
    async fn wait_for(&self, selector: &str, bound: Duration) -> Result<bool> {
        let started = Instant::now();
        loop {
            if self.browser.exists(selector).await? {
                return Ok(true);
            }
            if started.elapsed() >= bound {
                return Ok(false);
            }
            tokio::time::sleep(Duration::from_millis(250)).await;
        }
    }

    /// Whether the context currently shows an identity-provider page.
    ///
    /// Callers that retry a navigation after a re-login use this to detect
    /// a portal that keeps bouncing the fresh session back to the login
    /// page, which is a per-target failure rather than an expiry.
    pub async fn on_idp(&self) -> Result<bool> {
        let current = self.browser.current_url().await?;
        Ok(url_on_domain(&current, &self.idp_domain))
    }

    fn mark_authenticated(&mut self) {
        self.session.state = AuthState::Authenticated;
        self.session.established_at = Some(now_rfc3339());
        self.session.logins_performed += 1;
        tracing::info!("Session authenticated");
    }
}

/// Whether a URL's host is the given domain or a subdomain of it.
fn url_on_domain(candidate: &str, domain: &str) -> bool {
    match url::Url::parse(candidate) {
        Ok(parsed) => parsed
            .host_str()
            .map(|host| host == domain || host.ends_with(&format!(".{}", domain)))
            .unwrap_or(false),
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::browser::{FakeBrowser, FakeIdp, FakePage, TwoFactorScript};

    const HOME: &str = "https://learn.test.edu/d2l/home";
    const IDP_DOMAIN: &str = "idp.test";

    fn fake_idp(two_factor: TwoFactorScript) -> FakeIdp {
        let selectors = LoginSelectors::default();
        FakeIdp {
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
            two_factor,
        }
    }

    fn fast_auth() -> AuthConfig {
        AuthConfig {
            two_factor_timeout_seconds: 2,
            two_factor_poll_seconds: 1,
            step_timeout_seconds: 1,
            keep_signed_in: true,
        }
    }

    fn credentials() -> Credentials {
        Credentials {
            username: "student@college.edu".to_string(),
            password: "hunter2".to_string(),
        }
    }

    fn manager(browser: Arc<FakeBrowser>) -> SessionManager {
        SessionManager::new(browser, credentials(), fast_auth(), IDP_DOMAIN, HOME)
    }

    #[tokio::test]
    async fn test_authenticate_without_two_factor() {
        let browser = Arc::new(FakeBrowser::with_idp(fake_idp(TwoFactorScript::None)));
        browser.add_page(HOME, FakePage::new("Home"));

        let mut mgr = manager(browser.clone());
        mgr.authenticate().await.unwrap();

        assert_eq!(mgr.session().state, AuthState::Authenticated);
        assert_eq!(mgr.session().logins_performed, 1);
        assert!(mgr.session().established_at.is_some());
        // Both credential fields were filled.
        let fills = browser.fills();
        assert!(fills.iter().any(|(_, v)| v == "student@college.edu"));
        assert!(fills.iter().any(|(_, v)| v == "hunter2"));
    }

    #[tokio::test]
    async fn test_authenticate_already_authenticated_portal() {
        // No IdP at all: the home page loads directly.
        let browser = Arc::new(FakeBrowser::new());
        browser.add_page(HOME, FakePage::new("Home"));

        let mut mgr = manager(browser.clone());
        mgr.authenticate().await.unwrap();

        assert_eq!(mgr.session().state, AuthState::Authenticated);
        assert!(browser.fills().is_empty(), "no credentials submitted");
    }

    #[tokio::test]
    async fn test_authenticate_with_stay_signed_in_prompt() {
        let mut idp = fake_idp(TwoFactorScript::None);
        idp.stay_signed_in_prompt = true;
        let browser = Arc::new(FakeBrowser::with_idp(idp));
        browser.add_page(HOME, FakePage::new("Home"));

        let mut mgr = manager(browser.clone());
        mgr.authenticate().await.unwrap();

        assert_eq!(mgr.session().state, AuthState::Authenticated);
        assert!(browser.clicks().contains(&"#idSIButton9".to_string()));
    }

    #[tokio::test]
    async fn test_authenticate_with_out_of_band_approval() {
        let browser = Arc::new(FakeBrowser::with_idp(fake_idp(
            TwoFactorScript::ApproveAfterPolls(1),
        )));
        browser.add_page(HOME, FakePage::new("Home"));

        let mut mgr = manager(browser.clone());
        tokio::time::timeout(Duration::from_secs(10), mgr.authenticate())
            .await
            .expect("authenticate must finish within the ceiling")
            .unwrap();

        assert_eq!(mgr.session().state, AuthState::Authenticated);
    }

    #[tokio::test]
    async fn test_authenticate_with_displayed_code() {
        let browser = Arc::new(FakeBrowser::with_idp(fake_idp(TwoFactorScript::DisplayCode(
            "73".to_string(),
        ))));
        browser.add_page(HOME, FakePage::new("Home"));

        let mut mgr = manager(browser.clone());
        tokio::time::timeout(Duration::from_secs(10), mgr.authenticate())
            .await
            .expect("authenticate must finish within the ceiling")
            .unwrap();

        assert_eq!(mgr.session().state, AuthState::Authenticated);
        assert!(browser
            .fills()
            .iter()
            .any(|(sel, text)| sel == "input[name=otc]" && text == "73"));
    }

    #[tokio::test]
    async fn test_authenticate_times_out_when_never_approved() {
        let browser = Arc::new(FakeBrowser::with_idp(fake_idp(TwoFactorScript::NeverApproved)));
        browser.add_page(HOME, FakePage::new("Home"));

        let mut mgr = manager(browser.clone());
        let result = tokio::time::timeout(Duration::from_secs(10), mgr.authenticate())
            .await
            .expect("authenticate must raise within the timeout bound, not hang");

        let err = result.unwrap_err();
        let scout = err.downcast_ref::<ScoutError>().expect("ScoutError");
        assert!(matches!(scout, ScoutError::AuthenticationTimeout { .. }));
    }

    #[tokio::test]
    async fn test_authenticate_ui_mismatch_on_missing_password_field() {
        let mut idp = fake_idp(TwoFactorScript::None);
        idp.omit_password_field = true;
        let browser = Arc::new(FakeBrowser::with_idp(idp));
        browser.add_page(HOME, FakePage::new("Home"));

        let mut mgr = manager(browser.clone());
        let err = mgr.authenticate().await.unwrap_err();
        let scout = err.downcast_ref::<ScoutError>().expect("ScoutError");
        assert!(matches!(scout, ScoutError::AuthenticationUiMismatch(_)));
    }

    #[tokio::test]
    async fn test_ensure_authenticated_is_idempotent_when_live() {
        let browser = Arc::new(FakeBrowser::with_idp(fake_idp(TwoFactorScript::None)));
        browser.add_page(HOME, FakePage::new("Home"));

        let mut mgr = manager(browser.clone());
        mgr.authenticate().await.unwrap();
        let fills_after_login = browser.fills().len();

        let ran = mgr.ensure_authenticated().await.unwrap();
        assert!(!ran);
        assert_eq!(browser.fills().len(), fills_after_login);
    }

    #[tokio::test]
    async fn test_ensure_authenticated_reruns_login_after_expiry() {
        let browser = Arc::new(FakeBrowser::with_idp(fake_idp(TwoFactorScript::None)));
        browser.add_page(HOME, FakePage::new("Home"));

        let mut mgr = manager(browser.clone());
        mgr.authenticate().await.unwrap();

        browser.force_expire();
        browser.goto(HOME).await.unwrap();

        let ran = mgr.ensure_authenticated().await.unwrap();
        assert!(ran);
        assert_eq!(mgr.session().logins_performed, 2);
    }

    #[test]
    fn test_url_on_domain() {
        assert!(url_on_domain("https://idp.test/signin", "idp.test"));
        assert!(url_on_domain("https://sso.idp.test/x", "idp.test"));
        assert!(!url_on_domain("https://learn.test.edu/home", "idp.test"));
        assert!(!url_on_domain("not a url", "idp.test"));
        // Suffix match must not cross label boundaries.
        assert!(!url_on_domain("https://evilidp.test/", "idp.test"));
    }

    #[test]
    fn test_default_selectors_cover_all_steps() {
        let selectors = LoginSelectors::default();
        assert!(!selectors.username_input.is_empty());
        assert!(!selectors.password_input.is_empty());
        assert!(!selectors.stay_signed_in_button.is_empty());
        assert!(!selectors.code_display.is_empty());
        assert!(!selectors.code_input.is_empty());
    }
}
