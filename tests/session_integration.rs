//! Session reuse across fetches, driven through the content fetcher the
//! way the pipeline drives it: expiry mid-run triggers exactly one
//! re-login and the interrupted fetch still succeeds.

mod common;

use std::sync::Arc;

use campus_scout::browser::{FakeBrowser, TwoFactorScript};
use campus_scout::scrape::FetchTarget;
use campus_scout::session::AuthState;

use common::*;

#[tokio::test]
async fn test_expiry_between_fetches_triggers_one_relogin() {
    let browser = Arc::new(FakeBrowser::with_idp(fake_idp(TwoFactorScript::None)));
    browser.add_page(HOME, content_page("Home", "home"));
    browser.add_page("https://learn.test.edu/a", content_page("A", "alpha"));
    browser.add_page("https://learn.test.edu/b", content_page("B", "beta"));

    let mut manager = session_manager(browser.clone());
    let fetcher = content_fetcher(browser.clone());
    manager.authenticate().await.unwrap();

    let first = fetcher
        .fetch(
            &mut manager,
            0,
            &FetchTarget::new("A", "https://learn.test.edu/a"),
        )
        .await;
    assert!(!first.is_error());
    assert_eq!(manager.session().logins_performed, 1);

    // The portal drops the session between targets.
    browser.force_expire();

    let second = fetcher
        .fetch(
            &mut manager,
            1,
            &FetchTarget::new("B", "https://learn.test.edu/b"),
        )
        .await;
    assert!(!second.is_error());
    assert_eq!(second.content, "beta");
    assert_eq!(manager.session().logins_performed, 2);
    assert_eq!(manager.session().state, AuthState::Authenticated);
}

#[tokio::test]
async fn test_live_session_is_never_relogged() {
    let browser = Arc::new(FakeBrowser::with_idp(fake_idp(TwoFactorScript::None)));
    browser.add_page(HOME, content_page("Home", "home"));
    browser.add_page("https://learn.test.edu/a", content_page("A", "alpha"));
    browser.add_page("https://learn.test.edu/b", content_page("B", "beta"));

    let mut manager = session_manager(browser.clone());
    let fetcher = content_fetcher(browser.clone());
    manager.authenticate().await.unwrap();

    for (index, url) in ["https://learn.test.edu/a", "https://learn.test.edu/b"]
        .iter()
        .enumerate()
    {
        let record = fetcher
            .fetch(&mut manager, index, &FetchTarget::new("page", *url))
            .await;
        assert!(!record.is_error());
    }
    assert_eq!(manager.session().logins_performed, 1);
}

#[tokio::test]
async fn test_stay_signed_in_and_code_challenge_end_to_end() {
    let mut idp = fake_idp(TwoFactorScript::DisplayCode("81".to_string()));
    idp.stay_signed_in_prompt = true;
    let browser = Arc::new(FakeBrowser::with_idp(idp));
    browser.add_page(HOME, content_page("Home", "home"));

    let mut manager = session_manager(browser.clone());
    tokio::time::timeout(std::time::Duration::from_secs(10), manager.authenticate())
        .await
        .expect("authenticate must finish within the ceiling")
        .unwrap();

    assert_eq!(manager.session().state, AuthState::Authenticated);
    // The interstitial was accepted and the displayed code filled back in.
    assert!(browser.clicks().contains(&"#idSIButton9".to_string()));
    assert!(browser
        .fills()
        .iter()
        .any(|(sel, text)| sel == "input[name=otc]" && text == "81"));
}
