//! End-to-end pipeline runs over the fake browser: one login, N fetches,
//! persisted run documents, and the partial-save path on authentication
//! failure.

mod common;

use std::sync::Arc;
use std::time::Duration;

use campus_scout::browser::{FakeBrowser, TwoFactorScript};
use campus_scout::scrape::{ExtractionPipeline, FetchTarget};
use campus_scout::ScoutError;

use common::*;

fn pipeline(browser: Arc<FakeBrowser>, store: campus_scout::RunStore) -> ExtractionPipeline {
    ExtractionPipeline::new(
        session_manager(browser.clone()),
        content_fetcher(browser),
        store,
    )
}

#[tokio::test]
async fn test_counts_always_reconcile() {
    let browser = Arc::new(FakeBrowser::with_idp(fake_idp(TwoFactorScript::None)));
    browser.add_page(HOME, content_page("Home", "home"));
    browser.add_page("https://learn.test.edu/a", content_page("A", "alpha"));
    browser.add_page(
        "https://learn.test.edu/b",
        campus_scout::browser::FakePage::new("B").failing(),
    );
    browser.add_page("https://learn.test.edu/c", content_page("C", "gamma"));

    let targets = vec![
        FetchTarget::new("A", "https://learn.test.edu/a"),
        FetchTarget::new("B", "https://learn.test.edu/b"),
        FetchTarget::new("C", "https://learn.test.edu/c"),
    ];
    let (store, _dir) = temp_store();
    let summary = pipeline(browser, store)
        .run("custom", &targets)
        .await
        .unwrap();

    assert_eq!(summary.total, targets.len());
    assert_eq!(summary.successful + summary.failed, summary.total);
    assert_eq!(summary.successful, 2);
    assert_eq!(summary.failed, 1);
    assert!(!summary.partial);
}

#[tokio::test]
async fn test_one_login_serves_all_fetches() {
    let browser = Arc::new(FakeBrowser::with_idp(fake_idp(TwoFactorScript::None)));
    browser.add_page(HOME, content_page("Home", "home"));
    browser.add_page("https://learn.test.edu/a", content_page("A", "alpha"));
    browser.add_page("https://learn.test.edu/b", content_page("B", "beta"));

    let targets = vec![
        FetchTarget::new("A", "https://learn.test.edu/a"),
        FetchTarget::new("B", "https://learn.test.edu/b"),
    ];
    let (store, _dir) = temp_store();
    pipeline(browser.clone(), store)
        .run("custom", &targets)
        .await
        .unwrap();

    // Credentials were submitted exactly once across the whole run.
    let username_fills = browser
        .fills()
        .iter()
        .filter(|(_, text)| text == "student@college.edu")
        .count();
    assert_eq!(username_fills, 1);
}

#[tokio::test]
async fn test_failed_record_preserves_target_identity() {
    let browser = Arc::new(FakeBrowser::with_idp(fake_idp(TwoFactorScript::None)));
    browser.add_page(HOME, content_page("Home", "home"));
    browser.add_page("https://learn.test.edu/a", content_page("A", "alpha"));
    browser.add_page(
        "https://learn.test.edu/b",
        campus_scout::browser::FakePage::new("B").failing(),
    );

    let targets = vec![
        FetchTarget::new("Announcements A", "https://learn.test.edu/a"),
        FetchTarget::new("Announcements B", "https://learn.test.edu/b"),
    ];
    let (store, _dir) = temp_store();
    let summary = pipeline(browser, store)
        .run("announcements", &targets)
        .await
        .unwrap();

    let failed = &summary.records[1];
    assert!(failed.is_error());
    assert_eq!(failed.index, 1);
    assert_eq!(failed.label, "Announcements B");
    assert_eq!(failed.url, "https://learn.test.edu/b");
    assert!(failed.content.is_empty());
    assert!(failed.links.is_empty());

    // The failure did not contaminate its neighbor.
    assert!(!summary.records[0].is_error());
    assert_eq!(summary.records[0].content, "alpha");
}

#[tokio::test]
async fn test_zero_targets_is_a_valid_run() {
    let browser = Arc::new(FakeBrowser::with_idp(fake_idp(TwoFactorScript::None)));
    browser.add_page(HOME, content_page("Home", "home"));

    let (store, _dir) = temp_store();
    let summary = pipeline(browser, store.clone())
        .run("custom", &[])
        .await
        .unwrap();

    assert_eq!(summary.total, 0);
    assert_eq!(summary.successful, 0);
    assert_eq!(summary.failed, 0);
    assert!(!summary.partial);
    // The run document still exists on disk.
    assert!(store.path_for(&summary).exists());
}

#[tokio::test]
async fn test_two_factor_timeout_writes_partial_document() {
    let browser = Arc::new(FakeBrowser::with_idp(fake_idp(TwoFactorScript::NeverApproved)));
    browser.add_page(HOME, content_page("Home", "home"));
    browser.add_page("https://learn.test.edu/a", content_page("A", "alpha"));

    let targets = vec![FetchTarget::new("A", "https://learn.test.edu/a")];
    let (store, _dir) = temp_store();

    let result = tokio::time::timeout(
        Duration::from_secs(10),
        pipeline(browser, store.clone()).run("announcements", &targets),
    )
    .await
    .expect("the run must fail within the two-factor ceiling, not hang");

    let err = result.unwrap_err();
    let scout = err.downcast_ref::<ScoutError>().expect("ScoutError");
    assert!(matches!(scout, ScoutError::AuthenticationTimeout { .. }));

    // Exactly one partial document, no records, the error recorded.
    let runs = store.list().unwrap();
    assert_eq!(runs.len(), 1);
    let partial = &runs[0];
    assert!(partial.partial);
    assert_eq!(partial.total, 0);
    assert!(partial.records.is_empty());
    assert!(partial.error.as_deref().unwrap_or("").contains("timed out"));
    assert!(store
        .path_for(partial)
        .to_string_lossy()
        .ends_with("_partial.json"));
}

#[tokio::test]
async fn test_rerun_yields_same_totals_and_labels() {
    let targets = vec![
        FetchTarget::new("A", "https://learn.test.edu/a"),
        FetchTarget::new("B", "https://learn.test.edu/b"),
    ];

    let mut label_sets = Vec::new();
    for _ in 0..2 {
        let browser = Arc::new(FakeBrowser::with_idp(fake_idp(TwoFactorScript::None)));
        browser.add_page(HOME, content_page("Home", "home"));
        browser.add_page("https://learn.test.edu/a", content_page("A", "alpha"));
        browser.add_page("https://learn.test.edu/b", content_page("B", "beta"));

        let (store, _dir) = temp_store();
        let summary = pipeline(browser, store)
            .run("custom", &targets)
            .await
            .unwrap();
        assert_eq!(summary.total, 2);
        let labels: Vec<String> = summary.records.iter().map(|r| r.label.clone()).collect();
        label_sets.push(labels);
    }
    assert_eq!(label_sets[0], label_sets[1]);
}

#[tokio::test]
async fn test_saved_document_round_trips_through_store() {
    let browser = Arc::new(FakeBrowser::with_idp(fake_idp(TwoFactorScript::None)));
    browser.add_page(HOME, content_page("Home", "home"));
    browser.add_page(
        "https://learn.test.edu/a",
        content_page("A", "alpha").with_links(vec![
            "https://learn.test.edu/deep".to_string(),
        ]),
    );

    let targets = vec![FetchTarget::new("A", "https://learn.test.edu/a")];
    let (store, _dir) = temp_store();
    let summary = pipeline(browser, store.clone())
        .run("announcements", &targets)
        .await
        .unwrap();

    let loaded = store.load(&summary.id).unwrap();
    assert_eq!(loaded.source, "announcements");
    assert_eq!(loaded.records[0].links, vec!["https://learn.test.edu/deep"]);

    // Collected links feed follow-up runs.
    let follow_ups = store.targets_from_run(&summary.id).unwrap();
    assert_eq!(follow_ups.len(), 1);
    assert_eq!(follow_ups[0].url, "https://learn.test.edu/deep");
}
