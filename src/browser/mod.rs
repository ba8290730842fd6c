//! Browsing-context abstraction and implementations
//!
//! This module defines the [`Browser`] trait that the session manager and
//! content fetcher drive. Concrete implementations live in submodules:
//!
//! - [`webdriver::WebDriverBrowser`] -- real browser behind a WebDriver
//!   endpoint (fantoccini).
//! - [`fake::FakeBrowser`] -- in-process scripted browser used in tests.
//!
//! # Design
//!
//! The trait is intentionally small: navigate, inspect the current page
//! through CSS selectors, fill and click form elements, and capture a
//! screenshot. Everything login- or extraction-specific (which selectors
//! mean what) stays in the `session` and `scrape` modules, so a single
//! fake can exercise both.

pub mod fake;
pub mod webdriver;

pub use fake::{FakeBrowser, FakeIdp, FakePage, TwoFactorScript};
pub use webdriver::WebDriverBrowser;

use crate::error::Result;

/// Abstraction over an automated browsing context.
///
/// One `Browser` is one browsing context: navigation state is shared
/// across all calls. The session manager authenticates it; the content
/// fetcher then reuses it strictly sequentially.
#[async_trait::async_trait]
pub trait Browser: Send + Sync {
    /// Navigate to a URL and wait for the page load to settle.
    ///
    /// # Errors
    ///
    /// Returns `ScoutError::Browser` if navigation fails outright.
    async fn goto(&self, url: &str) -> Result<()>;

    /// URL of the page the context currently shows.
    async fn current_url(&self) -> Result<String>;

    /// Title of the current page.
    async fn title(&self) -> Result<String>;

    /// Whether at least one element matches the CSS selector.
    async fn exists(&self, selector: &str) -> Result<bool>;

    /// Visible text of the first element matching the CSS selector,
    /// or `None` when nothing matches.
    async fn text_of(&self, selector: &str) -> Result<Option<String>>;

    /// The given attribute of every element matching the CSS selector,
    /// in document order. Elements without the attribute are skipped.
    async fn attr_of_all(&self, selector: &str, attr: &str) -> Result<Vec<String>>;

    /// Type text into the first element matching the CSS selector.
    ///
    /// # Errors
    ///
    /// Returns `ScoutError::Browser` if no element matches.
    async fn fill(&self, selector: &str, text: &str) -> Result<()>;

    /// Click the first element matching the CSS selector.
    ///
    /// # Errors
    ///
    /// Returns `ScoutError::Browser` if no element matches.
    async fn click(&self, selector: &str) -> Result<()>;

    /// Capture a PNG screenshot of the current page to the given path.
    async fn screenshot(&self, path: &std::path::Path) -> Result<()>;
}
