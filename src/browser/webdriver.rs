//! WebDriver-backed [`Browser`] implementation
//!
//! Drives a real browser through a WebDriver endpoint (chromedriver,
//! geckodriver, or a Selenium grid) using fantoccini.

use crate::browser::Browser;
use crate::error::{Result, ScoutError};
use fantoccini::{Client, ClientBuilder, Locator};

/// A browsing context behind a WebDriver endpoint.
///
/// Created with [`WebDriverBrowser::connect`]; owns the underlying
/// WebDriver session until [`WebDriverBrowser::close`] is called or the
/// value is dropped.
pub struct WebDriverBrowser {
    client: Client,
}

impl WebDriverBrowser {
    /// Connect to a WebDriver endpoint and open one browsing context.
    ///
    /// # Arguments
    ///
    /// * `webdriver_url` - Endpoint URL, e.g. `http://localhost:4444`
    ///
    /// # Errors
    ///
    /// Returns `ScoutError::Browser` if the endpoint is unreachable or
    /// rejects the session request.
    pub async fn connect(webdriver_url: &str) -> Result<Self> {
        let caps = serde_json::json!({
            "goog:chromeOptions": {
                "args": ["--headless=new", "--disable-gpu", "--window-size=1280,1024"]
            }
        });
        let caps = caps
            .as_object()
            .cloned()
            .unwrap_or_default();

        let client = ClientBuilder::native()
            .capabilities(caps)
            .connect(webdriver_url)
            .await
            .map_err(|e| {
                ScoutError::Browser(format!(
                    "Failed to connect to WebDriver at {}: {}",
                    webdriver_url, e
                ))
            })?;

        Ok(Self { client })
    }

    /// Close the underlying WebDriver session. The client is a handle
    /// to the session actor, so closing a clone closes the session.
    pub async fn close(&self) -> Result<()> {
        self.client
            .clone()
            .close()
            .await
            .map_err(|e| ScoutError::Browser(format!("Failed to close session: {}", e)))?;
        Ok(())
    }
}

#[async_trait::async_trait]
impl Browser for WebDriverBrowser {
    async fn goto(&self, url: &str) -> Result<()> {
        self.client
            .goto(url)
            .await
            .map_err(|e| ScoutError::Browser(format!("Navigation to {} failed: {}", url, e)))?;
        Ok(())
    }

    async fn current_url(&self) -> Result<String> {
        let url = self
            .client
            .current_url()
            .await
            .map_err(|e| ScoutError::Browser(format!("current_url failed: {}", e)))?;
        Ok(url.to_string())
    }

    async fn title(&self) -> Result<String> {
        self.client
            .title()
            .await
            .map_err(|e| ScoutError::Browser(format!("title failed: {}", e)).into())
    }

    async fn exists(&self, selector: &str) -> Result<bool> {
        let found = self
            .client
            .find_all(Locator::Css(selector))
            .await
            .map_err(|e| ScoutError::Browser(format!("find_all({}) failed: {}", selector, e)))?;
        Ok(!found.is_empty())
    }

    async fn text_of(&self, selector: &str) -> Result<Option<String>> {
        let found = self
            .client
            .find_all(Locator::Css(selector))
            .await
            .map_err(|e| ScoutError::Browser(format!("find_all({}) failed: {}", selector, e)))?;

        match found.into_iter().next() {
            Some(element) => {
                let text = element.text().await.map_err(|e| {
                    ScoutError::Browser(format!("text({}) failed: {}", selector, e))
                })?;
                Ok(Some(text))
            }
            None => Ok(None),
        }
    }

    async fn attr_of_all(&self, selector: &str, attr: &str) -> Result<Vec<String>> {
        let found = self
            .client
            .find_all(Locator::Css(selector))
            .await
            .map_err(|e| ScoutError::Browser(format!("find_all({}) failed: {}", selector, e)))?;

        let mut values = Vec::with_capacity(found.len());
        for element in found {
            let value = element.attr(attr).await.map_err(|e| {
                ScoutError::Browser(format!("attr({}, {}) failed: {}", selector, attr, e))
            })?;
            if let Some(value) = value {
                values.push(value);
            }
        }
        Ok(values)
    }

    async fn fill(&self, selector: &str, text: &str) -> Result<()> {
        let element = self
            .client
            .find(Locator::Css(selector))
            .await
            .map_err(|e| ScoutError::Browser(format!("find({}) failed: {}", selector, e)))?;
        element
            .send_keys(text)
            .await
            .map_err(|e| ScoutError::Browser(format!("send_keys({}) failed: {}", selector, e)))?;
        Ok(())
    }

    async fn click(&self, selector: &str) -> Result<()> {
        let element = self
            .client
            .find(Locator::Css(selector))
            .await
            .map_err(|e| ScoutError::Browser(format!("find({}) failed: {}", selector, e)))?;
        element
            .click()
            .await
            .map_err(|e| ScoutError::Browser(format!("click({}) failed: {}", selector, e)))?;
        Ok(())
    }

    async fn screenshot(&self, path: &std::path::Path) -> Result<()> {
        let png = self
            .client
            .screenshot()
            .await
            .map_err(|e| ScoutError::Browser(format!("screenshot failed: {}", e)))?;
        tokio::fs::write(path, png).await?;
        Ok(())
    }
}

impl std::fmt::Debug for WebDriverBrowser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WebDriverBrowser").finish()
    }
}
