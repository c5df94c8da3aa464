//! Chromium session management
//!
//! One [`BrowserSession`] per run: it launches its own Chromium process,
//! owns the CDP handler task, and is closed unconditionally when the run
//! ends. Nothing is shared between sessions, so concurrent runs stay
//! independent.

use std::time::Duration;

use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::network::{
    EnableParams, EventResponseReceived,
};
use chromiumoxide::cdp::browser_protocol::page::CaptureScreenshotFormat;
use chromiumoxide::page::{Page, ScreenshotParams};
use futures_util::StreamExt;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::common::{Error, Result, UrlPattern};

use super::driver::{Driver, ResponseWatch};
use super::locator::{Locator, Query};

/// Pause after interactions that may trigger navigation or re-render,
/// before the engine starts polling the post-condition.
const SETTLE_DELAY: Duration = Duration::from_millis(100);

/// A live browser session owned by exactly one run.
pub struct BrowserSession {
    browser: Browser,
    page: Page,
    handler_task: JoinHandle<()>,
}

impl BrowserSession {
    /// Launch a Chromium instance and open a blank page.
    pub async fn launch(headless: bool) -> Result<Self> {
        let mut builder = BrowserConfig::builder()
            .no_sandbox()
            .arg("--disable-gpu")
            .arg("--disable-dev-shm-usage")
            .window_size(1280, 720);
        if !headless {
            builder = builder.with_head();
        }
        let config = builder
            .build()
            .map_err(|e| Error::browser(format!("failed to build browser config: {e}")))?;

        let (browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| Error::browser(format!("failed to launch chromium: {e}")))?;

        // The handler task pumps CDP messages; without it the connection stalls.
        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if event.is_err() {
                    debug!("CDP handler loop ended");
                    break;
                }
            }
        });

        let page = browser
            .new_page("about:blank")
            .await
            .map_err(|e| Error::browser(format!("failed to create page: {e}")))?;

        // Network events are only delivered once the domain is enabled.
        page.execute(EnableParams::default())
            .await
            .map_err(|e| Error::browser(format!("failed to enable network domain: {e}")))?;

        debug!(headless, "browser session ready");

        Ok(Self {
            browser,
            page,
            handler_task,
        })
    }

    /// Close the browser and stop the handler task. Safe to call on both
    /// success and failure paths.
    pub async fn close(mut self) {
        if let Err(e) = self.browser.close().await {
            warn!("error closing browser: {e}");
        }
        self.handler_task.abort();
    }

    /// Resolve a locator to a live element handle. Called immediately
    /// before every interaction; handles are never cached.
    async fn resolve(&self, locator: &Locator) -> Result<chromiumoxide::element::Element> {
        let found = match locator.to_query() {
            Query::Css(selector) => self.page.find_element(selector).await,
            Query::XPath(expr) => self.page.find_xpath(expr).await,
        };
        found.map_err(|_| Error::ElementNotFound(locator.describe()))
    }

    /// Evaluate a JS expression built around the locator's resolver.
    async fn eval_on(&self, locator: &Locator, body: &str) -> Result<serde_json::Value> {
        let js = format!(
            "(() => {{ const el = {resolver}; {body} }})()",
            resolver = locator.js_resolver()
        );
        let result = self
            .page
            .evaluate(js)
            .await
            .map_err(|e| Error::browser(format!("evaluate failed: {e}")))?;
        Ok(result.value().cloned().unwrap_or(serde_json::Value::Null))
    }
}

#[async_trait]
impl Driver for BrowserSession {
    async fn goto(&self, url: &str) -> Result<()> {
        debug!(url, "navigating");
        self.page
            .goto(url)
            .await
            .map_err(|e| Error::browser(format!("navigation to '{url}' failed: {e}")))?;
        self.page
            .wait_for_navigation()
            .await
            .map_err(|e| Error::browser(format!("navigation to '{url}' did not settle: {e}")))?;
        Ok(())
    }

    async fn fill(&self, locator: &Locator, value: &str) -> Result<()> {
        let element = self.resolve(locator).await?;
        element
            .click()
            .await
            .map_err(|e| Error::browser(format!("failed to focus {}: {e}", locator.describe())))?;
        // Clear any existing value before typing.
        self.eval_on(
            locator,
            "if (el) { el.value = \"\"; el.dispatchEvent(new Event(\"input\", { bubbles: true })); }",
        )
        .await?;
        element
            .type_str(value)
            .await
            .map_err(|e| Error::browser(format!("failed to type into {}: {e}", locator.describe())))?;
        Ok(())
    }

    async fn click(&self, locator: &Locator, force: bool) -> Result<()> {
        if force {
            // Dispatches the click inside the page, skipping hit-testing.
            // Can click through overlays a real user could not.
            warn!(target = %locator.describe(), "forced click: bypassing interactability checks");
            let hit = self
                .eval_on(locator, "if (!el) return false; el.click(); return true;")
                .await?;
            if hit.as_bool() != Some(true) {
                return Err(Error::ElementNotFound(locator.describe()));
            }
        } else {
            let element = self.resolve(locator).await?;
            element
                .scroll_into_view()
                .await
                .map_err(|e| Error::browser(format!("failed to scroll to {}: {e}", locator.describe())))?;
            element
                .click()
                .await
                .map_err(|e| Error::browser(format!("click on {} failed: {e}", locator.describe())))?;
        }
        // Let any triggered navigation or re-render start before the
        // post-condition wait begins polling.
        tokio::time::sleep(SETTLE_DELAY).await;
        Ok(())
    }

    async fn check(&self, locator: &Locator) -> Result<()> {
        let checked = self
            .eval_on(locator, "return el ? el.checked === true : null;")
            .await?;
        match checked.as_bool() {
            Some(true) => Ok(()),
            Some(false) => self.click(locator, false).await,
            None => Err(Error::ElementNotFound(locator.describe())),
        }
    }

    async fn select(&self, locator: &Locator, value: &str) -> Result<()> {
        let wanted = serde_json::to_string(value)?;
        let body = format!(
            "if (!el) return null; \
             for (const o of el.options) {{ \
               if (o.value === {wanted} || o.label === {wanted} || o.text.trim() === {wanted}) {{ \
                 el.value = o.value; \
                 el.dispatchEvent(new Event(\"input\", {{ bubbles: true }})); \
                 el.dispatchEvent(new Event(\"change\", {{ bubbles: true }})); \
                 return true; \
               }} \
             }} \
             return false;"
        );
        match self.eval_on(locator, &body).await?.as_bool() {
            Some(true) => Ok(()),
            Some(false) => Err(Error::browser(format!(
                "no option matching '{value}' in {}",
                locator.describe()
            ))),
            None => Err(Error::ElementNotFound(locator.describe())),
        }
    }

    async fn current_url(&self) -> Result<String> {
        let url = self
            .page
            .url()
            .await
            .map_err(|e| Error::browser(format!("failed to read page url: {e}")))?;
        Ok(url.unwrap_or_default())
    }

    async fn is_visible(&self, locator: &Locator) -> Result<bool> {
        let visible = self
            .eval_on(
                locator,
                "if (!el) return false; \
                 const r = el.getBoundingClientRect(); \
                 const s = window.getComputedStyle(el); \
                 return r.width > 0 && r.height > 0 \
                   && s.display !== \"none\" && s.visibility !== \"hidden\";",
            )
            .await?;
        Ok(visible.as_bool() == Some(true))
    }

    async fn arm_response_watch(&self, pattern: &UrlPattern) -> Result<ResponseWatch> {
        let mut events = self
            .page
            .event_listener::<EventResponseReceived>()
            .await
            .map_err(|e| Error::browser(format!("failed to attach response listener: {e}")))?;

        let pattern = pattern.clone();
        let (tx, rx) = oneshot::channel();
        let task = tokio::spawn(async move {
            while let Some(event) = events.next().await {
                let url = &event.response.url;
                if pattern.matches(url) {
                    debug!(%url, "matching response observed");
                    let _ = tx.send(url.clone());
                    break;
                }
            }
        });

        Ok(ResponseWatch::from_channel(rx, task))
    }

    async fn screenshot(&self) -> Result<Vec<u8>> {
        self.page
            .screenshot(
                ScreenshotParams::builder()
                    .format(CaptureScreenshotFormat::Png)
                    .full_page(true)
                    .build(),
            )
            .await
            .map_err(|e| Error::Capture(e.to_string()))
    }
}
