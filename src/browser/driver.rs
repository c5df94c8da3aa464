//! The browser-automation boundary
//!
//! The step engine drives a [`Driver`] rather than a concrete browser, so
//! the retry/failure semantics of a run can be exercised without launching
//! Chromium. [`BrowserSession`](super::session::BrowserSession) is the real
//! implementation.

use std::future;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

use crate::common::{Result, UrlPattern};

use super::locator::Locator;

/// Capabilities the step engine needs from a live browser session.
///
/// Every element interaction re-resolves its locator internally; callers
/// never hold element references across actions.
#[async_trait]
pub trait Driver: Send + Sync {
    /// Navigate to an absolute URL and wait for the navigation to settle.
    async fn goto(&self, url: &str) -> Result<()>;

    /// Clear a field and type a value into it.
    async fn fill(&self, locator: &Locator, value: &str) -> Result<()>;

    /// Click an element. With `force`, the click is dispatched inside the
    /// page and bypasses interactability checks; a last resort for controls
    /// blocked by overlays.
    async fn click(&self, locator: &Locator, force: bool) -> Result<()>;

    /// Ensure a checkbox is checked.
    async fn check(&self, locator: &Locator) -> Result<()>;

    /// Select an option by value or visible label.
    async fn select(&self, locator: &Locator, value: &str) -> Result<()>;

    /// The page's current URL.
    async fn current_url(&self) -> Result<String>;

    /// Whether an element matching the locator is currently visible.
    async fn is_visible(&self, locator: &Locator) -> Result<bool>;

    /// Register an observer for a network response matching `pattern`.
    ///
    /// Must be called before the action that triggers the response fires
    /// (arm-then-act), otherwise the response can complete before anyone is
    /// listening.
    async fn arm_response_watch(&self, pattern: &UrlPattern) -> Result<ResponseWatch>;

    /// Capture a PNG screenshot of the current page state.
    async fn screenshot(&self) -> Result<Vec<u8>>;
}

/// An armed observer for a matching network response.
///
/// Created before the triggering action, awaited after it. Dropping the
/// watch detaches the underlying listener.
pub struct ResponseWatch {
    rx: Option<oneshot::Receiver<String>>,
    task: Option<JoinHandle<()>>,
}

impl ResponseWatch {
    /// Watch backed by a listener task feeding a oneshot channel.
    pub fn from_channel(rx: oneshot::Receiver<String>, task: JoinHandle<()>) -> Self {
        Self {
            rx: Some(rx),
            task: Some(task),
        }
    }

    /// A watch that has already observed a matching response.
    pub fn resolved(url: impl Into<String>) -> Self {
        let (tx, rx) = oneshot::channel();
        let _ = tx.send(url.into());
        Self {
            rx: Some(rx),
            task: None,
        }
    }

    /// A watch that will never observe a response.
    pub fn never() -> Self {
        let (_tx, rx) = oneshot::channel();
        // Sender dropped here; wait() treats the closed channel as
        // "no response will ever arrive" and runs out the timeout.
        Self {
            rx: Some(rx),
            task: None,
        }
    }

    /// Wait until a matching response is observed or the timeout elapses.
    /// Returns the matched URL, or `None` on timeout.
    pub async fn wait(mut self, timeout: Duration) -> Option<String> {
        let rx = self.rx.take()?;
        let matched = async move {
            match rx.await {
                Ok(url) => url,
                // Listener ended without a match: the condition will never hold.
                Err(_) => future::pending().await,
            }
        };
        tokio::time::timeout(timeout, matched).await.ok()
    }
}

impl Drop for ResponseWatch {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}
