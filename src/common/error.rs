//! Error types for the verification runner
//!
//! Terminal errors (discovery exhausted, step timeout, action failure) are
//! surfaced to the caller after best-effort screenshot capture. Capture
//! failures are logged but never replace the error that triggered them.

use std::io;
use std::time::Duration;
use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the verification runner
#[derive(Error, Debug)]
pub enum Error {
    // === Discovery Errors ===
    #[error("no candidate endpoint responded ({tried} probed). Is the application running?")]
    DiscoveryExhausted { tried: usize },

    // === Step Errors ===
    #[error("step '{step}' timed out after {timeout_ms}ms waiting for its post-condition")]
    StepTimeout { step: String, timeout_ms: u64 },

    #[error("step '{step}' failed: {reason}")]
    ActionFailed { step: String, reason: String },

    // === Capture Errors ===
    // Never terminal: logged on the failure path, the original error wins.
    #[error("screenshot capture failed: {0}")]
    Capture(String),

    // === Browser Errors ===
    #[error("browser error: {0}")]
    Browser(String),

    #[error("element not found: {0}")]
    ElementNotFound(String),

    // === Configuration Errors ===
    #[error("configuration error: {0}")]
    Config(String),

    #[error("invalid scenario file: {0}")]
    Scenario(#[from] serde_yaml::Error),

    // === IO Errors ===
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    // === Serialization Errors ===
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Create a step timeout error from the step name and its wait bound
    pub fn step_timeout(step: &str, timeout: Duration) -> Self {
        Self::StepTimeout {
            step: step.to_string(),
            timeout_ms: timeout.as_millis() as u64,
        }
    }

    /// Create an action failure error tagged with the step name
    pub fn action_failed(step: &str, reason: impl ToString) -> Self {
        Self::ActionFailed {
            step: step.to_string(),
            reason: reason.to_string(),
        }
    }

    /// Create a browser boundary error
    pub fn browser(reason: impl ToString) -> Self {
        Self::Browser(reason.to_string())
    }
}
