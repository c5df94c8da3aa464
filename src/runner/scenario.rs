//! Verification scenario configuration
//!
//! Defines the data structures for deserializing YAML scenarios: an ordered
//! list of named steps, each an action against the page plus an optional
//! awaited post-condition and timeout.

use std::path::Path;

use serde::Deserialize;

use crate::browser::Locator;
use crate::common::{Error, Result};

/// Default per-step timeout when neither the scenario nor the step sets one.
pub const DEFAULT_STEP_TIMEOUT_MS: u64 = 15_000;

/// Default per-candidate probe timeout for endpoint discovery.
pub const DEFAULT_PROBE_TIMEOUT_MS: u64 = 5_000;

/// A complete verification scenario loaded from a YAML file
#[derive(Deserialize, Debug)]
pub struct Scenario {
    /// Name of the scenario
    pub name: String,
    /// Optional description of what the scenario verifies
    pub description: Option<String>,
    /// Configuration for the target application instance
    #[serde(default)]
    pub target: TargetConfig,
    /// Defaults applied to every step
    #[serde(default)]
    pub defaults: Defaults,
    /// The sequence of steps to execute
    pub steps: Vec<Step>,
}

impl Scenario {
    /// Load and parse a scenario from a YAML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!(
                "failed to read scenario '{}': {}",
                path.display(),
                e
            ))
        })?;
        let scenario: Scenario = serde_yaml::from_str(&content)?;
        if scenario.steps.is_empty() {
            return Err(Error::Config(format!(
                "scenario '{}' has no steps",
                scenario.name
            )));
        }
        Ok(scenario)
    }
}

/// Where the target application instance lives
#[derive(Deserialize, Debug, Default)]
pub struct TargetConfig {
    /// Known base URL; skips discovery entirely
    pub base_url: Option<String>,
    /// Host for candidate probing (default: localhost)
    pub host: Option<String>,
    /// Candidate ports, probed strictly in order
    #[serde(default)]
    pub ports: Vec<u16>,
    /// Per-candidate probe timeout in milliseconds
    pub probe_timeout_ms: Option<u64>,
}

/// Scenario-wide step defaults
#[derive(Deserialize, Debug, Default)]
pub struct Defaults {
    /// Default post-condition timeout in milliseconds
    pub timeout_ms: Option<u64>,
}

/// A single step: a named action, an optional awaited post-condition, and
/// a timeout bounding that wait. Immutable once parsed.
#[derive(Deserialize, Debug)]
pub struct Step {
    /// Human-readable step name; tags the failure screenshot
    pub name: String,
    /// The page interaction to perform
    #[serde(flatten)]
    pub action: Action,
    /// Awaited state that must hold before the step counts as complete.
    /// Written as a single-key map, e.g. `wait_for: { visible: { locator: … } }`.
    #[serde(default, with = "serde_yaml::with::singleton_map_recursive")]
    pub wait_for: Option<PostCondition>,
    /// Timeout in milliseconds overriding the scenario default
    pub timeout_ms: Option<u64>,
}

/// A page interaction
#[derive(Deserialize, Debug)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Action {
    /// Navigate to a path relative to the run's base address
    Goto {
        path: String,
    },
    /// Clear a field and type a value; supports `$EMAIL` / `$PASSWORD`
    Fill {
        locator: Locator,
        value: String,
    },
    /// Click a control. `force: true` dispatches the click inside the page,
    /// bypassing interactability checks; an explicit last resort.
    Click {
        locator: Locator,
        #[serde(default)]
        force: bool,
    },
    /// Ensure a checkbox is checked
    Check {
        locator: Locator,
    },
    /// Select an option by value or visible label
    Select {
        locator: Locator,
        value: String,
    },
    /// Capture a screenshot of the current page state
    Screenshot {
        tag: String,
    },
}

/// An awaited state bounding a step's completion
#[derive(Deserialize, Debug)]
#[serde(rename_all = "snake_case")]
pub enum PostCondition {
    /// The page URL matches a glob pattern (e.g. `**/dashboard`)
    UrlMatches { pattern: String },
    /// An element is visible
    Visible { locator: Locator },
    /// An element is hidden or absent
    Hidden { locator: Locator },
    /// A network response matching a URL pattern completes. The observer is
    /// armed before the step's action fires.
    Response { pattern: String },
}

/// Credential pair consumed by login-type steps via placeholders.
#[derive(Debug, Clone, Default)]
pub struct Credentials {
    pub email: Option<String>,
    pub password: Option<String>,
}

impl Credentials {
    /// Substitute `$EMAIL` and `$PASSWORD` placeholders in a step value.
    /// Using a placeholder without the credential configured is an error.
    pub fn substitute(&self, value: &str) -> Result<String> {
        let mut out = value.to_string();
        if out.contains("$EMAIL") {
            let email = self.email.as_deref().ok_or_else(|| {
                Error::Config("step uses $EMAIL but no email was provided".to_string())
            })?;
            out = out.replace("$EMAIL", email);
        }
        if out.contains("$PASSWORD") {
            let password = self.password.as_deref().ok_or_else(|| {
                Error::Config("step uses $PASSWORD but no password was provided".to_string())
            })?;
            out = out.replace("$PASSWORD", password);
        }
        Ok(out)
    }
}
