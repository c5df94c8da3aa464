//! pagecheck - browser-driven verification runner
//!
//! Drives a web application through a headless browser from a YAML scenario:
//! endpoint discovery, sequential step execution with per-step timeouts, and
//! screenshot capture on every run termination.

pub mod browser;
pub mod commands;
pub mod common;
pub mod runner;

// Re-export commonly used types for tests
pub use common::{Error, Result, UrlPattern};
pub use runner::{run_scenario, ArtifactSink, Credentials, RunConfig, RunOutcome, Scenario};
