//! Verification runner
//!
//! Reads YAML scenarios and executes them fail-fast against a dedicated
//! browser session, with endpoint discovery for targets whose port is not
//! known in advance and screenshot artifacts at every run termination.

pub mod artifacts;
pub mod discovery;
pub mod runner;
pub mod scenario;

pub use artifacts::ArtifactSink;
pub use discovery::discover;
pub use runner::{run_scenario, RunConfig, RunOutcome};
pub use scenario::{Credentials, Scenario};
