//! Run execution
//!
//! A run owns one browser session for its duration and executes its steps
//! strictly in order: step N+1 never begins until step N's post-condition
//! has resolved. The first timeout or action error is terminal; remaining
//! steps are skipped, a screenshot tagged with the failing step is captured,
//! and the session is released unconditionally.

use std::path::PathBuf;
use std::time::Duration;

use colored::Colorize;
use tokio::time::Instant;
use tracing::debug;

use crate::browser::{BrowserSession, Driver, Locator};
use crate::common::{Error, Result, UrlPattern};

use super::artifacts::{self, ArtifactSink};
use super::discovery;
use super::scenario::{
    Action, Credentials, PostCondition, Scenario, Step, DEFAULT_PROBE_TIMEOUT_MS,
    DEFAULT_STEP_TIMEOUT_MS,
};

/// How often post-condition polls re-check the page.
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Configuration supplied at run construction. Nothing here outlives the run.
#[derive(Debug, Clone, Default)]
pub struct RunConfig {
    /// Known base URL; overrides the scenario's target and skips discovery
    pub base_url: Option<String>,
    /// Host for candidate probing; overrides the scenario's target host
    pub host: Option<String>,
    /// Candidate ports; overrides the scenario's list when non-empty
    pub ports: Vec<u16>,
    /// Per-candidate probe timeout
    pub probe_timeout: Option<Duration>,
    /// Credential pair consumed by `$EMAIL` / `$PASSWORD` placeholders
    pub credentials: Credentials,
    /// Run the browser headless (the default) or headed
    pub headless: bool,
    /// Default post-condition timeout; overridden per step
    pub default_timeout: Option<Duration>,
    /// Directory screenshots are written to
    pub artifact_dir: PathBuf,
}

/// Terminal state of a run
#[derive(Debug)]
pub struct RunOutcome {
    pub name: String,
    pub passed: bool,
    pub steps_run: usize,
    pub steps_total: usize,
    /// The terminal error when the run failed
    pub error: Option<Error>,
    /// Screenshot captured at run termination, when capture succeeded
    pub screenshot: Option<PathBuf>,
}

/// Execute a scenario end to end: resolve the base address (probing
/// candidates when it is not known), drive the steps against a dedicated
/// browser session, and capture a screenshot at termination.
///
/// Returns `Ok` with a failed outcome for step-level failures; `Err` is
/// reserved for failures before any step could run (bad configuration,
/// discovery exhausted, browser launch).
pub async fn run_scenario(scenario: &Scenario, config: &RunConfig) -> Result<RunOutcome> {
    println!(
        "\n{} {}",
        "Running:".blue().bold(),
        scenario.name.white().bold()
    );
    if let Some(desc) = &scenario.description {
        println!("  {}", desc.dimmed());
    }

    let base_url = resolve_base_url(scenario, config).await?;
    println!("  {} {}", "Target:".cyan(), base_url.dimmed());

    let sink = ArtifactSink::new(&config.artifact_dir);
    let default_timeout = config.default_timeout.unwrap_or_else(|| {
        Duration::from_millis(
            scenario
                .defaults
                .timeout_ms
                .unwrap_or(DEFAULT_STEP_TIMEOUT_MS),
        )
    });

    let session = BrowserSession::launch(config.headless).await?;

    // The session is released on every exit path; steps never outlive it.
    let outcome = drive_steps(
        &session,
        &base_url,
        scenario,
        &config.credentials,
        default_timeout,
        &sink,
    )
    .await;
    session.close().await;

    Ok(outcome)
}

/// Resolve the run's base address: explicit configuration wins, otherwise
/// candidates are probed in order.
async fn resolve_base_url(scenario: &Scenario, config: &RunConfig) -> Result<String> {
    if let Some(base) = config.base_url.as_ref().or(scenario.target.base_url.as_ref()) {
        return Ok(base.trim_end_matches('/').to_string());
    }

    let ports = if !config.ports.is_empty() {
        &config.ports
    } else {
        &scenario.target.ports
    };
    let host = config
        .host
        .as_deref()
        .or(scenario.target.host.as_deref())
        .unwrap_or("localhost");
    let probe_timeout = config.probe_timeout.unwrap_or_else(|| {
        Duration::from_millis(
            scenario
                .target
                .probe_timeout_ms
                .unwrap_or(DEFAULT_PROBE_TIMEOUT_MS),
        )
    });

    discovery::discover(host, ports, probe_timeout).await
}

/// Execute the steps fail-fast and capture the terminal screenshot.
async fn drive_steps(
    driver: &dyn Driver,
    base_url: &str,
    scenario: &Scenario,
    credentials: &Credentials,
    default_timeout: Duration,
    sink: &ArtifactSink,
) -> RunOutcome {
    let steps_total = scenario.steps.len();
    println!("\n{}", "Steps:".cyan());

    for (i, step) in scenario.steps.iter().enumerate() {
        let step_num = i + 1;
        match execute_step(driver, base_url, step, credentials, default_timeout, sink).await {
            Ok(()) => {
                println!(
                    "  {} Step {}: {}",
                    "✓".green(),
                    step_num,
                    step.name.dimmed()
                );
            }
            Err(e) => {
                println!("  {} Step {}: {}", "✗".red(), step_num, e);
                let tag = format!("{}-failed", step.name);
                let screenshot = artifacts::capture(driver, sink, &tag).await;
                return RunOutcome {
                    name: scenario.name.clone(),
                    passed: false,
                    steps_run: step_num,
                    steps_total,
                    error: Some(e),
                    screenshot,
                };
            }
        }
    }

    let screenshot = artifacts::capture(driver, sink, "final").await;
    println!("\n{} {}", "✓".green().bold(), "Verification passed".green().bold());

    RunOutcome {
        name: scenario.name.clone(),
        passed: true,
        steps_run: steps_total,
        steps_total,
        error: None,
        screenshot,
    }
}

/// Execute one step: arm any network observer, perform the action, then
/// wait for the post-condition within the step's timeout.
async fn execute_step(
    driver: &dyn Driver,
    base_url: &str,
    step: &Step,
    credentials: &Credentials,
    default_timeout: Duration,
    sink: &ArtifactSink,
) -> Result<()> {
    let timeout = step
        .timeout_ms
        .map(Duration::from_millis)
        .unwrap_or(default_timeout);

    // Arm-then-act: the response observer must be attached before the
    // action fires, or a fast response slips past unobserved.
    let watch = match &step.wait_for {
        Some(PostCondition::Response { pattern }) => {
            let pattern = UrlPattern::compile(pattern)?;
            Some(
                driver
                    .arm_response_watch(&pattern)
                    .await
                    .map_err(|e| Error::action_failed(&step.name, e))?,
            )
        }
        _ => None,
    };

    perform_action(driver, base_url, step, credentials, sink)
        .await
        .map_err(|e| match e {
            e @ Error::ActionFailed { .. } => e,
            other => Error::action_failed(&step.name, other),
        })?;

    match &step.wait_for {
        None => Ok(()),
        Some(PostCondition::Response { .. }) => {
            // The watch was armed above; waiting consumes it.
            match watch {
                Some(watch) => match watch.wait(timeout).await {
                    Some(url) => {
                        debug!(step = %step.name, %url, "response post-condition met");
                        Ok(())
                    }
                    None => Err(Error::step_timeout(&step.name, timeout)),
                },
                None => Err(Error::action_failed(
                    &step.name,
                    "response observer was not armed",
                )),
            }
        }
        Some(PostCondition::UrlMatches { pattern }) => {
            let pattern = UrlPattern::compile(pattern)?;
            wait_for_url(driver, step, &pattern, timeout).await
        }
        Some(PostCondition::Visible { locator }) => {
            wait_for_visibility(driver, step, locator, true, timeout).await
        }
        Some(PostCondition::Hidden { locator }) => {
            wait_for_visibility(driver, step, locator, false, timeout).await
        }
    }
}

/// Perform the step's page interaction.
async fn perform_action(
    driver: &dyn Driver,
    base_url: &str,
    step: &Step,
    credentials: &Credentials,
    sink: &ArtifactSink,
) -> Result<()> {
    match &step.action {
        Action::Goto { path } => driver.goto(&join_url(base_url, path)).await,
        Action::Fill { locator, value } => {
            let value = credentials.substitute(value)?;
            driver.fill(locator, &value).await
        }
        Action::Click { locator, force } => driver.click(locator, *force).await,
        Action::Check { locator } => driver.check(locator).await,
        Action::Select { locator, value } => driver.select(locator, value).await,
        Action::Screenshot { tag } => {
            // An explicit capture step fails the run when it cannot write;
            // the diagnostic capture on the failure path stays best-effort.
            let bytes = driver.screenshot().await?;
            sink.write(tag, &bytes)?;
            Ok(())
        }
    }
}

/// Poll the page URL until it matches the pattern or the timeout elapses.
async fn wait_for_url(
    driver: &dyn Driver,
    step: &Step,
    pattern: &UrlPattern,
    timeout: Duration,
) -> Result<()> {
    let deadline = Instant::now() + timeout;
    loop {
        let url = driver
            .current_url()
            .await
            .map_err(|e| Error::action_failed(&step.name, e))?;
        if pattern.matches(&url) {
            debug!(step = %step.name, %url, "url post-condition met");
            return Ok(());
        }
        if Instant::now() >= deadline {
            return Err(Error::step_timeout(&step.name, timeout));
        }
        tokio::time::sleep(POLL_INTERVAL).await;
    }
}

/// Poll element visibility until it reaches `want_visible` or the timeout
/// elapses. Hidden treats an absent element as hidden.
async fn wait_for_visibility(
    driver: &dyn Driver,
    step: &Step,
    locator: &Locator,
    want_visible: bool,
    timeout: Duration,
) -> Result<()> {
    let deadline = Instant::now() + timeout;
    loop {
        let visible = driver
            .is_visible(locator)
            .await
            .map_err(|e| Error::action_failed(&step.name, e))?;
        if visible == want_visible {
            return Ok(());
        }
        if Instant::now() >= deadline {
            return Err(Error::step_timeout(&step.name, timeout));
        }
        tokio::time::sleep(POLL_INTERVAL).await;
    }
}

/// Join the run's base address with a step path.
fn join_url(base: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}
