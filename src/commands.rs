//! CLI command definitions and dispatch

use std::path::PathBuf;
use std::time::Duration;

use clap::Subcommand;
use colored::Colorize;

use crate::common::{Error, Result};
use crate::runner::{self, scenario::Scenario, Credentials, RunConfig};

#[derive(Subcommand)]
pub enum Commands {
    /// Execute a verification scenario from a YAML file
    Run {
        /// Path to the YAML scenario file
        path: PathBuf,

        /// Known base URL of the target (skips discovery)
        #[arg(long)]
        base_url: Option<String>,

        /// Candidate ports to probe in order, e.g. --ports 3000,3001,3003
        #[arg(long, value_delimiter = ',')]
        ports: Vec<u16>,

        /// Host used for candidate probing
        #[arg(long)]
        host: Option<String>,

        /// Per-candidate probe timeout in milliseconds
        #[arg(long)]
        probe_timeout_ms: Option<u64>,

        /// Login identifier, substituted for $EMAIL in steps
        #[arg(long, env = "PAGECHECK_EMAIL")]
        email: Option<String>,

        /// Login secret, substituted for $PASSWORD in steps
        #[arg(long, env = "PAGECHECK_PASSWORD", hide_env_values = true)]
        password: Option<String>,

        /// Run with a visible browser window instead of headless
        #[arg(long)]
        headed: bool,

        /// Default post-condition timeout in milliseconds
        #[arg(long)]
        timeout_ms: Option<u64>,

        /// Directory screenshots are written to
        #[arg(long, default_value = "verification")]
        artifacts: PathBuf,
    },

    /// Probe candidate ports and print the first reachable base address
    Discover {
        /// Candidate ports to probe in order
        #[arg(long, value_delimiter = ',', required = true)]
        ports: Vec<u16>,

        /// Host to probe
        #[arg(long, default_value = "localhost")]
        host: String,

        /// Per-candidate probe timeout in milliseconds
        #[arg(long, default_value = "5000")]
        probe_timeout_ms: u64,
    },
}

/// Dispatch a parsed command.
pub async fn dispatch(command: Commands) -> Result<()> {
    match command {
        Commands::Run {
            path,
            base_url,
            ports,
            host,
            probe_timeout_ms,
            email,
            password,
            headed,
            timeout_ms,
            artifacts,
        } => {
            let scenario = Scenario::load(&path)?;
            let config = RunConfig {
                base_url,
                host,
                ports,
                probe_timeout: probe_timeout_ms.map(Duration::from_millis),
                credentials: Credentials { email, password },
                headless: !headed,
                default_timeout: timeout_ms.map(Duration::from_millis),
                artifact_dir: artifacts,
            };

            let outcome = runner::run_scenario(&scenario, &config).await?;
            if outcome.passed {
                Ok(())
            } else {
                if let Some(path) = &outcome.screenshot {
                    println!(
                        "\n{} {}",
                        "Failure screenshot:".yellow(),
                        path.display()
                    );
                }
                let error = outcome
                    .error
                    .unwrap_or_else(|| Error::Config("run failed without an error".to_string()));
                println!(
                    "\n{} {} ({} of {} steps run)",
                    "✗".red().bold(),
                    "Verification failed".red().bold(),
                    outcome.steps_run,
                    outcome.steps_total
                );
                Err(error)
            }
        }

        Commands::Discover {
            ports,
            host,
            probe_timeout_ms,
        } => {
            let base =
                runner::discover(&host, &ports, Duration::from_millis(probe_timeout_ms)).await?;
            println!("{base}");
            Ok(())
        }
    }
}
