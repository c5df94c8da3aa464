//! pagecheck - browser-driven verification runner CLI
//!
//! Runs YAML verification scenarios against a live web application through
//! a headless browser, probing candidate ports when the target's address is
//! not known in advance.

use clap::Parser;
use pagecheck::commands::{self, Commands};
use pagecheck::common::logging;

#[derive(Parser)]
#[command(name = "pagecheck", about = "Browser-driven verification runner")]
#[command(version, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbose logging (RUST_LOG overrides)
    #[arg(long, short, global = true)]
    verbose: bool,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    logging::init(cli.verbose);

    if let Err(e) = commands::dispatch(cli.command).await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
