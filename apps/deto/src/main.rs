#![warn(clippy::pedantic)]

//! # deto
//!
//! Command-line entry point. Everything happens under the `man` subcommand:
//!
//! ```bash
//! deto man -a install -c java          # pick a Java build and install it
//! deto man -a list -c java             # show installed versions
//! deto man -a default -c java -v 21    # switch the current version
//! deto man -a remove -c java -v 17     # delete a version
//! deto man                             # prompt for everything
//! ```

use anyhow::Result;
use clap::{Parser, Subcommand};
use env_logger::Env;

use deto::commands::{self, ManArgs};
use deto::config::Settings;
use deto::ui::TerminalUi;

/// Environment variable holding the log filter.
const LOG_ENV: &str = "DETO_LOG";

/// Developer toolchain version manager.
#[derive(Parser)]
#[command(
    name = "deto",
    author,
    version,
    about = "Install and switch between versions of developer toolchains",
    after_help = "\
ENVIRONMENT VARIABLES:
    DETO_HOME               Root directory (default: ~/.deto)
    DETO_REGISTRY_URL       Registry base URL
    DETO_NO_TUI             Disable interactive prompts
    DETO_LOG                Log filter (default: warn)"
)]
pub struct Cli {
    /// The subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands for the deto CLI.
#[derive(Subcommand)]
pub enum Commands {
    /// Manage installed candidate versions.
    ///
    /// Installs, removes, lists or selects versions of a candidate. A missing
    /// action or candidate is prompted for.
    Man(ManArgs),
}

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(Env::default().filter_or(LOG_ENV, "warn"))
        .format_timestamp(None)
        .init();

    if let Err(e) = run().await {
        let exit_code = handle_error(&e);
        std::process::exit(exit_code);
    }
}

/// Prints an error with its cause chain and returns the exit code.
fn handle_error(e: &anyhow::Error) -> i32 {
    eprintln!("Error: {e:?}");
    1
}

async fn run() -> Result<()> {
    let cli = Cli::parse();
    let settings = Settings::from_env()?;
    let ui = TerminalUi::new(settings.interactive);

    match cli.command {
        Commands::Man(args) => commands::execute(&args, &settings, &ui).await,
    }
}
