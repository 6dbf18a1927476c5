//! Archivist CLI: archive expired date folders, verify the copies and only
//! then delete the originals.
//!
//! Configuration comes from ARCHIVIST_* environment variables (or `.env`),
//! overridden by the global flags.

use std::process::ExitCode;

use archivist_cli::commands::{self, VerifyReport};
use archivist_cli::prompt::PromptDecisions;
use archivist_cli::{init_tracing, print_json, ConfigArgs};
use archivist_core::Destination;
use archivist_services::{Pipeline, RunOutcome};
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "archivist",
    about = "Retention, archival and verified deletion of date-named data folders"
)]
struct Cli {
    #[command(flatten)]
    config: ConfigArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Archive and delete every expired folder
    Run {
        /// Skip the confirmation prompt
        #[arg(long, short = 'y')]
        yes: bool,
        /// Archive destination name; skips the destination menu
        #[arg(long)]
        destination: Option<Destination>,
    },
    /// List expired folders without touching them
    Scan,
    /// Print the manifest a folder would get, without writing it
    Manifest {
        /// Folder name under the output directory, e.g. 2023-01-01
        folder: String,
    },
    /// Re-verify an archived folder against its stored manifest
    Verify {
        /// Folder name, e.g. 2023-01-01
        folder: String,
        /// Destination the folder was archived to
        #[arg(long)]
        destination: Destination,
    },
}

fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();
    let config = cli.config.load()?;
    let _guard = init_tracing(Some(&config.log_dir));

    let code = match cli.command {
        Commands::Run { yes, destination } => {
            let decisions = PromptDecisions::stdio(yes, destination);
            let outcome = Pipeline::local(&config).run(&decisions)?;
            print_json(&outcome)?;
            match &outcome {
                RunOutcome::InvalidDestination => ExitCode::FAILURE,
                RunOutcome::Completed(summary) if !summary.is_clean() => ExitCode::FAILURE,
                _ => ExitCode::SUCCESS,
            }
        }
        Commands::Scan => {
            let today = chrono::Local::now().date_naive();
            print_json(&commands::scan(&config, today)?)?;
            ExitCode::SUCCESS
        }
        Commands::Manifest { folder } => {
            print_json(&commands::manifest(&config, &folder)?)?;
            ExitCode::SUCCESS
        }
        Commands::Verify {
            folder,
            destination,
        } => {
            let report: VerifyReport = commands::verify(&config, &folder, &destination)?;
            print_json(&report)?;
            if report.is_verified() {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            }
        }
    };

    Ok(code)
}
