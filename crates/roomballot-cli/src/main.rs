mod commands;
mod reader;
mod writer;

use std::process::ExitCode;

use clap::{Parser, Subcommand};
use roomballot_types::{BallotError, ErrorKind};

use crate::commands::{AuditArgs, CollusionArgs, ReplayArgs, RunArgs, VerifyArgs};

#[derive(Parser)]
#[command(name = "roomballot")]
#[command(about = "Allocate rooms by ranked preference and publish verifiable, anonymised results")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Run the ballot and write results, public artifact and tokens")]
    Run(RunArgs),
    #[command(about = "Check your own outcome against a public artifact")]
    Verify(VerifyArgs),
    #[command(about = "Recompute publication order and check every token")]
    Audit(AuditArgs),
    #[command(about = "Re-run the matching from a public artifact and compare outcomes")]
    Replay(ReplayArgs),
    #[command(about = "Report participants with suspiciously similar preferences")]
    Collusion(CollusionArgs),
}

fn main() -> ExitCode {
    init_logging();
    let cli = Cli::parse();

    let result = match &cli.command {
        Commands::Run(args) => commands::run(args),
        Commands::Verify(args) => commands::verify(args),
        Commands::Audit(args) => commands::audit(args),
        Commands::Replay(args) => commands::replay(args),
        Commands::Collusion(args) => commands::collusion(args),
    };

    match result {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::from(exit_code_for_error(&e))
        }
    }
}

fn init_logging() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();
}

/// 1 for a failed verification, 3 for an engine bug, 2 for everything the
/// user can fix.
fn exit_code_for_error(err: &anyhow::Error) -> u8 {
    let kind = err
        .chain()
        .find_map(|cause| cause.downcast_ref::<BallotError>())
        .map(BallotError::kind);
    match kind {
        Some(ErrorKind::Verification) => 1,
        Some(ErrorKind::Precondition | ErrorKind::Invariant) => 3,
        _ => 2,
    }
}
