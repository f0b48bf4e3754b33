//! `automation` - inspect, validate and lay out workflow files
//!
//! Workflow files are the JSON documents produced by
//! `BuilderSession::export_json`.

mod commands;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use automation_engine::SessionConfig;
use clap::{Parser, Subcommand};

/// Tools for CRM workflow automation graphs
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Session configuration file (JSON)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print validation errors and warnings; exits with 1 when invalid
    Validate {
        /// Workflow file to check
        file: PathBuf,
    },
    /// Re-position every node with the layered layout
    Layout {
        /// Workflow file to lay out
        file: PathBuf,
        /// Where to write the result (defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Print node and edge counts per kind
    Inspect {
        /// Workflow file to inspect
        file: PathBuf,
    },
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    let cli = Cli::parse();
    match run(cli) {
        Ok(code) => code,
        Err(e) => {
            log::error!("{:#}", e);
            ExitCode::from(2)
        }
    }
}

fn run(cli: Cli) -> anyhow::Result<ExitCode> {
    let config = match &cli.config {
        Some(path) => SessionConfig::load(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => SessionConfig::default(),
    };

    let mut stdout = std::io::stdout().lock();
    match cli.command {
        Command::Validate { file } => {
            let mut session = commands::open(&file, config)?;
            let valid = commands::validate(&mut session, &mut stdout)?;
            Ok(if valid { ExitCode::SUCCESS } else { ExitCode::from(1) })
        }
        Command::Layout { file, output } => {
            let mut session = commands::open(&file, config)?;
            commands::layout(&mut session, output.as_deref(), &mut stdout)?;
            Ok(ExitCode::SUCCESS)
        }
        Command::Inspect { file } => {
            let mut session = commands::open(&file, config)?;
            commands::inspect(&mut session, &mut stdout)?;
            Ok(ExitCode::SUCCESS)
        }
    }
}
