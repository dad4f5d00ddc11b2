pub mod commands;

use std::path::PathBuf;
use std::process::ExitCode;

use archon_core::config::{AppConfig, ConfigError, LoadOptions};
use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(
    name = "archon",
    about = "Archon quote pipeline CLI",
    long_about = "Inspect the offerte pipeline: status registry, KPIs, reminders and bulk actions over a JSON quote snapshot.",
    after_help = "Examples:\n  archon statuses\n  archon kpis --input quotes.json\n  archon bulk --input quotes.json --action send --ids OFF-1,OFF-2"
)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Print every quote status with label, weight and next actions")]
    Statuses,
    #[command(about = "Compute pipeline KPIs and a per-status breakdown for a quote snapshot")]
    Kpis {
        #[arg(long, help = "Path to the JSON quote snapshot")]
        input: PathBuf,
        #[arg(long, help = "Evaluate at this RFC 3339 timestamp instead of the current time")]
        now: Option<String>,
    },
    #[command(about = "List open quotes whose follow-up reminder is due")]
    Reminders {
        #[arg(long, help = "Path to the JSON quote snapshot")]
        input: PathBuf,
        #[arg(long, help = "Evaluate at this RFC 3339 timestamp instead of the current time")]
        now: Option<String>,
    },
    #[command(about = "Apply one bulk action to the selected quotes and write the snapshot back")]
    Bulk {
        #[arg(long, help = "Path to the JSON quote snapshot")]
        input: PathBuf,
        #[arg(long, help = "send|export|duplicate|accept|reject|archive|delete")]
        action: String,
        #[arg(long, value_delimiter = ',', help = "Comma-separated quote ids")]
        ids: Vec<String>,
        #[arg(long, help = "Write the updated snapshot here instead of in place")]
        output: Option<PathBuf>,
    },
    #[command(
        about = "Inspect effective configuration values with source attribution"
    )]
    Config,
}

/// Configuration used to start logging. On a load error the defaults are
/// returned with the error, so it can be reported once logging is up.
pub fn startup_config() -> (AppConfig, Option<ConfigError>) {
    match AppConfig::load(LoadOptions::default()) {
        Ok(config) => (config, None),
        Err(error) => (AppConfig::default(), Some(error)),
    }
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Statuses => commands::statuses::run(),
        Command::Kpis { input, now } => commands::kpis::run(&input, now.as_deref()),
        Command::Reminders { input, now } => commands::reminders::run(&input, now.as_deref()),
        Command::Bulk { input, action, ids, output } => {
            commands::bulk::run(&input, &action, &ids, output.as_deref())
        }
        Command::Config => {
            commands::CommandResult { exit_code: 0, output: commands::config::run() }
        }
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}
