mod build;
mod config;
mod inspect;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};

use tooltrace_logging::{init_tracing, LogFormat};

use crate::build::{handle_build_command, BuildArgs};
use crate::config::ToolTraceConfig;
use crate::inspect::handle_inspect_command;

#[derive(Parser, Debug)]
#[command(
    name = "tooltrace",
    about = "Build tool-use datasets from agent session logs",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Log level (overridden by RUST_LOG)
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    /// Log output format
    #[arg(long, global = true, value_enum, default_value = "pretty")]
    log_format: LogFormatChoice,

    /// Also write JSON logs to this file
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    /// Config file (default: ./tooltrace.toml if present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Pair tool calls with their results and write dataset rows
    Build(BuildArgs),

    /// Show what the normalizer extracts from one log file
    Inspect {
        /// Session log (JSONL)
        file: PathBuf,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogFormatChoice {
    Pretty,
    Json,
    Compact,
}

impl From<LogFormatChoice> for LogFormat {
    fn from(choice: LogFormatChoice) -> Self {
        match choice {
            LogFormatChoice::Pretty => LogFormat::Pretty,
            LogFormatChoice::Json => LogFormat::Json,
            LogFormatChoice::Compact => LogFormat::Compact,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let _log_guard = init_tracing(
        &cli.log_level,
        cli.log_format.into(),
        cli.log_file.as_deref(),
    );

    match cli.command {
        Commands::Build(args) => {
            let config = load_config(cli.config.as_deref())?;
            handle_build_command(args, config.as_ref()).await
        }
        Commands::Inspect { file, json } => handle_inspect_command(&file, json),
    }
}

fn load_config(explicit: Option<&std::path::Path>) -> Result<Option<ToolTraceConfig>> {
    if let Some(path) = explicit {
        return ToolTraceConfig::load_file(path).map(Some);
    }
    let working_dir = std::env::current_dir()?;
    ToolTraceConfig::load(&working_dir)
}
