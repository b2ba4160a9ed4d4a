//! Calltrace Studio CLI
//!
//! Reads call-edge log lines from a file or stdin and writes one JSON call
//! tree per trace, plus orphan traces and malformed lines to their own files.

use anyhow::Result;
use calltrace_studio::commands::{
    display_version, execute_watch, validate_args, validate_results_file, WatchArgs,
};
use calltrace_studio::utils::config::{
    DEFAULT_CHANNEL_CAPACITY, DEFAULT_MALFORMED_PATH, DEFAULT_ORPHANS_PATH,
};
use clap::{Parser, Subcommand};
use env_logger::Env;
use std::path::PathBuf;

/// Calltrace Studio - rebuild call trees from call-edge logs
#[derive(Parser, Debug)]
#[command(name = "calltrace")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

/// Available commands
#[derive(Subcommand, Debug)]
enum Commands {
    /// Process a log until end of input or a "stop" line
    Watch {
        /// Input log file (defaults to standard input)
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Output file for completed traces (defaults to standard output)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Output file for traces that never saw a root call
        #[arg(long, default_value = DEFAULT_ORPHANS_PATH)]
        orphans: PathBuf,

        /// Output file for lines that could not be parsed
        #[arg(long, default_value = DEFAULT_MALFORMED_PATH)]
        malformed: PathBuf,

        /// Capacity of each channel between pipeline stages
        #[arg(long, default_value_t = DEFAULT_CHANNEL_CAPACITY)]
        channel_capacity: usize,

        /// Seconds to wait for pending tree builds at end of input (0 = no limit).
        /// Traces still pending at the deadline are dropped and reported as abandoned
        #[arg(long, default_value = "30")]
        join_timeout: u64,
    },

    /// Validate a JSON-lines result file
    Validate {
        /// Path to result file
        #[arg(short, long)]
        file: PathBuf,
    },

    /// Display version information
    Version,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Setup logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(Env::default().default_filter_or(log_level)).init();

    // Execute command
    match cli.command {
        Commands::Watch {
            input,
            output,
            orphans,
            malformed,
            channel_capacity,
            join_timeout,
        } => {
            let args = WatchArgs {
                input,
                output,
                orphans,
                malformed,
                channel_capacity,
                join_timeout_secs: join_timeout,
            };

            // Validate args first
            validate_args(&args)?;

            execute_watch(args).await?;
        }

        Commands::Validate { file } => {
            validate_results_file(file)?;
        }

        Commands::Version => {
            display_version();
        }
    }

    Ok(())
}
