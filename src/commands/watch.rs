//! Watch command implementation.
//!
//! The watch command:
//! 1. Opens the input (file or stdin)
//! 2. Opens the completed, orphan and malformed outputs
//! 3. Runs the pipeline until end of input or a `stop` line
//! 4. Reports what was read and written

use crate::output::prepare_output_path;
use crate::pipeline::{start_watching, PipelineConfig};
use crate::utils::config::{
    DEFAULT_CHANNEL_CAPACITY, DEFAULT_JOIN_TIMEOUT, DEFAULT_MALFORMED_PATH, DEFAULT_ORPHANS_PATH,
    STOP_SIGNAL,
};
use anyhow::{bail, Context, Result};
use log::{debug, info};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tokio::fs::File;
use tokio::io::{AsyncBufRead, AsyncWrite, BufReader};

/// Arguments for the watch command
///
/// **Public** - used by main.rs to construct from CLI args
#[derive(Debug, Clone)]
pub struct WatchArgs {
    /// Input log file; stdin when absent
    pub input: Option<PathBuf>,

    /// Completed-trace output; stdout when absent
    pub output: Option<PathBuf>,

    /// Orphan-trace output
    pub orphans: PathBuf,

    /// Malformed-line output
    pub malformed: PathBuf,

    /// Capacity of each pipeline channel
    pub channel_capacity: usize,

    /// Seconds to wait for in-flight tree builds at end of input, 0 waits forever
    pub join_timeout_secs: u64,
}

impl Default for WatchArgs {
    fn default() -> Self {
        Self {
            input: None,
            output: None,
            orphans: PathBuf::from(DEFAULT_ORPHANS_PATH),
            malformed: PathBuf::from(DEFAULT_MALFORMED_PATH),
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
            join_timeout_secs: DEFAULT_JOIN_TIMEOUT.as_secs(),
        }
    }
}

impl WatchArgs {
    /// Pipeline settings derived from these arguments
    pub fn pipeline_config(&self) -> PipelineConfig {
        PipelineConfig {
            channel_capacity: self.channel_capacity,
            stop_token: STOP_SIGNAL.to_string(),
            join_timeout: match self.join_timeout_secs {
                0 => None,
                secs => Some(Duration::from_secs(secs)),
            },
        }
    }
}

/// Validate watch arguments
///
/// **Public** - called before execution to fail fast
pub fn validate_args(args: &WatchArgs) -> Result<()> {
    if args.channel_capacity == 0 {
        bail!("Channel capacity must be greater than 0");
    }

    if let Some(input) = &args.input {
        if !input.is_file() {
            bail!("Input file not found: {}", input.display());
        }
    }

    let outputs = args
        .output
        .iter()
        .chain([&args.orphans, &args.malformed]);
    for path in outputs {
        if path.as_os_str().is_empty() {
            bail!("Output path cannot be empty");
        }
        if path.is_dir() {
            bail!("Output path is a directory: {}", path.display());
        }
    }

    if Some(&args.orphans) == args.output.as_ref()
        || Some(&args.malformed) == args.output.as_ref()
        || args.orphans == args.malformed
    {
        bail!("Completed, orphan and malformed outputs must be different files");
    }

    Ok(())
}

/// Execute the watch command
///
/// **Public** - main entry point called from main.rs
///
/// # Errors
/// * Input cannot be opened or read
/// * An output cannot be created or written
pub async fn execute_watch(args: WatchArgs) -> Result<()> {
    let start_time = Instant::now();

    let source = open_source(args.input.as_deref()).await?;
    let completed: Box<dyn AsyncWrite + Unpin + Send> = match &args.output {
        Some(path) => {
            info!("Writing completed traces to {}", path.display());
            create_sink(path).await?
        }
        None => {
            info!("Writing completed traces to standard output, use -o to write to a file");
            Box::new(tokio::io::stdout())
        }
    };
    let orphans = create_sink(&args.orphans).await?;
    let malformed = create_sink(&args.malformed).await?;

    let config = args.pipeline_config();
    debug!("Pipeline config: {:?}", config);

    let summary = start_watching(source, completed, orphans, malformed, &config)
        .await
        .context("Pipeline failed")?;

    info!("{}", summary.aggregator.summary());
    info!("Orphans written to {}", args.orphans.display());
    info!("Malformed lines written to {}", args.malformed.display());
    info!("Finished in {:.2?}", start_time.elapsed());

    Ok(())
}

/// Open the input file, or stdin when no path is given
///
/// **Private** - internal helper for execute_watch
async fn open_source(input: Option<&Path>) -> Result<Box<dyn AsyncBufRead + Unpin + Send>> {
    match input {
        Some(path) => {
            let file = File::open(path)
                .await
                .with_context(|| format!("Failed to open input {}", path.display()))?;
            info!("Processing the input from {}", path.display());
            Ok(Box::new(BufReader::new(file)))
        }
        None => {
            info!("Processing the input from standard input, use -i to read a log file");
            info!("Processing will stop once a \"{}\" line is read", STOP_SIGNAL);
            Ok(Box::new(BufReader::new(tokio::io::stdin())))
        }
    }
}

/// Create (truncate) an output file, creating parent directories
///
/// **Private** - internal helper for execute_watch
async fn create_sink(path: &Path) -> Result<Box<dyn AsyncWrite + Unpin + Send>> {
    prepare_output_path(path)?;
    let file = File::create(path)
        .await
        .with_context(|| format!("Failed to create output {}", path.display()))?;
    Ok(Box::new(file))
}
