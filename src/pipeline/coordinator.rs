//! Wire a line source, the aggregator and three sinks together.
//!
//! ```text
//! source ──reader──▶ lines ──aggregator──┬─▶ completed ─┐
//!                                        ├─▶ orphans   ─┼─writer──▶ sinks
//!                                        └─▶ malformed ─┘
//! ```
//!
//! The reader and the aggregator run as spawned tasks. The writer runs on
//! the caller's task so it can borrow the sinks.

use crate::aggregator::{AggregatorOutputs, AggregatorStats, TraceAggregator};
use crate::output::sink::LineSink;
use crate::utils::config::{DEFAULT_CHANNEL_CAPACITY, DEFAULT_JOIN_TIMEOUT, STOP_SIGNAL};
use crate::utils::error::PipelineError;
use log::{debug, error, info};
use std::io;
use std::time::Duration;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite};
use tokio::sync::mpsc;

/// Runtime knobs for one pipeline run
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Capacity of each of the four channels
    pub channel_capacity: usize,

    /// Input line that ends ingestion
    pub stop_token: String,

    /// Deadline for in-flight tree builds at end of stream
    pub join_timeout: Option<Duration>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
            stop_token: STOP_SIGNAL.to_string(),
            join_timeout: Some(DEFAULT_JOIN_TIMEOUT),
        }
    }
}

/// What one run read and wrote
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PipelineSummary {
    pub lines_read: u64,
    pub aggregator: AggregatorStats,
    pub completed_written: u64,
    pub orphans_written: u64,
    pub malformed_written: u64,
}

/// Run the whole pipeline until the source is exhausted or the stop token
/// is read, then flush every sink
///
/// **Public** - main entry point for the watch command
///
/// # Arguments
/// * `source` - Line-oriented input
/// * `completed_sink` - Receives one JSON line per completed trace
/// * `orphan_sink` - Receives one JSON line per orphan trace
/// * `malformed_sink` - Receives each unparseable line verbatim
///
/// # Errors
/// * `PipelineError::Source` - reading failed; outputs up to that point
///   are still written
/// * `PipelineError::Sink` - the first sink that failed to write
/// * `PipelineError::TaskFailed` - the reader or aggregator task panicked
pub async fn start_watching<R, C, O, M>(
    source: R,
    completed_sink: C,
    orphan_sink: O,
    malformed_sink: M,
    config: &PipelineConfig,
) -> Result<PipelineSummary, PipelineError>
where
    R: AsyncBufRead + Unpin + Send + 'static,
    C: AsyncWrite + Unpin,
    O: AsyncWrite + Unpin,
    M: AsyncWrite + Unpin,
{
    let capacity = config.channel_capacity.max(1);
    let (lines_tx, lines_rx) = mpsc::channel(capacity);
    let (malformed_tx, malformed_rx) = mpsc::channel(capacity);
    let (completed_tx, completed_rx) = mpsc::channel(capacity);
    let (orphans_tx, orphans_rx) = mpsc::channel(capacity);

    let reader = tokio::spawn(read_lines(source, lines_tx, config.stop_token.clone()));

    let aggregator = TraceAggregator::new(
        AggregatorOutputs {
            malformed: malformed_tx,
            completed: completed_tx,
            orphans: orphans_tx,
        },
        config.join_timeout,
    )
    .with_stop_token(config.stop_token.clone());
    let aggregating = tokio::spawn(aggregator.run(lines_rx));

    let written = drain_outputs(
        OutputStreams {
            completed: completed_rx,
            orphans: orphans_rx,
            malformed: malformed_rx,
        },
        LineSink::new("completed", completed_sink),
        LineSink::new("orphan", orphan_sink),
        LineSink::new("malformed", malformed_sink),
    )
    .await;

    let stats = aggregating.await?;
    let lines_read = reader.await?.map_err(|e| {
        error!("Reading input failed: {}", e);
        PipelineError::Source(e)
    })?;

    let (completed_written, orphans_written, malformed_written) = written?;

    let summary = PipelineSummary {
        lines_read,
        aggregator: stats,
        completed_written,
        orphans_written,
        malformed_written,
    };
    info!(
        "Pipeline finished: {} lines read, {} completed, {} orphans, {} malformed written",
        summary.lines_read,
        summary.completed_written,
        summary.orphans_written,
        summary.malformed_written
    );

    Ok(summary)
}

/// Forward lines to the aggregator until end of input or the stop token
///
/// **Private** - spawned as the reader task
///
/// Dropping `lines` on return is the end-of-stream signal, so the rest of
/// the pipeline drains even when reading fails. Lines are read as raw bytes
/// so one line of invalid UTF-8 does not end the input.
async fn read_lines<R>(
    mut source: R,
    lines: mpsc::Sender<String>,
    stop_token: String,
) -> Result<u64, io::Error>
where
    R: AsyncBufRead + Unpin,
{
    let mut buf = Vec::new();
    let mut count = 0u64;

    while source.read_until(b'\n', &mut buf).await? > 0 {
        let line = decode_line(&buf);
        buf.clear();

        if line == stop_token {
            debug!("Stop token read after {} lines", count);
            break;
        }

        count += 1;
        if lines.send(line).await.is_err() {
            debug!("Aggregator stopped accepting lines");
            break;
        }
    }

    debug!("Reader finished after {} lines", count);
    Ok(count)
}

/// Strip the line terminator and decode, replacing invalid UTF-8
///
/// **Private** - a line with bad bytes still reaches the parser and ends up
/// in the malformed output instead of failing the reader
fn decode_line(raw: &[u8]) -> String {
    let raw = raw.strip_suffix(b"\n").unwrap_or(raw);
    let raw = raw.strip_suffix(b"\r").unwrap_or(raw);
    String::from_utf8_lossy(raw).into_owned()
}

/// Receiving halves of the aggregator outputs
struct OutputStreams {
    completed: mpsc::Receiver<String>,
    orphans: mpsc::Receiver<String>,
    malformed: mpsc::Receiver<String>,
}

/// Fan the three output streams into their sinks until all are closed
///
/// **Private** - the writer stage
///
/// # Returns
/// Lines written to the completed, orphan and malformed sinks
async fn drain_outputs<C, O, M>(
    mut streams: OutputStreams,
    mut completed: LineSink<C>,
    mut orphans: LineSink<O>,
    mut malformed: LineSink<M>,
) -> Result<(u64, u64, u64), PipelineError>
where
    C: AsyncWrite + Unpin,
    O: AsyncWrite + Unpin,
    M: AsyncWrite + Unpin,
{
    let mut completed_open = true;
    let mut orphans_open = true;
    let mut malformed_open = true;

    while completed_open || orphans_open || malformed_open {
        tokio::select! {
            line = streams.completed.recv(), if completed_open => match line {
                Some(line) => completed.write_line(&line).await,
                None => {
                    debug!("Completed stream closed");
                    completed_open = false;
                }
            },
            line = streams.orphans.recv(), if orphans_open => match line {
                Some(line) => orphans.write_line(&line).await,
                None => {
                    debug!("Orphan stream closed");
                    orphans_open = false;
                }
            },
            line = streams.malformed.recv(), if malformed_open => match line {
                Some(line) => malformed.write_line(&line).await,
                None => {
                    debug!("Malformed stream closed");
                    malformed_open = false;
                }
            },
        }
    }

    // Flush every sink before reporting the first failure
    let names = [completed.name(), orphans.name(), malformed.name()];
    let results = [
        completed.finish().await,
        orphans.finish().await,
        malformed.finish().await,
    ];

    let mut counts = [0u64; 3];
    for ((count, result), sink) in counts.iter_mut().zip(results).zip(names) {
        *count = result.map_err(|source| PipelineError::Sink { sink, source })?;
    }

    Ok((counts[0], counts[1], counts[2]))
}
