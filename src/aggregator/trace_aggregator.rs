//! Group parsed edges by trace id and dispatch tree building.
//!
//! A trace stays open until its root edge (caller `"null"`) arrives. At that
//! point its edges are moved into a spawned task that builds and serializes
//! the tree. Traces still open at end of stream are flushed as orphans.
//!
//! Outputs are three bounded channels. A channel being closed is the
//! terminal signal for that stream: orphans close first, then completed
//! traces, and malformed lines close when the aggregator is dropped.

use crate::aggregator::tree_builder::render_trace;
use crate::parser::log_line::parse_line;
use crate::parser::schema::Edge;
use crate::utils::config::STOP_SIGNAL;
use log::{debug, error, info, warn};
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::{JoinError, JoinSet};

/// Sending halves of the aggregator's three output streams
#[derive(Debug, Clone)]
pub struct AggregatorOutputs {
    pub malformed: mpsc::Sender<String>,
    pub completed: mpsc::Sender<String>,
    pub orphans: mpsc::Sender<String>,
}

/// Counters collected over one run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AggregatorStats {
    /// Lines handed to `ingest`
    pub lines: u64,

    /// Lines that parsed into edges
    pub edges: u64,

    pub malformed: u64,

    /// Traces closed by a root edge and sent to tree building
    pub completed: u64,

    /// Traces flushed at end of stream without a root edge
    pub orphans: u64,

    /// Tree builds still pending at the join deadline; their traces are lost
    pub abandoned: u64,
}

impl AggregatorStats {
    pub fn summary(&self) -> String {
        format!(
            "Lines: {} | Edges: {} | Malformed: {} | Completed: {} | Orphans: {} | Abandoned: {}",
            self.lines,
            self.edges,
            self.malformed,
            self.completed,
            self.orphans,
            self.abandoned
        )
    }
}

/// Stateful grouping of edges into traces
///
/// Owns the map of open traces; nothing else touches it.
pub struct TraceAggregator {
    groups: HashMap<String, Vec<Edge>>,
    outputs: AggregatorOutputs,
    completed_tasks: JoinSet<()>,
    join_timeout: Option<Duration>,
    stop_token: String,
    stats: AggregatorStats,
}

impl TraceAggregator {
    /// Create an aggregator writing to `outputs`
    ///
    /// `join_timeout` bounds each wait for in-flight tree builds in
    /// `finish`; `None` waits indefinitely.
    pub fn new(outputs: AggregatorOutputs, join_timeout: Option<Duration>) -> Self {
        Self {
            groups: HashMap::new(),
            outputs,
            completed_tasks: JoinSet::new(),
            join_timeout,
            stop_token: STOP_SIGNAL.to_string(),
            stats: AggregatorStats::default(),
        }
    }

    /// Use `token` instead of `"stop"` as the end-of-stream line
    pub fn with_stop_token(mut self, token: impl Into<String>) -> Self {
        self.stop_token = token.into();
        self
    }

    /// Number of traces still waiting for their root edge
    pub fn open_traces(&self) -> usize {
        self.groups.len()
    }

    pub fn stats(&self) -> &AggregatorStats {
        &self.stats
    }

    /// Consume lines until the channel closes or the stop token arrives,
    /// then flush orphans and close the outputs
    ///
    /// **Public** - main entry point when running as a pipeline stage
    pub async fn run(mut self, mut lines: mpsc::Receiver<String>) -> AggregatorStats {
        while let Some(line) = lines.recv().await {
            if line == self.stop_token {
                debug!("Stop token received");
                break;
            }
            self.ingest(line).await;
        }

        self.finish().await
    }

    /// Process one raw line
    ///
    /// Malformed lines are forwarded before this returns, so their output
    /// order matches the input order. A root edge closes its trace and
    /// dispatches tree building without waiting for it.
    pub async fn ingest(&mut self, line: String) {
        self.stats.lines += 1;
        self.reap_completed();

        let edge = match parse_line(&line) {
            Ok(edge) => edge,
            Err(e) => {
                debug!("Malformed line: {}", e);
                self.stats.malformed += 1;
                if self.outputs.malformed.send(e.into_line()).await.is_err() {
                    warn!("Malformed output closed, dropping line");
                }
                return;
            }
        };

        self.stats.edges += 1;

        let is_root = edge.is_root();
        let trace_id = edge.trace_id.clone();
        // Completed traces are emitted under the root edge's service name
        let id = edge.service.clone();
        self.groups.entry(trace_id.clone()).or_default().push(edge);

        if is_root {
            if let Some(edges) = self.groups.remove(&trace_id) {
                debug!("Trace {} completed with {} edges", trace_id, edges.len());
                self.stats.completed += 1;
                dispatch(
                    &mut self.completed_tasks,
                    self.outputs.completed.clone(),
                    id,
                    edges,
                );
            }
        }
    }

    /// Flush every open trace as an orphan and close the outputs
    ///
    /// Orphans are emitted under the service name of their first edge.
    /// The orphan stream is closed only after every orphan build finished,
    /// then the completed stream once its in-flight builds finished. Builds
    /// still running at the join deadline are aborted and counted in
    /// `abandoned`.
    pub async fn finish(mut self) -> AggregatorStats {
        let groups = std::mem::take(&mut self.groups);
        info!("End of stream, flushing {} orphan traces", groups.len());

        let mut orphan_tasks = JoinSet::new();
        for (trace_id, edges) in groups {
            let id = edges[0].service.clone();
            debug!("Trace {} orphaned with {} edges", trace_id, edges.len());
            self.stats.orphans += 1;
            dispatch(&mut orphan_tasks, self.outputs.orphans.clone(), id, edges);
        }

        self.stats.abandoned += join_all(&mut orphan_tasks, "orphan", self.join_timeout).await;
        let TraceAggregator {
            outputs,
            mut completed_tasks,
            join_timeout,
            mut stats,
            ..
        } = self;
        let AggregatorOutputs {
            malformed,
            completed,
            orphans,
        } = outputs;
        drop(orphans);

        stats.abandoned += join_all(&mut completed_tasks, "completed", join_timeout).await;
        drop(completed);
        drop(malformed);

        info!("Aggregation finished: {}", stats.summary());
        stats
    }

    /// Collect results of tree builds that already finished
    ///
    /// **Private** - keeps the task set from growing with the stream
    fn reap_completed(&mut self) {
        while let Some(result) = self.completed_tasks.try_join_next() {
            log_join_result(result);
        }
    }
}

/// Spawn one task that builds, serializes and sends a trace
///
/// **Private** - ownership of `edges` moves into the task
fn dispatch(tasks: &mut JoinSet<()>, output: mpsc::Sender<String>, id: String, edges: Vec<Edge>) {
    tasks.spawn(async move {
        let line = match render_trace(id.clone(), &edges) {
            Ok(line) => line,
            Err(e) => {
                error!("Skipping trace {} ({} edges): {}", id, edges.len(), e);
                return;
            }
        };

        if output.send(line).await.is_err() {
            warn!("Output closed before trace {} could be written", id);
        }
    });
}

/// Wait for every task in `tasks`, giving up after `timeout`
///
/// **Private** - on timeout the remaining tasks are aborted
///
/// # Returns
/// Number of tasks aborted
async fn join_all(tasks: &mut JoinSet<()>, kind: &str, timeout: Option<Duration>) -> u64 {
    let pending = tasks.len();
    if pending == 0 {
        return 0;
    }
    debug!("Waiting for {} {} tree builds", pending, kind);

    let drain = async {
        while let Some(result) = tasks.join_next().await {
            log_join_result(result);
        }
    };

    match timeout {
        Some(limit) => {
            if tokio::time::timeout(limit, drain).await.is_err() {
                let abandoned = tasks.len();
                warn!(
                    "Gave up on {} {} tree builds after {:?}, their traces are dropped",
                    abandoned, kind, limit
                );
                tasks.abort_all();
                return abandoned as u64;
            }
        }
        None => drain.await,
    }

    0
}

fn log_join_result(result: Result<(), JoinError>) {
    if let Err(e) = result {
        if e.is_panic() {
            error!("Tree build task panicked: {}", e);
        } else {
            debug!("Tree build task cancelled: {}", e);
        }
    }
}
