//! Aggregation of parsed edges into call trees.
//!
//! This module transforms a stream of edges into:
//! - Per-trace edge groups, closed by their root edge
//! - Nested call trees (one per completed or orphaned trace)

pub mod trace_aggregator;
pub mod tree_builder;

// Re-export main types and functions
pub use trace_aggregator::{AggregatorOutputs, AggregatorStats, TraceAggregator};
pub use tree_builder::{build_tree, render_trace};
