//! Calltrace Studio
//!
//! Reconstructs distributed call trees from a stream of inter-service
//! call-edge log lines.
//!
//! Each input line records one `caller->callee` call of a trace. Edges are
//! grouped by trace id; when a trace's root edge (caller `null`) arrives its
//! edges are linked into a nested call tree and written as one JSON line.
//! Traces that never see a root edge are written as orphans at end of
//! input, and unparseable lines are echoed to a separate output.
//!
//! ## Getting Started
//!
//! ```bash
//! calltrace watch -i trace.log -o traces.jsonl
//! calltrace validate -f traces.jsonl
//! ```

pub mod aggregator;
pub mod commands;
pub mod output;
pub mod parser;
pub mod pipeline;
pub mod utils;
