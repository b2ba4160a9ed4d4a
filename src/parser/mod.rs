//! Line parsing and schema definitions.
//!
//! This module handles:
//! - Parsing raw call-edge log lines
//! - Defining the edge and call-tree types
//! - Defining the output schema

pub mod log_line;
pub mod schema;

// Re-export main types
pub use log_line::{format_timestamp, parse_line};
pub use schema::{CallNode, Edge, TraceResult};
