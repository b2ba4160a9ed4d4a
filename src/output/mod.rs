//! Output writers for trace results and malformed lines.
//!
//! This module handles:
//! - Serializing one trace result as a JSON line
//! - Reading JSON-lines result files back
//! - Buffered, failure-tolerant line sinks for the pipeline writer

pub mod json;
pub mod sink;

// Re-export main functions
pub use json::{parse_results, prepare_output_path, read_results, result_to_line};
pub use sink::LineSink;
