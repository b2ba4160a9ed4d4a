//! Error types for the entire application.
//!
//! We use `thiserror` for library-style errors with custom types,
//! and `anyhow` for application-level error propagation in main.rs and commands.

use thiserror::Error;

/// Errors that can occur while parsing a single log line
///
/// Every variant keeps the offending line verbatim so it can be
/// forwarded to the malformed output unchanged.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("expected {expected} space-separated fields, found {found}: {line:?}")]
    FieldCount {
        line: String,
        expected: usize,
        found: usize,
    },

    #[error("field {index} is empty: {line:?}")]
    EmptyField { line: String, index: usize },

    #[error("call field has no '->': {line:?}")]
    MissingArrow { line: String },

    #[error("call field must be exactly 'caller->callee': {line:?}")]
    InvalidCallPair { line: String },
}

impl ParseError {
    /// The line that failed to parse, unchanged
    pub fn line(&self) -> &str {
        match self {
            ParseError::FieldCount { line, .. }
            | ParseError::EmptyField { line, .. }
            | ParseError::MissingArrow { line }
            | ParseError::InvalidCallPair { line } => line,
        }
    }

    pub fn into_line(self) -> String {
        match self {
            ParseError::FieldCount { line, .. }
            | ParseError::EmptyField { line, .. }
            | ParseError::MissingArrow { line }
            | ParseError::InvalidCallPair { line } => line,
        }
    }
}

/// Errors that can occur while linking a trace's edges into a tree
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TreeError {
    #[error("cannot build a tree from an empty edge group")]
    EmptyGroup,

    /// A span calls back into one of its own ancestors
    #[error("span {span} calls back into its own ancestor; caller/callee links form a cycle")]
    Cycle { span: String },
}

/// Errors that abort the rendering of one trace
#[derive(Error, Debug)]
pub enum TraceError {
    #[error("tree reconstruction failed: {0}")]
    Tree(#[from] TreeError),

    #[error("failed to serialize trace: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Errors that can occur during file output
#[derive(Error, Debug)]
pub enum OutputError {
    #[error("Failed to write file: {0}")]
    WriteFailed(#[from] std::io::Error),

    #[error("Failed to serialize JSON: {0}")]
    SerializationFailed(#[from] serde_json::Error),

    #[error("Invalid output path: {0}")]
    InvalidPath(String),

    #[error("Invalid result on line {line_number}: {source}")]
    InvalidLine {
        line_number: usize,
        source: serde_json::Error,
    },
}

/// Errors reported by the pipeline coordinator once every stage has drained
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("reading the input failed: {0}")]
    Source(#[source] std::io::Error),

    #[error("writing to the {sink} output failed: {source}")]
    Sink {
        sink: &'static str,
        source: std::io::Error,
    },

    #[error("pipeline task failed: {0}")]
    TaskFailed(#[from] tokio::task::JoinError),
}
