//! Configuration and constants for the pipeline and CLI.

use std::time::Duration;

/// Caller value that marks the entry point of a trace
pub const ROOT_CALLER: &str = "null";

/// Literal input line that ends ingestion
pub const STOP_SIGNAL: &str = "stop";

/// Separator between caller and callee in the last field of a line
pub const CALL_SEPARATOR: &str = "->";

/// Number of space-separated fields in a well-formed line
pub const FIELD_COUNT: usize = 5;

/// Capacity of every channel between pipeline stages
pub const DEFAULT_CHANNEL_CAPACITY: usize = 100;

/// Upper bound on waiting for in-flight tree builds at end of stream
pub const DEFAULT_JOIN_TIMEOUT: Duration = Duration::from_secs(30);

// Orphan and malformed outputs default to the working directory
pub const DEFAULT_ORPHANS_PATH: &str = "orphans.txt";
pub const DEFAULT_MALFORMED_PATH: &str = "malformed.txt";
