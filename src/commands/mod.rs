//! CLI command implementations.
//!
//! Each command is implemented in its own module.
//! Commands orchestrate the various library components to perform user tasks.

pub mod utils;
pub mod watch;

// Re-export main command functions
pub use utils::{display_version, validate_results_file, ResultsReport};
pub use watch::{execute_watch, validate_args, WatchArgs};
