//! JSON-lines rendering and reading of trace results.
//!
//! Every completed or orphan trace is written as one compact JSON object
//! on its own line:
//!
//! ```text
//! {"id":"service6","root":{"start":"...","end":"...","service":"service6","span":"bm6il56t","calls":[...]}}
//! ```

use crate::parser::schema::TraceResult;
use crate::utils::error::OutputError;
use log::debug;
use std::fs;
use std::path::Path;

/// Serialize a result without a trailing newline
pub fn result_to_line(result: &TraceResult) -> Result<String, serde_json::Error> {
    serde_json::to_string(result)
}

/// Parse JSON-lines text into results, skipping blank lines
///
/// **Public** - used by the validate command and tests
///
/// # Errors
/// * `OutputError::InvalidLine` - first line that is not a valid result,
///   numbered from 1
pub fn parse_results(text: &str) -> Result<Vec<TraceResult>, OutputError> {
    text.lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(index, line)| {
            serde_json::from_str(line).map_err(|source| OutputError::InvalidLine {
                line_number: index + 1,
                source,
            })
        })
        .collect()
}

/// Read a JSON-lines result file
///
/// **Public** - useful for validation and testing
///
/// # Errors
/// * `OutputError::WriteFailed` - File read error (reusing WriteFailed for I/O)
/// * `OutputError::InvalidLine` - a line is not a valid result
pub fn read_results(input_path: impl AsRef<Path>) -> Result<Vec<TraceResult>, OutputError> {
    let input_path = input_path.as_ref();

    debug!("Reading results from: {}", input_path.display());

    let text = fs::read_to_string(input_path)?;
    let results = parse_results(&text)?;

    debug!("Loaded {} results", results.len());

    Ok(results)
}

/// Check that a path can be used as an output file and create its parent
/// directories
///
/// **Public** - called by the watch command before opening outputs
///
/// # Errors
/// * `OutputError::InvalidPath` - empty path, a directory, or parent
///   directories cannot be created
pub fn prepare_output_path(path: &Path) -> Result<(), OutputError> {
    if path.as_os_str().is_empty() {
        return Err(OutputError::InvalidPath("Path is empty".to_string()));
    }

    if path.is_dir() {
        return Err(OutputError::InvalidPath(format!(
            "Path is a directory: {}",
            path.display()
        )));
    }

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            debug!("Creating parent directories: {}", parent.display());
            fs::create_dir_all(parent).map_err(|e| {
                OutputError::InvalidPath(format!(
                    "Cannot create directory {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }
    }

    Ok(())
}
