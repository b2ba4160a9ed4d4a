use crate::output::read_results;
use crate::parser::TraceResult;
use anyhow::{Context, Result};
use std::path::PathBuf;

/// Totals over a result file, printed by the validate command
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResultsReport {
    pub traces: usize,
    pub calls: usize,
    pub max_depth: usize,
}

impl ResultsReport {
    pub fn from_results(results: &[TraceResult]) -> Self {
        Self {
            traces: results.len(),
            calls: results.iter().map(|r| r.root.call_count()).sum(),
            max_depth: results.iter().map(|r| r.root.depth()).max().unwrap_or(0),
        }
    }
}

/// Validate a JSON-lines result file
pub fn validate_results_file(file_path: PathBuf) -> Result<ResultsReport> {
    println!("Validating results: {}", file_path.display());

    let results = read_results(&file_path)
        .with_context(|| format!("Invalid result file {}", file_path.display()))?;
    let report = ResultsReport::from_results(&results);

    println!("✓ Valid result file");
    println!("  Traces: {}", report.traces);
    println!("  Calls: {}", report.calls);
    println!("  Max Depth: {}", report.max_depth);

    Ok(report)
}

/// Display version information
pub fn display_version() {
    println!("Calltrace Studio v{}", env!("CARGO_PKG_VERSION"));
    println!();
    println!("Reconstructs distributed call trees from call-edge log lines.");
}
