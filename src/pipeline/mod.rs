//! Concurrent staging of reader, aggregator and writer.

pub mod coordinator;

pub use coordinator::{start_watching, PipelineConfig, PipelineSummary};
