//! CSV analysis bridge over an embedded DuckDB session.
//!
//! CSV text goes in, is materialized as a table by the engine's CSV
//! auto-detection, and DESCRIBE / SUMMARIZE / custom SQL results come back as
//! JSON-safe payloads.

pub mod config;
pub mod db;
pub mod error;
pub mod execution;
pub mod host;
pub mod ingestion;

pub use config::AnalyzerConfig;
pub use error::{AnalyzerError, Result};
pub use execution::{AnalysisCommand, CellValue, CommandMetadata, NormalizedTable, ResultPayload, SampleData};
pub use host::AnalyzerHost;
