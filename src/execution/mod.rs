//! Execution Module - analysis commands and result normalization
//!
//! - `analyzer`: DESCRIBE / SUMMARIZE / custom SQL over the shared session
//! - `normalize`: engine values to boundary-safe cells
//! - `result`: payload types handed to the host

pub mod analyzer;
pub mod normalize;
pub mod result;

pub use analyzer::{DataAnalyzer, TableState};
pub use normalize::{normalize_cell, normalize_raw, normalize_result_set};
pub use result::{AnalysisCommand, CellValue, CommandMetadata, NormalizedTable, ResultPayload, SampleData};
