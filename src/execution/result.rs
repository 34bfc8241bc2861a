//! Query Result - Boundary-safe payloads returned to the host
//!
//! Everything in here serializes to plain JSON (null, bool, number, string,
//! arrays and objects) so it can cross into a foreign runtime without any
//! engine-specific types.

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::fmt;

/// One normalized cell
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellValue {
    Null,
    Boolean(bool),
    Integer(i64),
    Float(f64),
    Text(String),
}

impl CellValue {
    pub fn is_null(&self) -> bool {
        matches!(self, CellValue::Null)
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            CellValue::Integer(i) => Some(*i as f64),
            CellValue::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            CellValue::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Null => f.write_str("NULL"),
            CellValue::Boolean(b) => write!(f, "{}", b),
            CellValue::Integer(i) => write!(f, "{}", i),
            CellValue::Float(x) => write!(f, "{}", x),
            CellValue::Text(s) => f.write_str(s),
        }
    }
}

/// Normalized rows plus the column names they line up with
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedTable {
    /// Rows in engine order, each cell parallel to `columns`
    pub data: Vec<Vec<CellValue>>,

    /// Column names in engine order
    pub columns: Vec<String>,

    pub row_count: usize,

    pub column_count: usize,
}

impl NormalizedTable {
    /// True when there is at least one row and column and every row has exactly
    /// `column_count` cells.
    pub fn is_well_formed(&self) -> bool {
        if self.data.is_empty() || self.columns.is_empty() {
            return false;
        }
        self.data.iter().all(|row| row.len() == self.column_count)
    }

    /// Index of the first row whose width disagrees with the column list
    pub fn first_ragged_row(&self) -> Option<usize> {
        self.data.iter().position(|row| row.len() != self.column_count)
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// All values of one named column, top to bottom
    pub fn column_values(&self, name: &str) -> Option<Vec<&CellValue>> {
        let idx = self.column_index(name)?;
        Some(self.data.iter().filter_map(|row| row.get(idx)).collect())
    }
}

/// Analysis command issued against a table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AnalysisCommand {
    Describe,
    Summarize,
}

impl AnalysisCommand {
    pub fn keyword(&self) -> &'static str {
        match self {
            AnalysisCommand::Describe => "DESCRIBE",
            AnalysisCommand::Summarize => "SUMMARIZE",
        }
    }
}

impl fmt::Display for AnalysisCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

/// Metadata attached to a payload, depending on which operation produced it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CommandMetadata {
    Analysis {
        command: AnalysisCommand,
        table_name: String,
        source_table_rows: u64,
    },
    Query {
        query: String,
    },
}

/// Unit returned by every analysis operation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultPayload {
    #[serde(flatten)]
    pub table: NormalizedTable,

    #[serde(flatten)]
    pub metadata: CommandMetadata,
}

impl ResultPayload {
    pub fn new(table: NormalizedTable, metadata: CommandMetadata) -> Self {
        Self { table, metadata }
    }

    pub fn row_count(&self) -> usize {
        self.table.row_count
    }

    pub fn column_count(&self) -> usize {
        self.table.column_count
    }

    pub fn columns(&self) -> &[String] {
        &self.table.columns
    }

    pub fn data(&self) -> &[Vec<CellValue>] {
        &self.table.data
    }

    pub fn command(&self) -> Option<AnalysisCommand> {
        match &self.metadata {
            CommandMetadata::Analysis { command, .. } => Some(*command),
            CommandMetadata::Query { .. } => None,
        }
    }

    /// JSON value handed across the host boundary
    pub fn to_json(&self) -> Result<serde_json::Value> {
        Ok(serde_json::to_value(self)?)
    }
}

/// First rows of a table, without command metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SampleData {
    pub data: Vec<Vec<CellValue>>,
    pub columns: Vec<String>,
    pub sample_size: usize,
}

impl From<NormalizedTable> for SampleData {
    fn from(table: NormalizedTable) -> Self {
        Self {
            sample_size: table.row_count,
            data: table.data,
            columns: table.columns,
        }
    }
}
