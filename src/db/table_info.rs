//! Table metadata derived from the engine
//!
//! Row counts and column schemas are always read back from DuckDB on demand and
//! never cached here, so they cannot go stale after a re-ingestion.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Semantic kind of a column as exposed to the host UI
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnKind {
    String,
    Number,
    Date,
    Boolean,
}

const TEXT_TYPES: &[&str] = &["VARCHAR", "TEXT", "CHAR", "STRING"];
const NUMERIC_TYPES: &[&str] = &[
    "TINYINT", "SMALLINT", "INTEGER", "BIGINT", "HUGEINT", "DOUBLE", "FLOAT", "REAL", "DECIMAL", "NUMERIC",
];
const DATE_TYPES: &[&str] = &["DATE", "TIMESTAMP"];
const BOOLEAN_TYPES: &[&str] = &["BOOLEAN", "BOOL"];

impl ColumnKind {
    /// Map a raw DuckDB type name onto a semantic kind.
    ///
    /// The mapping is total: anything unrecognized is a string. Text types are
    /// checked first so nested types carrying a VARCHAR member stay textual.
    pub fn from_engine_type(raw_type: &str) -> Self {
        let upper = raw_type.to_uppercase();
        let matches_any = |candidates: &[&str]| candidates.iter().any(|c| upper.contains(c));

        if matches_any(TEXT_TYPES) {
            ColumnKind::String
        } else if matches_any(NUMERIC_TYPES) {
            ColumnKind::Number
        } else if matches_any(DATE_TYPES) {
            ColumnKind::Date
        } else if matches_any(BOOLEAN_TYPES) {
            ColumnKind::Boolean
        } else {
            ColumnKind::String
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ColumnKind::String => "string",
            ColumnKind::Number => "number",
            ColumnKind::Date => "date",
            ColumnKind::Boolean => "boolean",
        }
    }

    fn title(&self) -> &'static str {
        match self {
            ColumnKind::String => "String",
            ColumnKind::Number => "Number",
            ColumnKind::Date => "Date",
            ColumnKind::Boolean => "Boolean",
        }
    }
}

impl fmt::Display for ColumnKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Caller-facing view of one table column
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDescriptor {
    pub name: String,

    #[serde(rename = "type")]
    pub kind: ColumnKind,

    /// Type name exactly as DuckDB reports it (e.g. "BIGINT", "DECIMAL(9,2)")
    pub raw_type: String,

    pub description: String,
}

impl ColumnDescriptor {
    pub fn new(name: impl Into<String>, raw_type: impl Into<String>) -> Self {
        let name = name.into();
        let raw_type = raw_type.into();
        let kind = ColumnKind::from_engine_type(&raw_type);
        let description = format!("{} column '{}'", kind.title(), name);

        Self {
            name,
            kind,
            raw_type,
            description,
        }
    }
}

/// Row count and schema of a table at the moment it was queried
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableInfo {
    pub table_name: String,
    pub row_count: u64,
    pub columns: Vec<ColumnDescriptor>,
}

impl TableInfo {
    pub fn column_names(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name.clone()).collect()
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn summary(&self) -> TableSummary {
        TableSummary::new(self.row_count, self.column_names())
    }
}

/// Compact, display-ready description of a table's dimensions
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableSummary {
    pub row_count: u64,
    pub column_count: usize,
    pub column_names: Vec<String>,
    pub summary: String,
}

impl TableSummary {
    pub fn new(row_count: u64, column_names: Vec<String>) -> Self {
        let column_count = column_names.len();
        Self {
            row_count,
            column_count,
            summary: format!("{} rows × {} columns", row_count, column_count),
            column_names,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_engine_type_mapping() {
        assert_eq!(ColumnKind::from_engine_type("VARCHAR"), ColumnKind::String);
        assert_eq!(ColumnKind::from_engine_type("BIGINT"), ColumnKind::Number);
        assert_eq!(ColumnKind::from_engine_type("INTEGER"), ColumnKind::Number);
        assert_eq!(ColumnKind::from_engine_type("DOUBLE"), ColumnKind::Number);
        assert_eq!(ColumnKind::from_engine_type("DECIMAL(9,2)"), ColumnKind::Number);
        assert_eq!(ColumnKind::from_engine_type("DATE"), ColumnKind::Date);
        assert_eq!(ColumnKind::from_engine_type("TIMESTAMP WITH TIME ZONE"), ColumnKind::Date);
        assert_eq!(ColumnKind::from_engine_type("BOOLEAN"), ColumnKind::Boolean);
    }

    #[test]
    fn test_unmapped_types_fall_back_to_string() {
        assert_eq!(ColumnKind::from_engine_type("INTERVAL"), ColumnKind::String);
        assert_eq!(ColumnKind::from_engine_type("TIME"), ColumnKind::String);
        assert_eq!(ColumnKind::from_engine_type("BLOB"), ColumnKind::String);
        assert_eq!(ColumnKind::from_engine_type("UUID"), ColumnKind::String);
        assert_eq!(ColumnKind::from_engine_type(""), ColumnKind::String);
        assert_eq!(ColumnKind::from_engine_type("STRUCT(a INTEGER, b VARCHAR)"), ColumnKind::String);
    }

    #[test]
    fn test_descriptor_and_summary() {
        let descriptor = ColumnDescriptor::new("amount", "DOUBLE");
        assert_eq!(descriptor.kind, ColumnKind::Number);
        assert_eq!(descriptor.raw_type, "DOUBLE");
        assert_eq!(descriptor.description, "Number column 'amount'");

        let json = serde_json::to_value(&descriptor).unwrap();
        assert_eq!(json["type"], "number");

        let info = TableInfo {
            table_name: "csv_data".to_string(),
            row_count: 3,
            columns: vec![descriptor, ColumnDescriptor::new("label", "VARCHAR")],
        };
        let summary = info.summary();
        assert_eq!(summary.column_count, 2);
        assert_eq!(summary.column_names, vec!["amount", "label"]);
        assert_eq!(summary.summary, "3 rows × 2 columns");
    }
}
