//! Database module for the embedded DuckDB session
//!
//! This module owns the single in-memory connection and the table metadata derived from it

pub mod connection;
pub mod table_info;

pub use connection::{lock_session, quote_identifier, quote_literal, ConnectionManager, QueryCursor, RawResultSet, SharedConnection};
pub use table_info::{ColumnDescriptor, ColumnKind, TableInfo, TableSummary};
