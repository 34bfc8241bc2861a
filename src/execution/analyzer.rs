//! Analysis orchestration
//!
//! Runs DESCRIBE / SUMMARIZE against an ingested table, or an arbitrary SQL
//! query, and turns the engine's answer into a [`ResultPayload`].

use crate::db::{lock_session, quote_identifier, ConnectionManager, SharedConnection};
use crate::error::{AnalyzerError, Result};
use crate::execution::normalize::normalize_raw;
use crate::execution::result::{AnalysisCommand, CommandMetadata, ResultPayload};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Whether a table is ready to be analyzed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TableState {
    NoTable,
    TableReady,
}

/// Issues analysis commands over the shared session
pub struct DataAnalyzer {
    db: SharedConnection,
}

impl DataAnalyzer {
    pub fn new(db: SharedConnection) -> Self {
        Self { db }
    }

    /// Default table of the underlying session
    pub fn default_table(&self) -> String {
        lock_session(&self.db).table_name().to_string()
    }

    pub fn table_state(&self, table_name: &str) -> TableState {
        if lock_session(&self.db).table_exists(table_name) {
            TableState::TableReady
        } else {
            TableState::NoTable
        }
    }

    pub fn describe(&self, table_name: &str) -> Result<ResultPayload> {
        self.run_analysis_command(AnalysisCommand::Describe, table_name)
    }

    pub fn summarize(&self, table_name: &str) -> Result<ResultPayload> {
        self.run_analysis_command(AnalysisCommand::Summarize, table_name)
    }

    /// Run `sql` verbatim. No existence check and no sanitizing: the engine
    /// decides whether the query is valid.
    pub fn custom_query(&self, sql: &str) -> Result<ResultPayload> {
        let db = lock_session(&self.db);
        info!("Executing custom query");
        debug!(sql, "Custom query text");

        let raw = db.execute_query(sql)?.fetch_all()?;
        let table = normalize_raw(raw);

        debug!(rows = table.row_count, columns = table.column_count, "Custom query finished");

        Ok(ResultPayload::new(
            table,
            CommandMetadata::Query {
                query: sql.to_string(),
            },
        ))
    }

    fn run_analysis_command(&self, command: AnalysisCommand, table_name: &str) -> Result<ResultPayload> {
        let db = lock_session(&self.db);
        ensure_table(&db, table_name)?;

        // Fetched per call so a replaced table never reports a stale count
        let source_table_rows = db.table_info_for(table_name)?.row_count;

        let sql = format!("{} {}", command.keyword(), quote_identifier(table_name));
        info!(command = %command, table = table_name, "Running analysis command");

        let raw = db.execute_query(&sql)?.fetch_all()?;
        debug!(rows = raw.row_count(), columns = ?raw.columns, "Engine returned");

        let table = normalize_raw(raw);
        if let Some(first) = table.data.first() {
            debug!(row = ?first, "First result row");
        }
        info!(
            command = %command,
            table = table_name,
            rows = table.row_count,
            "Analysis complete"
        );

        Ok(ResultPayload::new(
            table,
            CommandMetadata::Analysis {
                command,
                table_name: table_name.to_string(),
                source_table_rows,
            },
        ))
    }
}

fn ensure_table(db: &ConnectionManager, table_name: &str) -> Result<()> {
    if db.table_exists(table_name) {
        Ok(())
    } else {
        Err(AnalyzerError::TableNotFound {
            table: table_name.to_string(),
        })
    }
}
