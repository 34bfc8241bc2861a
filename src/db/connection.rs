//! DuckDB connection management
//!
//! One lazily opened in-memory connection per session. Every query goes through
//! [`ConnectionManager::execute_query`], which refuses to run before `connect()`.

use crate::db::table_info::{ColumnDescriptor, TableInfo};
use crate::error::{AnalyzerError, Result};
use crate::execution::normalize::normalize_raw;
use crate::execution::result::CellValue;
use duckdb::arrow::record_batch::RecordBatch;
use duckdb::{Connection, Statement};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, info, warn};

/// Session handle shared by the ingestor and the analyzer
pub type SharedConnection = Arc<Mutex<ConnectionManager>>;

/// Lock the shared session for the duration of one operation.
///
/// A panic in another holder leaves the connection itself intact, so a poisoned
/// lock is recovered instead of propagated.
pub fn lock_session(db: &SharedConnection) -> MutexGuard<'_, ConnectionManager> {
    db.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Quote a SQL identifier, doubling embedded double quotes.
pub fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Quote a SQL string literal, doubling embedded single quotes.
pub fn quote_literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

/// Owner of the single DuckDB connection
pub struct ConnectionManager {
    conn: Option<Connection>,
    table_name: String,
}

impl ConnectionManager {
    /// Create a manager for the given default table. No connection is opened yet.
    pub fn new(table_name: impl Into<String>) -> Self {
        Self {
            conn: None,
            table_name: table_name.into(),
        }
    }

    pub fn shared(self) -> SharedConnection {
        Arc::new(Mutex::new(self))
    }

    /// Default table this session analyzes
    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    pub fn is_connected(&self) -> bool {
        self.conn.is_some()
    }

    /// Open the in-memory connection if needed and return it. Repeated calls reuse it.
    pub fn connect(&mut self) -> Result<&Connection> {
        if self.conn.is_none() {
            let conn = Connection::open_in_memory().map_err(AnalyzerError::Connection)?;
            info!("DuckDB in-memory connection opened");
            self.conn = Some(conn);
        }
        self.connection()
    }

    /// Close the connection if one is open.
    pub fn disconnect(&mut self) {
        if let Some(conn) = self.conn.take() {
            if let Err((_, e)) = conn.close() {
                warn!(error = %e, "DuckDB connection did not close cleanly; dropping it");
            }
            info!("DuckDB connection closed");
        }
    }

    fn connection(&self) -> Result<&Connection> {
        self.conn.as_ref().ok_or(AnalyzerError::NotConnected)
    }

    /// Prepare `sql` against the live connection.
    ///
    /// DuckDB binds at prepare time, so unknown tables and syntax errors surface
    /// here. Rows are only produced when the returned cursor is fetched.
    pub fn execute_query(&self, sql: &str) -> Result<QueryCursor<'_>> {
        let conn = self.connection()?;
        debug!(sql, "Preparing query");
        let statement = conn.prepare(sql).map_err(|e| AnalyzerError::query(sql, e))?;
        Ok(QueryCursor {
            statement,
            sql: sql.to_string(),
        })
    }

    /// Run a statement that produces no result set (DDL).
    pub fn execute_statement(&self, sql: &str) -> Result<()> {
        let conn = self.connection()?;
        debug!(sql, "Executing statement");
        conn.execute_batch(sql).map_err(|e| AnalyzerError::query(sql, e))
    }

    /// Whether `table_name` is a base table in the current schema.
    ///
    /// Any failure, including a missing connection, reads as "does not exist".
    pub fn table_exists(&self, table_name: &str) -> bool {
        if !self.is_connected() {
            debug!(table = table_name, "No connection; table treated as missing");
            return false;
        }

        let sql = format!(
            "SELECT count(*) FROM information_schema.tables \
             WHERE lower(table_name) = lower({}) \
             AND table_schema = current_schema() \
             AND table_type = 'BASE TABLE'",
            quote_literal(table_name)
        );
        match self.execute_query(&sql).and_then(QueryCursor::fetch_count) {
            Ok(count) => count > 0,
            Err(e) => {
                warn!(table = table_name, error = %e, "Table existence check failed; treating as missing");
                false
            }
        }
    }

    pub fn count_rows(&self, table_name: &str) -> Result<u64> {
        let sql = format!("SELECT count(*) FROM {}", quote_identifier(table_name));
        self.execute_query(&sql)?.fetch_count()
    }

    /// Row count and column schema of the default table.
    pub fn table_info(&self) -> Result<TableInfo> {
        self.table_info_for(&self.table_name)
    }

    /// Row count and column schema of `table_name`, read fresh from the engine.
    pub fn table_info_for(&self, table_name: &str) -> Result<TableInfo> {
        let row_count = self.count_rows(table_name)?;

        let describe = normalize_raw(
            self.execute_query(&format!("DESCRIBE {}", quote_identifier(table_name)))?
                .fetch_all()?,
        );

        let columns: Vec<ColumnDescriptor> = describe
            .data
            .iter()
            .map(|row| ColumnDescriptor::new(text_at(row, 0), text_at(row, 1)))
            .collect();

        debug!(
            table = table_name,
            row_count,
            columns = ?columns.iter().map(|c| c.name.as_str()).collect::<Vec<_>>(),
            "Table info"
        );

        Ok(TableInfo {
            table_name: table_name.to_string(),
            row_count,
            columns,
        })
    }
}

impl Drop for ConnectionManager {
    fn drop(&mut self) {
        self.disconnect();
    }
}

fn text_at(row: &[CellValue], idx: usize) -> String {
    row.get(idx).map(CellValue::to_string).unwrap_or_default()
}

/// Engine result batches and column names, before normalization
#[derive(Debug, Clone)]
pub struct RawResultSet {
    pub columns: Vec<String>,
    pub batches: Vec<RecordBatch>,
}

impl RawResultSet {
    pub fn row_count(&self) -> usize {
        self.batches.iter().map(RecordBatch::num_rows).sum()
    }
}

/// A prepared statement waiting to be fetched
pub struct QueryCursor<'conn> {
    statement: Statement<'conn>,
    sql: String,
}

impl QueryCursor<'_> {
    pub fn sql(&self) -> &str {
        &self.sql
    }

    /// Execute and materialize every result batch together with the column names.
    ///
    /// Rows stay in Arrow form: converting through the row API would route
    /// DECIMAL cells through `rust_decimal`, which cannot hold scales above 28.
    pub fn fetch_all(self) -> Result<RawResultSet> {
        let QueryCursor { mut statement, sql } = self;
        let batches: Vec<RecordBatch> = statement
            .query_arrow([])
            .map_err(|e| AnalyzerError::query(&sql, e))?
            .collect();
        let columns = statement.column_names();

        Ok(RawResultSet { columns, batches })
    }

    /// Execute a `count(*)`-style query and return its single value.
    pub fn fetch_count(self) -> Result<u64> {
        let QueryCursor { mut statement, sql } = self;
        let count: i64 = statement
            .query_row([], |row| row.get(0))
            .map_err(|e| AnalyzerError::query(&sql, e))?;
        Ok(u64::try_from(count).unwrap_or_default())
    }
}
