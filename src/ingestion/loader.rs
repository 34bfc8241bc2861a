//! CSV loader - materializes CSV text into a DuckDB table
//!
//! Loading is destructive: the target table is dropped and recreated from the
//! staged file every time, with column types left to `read_csv_auto`.

use crate::db::{lock_session, quote_identifier, quote_literal, SharedConnection};
use crate::error::{AnalyzerError, Result};
use crate::execution::normalize::normalize_raw;
use crate::execution::result::SampleData;
use crate::ingestion::staging::StagingArea;
use std::path::Path;
use tracing::{debug, info};

pub struct DataLoader {
    db: SharedConnection,
    staging: StagingArea,
}

impl DataLoader {
    pub fn new(db: SharedConnection, staging_dir: impl AsRef<Path>) -> Self {
        Self {
            db,
            staging: StagingArea::new(staging_dir),
        }
    }

    pub fn staging_path(&self) -> &Path {
        self.staging.path()
    }

    /// Load `content` into the session's default table and return its row count.
    pub fn load_csv(&self, content: &str) -> Result<u64> {
        let table_name = lock_session(&self.db).table_name().to_string();
        self.load_csv_into(content, &table_name)
    }

    /// Replace `table_name` with the rows of `content` and return the new row count.
    pub fn load_csv_into(&self, content: &str, table_name: &str) -> Result<u64> {
        if content.trim().is_empty() {
            return Err(AnalyzerError::ingestion("CSV content is empty", "no header row to infer columns from"));
        }

        let mut db = lock_session(&self.db);
        db.connect()?;

        let staged = self.staging.write(content).map_err(|e| {
            AnalyzerError::ingestion(format!("failed to stage CSV at {}", self.staging.path().display()), e)
        })?;

        let table = quote_identifier(table_name);

        // IF EXISTS covers the missing-table case, so any error here is real
        db.execute_statement(&format!("DROP TABLE IF EXISTS {}", table))
            .map_err(|e| ingestion_failure(format!("failed to drop table '{}'", table_name), e))?;

        let create = format!(
            "CREATE TABLE {} AS SELECT * FROM read_csv_auto({})",
            table,
            quote_literal(&staged.to_string_lossy())
        );
        db.execute_statement(&create)
            .map_err(|e| ingestion_failure(format!("failed to create table '{}' from CSV", table_name), e))?;

        let row_count = db
            .count_rows(table_name)
            .map_err(|e| ingestion_failure(format!("failed to count rows of '{}'", table_name), e))?;

        info!(table = table_name, rows = row_count, "CSV loaded");
        Ok(row_count)
    }

    /// Up to `limit` rows of `table_name`, normalized.
    pub fn sample_data(&self, table_name: &str, limit: usize) -> Result<SampleData> {
        let db = lock_session(&self.db);
        let sql = format!("SELECT * FROM {} LIMIT {}", quote_identifier(table_name), limit);

        let raw = db.execute_query(&sql)?.fetch_all()?;
        let sample = SampleData::from(normalize_raw(raw));

        debug!(table = table_name, sample_size = sample.sample_size, "Sample fetched");
        Ok(sample)
    }
}

/// Re-label an engine failure as an ingestion failure, keeping the engine error
/// as the cause. Session-level errors pass through untouched.
fn ingestion_failure(context: String, err: AnalyzerError) -> AnalyzerError {
    match err {
        AnalyzerError::QueryExecution { source, .. } => AnalyzerError::ingestion(context, source),
        other => other,
    }
}
