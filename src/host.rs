//! Host boundary
//!
//! The surface a host runtime calls into. [`AnalyzerHost`] is an explicit
//! context object: the host builds one, calls [`AnalyzerHost::initialize`], and
//! every later call goes through it. Separate hosts are fully isolated sessions.

use crate::config::AnalyzerConfig;
use crate::db::{lock_session, ConnectionManager, SharedConnection, TableInfo};
use crate::error::{AnalyzerError, Result};
use crate::execution::{DataAnalyzer, ResultPayload, SampleData};
use crate::ingestion::DataLoader;
use tracing::info;

/// Session-bound handles created by [`AnalyzerHost::initialize`]
pub struct Components {
    pub db: SharedConnection,
    pub analyzer: DataAnalyzer,
    pub loader: DataLoader,
}

impl Components {
    fn build(config: &AnalyzerConfig) -> Result<Self> {
        let mut manager = ConnectionManager::new(config.table_name.clone());
        manager.connect()?;

        let db = manager.shared();
        Ok(Self {
            analyzer: DataAnalyzer::new(db.clone()),
            loader: DataLoader::new(db.clone(), &config.staging_dir),
            db,
        })
    }
}

pub struct AnalyzerHost {
    config: AnalyzerConfig,
    components: Option<Components>,
}

impl AnalyzerHost {
    pub fn new(config: AnalyzerConfig) -> Self {
        Self {
            config,
            components: None,
        }
    }

    pub fn from_env() -> Result<Self> {
        Ok(Self::new(AnalyzerConfig::from_env()?))
    }

    pub fn config(&self) -> &AnalyzerConfig {
        &self.config
    }

    pub fn is_initialized(&self) -> bool {
        self.components.is_some()
    }

    /// Wire the session components and open the connection.
    ///
    /// Calling this again on an initialized host returns the existing components;
    /// use [`AnalyzerHost::shutdown`] first to start a fresh session.
    pub fn initialize(&mut self) -> Result<&Components> {
        if self.components.is_none() {
            self.config.validate()?;
            info!(version = env!("CARGO_PKG_VERSION"), "Initializing CSV analyzer");
            self.components = Some(Components::build(&self.config)?);
            info!(table = %self.config.table_name, "CSV analyzer ready");
        }
        self.components()
    }

    pub fn components(&self) -> Result<&Components> {
        self.components.as_ref().ok_or(AnalyzerError::NotInitialized)
    }

    /// Load CSV text into the configured table and return the row count.
    pub fn load_csv(&self, csv_text: &str) -> Result<u64> {
        self.components()?.loader.load_csv(csv_text)
    }

    pub fn describe_data(&self) -> Result<ResultPayload> {
        self.components()?.analyzer.describe(&self.config.table_name)
    }

    pub fn summarize_data(&self) -> Result<ResultPayload> {
        self.components()?.analyzer.summarize(&self.config.table_name)
    }

    pub fn custom_query(&self, sql: &str) -> Result<ResultPayload> {
        self.components()?.analyzer.custom_query(sql)
    }

    /// First rows of the configured table; `None` uses the configured sample limit.
    pub fn sample_data(&self, limit: Option<usize>) -> Result<SampleData> {
        let limit = limit.unwrap_or(self.config.sample_limit);
        self.components()?.loader.sample_data(&self.config.table_name, limit)
    }

    pub fn table_info(&self) -> Result<TableInfo> {
        lock_session(&self.components()?.db).table_info()
    }

    /// Close the connection and drop all components. The host can be initialized again.
    pub fn shutdown(&mut self) {
        if let Some(components) = self.components.take() {
            lock_session(&components.db).disconnect();
            info!("CSV analyzer shut down");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operations_require_initialize() {
        let host = AnalyzerHost::new(AnalyzerConfig::default());

        assert!(matches!(host.load_csv("a\n1\n"), Err(AnalyzerError::NotInitialized)));
        assert!(matches!(host.describe_data(), Err(AnalyzerError::NotInitialized)));
        assert!(matches!(host.summarize_data(), Err(AnalyzerError::NotInitialized)));
        assert!(matches!(host.custom_query("SELECT 1"), Err(AnalyzerError::NotInitialized)));
        assert!(matches!(host.table_info(), Err(AnalyzerError::NotInitialized)));
    }

    #[test]
    fn test_initialize_opens_connection_eagerly() {
        let mut host = AnalyzerHost::new(AnalyzerConfig::default());
        let components = host.initialize().unwrap();
        assert!(lock_session(&components.db).is_connected());
        assert!(host.is_initialized());
    }

    #[test]
    fn test_initialize_rejects_invalid_config() {
        let mut host = AnalyzerHost::new(AnalyzerConfig::default().with_table_name(""));
        assert!(matches!(host.initialize(), Err(AnalyzerError::Config(_))));
        assert!(!host.is_initialized());
    }

    #[test]
    fn test_shutdown_returns_to_uninitialized() {
        let mut host = AnalyzerHost::new(AnalyzerConfig::default());
        host.initialize().unwrap();
        host.load_csv("id,score\n1,2.5\n").unwrap();

        host.shutdown();
        assert!(matches!(host.describe_data(), Err(AnalyzerError::NotInitialized)));

        // A fresh session has no table
        host.initialize().unwrap();
        assert!(matches!(host.describe_data(), Err(AnalyzerError::TableNotFound { .. })));
    }

    #[test]
    fn test_sample_uses_configured_limit() {
        let mut config = AnalyzerConfig::default();
        config.sample_limit = 2;
        let mut host = AnalyzerHost::new(config);
        host.initialize().unwrap();
        host.load_csv("n,sq\n1,1\n2,4\n3,9\n").unwrap();

        assert_eq!(host.sample_data(None).unwrap().sample_size, 2);
        assert_eq!(host.sample_data(Some(10)).unwrap().sample_size, 3);
    }
}
