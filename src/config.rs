//! Analyzer configuration
//!
//! Defaults match the single-dataset setup: one table called `csv_data`, staged
//! through the system temp directory, five-row samples. Every value can be
//! overridden through the environment (or a `.env` file).

use crate::error::{AnalyzerError, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub const DEFAULT_TABLE_NAME: &str = "csv_data";
pub const DEFAULT_SAMPLE_LIMIT: usize = 5;

const ENV_TABLE: &str = "CSV_ANALYZER_TABLE";
const ENV_STAGING_DIR: &str = "CSV_ANALYZER_STAGING_DIR";
const ENV_SAMPLE_LIMIT: &str = "CSV_ANALYZER_SAMPLE_LIMIT";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalyzerConfig {
    /// Table the CSV text is materialized into
    pub table_name: String,

    /// Directory holding the staged CSV file handed to the engine's reader
    pub staging_dir: PathBuf,

    /// Default row limit for sample queries
    pub sample_limit: usize,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            table_name: DEFAULT_TABLE_NAME.to_string(),
            staging_dir: std::env::temp_dir(),
            sample_limit: DEFAULT_SAMPLE_LIMIT,
        }
    }
}

impl AnalyzerConfig {
    /// Load configuration from the process environment, reading `.env` first if present.
    pub fn from_env() -> Result<Self> {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(table_name) = lookup(ENV_TABLE) {
            config.table_name = table_name;
        }

        if let Some(dir) = lookup(ENV_STAGING_DIR) {
            config.staging_dir = PathBuf::from(dir);
        }

        if let Some(limit) = lookup(ENV_SAMPLE_LIMIT) {
            config.sample_limit = limit.trim().parse().map_err(|_| {
                AnalyzerError::Config(format!("{} must be a non-negative integer, got '{}'", ENV_SAMPLE_LIMIT, limit))
            })?;
        }

        config.validate()?;
        Ok(config)
    }

    pub fn with_table_name(mut self, table_name: impl Into<String>) -> Self {
        self.table_name = table_name.into();
        self
    }

    pub fn with_staging_dir(mut self, staging_dir: impl Into<PathBuf>) -> Self {
        self.staging_dir = staging_dir.into();
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.table_name.trim().is_empty() {
            return Err(AnalyzerError::Config("table name must not be empty".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_when_environment_is_empty() {
        let config = AnalyzerConfig::from_lookup(|_| None).unwrap();
        assert_eq!(config, AnalyzerConfig::default());
        assert_eq!(config.table_name, "csv_data");
        assert_eq!(config.sample_limit, 5);
    }

    #[test]
    fn test_overrides_from_environment() {
        let config = AnalyzerConfig::from_lookup(lookup_from(&[
            ("CSV_ANALYZER_TABLE", "sales"),
            ("CSV_ANALYZER_STAGING_DIR", "/var/tmp/analyzer"),
            ("CSV_ANALYZER_SAMPLE_LIMIT", " 12 "),
        ]))
        .unwrap();

        assert_eq!(config.table_name, "sales");
        assert_eq!(config.staging_dir, PathBuf::from("/var/tmp/analyzer"));
        assert_eq!(config.sample_limit, 12);
    }

    #[test]
    fn test_rejects_bad_values() {
        let err = AnalyzerConfig::from_lookup(lookup_from(&[("CSV_ANALYZER_SAMPLE_LIMIT", "many")]))
            .unwrap_err();
        assert!(matches!(err, AnalyzerError::Config(_)));

        let err = AnalyzerConfig::from_lookup(lookup_from(&[("CSV_ANALYZER_TABLE", "  ")])).unwrap_err();
        assert!(matches!(err, AnalyzerError::Config(_)));
    }
}
