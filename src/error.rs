use thiserror::Error;

#[derive(Error, Debug)]
pub enum AnalyzerError {
    #[error("Not connected: call connect() before running queries")]
    NotConnected,

    #[error("Not initialized: call initialize() first")]
    NotInitialized,

    #[error("Table '{table}' does not exist")]
    TableNotFound { table: String },

    #[error("Ingestion error: {context}")]
    Ingestion {
        context: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("Query execution error: {sql}")]
    QueryExecution {
        sql: String,
        #[source]
        source: duckdb::Error,
    },

    #[error("Connection error: {0}")]
    Connection(#[source] duckdb::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl AnalyzerError {
    pub(crate) fn ingestion<E>(context: impl Into<String>, source: E) -> Self
    where
        E: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        Self::Ingestion {
            context: context.into(),
            source: source.into(),
        }
    }

    pub(crate) fn query(sql: &str, source: duckdb::Error) -> Self {
        Self::QueryExecution {
            sql: sql.to_string(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, AnalyzerError>;
