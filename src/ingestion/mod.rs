//! Ingestion Module
//!
//! Turns host-supplied CSV text into a queryable DuckDB table:
//! - Staging the text where the engine's CSV reader can see it
//! - Replacing any previous table of the same name
//! - Letting the engine infer column types

pub mod loader;
pub mod staging;

pub use loader::DataLoader;
pub use staging::StagingArea;
