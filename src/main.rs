use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use csv_analyzer::{AnalyzerConfig, AnalyzerHost};
use serde::Serialize;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "csv-analyzer")]
#[command(about = "Load a CSV file into an in-memory DuckDB table and analyze it")]
struct Args {
    /// Path to the CSV file to load
    csv: PathBuf,

    /// Table name to load into (overrides CSV_ANALYZER_TABLE)
    #[arg(short, long)]
    table: Option<String>,

    /// Print compact JSON instead of pretty-printed
    #[arg(long)]
    compact: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Column names and engine types
    Describe,
    /// Per-column statistics
    Summarize,
    /// Run an arbitrary SQL statement against the session
    Query {
        sql: String,
    },
    /// First rows of the loaded table
    Sample {
        #[arg(short, long)]
        limit: Option<usize>,
    },
    /// Row count and column types of the loaded table
    Info,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let mut config = AnalyzerConfig::from_env()?;
    if let Some(table) = args.table {
        config = config.with_table_name(table);
    }

    let content = std::fs::read_to_string(&args.csv)
        .with_context(|| format!("failed to read {}", args.csv.display()))?;

    let mut host = AnalyzerHost::new(config);
    host.initialize()?;

    let rows = host.load_csv(&content)?;
    info!("Loaded {} rows from {}", rows, args.csv.display());

    match args.command {
        Command::Describe => print_json(&host.describe_data()?, args.compact)?,
        Command::Summarize => print_json(&host.summarize_data()?, args.compact)?,
        Command::Query { sql } => print_json(&host.custom_query(&sql)?, args.compact)?,
        Command::Sample { limit } => print_json(&host.sample_data(limit)?, args.compact)?,
        Command::Info => print_json(&host.table_info()?, args.compact)?,
    }

    host.shutdown();
    Ok(())
}

fn print_json<T: Serialize>(value: &T, compact: bool) -> Result<()> {
    let json = if compact {
        serde_json::to_string(value)?
    } else {
        serde_json::to_string_pretty(value)?
    };
    println!("{}", json);
    Ok(())
}
