//! Call event ingestion CLI

use anyhow::{Context, Result};
use callevent_common::logging::{init_logging, LogConfig, LogLevel};
use callevent_ingest::config::parse_port;
use callevent_ingest::{
    BatchOrchestrator, IngestConfig, ParserConfig, PgCallEventStore, RunReport, StoreConfig,
};
use clap::Parser;
use std::process::ExitCode;
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(name = "callevent-ingest")]
#[command(author, version, about = "Load call event CSV files into PostgreSQL")]
struct Cli {
    /// Database user
    db_user: String,

    /// Database password
    db_password: String,

    /// Database host
    db_host: String,

    /// Database port
    db_port: String,

    /// Database name
    database: String,

    /// Destination table
    table: String,

    /// Directory stored files are moved to
    processed_dir: String,

    /// Directory scanned for CSV files
    inbound_dir: String,

    /// Marker file held while a run is active
    lock_file: String,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    dotenvy::dotenv().ok();

    let log_level = if cli.verbose {
        LogLevel::Debug
    } else {
        LogLevel::Info
    };

    // Environment variables take precedence over the flag
    let log_config = LogConfig::builder()
        .level(log_level)
        .log_file_prefix("callevent-ingest")
        .build()
        .merge_env();

    let _log_guard = match log_config.and_then(|config| init_logging(&config)) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Failed to initialize logging: {:#}", e);
            return ExitCode::FAILURE;
        },
    };

    match run(cli).await {
        Ok(report) => {
            if report.failed_count() > 0 {
                info!(
                    failed = report.failed_count(),
                    "Some files were left in the inbound directory"
                );
            }
            ExitCode::SUCCESS
        },
        Err(e) => {
            error!("{:#}", e);
            ExitCode::FAILURE
        },
    }
}

async fn run(cli: Cli) -> Result<RunReport> {
    let store = StoreConfig::new(
        cli.db_user,
        cli.db_password,
        cli.db_host,
        parse_port(&cli.db_port)?,
        cli.database,
        cli.table,
    );
    let parser = ParserConfig::new(cli.processed_dir, cli.inbound_dir, cli.lock_file);
    let config = IngestConfig::load(store, parser)?;

    let store = PgCallEventStore::new(&config.store).context("Failed to create store")?;
    let orchestrator = BatchOrchestrator::new(store, &config.parser);

    let report = orchestrator.run(&config.parser.inbound_dir).await?;
    Ok(report)
}
