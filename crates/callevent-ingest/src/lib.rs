//! Call event ingestion
//!
//! Loads call-event CSV files from an inbound directory into PostgreSQL.
//!
//! # Pipeline
//!
//! - [`guard`]: marker file so only one run is active at a time
//! - [`scanner`]: recursive discovery of `.csv` files
//! - [`reader`]: raw CSV rows
//! - [`validation`]: per-record checks producing a [`ValidatedBatch`]
//! - [`store`]: schema setup and bulk inserts
//! - [`orchestrator`]: ties the above together and moves stored files to the
//!   processed directory
//!
//! # Example
//!
//! ```no_run
//! use callevent_ingest::{BatchOrchestrator, ParserConfig, PgCallEventStore, StoreConfig};
//! use std::path::Path;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let store = PgCallEventStore::new(&StoreConfig::new(
//!         "calls", "secret", "localhost", 5432, "calls", "call_events",
//!     ))?;
//!     let config = ParserConfig::new("./processed", "./inbound", "/tmp/callevent.lock");
//!
//!     let report = BatchOrchestrator::new(store, &config)
//!         .run(Path::new("./inbound"))
//!         .await?;
//!     println!("{} files processed", report.processed_count());
//!     Ok(())
//! }
//! ```

#![deny(clippy::unwrap_used, clippy::expect_used)]

pub mod config;
pub mod error;
pub mod guard;
pub mod orchestrator;
pub mod reader;
pub mod scanner;
pub mod store;
pub mod validation;

pub use config::{IngestConfig, ParserConfig};
pub use error::{FileError, IngestError, Result};
pub use guard::RunGuard;
pub use orchestrator::{BatchOrchestrator, FileReport, FileStatus, RunReport};
pub use store::{CallEventStore, PgCallEventStore, StoreConfig, StoreError};
pub use validation::{validate, RecordError, Rejection, ValidatedBatch};
