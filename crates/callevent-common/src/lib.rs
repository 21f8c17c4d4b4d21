//! Call Event Common Library
//!
//! Shared pieces of the call event ingestion workspace.
//!
//! - **Logging**: `tracing` subscriber setup driven by [`logging::LogConfig`]
//! - **Types**: the call event record and the layout of inbound CSV files
//!
//! # Example
//!
//! ```no_run
//! use callevent_common::logging::{init_logging, LogConfig};
//!
//! fn main() -> anyhow::Result<()> {
//!     let _guard = init_logging(&LogConfig::from_env()?)?;
//!     tracing::info!("ready");
//!     Ok(())
//! }
//! ```

#![deny(clippy::unwrap_used, clippy::expect_used)]

pub mod logging;
pub mod types;

pub use types::CallEvent;
