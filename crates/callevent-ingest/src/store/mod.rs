//! Persistence for validated call events
//!
//! The orchestrator only talks to [`CallEventStore`]. [`PgCallEventStore`] is
//! the production implementation; tests substitute an in-memory store.

pub mod postgres;

pub use postgres::{PgCallEventStore, StoreConfig};

use crate::validation::ValidatedBatch;
use async_trait::async_trait;
use thiserror::Error;

/// Store operation errors
#[derive(Error, Debug)]
pub enum StoreError {
    /// SQL query or connection error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Destination table name is not a plain identifier
    #[error("Invalid table name '{0}'. Use letters, digits and underscores, optionally schema-qualified.")]
    InvalidTableName(String),
}

/// Destination for accepted call events
#[async_trait]
pub trait CallEventStore: Send + Sync {
    /// Ensure the destination schema exists
    ///
    /// Called once per run. Must succeed when the schema is already present.
    async fn prepare(&self) -> Result<(), StoreError>;

    /// Persist the accepted events of one batch
    ///
    /// All-or-nothing per batch. A batch without accepted events is a no-op
    /// that succeeds.
    async fn create(&self, batch: &ValidatedBatch) -> Result<(), StoreError>;
}
