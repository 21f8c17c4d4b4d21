//! PostgreSQL call event store

use super::{CallEventStore, StoreError};
use crate::validation::ValidatedBatch;
use async_trait::async_trait;
use sqlx::postgres::{PgConnectOptions, PgPool, PgPoolOptions};
use sqlx::{Postgres, QueryBuilder};
use std::time::Duration;
use tracing::{debug, info};

pub const DEFAULT_MAX_CONNECTIONS: u32 = 5;
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 30;

/// Rows per INSERT statement. Five binds per row keeps this well under the
/// 65535 bind parameter limit.
pub const DEFAULT_INSERT_CHUNK_SIZE: usize = 1000;

/// Connection and destination settings for [`PgCallEventStore`]
#[derive(Clone)]
pub struct StoreConfig {
    pub user: String,
    pub password: String,
    pub host: String,
    pub port: u16,
    pub database: String,
    pub table: String,
    pub max_connections: u32,
    pub connect_timeout_secs: u64,
    pub insert_chunk_size: usize,
}

impl std::fmt::Debug for StoreConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreConfig")
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("database", &self.database)
            .field("table", &self.table)
            .field("max_connections", &self.max_connections)
            .field("connect_timeout_secs", &self.connect_timeout_secs)
            .field("insert_chunk_size", &self.insert_chunk_size)
            .finish()
    }
}

impl StoreConfig {
    pub fn new(
        user: impl Into<String>,
        password: impl Into<String>,
        host: impl Into<String>,
        port: u16,
        database: impl Into<String>,
        table: impl Into<String>,
    ) -> Self {
        Self {
            user: user.into(),
            password: password.into(),
            host: host.into(),
            port,
            database: database.into(),
            table: table.into(),
            max_connections: DEFAULT_MAX_CONNECTIONS,
            connect_timeout_secs: DEFAULT_CONNECT_TIMEOUT_SECS,
            insert_chunk_size: DEFAULT_INSERT_CHUNK_SIZE,
        }
    }

    /// Apply pool tunables from the environment
    ///
    /// - `DB_MAX_CONNECTIONS`
    /// - `DB_CONNECT_TIMEOUT` (seconds)
    /// - `DB_INSERT_CHUNK_SIZE` (rows per INSERT)
    ///
    /// Unparseable values are ignored.
    pub fn with_env_overrides(mut self) -> Self {
        if let Some(max) = env_parse("DB_MAX_CONNECTIONS") {
            self.max_connections = max;
        }

        if let Some(timeout) = env_parse("DB_CONNECT_TIMEOUT") {
            self.connect_timeout_secs = timeout;
        }

        if let Some(chunk) = env_parse("DB_INSERT_CHUNK_SIZE") {
            self.insert_chunk_size = chunk;
        }

        self
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.host.is_empty() {
            return Err("Database host cannot be empty".to_string());
        }

        if self.user.is_empty() {
            return Err("Database user cannot be empty".to_string());
        }

        if self.database.is_empty() {
            return Err("Database name cannot be empty".to_string());
        }

        if !is_valid_table_name(&self.table) {
            return Err(format!("Invalid table name '{}'", self.table));
        }

        if self.max_connections == 0 {
            return Err("DB_MAX_CONNECTIONS must be greater than 0".to_string());
        }

        if self.insert_chunk_size == 0 {
            return Err("DB_INSERT_CHUNK_SIZE must be greater than 0".to_string());
        }

        Ok(())
    }

    fn connect_options(&self) -> PgConnectOptions {
        PgConnectOptions::new()
            .host(&self.host)
            .port(self.port)
            .username(&self.user)
            .password(&self.password)
            .database(&self.database)
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|s| s.parse().ok())
}

/// Plain or schema-qualified SQL identifier, e.g. `call_events` or `billing.call_events`
pub fn is_valid_table_name(name: &str) -> bool {
    fn is_identifier(part: &str) -> bool {
        let mut chars = part.chars();
        matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
            && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
    }

    let parts: Vec<&str> = name.split('.').collect();
    matches!(parts.len(), 1 | 2) && parts.iter().all(|part| is_identifier(part))
}

/// Call event store on PostgreSQL
///
/// The pool connects lazily, so an unreachable server is first reported by
/// [`CallEventStore::prepare`].
pub struct PgCallEventStore {
    pool: PgPool,
    table: String,
    insert_chunk_size: usize,
}

impl PgCallEventStore {
    /// Create a store from connection settings
    pub fn new(config: &StoreConfig) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections.max(1))
            .acquire_timeout(Duration::from_secs(config.connect_timeout_secs))
            .connect_lazy_with(config.connect_options());

        Self::with_pool(pool, &config.table, config.insert_chunk_size)
    }

    /// Create a store over an existing pool
    pub fn with_pool(
        pool: PgPool,
        table: impl Into<String>,
        insert_chunk_size: usize,
    ) -> Result<Self, StoreError> {
        let table = table.into();
        if !is_valid_table_name(&table) {
            return Err(StoreError::InvalidTableName(table));
        }

        Ok(Self {
            pool,
            table,
            insert_chunk_size: insert_chunk_size.max(1),
        })
    }
}

fn create_table_sql(table: &str) -> String {
    format!(
        r#"
        CREATE TABLE IF NOT EXISTS {table} (
            id BIGSERIAL PRIMARY KEY,
            event_date_time TIMESTAMP NOT NULL,
            event_action VARCHAR(20) NOT NULL,
            call_ref VARCHAR(20) NOT NULL,
            event_value NUMERIC(10,2) NULL,
            event_currency_code VARCHAR(3) NULL
        )
        "#
    )
}

fn insert_prefix(table: &str) -> String {
    format!(
        "INSERT INTO {table} (event_date_time, event_action, call_ref, event_value, event_currency_code) "
    )
}

#[async_trait]
impl CallEventStore for PgCallEventStore {
    async fn prepare(&self) -> Result<(), StoreError> {
        let sql = create_table_sql(&self.table);
        sqlx::query(&sql).execute(&self.pool).await?;

        info!(table = %self.table, "Destination table ready");
        Ok(())
    }

    async fn create(&self, batch: &ValidatedBatch) -> Result<(), StoreError> {
        let events = batch.accepted();
        if events.is_empty() {
            debug!(file = %batch.source().display(), "No accepted records to store");
            return Ok(());
        }

        let mut tx = self.pool.begin().await?;

        for chunk in events.chunks(self.insert_chunk_size) {
            let mut query_builder: QueryBuilder<Postgres> =
                QueryBuilder::new(insert_prefix(&self.table));

            query_builder.push_values(chunk, |mut b, event| {
                b.push_bind(event.event_datetime)
                    .push_bind(&event.event_action)
                    .push_bind(&event.call_ref)
                    .push_bind(&event.event_value)
                    .push_unseparated("::NUMERIC")
                    .push_bind(event.currency_code());
            });

            query_builder.build().execute(&mut *tx).await?;
        }

        tx.commit().await?;

        info!(
            table = %self.table,
            file = %batch.source().display(),
            rows = events.len(),
            "Stored call events"
        );

        Ok(())
    }
}
