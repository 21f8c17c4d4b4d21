//! Ingestion configuration
//!
//! Connection and directory settings come from the command line. Tunables
//! that operators rarely change are read from the environment (a `.env` file
//! is loaded first by the binary).

use crate::error::{IngestError, Result};
use crate::store::StoreConfig;
use std::path::PathBuf;

/// Default extension of ingestible files
pub const DEFAULT_FILE_EXTENSION: &str = "csv";

/// Directory and run-marker settings
#[derive(Debug, Clone)]
pub struct ParserConfig {
    pub processed_dir: PathBuf,
    pub inbound_dir: PathBuf,
    pub lock_file: PathBuf,
    /// Case-sensitive, leading dot optional
    pub extension: String,
}

impl ParserConfig {
    pub fn new(
        processed_dir: impl Into<PathBuf>,
        inbound_dir: impl Into<PathBuf>,
        lock_file: impl Into<PathBuf>,
    ) -> Self {
        Self {
            processed_dir: processed_dir.into(),
            inbound_dir: inbound_dir.into(),
            lock_file: lock_file.into(),
            extension: DEFAULT_FILE_EXTENSION.to_string(),
        }
    }

    /// Apply `CALLEVENT_FILE_EXTENSION` if set
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(extension) = std::env::var("CALLEVENT_FILE_EXTENSION") {
            self.extension = extension;
        }
        self
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.processed_dir.as_os_str().is_empty() {
            return Err(IngestError::config("Processed directory cannot be empty"));
        }

        if self.inbound_dir.as_os_str().is_empty() {
            return Err(IngestError::config("Inbound directory cannot be empty"));
        }

        if self.lock_file.as_os_str().is_empty() {
            return Err(IngestError::config("Lock file path cannot be empty"));
        }

        if self.extension.trim_start_matches('.').is_empty() {
            return Err(IngestError::config("CALLEVENT_FILE_EXTENSION cannot be empty"));
        }

        Ok(())
    }
}

/// Everything a run needs
#[derive(Debug, Clone)]
pub struct IngestConfig {
    pub store: StoreConfig,
    pub parser: ParserConfig,
}

impl IngestConfig {
    /// Combine command line settings with environment overrides and validate
    pub fn load(store: StoreConfig, parser: ParserConfig) -> Result<Self> {
        let config = Self {
            store: store.with_env_overrides(),
            parser: parser.with_env_overrides(),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.store.validate().map_err(IngestError::Config)?;
        self.parser.validate()
    }
}

/// Parse the database port argument
pub fn parse_port(value: &str) -> Result<u16> {
    value
        .trim()
        .parse::<u16>()
        .map_err(|e| IngestError::config(format!("Invalid database port '{}': {}", value, e)))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use serial_test::serial;

    fn store() -> StoreConfig {
        StoreConfig::new("calls", "secret", "localhost", 5432, "calls", "call_events")
    }

    fn parser() -> ParserConfig {
        ParserConfig::new("/srv/processed", "/srv/inbound", "/tmp/callevent.lock")
    }

    #[test]
    fn test_parse_port() {
        assert_eq!(parse_port("5432").unwrap(), 5432);
        assert_eq!(parse_port(" 3306 ").unwrap(), 3306);

        let err = parse_port("70000").unwrap_err();
        assert!(matches!(err, IngestError::Config(_)));
        assert!(err.to_string().contains("70000"));

        assert!(parse_port("db").is_err());
    }

    #[test]
    fn test_parser_config_validate() {
        assert!(parser().validate().is_ok());

        let mut bad = parser();
        bad.lock_file = PathBuf::new();
        assert!(matches!(bad.validate(), Err(IngestError::Config(_))));

        let mut bad = parser();
        bad.extension = ".".to_string();
        assert!(bad.validate().is_err());
    }

    #[test]
    #[serial]
    fn test_extension_override() {
        std::env::set_var("CALLEVENT_FILE_EXTENSION", "txt");
        let config = parser().with_env_overrides();
        std::env::remove_var("CALLEVENT_FILE_EXTENSION");

        assert_eq!(config.extension, "txt");
        assert_eq!(parser().with_env_overrides().extension, DEFAULT_FILE_EXTENSION);
    }

    #[test]
    #[serial]
    fn test_load_rejects_invalid_table() {
        let mut store = store();
        store.table = "calls; --".to_string();

        let err = IngestConfig::load(store, parser()).unwrap_err();
        assert!(matches!(err, IngestError::Config(_)));
    }

    #[test]
    #[serial]
    fn test_load_accepts_defaults() {
        let config = IngestConfig::load(store(), parser()).unwrap();
        assert_eq!(config.store.port, 5432);
        assert_eq!(config.parser.extension, "csv");
    }
}
