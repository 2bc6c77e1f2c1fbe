//! Environment-driven configuration

use crate::{ImportError, Result};
use relimport_core::{ImportOptions, ImportStrategy, PayloadDecoder, ReportMode, DEFAULT_MAX_PAYLOAD_BYTES};
use std::path::PathBuf;
use std::sync::Arc;

pub const ENV_DB_PATH: &str = "RELIMPORT_DB_PATH";
pub const ENV_MAX_PAYLOAD_BYTES: &str = "RELIMPORT_MAX_PAYLOAD_BYTES";
pub const ENV_DEFAULT_STRATEGY: &str = "RELIMPORT_DEFAULT_STRATEGY";
pub const ENV_DEFAULT_REPORT_MODE: &str = "RELIMPORT_DEFAULT_REPORT_MODE";

fn env_non_empty(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

/// Settings shared by every import in a process
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportConfig {
    /// Location of the persistent database, if configured
    pub db_path: Option<PathBuf>,
    pub max_payload_bytes: usize,
    /// Strategy applied when a caller passes no options
    pub default_strategy: ImportStrategy,
    pub default_report_mode: ReportMode,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            db_path: None,
            max_payload_bytes: DEFAULT_MAX_PAYLOAD_BYTES,
            default_strategy: ImportStrategy::default(),
            default_report_mode: ReportMode::default(),
        }
    }
}

impl ImportConfig {
    /// Read configuration from the environment, falling back to defaults
    ///
    /// Unparseable strategy, report mode or size values are rejected rather
    /// than silently replaced.
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();

        let max_payload_bytes = match env_non_empty(ENV_MAX_PAYLOAD_BYTES) {
            Some(value) => value
                .parse::<usize>()
                .ok()
                .filter(|bytes| *bytes > 0)
                .ok_or_else(|| {
                    ImportError::Config(format!(
                        "{}: expected a positive byte count, got '{}'",
                        ENV_MAX_PAYLOAD_BYTES, value
                    ))
                })?,
            None => defaults.max_payload_bytes,
        };

        let default_strategy = match env_non_empty(ENV_DEFAULT_STRATEGY) {
            Some(value) => value
                .parse()
                .map_err(|e| ImportError::Config(format!("{}: {}", ENV_DEFAULT_STRATEGY, e)))?,
            None => defaults.default_strategy,
        };

        let default_report_mode = match env_non_empty(ENV_DEFAULT_REPORT_MODE) {
            Some(value) => value
                .parse()
                .map_err(|e| ImportError::Config(format!("{}: {}", ENV_DEFAULT_REPORT_MODE, e)))?,
            None => defaults.default_report_mode,
        };

        Ok(Self {
            db_path: env_non_empty(ENV_DB_PATH).map(PathBuf::from),
            max_payload_bytes,
            default_strategy,
            default_report_mode,
        })
    }

    /// Options used when a caller supplies none
    pub fn default_options(&self) -> ImportOptions {
        ImportOptions::new(self.default_strategy).with_report_mode(self.default_report_mode)
    }

    /// The process-wide decoder
    pub fn decoder(&self) -> Arc<PayloadDecoder> {
        Arc::new(PayloadDecoder::new(self.max_payload_bytes))
    }
}
