//! Import configuration

use std::time::Duration;

use serde::Deserialize;

use core_kernel::Currency;

/// Default per-call extraction timeout
pub const DEFAULT_EXTRACTION_TIMEOUT_SECS: u64 = 120;

/// Default upper bound for uploaded files (20 MiB)
pub const DEFAULT_MAX_FILE_BYTES: usize = 20 * 1024 * 1024;

/// Default number of synthesized calendar periods
pub const DEFAULT_PROJECTION_MONTHS: u32 = 12;

/// Tunables of the import wizard
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ImportConfig {
    /// Upper bound for one extraction call, in seconds
    pub extraction_timeout_secs: u64,
    /// Largest accepted upload, in bytes
    pub max_file_bytes: usize,
    /// Periods synthesized when the statement carries no ledger
    pub projection_months: u32,
    /// Currency of all extracted amounts
    pub currency: Currency,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            extraction_timeout_secs: DEFAULT_EXTRACTION_TIMEOUT_SECS,
            max_file_bytes: DEFAULT_MAX_FILE_BYTES,
            projection_months: DEFAULT_PROJECTION_MONTHS,
            currency: Currency::EUR,
        }
    }
}

impl ImportConfig {
    /// Loads configuration from `IMPORT_*` environment variables
    pub fn from_env() -> Result<Self, config::ConfigError> {
        config::Config::builder()
            .add_source(config::Environment::with_prefix("IMPORT"))
            .build()?
            .try_deserialize()
    }

    pub fn extraction_timeout(&self) -> Duration {
        Duration::from_secs(self.extraction_timeout_secs)
    }

    pub fn with_extraction_timeout(mut self, timeout: Duration) -> Self {
        self.extraction_timeout_secs = timeout.as_secs().max(1);
        self
    }

    pub fn with_max_file_bytes(mut self, max: usize) -> Self {
        self.max_file_bytes = max;
        self
    }
}
