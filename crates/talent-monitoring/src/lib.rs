//! Logging setup shared by the Talent KB binaries.

use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;

pub mod logging;

pub use logging::{init_logging, LogExt};

/// Monitoring configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonitoringConfig {
    /// Service name attached to the startup log line
    pub service_name: String,

    /// Filter directive used when `RUST_LOG` is not set
    pub log_filter: String,

    /// Emit JSON to stderr instead of pretty text
    pub enable_json_logging: bool,

    /// Daily-rotated JSON log file (date suffix appended)
    pub log_file: Option<PathBuf>,
}

impl Default for MonitoringConfig {
    fn default() -> Self {
        Self {
            service_name: "talent-kb".to_string(),
            log_filter: "info".to_string(),
            enable_json_logging: false,
            log_file: None,
        }
    }
}

impl MonitoringConfig {
    /// Reads `TALENT_LOG_FILTER`, `TALENT_LOG_JSON` and `TALENT_LOG_FILE`.
    pub fn from_env(service_name: impl Into<String>) -> Self {
        Self::from_vars(service_name, |key| env::var(key).ok())
    }

    pub fn from_vars<F>(service_name: impl Into<String>, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self {
            service_name: service_name.into(),
            ..Self::default()
        };

        if let Some(filter) = lookup("TALENT_LOG_FILTER") {
            config.log_filter = filter;
        }
        if let Some(json) = lookup("TALENT_LOG_JSON") {
            config.enable_json_logging = json.eq_ignore_ascii_case("true") || json == "1";
        }
        if let Some(file) = lookup("TALENT_LOG_FILE").filter(|f| !f.is_empty()) {
            config.log_file = Some(PathBuf::from(file));
        }

        config
    }
}
