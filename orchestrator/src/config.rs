//! Orchestrator configuration with TOML file support.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::logging::LogFormat;
use crate::OrchestratorError;

/// What the migration runner does when a migration fails.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MigrationFailurePolicy {
    /// Return the error; initialization halts.
    #[default]
    Abort,
    /// Stop at the failing migration and keep the envelope at the last
    /// version that migrated cleanly.
    KeepPartial,
}

/// Configuration for the orchestrator.
///
/// Can be loaded from a TOML file via [`OrchestratorConfig::from_toml_file`]
/// or built programmatically (e.g. for tests).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct OrchestratorConfig {
    /// Directory holding both storage tiers.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Name of the fallback tier's state file (without extension).
    #[serde(default = "default_storage_key")]
    pub storage_key: String,

    /// LMDB map size in bytes for the preferred tier.
    #[serde(default = "default_lmdb_map_size")]
    pub lmdb_map_size: usize,

    /// Quiet period before a burst of state changes is written.
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,

    #[serde(default)]
    pub migration_failure_policy: MigrationFailurePolicy,

    /// Also write every persisted envelope to the fallback tier.
    #[serde(default)]
    pub mirror_to_fallback: bool,

    /// Port names whose connections are dropped without a stream.
    #[serde(default = "default_denylisted_ports")]
    pub denylisted_ports: Vec<String>,

    /// Toolbar badge background color.
    #[serde(default = "default_badge_color")]
    pub badge_color: String,

    /// Page loaded into the approval window.
    #[serde(default = "default_notification_url")]
    pub notification_url: String,

    #[serde(default = "default_notification_width")]
    pub notification_width: u32,

    #[serde(default = "default_notification_height")]
    pub notification_height: u32,

    /// Optional JSON file merged over the built-in first-run state.
    #[serde(default)]
    pub first_time_state_path: Option<PathBuf>,

    /// Log format: "human" or "json".
    #[serde(default = "default_log_format")]
    pub log_format: String,

    /// Log level filter: "trace", "debug", "info", "warn", "error".
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Force debug-level logging regardless of `log_level`.
    #[serde(default)]
    pub debug_logging: bool,
}

// ── Serde default helpers ──────────────────────────────────────────────

fn default_data_dir() -> PathBuf {
    PathBuf::from("./hearth_data")
}

fn default_storage_key() -> String {
    "hearth-config".to_string()
}

fn default_lmdb_map_size() -> usize {
    64 * 1024 * 1024
}

fn default_debounce_ms() -> u64 {
    1000
}

fn default_denylisted_ports() -> Vec<String> {
    vec!["trezor-connect".to_string()]
}

fn default_badge_color() -> String {
    "#506F8B".to_string()
}

fn default_notification_url() -> String {
    "notification.html".to_string()
}

fn default_notification_width() -> u32 {
    357
}

fn default_notification_height() -> u32 {
    620
}

fn default_log_format() -> String {
    "human".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

// ── Impl ───────────────────────────────────────────────────────────────

impl OrchestratorConfig {
    /// Load configuration from a TOML file.
    pub fn from_toml_file(path: &str) -> Result<Self, OrchestratorError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| OrchestratorError::Config(e.to_string()))?;
        Self::from_toml_str(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, OrchestratorError> {
        toml::from_str(s).map_err(|e| OrchestratorError::Config(e.to_string()))
    }

    /// Serialize the configuration to a TOML string.
    pub fn to_toml_string(&self) -> Result<String, OrchestratorError> {
        toml::to_string_pretty(self).map_err(|e| OrchestratorError::Config(e.to_string()))
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn is_denylisted(&self, port_name: &str) -> bool {
        self.denylisted_ports.iter().any(|p| p == port_name)
    }

    pub fn log_format(&self) -> LogFormat {
        match self.log_format.as_str() {
            "json" => LogFormat::Json,
            _ => LogFormat::Human,
        }
    }

    /// The filter handed to the subscriber, honoring `debug_logging`.
    pub fn effective_log_level(&self) -> &str {
        if self.debug_logging {
            "debug"
        } else {
            &self.log_level
        }
    }
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            storage_key: default_storage_key(),
            lmdb_map_size: default_lmdb_map_size(),
            debounce_ms: default_debounce_ms(),
            migration_failure_policy: MigrationFailurePolicy::default(),
            mirror_to_fallback: false,
            denylisted_ports: default_denylisted_ports(),
            badge_color: default_badge_color(),
            notification_url: default_notification_url(),
            notification_width: default_notification_width(),
            notification_height: default_notification_height(),
            first_time_state_path: None,
            log_format: default_log_format(),
            log_level: default_log_level(),
            debug_logging: false,
        }
    }
}
