//! Diagnostic events sent to the error-telemetry collaborator.

use serde::Serialize;
use serde_json::Value;

/// A diagnostic the orchestrator reports.
///
/// Payloads are structure-only: `structure` fields hold the output of
/// `hearth_utils::obj_structure`, never state values.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DiagnosticEvent {
    /// The preferred tier held an envelope without data and the fallback
    /// tier had a usable copy.
    VaultRecovered { structure: Value },
    /// Neither tier had usable data; first-run state was generated.
    VaultUnrecoverable,
    /// A schema migration failed.
    MigrationFailed {
        version: u32,
        error: String,
        structure: Value,
    },
    /// A transaction reached the `failed` status.
    TransactionFailed { tx_id: u64, error: Option<String> },
}

impl DiagnosticEvent {
    /// Short stable message used as the event title.
    pub fn message(&self) -> &'static str {
        match self {
            Self::VaultRecovered { .. } => "empty vault found - recovered from disk store",
            Self::VaultUnrecoverable => "empty vault found - unable to recover",
            Self::MigrationFailed { .. } => "state migration failed",
            Self::TransactionFailed { .. } => "transaction failed",
        }
    }
}

/// Sink for diagnostic events. Capturing must not fail or block.
pub trait Telemetry: Send + Sync {
    fn capture(&self, event: DiagnosticEvent);
}
