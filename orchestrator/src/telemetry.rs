//! Telemetry sink that records diagnostics as structured log events.
//!
//! Deployments with a remote error collector supply their own
//! [`Telemetry`] implementation; this one is the default.

use hearth_interfaces::{DiagnosticEvent, Telemetry};

#[derive(Clone, Copy, Debug, Default)]
pub struct TracingTelemetry;

impl Telemetry for TracingTelemetry {
    fn capture(&self, event: DiagnosticEvent) {
        let payload = serde_json::to_string(&event).unwrap_or_default();
        match &event {
            DiagnosticEvent::VaultRecovered { .. } => {
                tracing::warn!(diagnostic = %payload, "{}", event.message())
            }
            _ => tracing::error!(diagnostic = %payload, "{}", event.message()),
        }
    }
}
