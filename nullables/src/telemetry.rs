//! Nullable telemetry: records diagnostic events instead of sending them.

use std::sync::Mutex;

use hearth_interfaces::{DiagnosticEvent, Telemetry};

#[derive(Default)]
pub struct NullTelemetry {
    events: Mutex<Vec<DiagnosticEvent>>,
}

impl NullTelemetry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every captured event, oldest first.
    pub fn events(&self) -> Vec<DiagnosticEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn count(&self) -> usize {
        self.events.lock().unwrap().len()
    }
}

impl Telemetry for NullTelemetry {
    fn capture(&self, event: DiagnosticEvent) {
        self.events.lock().unwrap().push(event);
    }
}
