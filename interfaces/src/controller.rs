//! The wallet controller's contract with the orchestrator.

use hearth_types::{ApprovalQueue, SenderMetadata, TxStatusUpdate};
use serde_json::Value;
use tokio::sync::mpsc;

use crate::transport::DuplexStream;

/// The subset of the wallet controller the connection router talks to.
///
/// Stream setup must not block: controllers spawn their own tasks to serve
/// the stream.
pub trait Controller: Send + Sync {
    /// Serve the full, privileged API to an internal UI surface.
    fn setup_trusted_communication(&self, stream: DuplexStream, sender: Option<SenderMetadata>);

    /// Serve the restricted provider API to a page or another extension.
    fn setup_untrusted_communication(&self, stream: DuplexStream, sender: Option<SenderMetadata>);

    /// Whether any internal UI surface is currently open.
    fn set_client_open(&self, open: bool);
}

/// Notifications the controller sends to the orchestrator.
#[derive(Clone, Debug, PartialEq)]
pub enum ControllerEvent {
    /// The controller's state changed. `None` is a contract violation.
    StateChanged(Option<Value>),
    /// One approval queue's size changed.
    PendingCountChanged { queue: ApprovalQueue, count: u32 },
    /// A transaction changed status.
    TxStatusChanged(TxStatusUpdate),
}

/// Typed handle the controller uses to publish [`ControllerEvent`]s.
#[derive(Clone, Debug)]
pub struct ControllerEventSink {
    tx: mpsc::UnboundedSender<ControllerEvent>,
}

impl ControllerEventSink {
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<ControllerEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    /// Publish an event. Returns `false` once the orchestrator has stopped
    /// listening.
    pub fn emit(&self, event: ControllerEvent) -> bool {
        self.tx.send(event).is_ok()
    }

    pub fn state_changed(&self, state: Value) -> bool {
        self.emit(ControllerEvent::StateChanged(Some(state)))
    }

    pub fn pending_count_changed(&self, queue: ApprovalQueue, count: u32) -> bool {
        self.emit(ControllerEvent::PendingCountChanged { queue, count })
    }

    pub fn tx_status_changed(&self, update: TxStatusUpdate) -> bool {
        self.emit(ControllerEvent::TxStatusChanged(update))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn sink_delivers_in_order_and_reports_closure() {
        let (sink, mut rx) = ControllerEventSink::channel();
        assert!(sink.state_changed(json!({"a": 1})));
        assert!(sink.pending_count_changed(ApprovalQueue::Transaction, 2));

        assert_eq!(
            rx.try_recv().expect("first event"),
            ControllerEvent::StateChanged(Some(json!({"a": 1})))
        );
        assert_eq!(
            rx.try_recv().expect("second event"),
            ControllerEvent::PendingCountChanged {
                queue: ApprovalQueue::Transaction,
                count: 2
            }
        );

        drop(rx);
        assert!(!sink.state_changed(json!({})));
    }
}
