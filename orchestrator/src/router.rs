//! Connection router: classifies inbound channels and hands them to the
//! controller.
//!
//! Every accepted channel gets its own forwarding task. Frames from the
//! remote context pass through the task to the controller's stream, so the
//! router can observe account requests on untrusted channels; frames from
//! the controller go straight to the remote context. When the remote
//! context disconnects, the task removes the connection from the registry.

use std::sync::Arc;

use hearth_interfaces::{Controller, DuplexStream, RemotePort, PORT_BUFFER};
use hearth_types::{ConnectionId, ContextKind, InboundMessage, SenderMetadata, Trust};
use serde_json::Value;
use tokio::sync::mpsc;

use crate::registry::{LifecycleChange, SharedRegistry};

/// What happened to an inbound channel.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConnectionOutcome {
    /// Denylisted; no stream was created.
    Rejected,
    Accepted { id: ConnectionId, trust: Trust },
}

#[derive(Clone)]
pub struct ConnectionRouter {
    controller: Arc<dyn Controller>,
    registry: SharedRegistry,
    denylist: Arc<Vec<String>>,
}

impl ConnectionRouter {
    pub fn new(
        controller: Arc<dyn Controller>,
        registry: SharedRegistry,
        denylist: Vec<String>,
    ) -> Self {
        Self {
            controller,
            registry,
            denylist: Arc::new(denylist),
        }
    }

    pub fn registry(&self) -> &SharedRegistry {
        &self.registry
    }

    /// A channel opened from inside the extension or by a page's content
    /// script.
    pub async fn on_connection(&self, port: RemotePort) -> ConnectionOutcome {
        if self.denylist.iter().any(|name| name == port.name()) {
            tracing::debug!(port = port.name(), "rejecting denylisted connection");
            return ConnectionOutcome::Rejected;
        }
        let kind = ContextKind::from_port_name(port.name());
        self.accept(port, kind, kind == ContextKind::ExternalPage).await
    }

    /// A channel opened by another extension or an externally connectable
    /// page. Always untrusted and never correlated.
    pub async fn on_external_connection(&self, port: RemotePort) -> ConnectionOutcome {
        self.accept(port, ContextKind::ExternalPage, false).await
    }

    async fn accept(
        &self,
        port: RemotePort,
        kind: ContextKind,
        correlate: bool,
    ) -> ConnectionOutcome {
        let (name, sender, incoming, outgoing) = port.into_parts();
        let tab_id = sender.as_ref().and_then(|s| s.tab_id);
        if kind == ContextKind::FullscreenTab && tab_id.is_none() {
            tracing::warn!(port = %name, "fullscreen connection without a tab id is not tracked");
        }
        let origin_host = if correlate {
            sender.as_ref().and_then(account_origin)
        } else {
            None
        };

        let change = self
            .registry
            .lock()
            .await
            .register(kind, tab_id, origin_host);
        let id = change.connection.id;
        let trust = change.connection.trust;

        let (to_controller, controller_inbound) = mpsc::channel(PORT_BUFFER);
        let stream = DuplexStream::new(controller_inbound, outgoing);
        match trust {
            Trust::Trusted => self.controller.setup_trusted_communication(stream, sender),
            Trust::Untrusted => self.controller.setup_untrusted_communication(stream, sender),
        }
        self.notify(&change);
        tracing::info!(connection = %id, port = %name, kind = %kind, "connection accepted");

        let correlate = correlate && change.connection.origin_host.is_some();
        let router = self.clone();
        tokio::spawn(async move {
            router.forward(id, incoming, to_controller, correlate).await
        });

        ConnectionOutcome::Accepted { id, trust }
    }

    async fn forward(
        &self,
        id: ConnectionId,
        mut incoming: mpsc::Receiver<Value>,
        to_controller: mpsc::Sender<Value>,
        correlate: bool,
    ) {
        while let Some(frame) = incoming.recv().await {
            if correlate && InboundMessage::from_value(&frame).is_account_request() {
                self.registry.lock().await.record_account_request(id);
            }
            if to_controller.send(frame).await.is_err() {
                tracing::debug!(connection = %id, "controller stopped reading");
                break;
            }
        }

        let change = self.registry.lock().await.unregister(id);
        if let Some(change) = change {
            self.notify(&change);
        }
    }

    fn notify(&self, change: &LifecycleChange) {
        if let Some(open) = change.client_open {
            tracing::debug!(open, "client open state changed");
            self.controller.set_client_open(open);
        }
    }
}

/// Origin host of a sender that lives in a tab, if its url parses.
fn account_origin(sender: &SenderMetadata) -> Option<String> {
    sender.tab_id?;
    match sender.origin_host() {
        Ok(host) => host,
        Err(e) => {
            tracing::debug!(error = %e, "sender url has no usable origin");
            None
        }
    }
}
