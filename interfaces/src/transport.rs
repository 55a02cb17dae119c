//! Channel types between remote contexts and the controller.
//!
//! A [`RemotePort`] is what the platform hands the router when a context
//! connects: a name, optional sender metadata, and a pair of frame channels.
//! The far side holds the matching [`PortEnd`]; dropping its sender is the
//! end-of-stream signal. The controller receives a [`DuplexStream`].

use hearth_types::SenderMetadata;
use serde_json::Value;
use tokio::sync::mpsc;

/// Frames buffered per direction before senders wait.
pub const PORT_BUFFER: usize = 64;

/// An inbound connection as delivered by the platform.
#[derive(Debug)]
pub struct RemotePort {
    name: String,
    sender: Option<SenderMetadata>,
    incoming: mpsc::Receiver<Value>,
    outgoing: mpsc::Sender<Value>,
}

impl RemotePort {
    pub fn new(
        name: impl Into<String>,
        sender: Option<SenderMetadata>,
        incoming: mpsc::Receiver<Value>,
        outgoing: mpsc::Sender<Value>,
    ) -> Self {
        Self {
            name: name.into(),
            sender,
            incoming,
            outgoing,
        }
    }

    /// Create a connected port and the remote context's end of it.
    pub fn pair(name: impl Into<String>, sender: Option<SenderMetadata>) -> (Self, PortEnd) {
        let (to_port, incoming) = mpsc::channel(PORT_BUFFER);
        let (outgoing, from_port) = mpsc::channel(PORT_BUFFER);
        (
            Self::new(name, sender, incoming, outgoing),
            PortEnd {
                tx: to_port,
                rx: from_port,
            },
        )
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn sender(&self) -> Option<&SenderMetadata> {
        self.sender.as_ref()
    }

    pub fn into_parts(
        self,
    ) -> (
        String,
        Option<SenderMetadata>,
        mpsc::Receiver<Value>,
        mpsc::Sender<Value>,
    ) {
        (self.name, self.sender, self.incoming, self.outgoing)
    }
}

/// The remote context's side of a port.
#[derive(Debug)]
pub struct PortEnd {
    /// Frames to the orchestrator. Drop to disconnect.
    pub tx: mpsc::Sender<Value>,
    /// Frames from the controller.
    pub rx: mpsc::Receiver<Value>,
}

/// The controller's view of an accepted connection.
///
/// `inbound` closes when the remote context disconnects.
#[derive(Debug)]
pub struct DuplexStream {
    pub inbound: mpsc::Receiver<Value>,
    pub outbound: mpsc::Sender<Value>,
}

impl DuplexStream {
    pub fn new(inbound: mpsc::Receiver<Value>, outbound: mpsc::Sender<Value>) -> Self {
        Self { inbound, outbound }
    }
}
