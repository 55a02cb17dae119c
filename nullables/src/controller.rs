//! Nullable wallet controller: records stream setups and client-open flags.

use std::sync::Mutex;

use hearth_interfaces::{Controller, DuplexStream};
use hearth_types::{SenderMetadata, Trust};

/// One call to a `setup_*_communication` method.
#[derive(Debug)]
pub struct StreamSetup {
    pub trust: Trust,
    pub sender: Option<SenderMetadata>,
    /// Taken by tests that want to talk over the stream.
    pub stream: Option<DuplexStream>,
}

/// A controller that serves nothing and remembers everything.
#[derive(Default)]
pub struct NullController {
    setups: Mutex<Vec<StreamSetup>>,
    client_open: Mutex<Vec<bool>>,
}

impl NullController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Trust level of every setup so far, oldest first.
    pub fn setup_trusts(&self) -> Vec<Trust> {
        self.setups.lock().unwrap().iter().map(|s| s.trust).collect()
    }

    pub fn setup_count(&self) -> usize {
        self.setups.lock().unwrap().len()
    }

    /// Sender metadata handed to the `index`th setup.
    pub fn sender_of(&self, index: usize) -> Option<SenderMetadata> {
        self.setups
            .lock()
            .unwrap()
            .get(index)
            .and_then(|s| s.sender.clone())
    }

    /// Take the stream from the `index`th setup, leaving `None` behind.
    pub fn take_stream(&self, index: usize) -> Option<DuplexStream> {
        self.setups
            .lock()
            .unwrap()
            .get_mut(index)
            .and_then(|s| s.stream.take())
    }

    /// Every value passed to `set_client_open`, oldest first.
    pub fn client_open_history(&self) -> Vec<bool> {
        self.client_open.lock().unwrap().clone()
    }

    pub fn last_client_open(&self) -> Option<bool> {
        self.client_open.lock().unwrap().last().copied()
    }

    fn record(&self, trust: Trust, stream: DuplexStream, sender: Option<SenderMetadata>) {
        self.setups.lock().unwrap().push(StreamSetup {
            trust,
            sender,
            stream: Some(stream),
        });
    }
}

impl Controller for NullController {
    fn setup_trusted_communication(&self, stream: DuplexStream, sender: Option<SenderMetadata>) {
        self.record(Trust::Trusted, stream, sender);
    }

    fn setup_untrusted_communication(&self, stream: DuplexStream, sender: Option<SenderMetadata>) {
        self.record(Trust::Untrusted, stream, sender);
    }

    fn set_client_open(&self, open: bool) {
        self.client_open.lock().unwrap().push(open);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tokio::sync::mpsc;

    #[tokio::test]
    async fn records_setups_and_hands_out_streams() {
        let controller = NullController::new();
        let (to_ctrl, inbound) = mpsc::channel(4);
        let (outbound, _from_ctrl) = mpsc::channel(4);
        controller.setup_untrusted_communication(DuplexStream::new(inbound, outbound), None);
        controller.set_client_open(true);

        assert_eq!(controller.setup_trusts(), vec![Trust::Untrusted]);
        assert_eq!(controller.client_open_history(), vec![true]);

        let mut stream = controller.take_stream(0).expect("stream recorded");
        assert!(controller.take_stream(0).is_none());
        to_ctrl.send(json!(1)).await.unwrap();
        assert_eq!(stream.inbound.recv().await, Some(json!(1)));
    }
}
