//! Named substreams over a single [`DuplexStream`].
//!
//! Every frame on the shared stream is `{ "name": <substream>, "data": <payload> }`.
//! Controllers use this to run the privileged controller API and the
//! provider API over one connection.

use std::collections::HashMap;

use serde_json::{json, Value};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::transport::{DuplexStream, PORT_BUFFER};

pub struct Multiplexer {
    stream: DuplexStream,
    routes: HashMap<String, mpsc::Sender<Value>>,
    outputs: Vec<(String, mpsc::Receiver<Value>)>,
}

impl Multiplexer {
    pub fn new(stream: DuplexStream) -> Self {
        Self {
            stream,
            routes: HashMap::new(),
            outputs: Vec::new(),
        }
    }

    /// Register a substream. Frames for unregistered names are dropped.
    pub fn create_stream(&mut self, name: &str) -> DuplexStream {
        let (route_tx, sub_inbound) = mpsc::channel(PORT_BUFFER);
        let (sub_outbound, output_rx) = mpsc::channel(PORT_BUFFER);
        self.routes.insert(name.to_string(), route_tx);
        self.outputs.push((name.to_string(), output_rx));
        DuplexStream::new(sub_inbound, sub_outbound)
    }

    /// Start routing. The returned task ends when the shared inbound stream
    /// closes, which in turn closes every substream's inbound side.
    pub fn spawn(self) -> JoinHandle<()> {
        let Multiplexer {
            stream,
            routes,
            outputs,
        } = self;
        let DuplexStream {
            mut inbound,
            outbound,
        } = stream;

        for (name, mut output_rx) in outputs {
            let outbound = outbound.clone();
            tokio::spawn(async move {
                while let Some(data) = output_rx.recv().await {
                    if outbound.send(json!({ "name": name, "data": data })).await.is_err() {
                        break;
                    }
                }
            });
        }

        tokio::spawn(async move {
            while let Some(frame) = inbound.recv().await {
                let Some(name) = frame.get("name").and_then(Value::as_str) else {
                    tracing::debug!("dropping frame without substream name");
                    continue;
                };
                let Some(route) = routes.get(name) else {
                    tracing::debug!(substream = name, "dropping frame for unknown substream");
                    continue;
                };
                let data = frame.get("data").cloned().unwrap_or(Value::Null);
                // A substream whose reader went away only loses its own frames.
                let _ = route.send(data).await;
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn routes_frames_by_name_and_wraps_replies() {
        let (to_mux, inbound) = mpsc::channel(8);
        let (outbound, mut from_mux) = mpsc::channel(8);
        let mut mux = Multiplexer::new(DuplexStream::new(inbound, outbound));
        let mut controller = mux.create_stream("controller");
        let mut provider = mux.create_stream("provider");
        let handle = mux.spawn();

        to_mux
            .send(json!({"name": "provider", "data": {"method": "eth_chainId"}}))
            .await
            .expect("send");
        to_mux
            .send(json!({"name": "controller", "data": "getState"}))
            .await
            .expect("send");
        assert_eq!(
            provider.inbound.recv().await,
            Some(json!({"method": "eth_chainId"}))
        );
        assert_eq!(controller.inbound.recv().await, Some(json!("getState")));

        provider.outbound.send(json!("0x1")).await.expect("reply");
        assert_eq!(
            from_mux.recv().await,
            Some(json!({"name": "provider", "data": "0x1"}))
        );

        drop(to_mux);
        handle.await.expect("router task");
        assert_eq!(controller.inbound.recv().await, None);
    }

    #[tokio::test]
    async fn unknown_and_unnamed_frames_are_dropped() {
        let (to_mux, inbound) = mpsc::channel(8);
        let (outbound, _from_mux) = mpsc::channel(8);
        let mut mux = Multiplexer::new(DuplexStream::new(inbound, outbound));
        let mut provider = mux.create_stream("provider");
        let _handle = mux.spawn();

        to_mux.send(json!({"data": 1})).await.expect("send");
        to_mux
            .send(json!({"name": "phishing", "data": 2}))
            .await
            .expect("send");
        to_mux
            .send(json!({"name": "provider", "data": 3}))
            .await
            .expect("send");
        assert_eq!(provider.inbound.recv().await, Some(json!(3)));
    }
}
