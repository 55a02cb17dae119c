//! Debounced write-back of controller state.
//!
//! The pipeline owns the live envelope. Every snapshot replaces its data;
//! once snapshots stop arriving for the debounce period, the latest one is
//! written. Writes happen on the pipeline task only, one at a time.

use std::sync::Arc;
use std::time::Duration;

use hearth_store::{FallbackStore, PreferredStore};
use hearth_types::VersionedEnvelope;
use serde_json::Value;
use thiserror::Error;
use tokio::sync::{broadcast, mpsc};
use tokio::time::Instant;

#[derive(Debug, Error)]
pub enum PersistenceError {
    /// The controller published a snapshot without state.
    #[error("updated state is missing")]
    MissingState,
}

pub struct PersistencePipeline {
    preferred: Arc<dyn PreferredStore>,
    mirror: Option<Arc<dyn FallbackStore>>,
    envelope: VersionedEnvelope,
    debounce: Duration,
}

impl PersistencePipeline {
    pub fn new(
        preferred: Arc<dyn PreferredStore>,
        envelope: VersionedEnvelope,
        debounce: Duration,
    ) -> Self {
        Self {
            preferred,
            mirror: None,
            envelope,
            debounce,
        }
    }

    /// Also write every envelope to `fallback`.
    pub fn with_fallback_mirror(mut self, fallback: Arc<dyn FallbackStore>) -> Self {
        self.mirror = Some(fallback);
        self
    }

    /// Consume snapshots until the source closes or shutdown is signalled.
    ///
    /// A `None` or JSON `null` snapshot ends the pipeline with
    /// [`PersistenceError::MissingState`]; any pending valid snapshot is
    /// written first. A pending snapshot is also written on close and on
    /// shutdown.
    pub async fn run(
        mut self,
        mut snapshots: mpsc::UnboundedReceiver<Option<Value>>,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), PersistenceError> {
        let mut pending: Option<Value> = None;
        let timer = tokio::time::sleep(self.debounce);
        tokio::pin!(timer);

        loop {
            tokio::select! {
                snapshot = snapshots.recv() => match snapshot {
                    Some(snapshot) => {
                        self.accept(snapshot, &mut pending).await?;
                        timer.as_mut().reset(Instant::now() + self.debounce);
                    }
                    None => {
                        self.flush(&mut pending).await;
                        tracing::debug!("state source closed, persistence stopped");
                        return Ok(());
                    }
                },
                () = &mut timer, if pending.is_some() => {
                    self.flush(&mut pending).await;
                }
                _ = shutdown.recv() => {
                    while let Ok(snapshot) = snapshots.try_recv() {
                        self.accept(snapshot, &mut pending).await?;
                    }
                    self.flush(&mut pending).await;
                    tracing::debug!("persistence stopped on shutdown");
                    return Ok(());
                }
            }
        }
    }

    /// Make `snapshot` the pending state, or fail on an empty one after
    /// writing whatever valid state was pending.
    async fn accept(
        &mut self,
        snapshot: Option<Value>,
        pending: &mut Option<Value>,
    ) -> Result<(), PersistenceError> {
        match snapshot {
            Some(state) if !state.is_null() => {
                *pending = Some(state);
                Ok(())
            }
            _ => {
                self.flush(pending).await;
                tracing::error!("controller published empty state, stopping persistence");
                Err(PersistenceError::MissingState)
            }
        }
    }

    async fn flush(&mut self, pending: &mut Option<Value>) {
        let Some(state) = pending.take() else {
            return;
        };
        self.envelope = self.envelope.with_data(state);

        if self.preferred.is_supported() {
            match self.preferred.set(&self.envelope).await {
                Ok(()) => tracing::trace!(version = self.envelope.version, "state persisted"),
                Err(e) => tracing::warn!(error = %e, "error persisting state"),
            }
        }
        if let Some(mirror) = &self.mirror {
            if let Err(e) = mirror.put_state(&self.envelope) {
                tracing::warn!(error = %e, "error mirroring state to fallback tier");
            }
        }
    }
}
