//! Loading, repairing and migrating the persisted state envelope.
//!
//! Resolution order is preferred tier, then fallback tier, then generated
//! first-run state. An envelope without data is repaired from the fallback
//! tier when possible and regenerated otherwise; only a migrated envelope
//! that still has no data is fatal. A tier that fails to read stops the
//! load before anything is written.

use std::sync::Arc;

use hearth_interfaces::{DiagnosticEvent, Telemetry};
use hearth_store::{FallbackStore, PreferredStore, StoreError};
use hearth_types::VersionedEnvelope;
use hearth_utils::obj_structure;
use serde_json::Value;
use tokio::sync::mpsc;

use crate::migrator::Migrator;
use crate::OrchestratorError;

pub struct VersionedStateStore {
    preferred: Arc<dyn PreferredStore>,
    fallback: Arc<dyn FallbackStore>,
    telemetry: Arc<dyn Telemetry>,
    fatal_tx: mpsc::UnboundedSender<OrchestratorError>,
}

impl VersionedStateStore {
    /// `fatal_tx` receives errors that surface after `load` has returned.
    pub fn new(
        preferred: Arc<dyn PreferredStore>,
        fallback: Arc<dyn FallbackStore>,
        telemetry: Arc<dyn Telemetry>,
        fatal_tx: mpsc::UnboundedSender<OrchestratorError>,
    ) -> Self {
        Self {
            preferred,
            fallback,
            telemetry,
            fatal_tx,
        }
    }

    pub async fn load(
        &self,
        migrator: &Migrator,
        first_time_state: &Value,
    ) -> Result<VersionedEnvelope, OrchestratorError> {
        let mut envelope = match self.read_preferred().await? {
            Some(env) => env,
            None => match self.read_fallback()? {
                Some(env) => env,
                None => {
                    tracing::info!("no stored state found, generating first-run state");
                    migrator.generate_initial_state(first_time_state.clone())
                }
            },
        };

        if !envelope.has_data() {
            envelope = self.recover(migrator, first_time_state)?;
        }

        let envelope = migrator.migrate_data(envelope)?;
        if !envelope.has_data() {
            return Err(OrchestratorError::FatalInitState);
        }

        self.write_back(&envelope).await;
        tracing::info!(version = envelope.version, "state loaded");
        Ok(envelope)
    }

    /// Only an absent envelope is a miss; an unreadable one stops the load
    /// so it is never overwritten.
    async fn read_preferred(&self) -> Result<Option<VersionedEnvelope>, StoreError> {
        if !self.preferred.is_supported() {
            return Ok(None);
        }
        self.preferred.get().await.map_err(|e| {
            tracing::error!(error = %e, "preferred tier read failed");
            e
        })
    }

    fn read_fallback(&self) -> Result<Option<VersionedEnvelope>, StoreError> {
        self.fallback.get_state().map_err(|e| {
            tracing::error!(error = %e, "fallback tier read failed");
            e
        })
    }

    fn recover(
        &self,
        migrator: &Migrator,
        first_time_state: &Value,
    ) -> Result<VersionedEnvelope, StoreError> {
        let recovered = match self.read_fallback()?.filter(VersionedEnvelope::has_data) {
            Some(recovered) => {
                let structure = recovered.data.as_ref().map(obj_structure).unwrap_or_default();
                tracing::warn!(version = recovered.version, "empty vault recovered from fallback tier");
                self.telemetry
                    .capture(DiagnosticEvent::VaultRecovered { structure });
                recovered
            }
            None => {
                tracing::error!("empty vault found, unable to recover");
                self.telemetry.capture(DiagnosticEvent::VaultUnrecoverable);
                migrator.generate_initial_state(first_time_state.clone())
            }
        };
        Ok(recovered)
    }

    async fn write_back(&self, envelope: &VersionedEnvelope) {
        if self.preferred.is_supported() {
            if let Err(e) = self.preferred.set(envelope).await {
                tracing::warn!(error = %e, "failed to write migrated state");
            }
            return;
        }
        // Surfaces after the caller has the state in hand.
        let fatal_tx = self.fatal_tx.clone();
        tokio::spawn(async move {
            tokio::task::yield_now().await;
            let _ = fatal_tx.send(OrchestratorError::UnsupportedStorageTier);
        });
    }
}
