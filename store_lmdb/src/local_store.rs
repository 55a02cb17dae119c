//! LMDB implementation of the preferred storage tier.

use async_trait::async_trait;
use hearth_store::{PreferredStore, StoreError};
use hearth_types::VersionedEnvelope;

use crate::{LmdbEnvironment, LmdbError};

/// Key under which the envelope document is stored.
const ENVELOPE_KEY: &str = "data";

/// Preferred tier backed by a single LMDB entry holding the envelope as JSON.
pub struct LmdbLocalStore {
    env: LmdbEnvironment,
}

impl LmdbLocalStore {
    pub fn new(env: LmdbEnvironment) -> Self {
        Self { env }
    }

    fn read(env: &LmdbEnvironment) -> Result<Option<VersionedEnvelope>, LmdbError> {
        match env.get(ENVELOPE_KEY)? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    fn write(env: &LmdbEnvironment, envelope: &VersionedEnvelope) -> Result<(), LmdbError> {
        let bytes = serde_json::to_vec(envelope)?;
        env.put(ENVELOPE_KEY, &bytes)
    }

    /// Remove the stored envelope.
    pub fn clear(&self) -> Result<(), StoreError> {
        self.env.delete(ENVELOPE_KEY)?;
        Ok(())
    }
}

#[async_trait]
impl PreferredStore for LmdbLocalStore {
    fn is_supported(&self) -> bool {
        true
    }

    async fn get(&self) -> Result<Option<VersionedEnvelope>, StoreError> {
        let env = self.env.clone();
        let envelope = tokio::task::spawn_blocking(move || Self::read(&env))
            .await
            .map_err(|e| LmdbError::Join(e.to_string()))??;
        Ok(envelope)
    }

    async fn set(&self, envelope: &VersionedEnvelope) -> Result<(), StoreError> {
        let env = self.env.clone();
        let envelope = envelope.clone();
        tokio::task::spawn_blocking(move || Self::write(&env, &envelope))
            .await
            .map_err(|e| LmdbError::Join(e.to_string()))??;
        tracing::trace!("envelope written to LMDB tier");
        Ok(())
    }
}
