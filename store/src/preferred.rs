//! Preferred (asynchronous) storage tier.

use async_trait::async_trait;
use hearth_types::VersionedEnvelope;

use crate::StoreError;

/// The tier that is read first at boot and written on every persisted
/// state change.
///
/// Some platforms cannot provide it at all; callers check
/// [`is_supported`](PreferredStore::is_supported) before writing.
#[async_trait]
pub trait PreferredStore: Send + Sync {
    /// Whether this tier is usable on the current platform.
    fn is_supported(&self) -> bool;

    /// Read the stored envelope. `Ok(None)` means nothing has been stored yet.
    async fn get(&self) -> Result<Option<VersionedEnvelope>, StoreError>;

    /// Replace the stored envelope.
    async fn set(&self, envelope: &VersionedEnvelope) -> Result<(), StoreError>;
}
