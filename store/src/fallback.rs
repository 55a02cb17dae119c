//! Fallback (synchronous) storage tier.

use hearth_types::VersionedEnvelope;

use crate::StoreError;

/// The older, synchronous tier. It is consulted when the preferred tier has
/// nothing and serves as the recovery source when the preferred tier holds
/// an envelope without data.
pub trait FallbackStore: Send + Sync {
    /// Read the stored envelope. `Ok(None)` means nothing has been stored yet.
    fn get_state(&self) -> Result<Option<VersionedEnvelope>, StoreError>;

    /// Replace the stored envelope.
    fn put_state(&self, envelope: &VersionedEnvelope) -> Result<(), StoreError>;
}
