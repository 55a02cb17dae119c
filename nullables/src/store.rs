//! Nullable storage tiers: thread-safe in-memory envelopes for testing.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use hearth_store::{FallbackStore, PreferredStore, StoreError};
use hearth_types::VersionedEnvelope;

/// An in-memory preferred tier.
///
/// Can be made unsupported (as on platforms without the async storage API)
/// or made to fail reads or writes.
pub struct NullPreferredStore {
    supported: bool,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
    stored: Mutex<Option<VersionedEnvelope>>,
    writes: Mutex<Vec<VersionedEnvelope>>,
}

impl NullPreferredStore {
    pub fn new() -> Self {
        Self {
            supported: true,
            fail_reads: AtomicBool::new(false),
            fail_writes: AtomicBool::new(false),
            stored: Mutex::new(None),
            writes: Mutex::new(Vec::new()),
        }
    }

    /// A tier that already holds `envelope`.
    pub fn with_envelope(envelope: VersionedEnvelope) -> Self {
        let store = Self::new();
        *store.stored.lock().unwrap() = Some(envelope);
        store
    }

    /// A tier the platform does not provide.
    pub fn unsupported() -> Self {
        Self {
            supported: false,
            ..Self::new()
        }
    }

    /// Make every subsequent `get` fail (or succeed again).
    pub fn set_fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    /// Make every subsequent `set` fail (or succeed again).
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// The currently stored envelope.
    pub fn stored(&self) -> Option<VersionedEnvelope> {
        self.stored.lock().unwrap().clone()
    }

    /// Every successful write, oldest first.
    pub fn writes(&self) -> Vec<VersionedEnvelope> {
        self.writes.lock().unwrap().clone()
    }
}

impl Default for NullPreferredStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PreferredStore for NullPreferredStore {
    fn is_supported(&self) -> bool {
        self.supported
    }

    async fn get(&self) -> Result<Option<VersionedEnvelope>, StoreError> {
        if !self.supported {
            return Err(StoreError::Unsupported);
        }
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(StoreError::Backend("read refused by null store".into()));
        }
        Ok(self.stored())
    }

    async fn set(&self, envelope: &VersionedEnvelope) -> Result<(), StoreError> {
        if !self.supported {
            return Err(StoreError::Unsupported);
        }
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Backend("write refused by null store".into()));
        }
        *self.stored.lock().unwrap() = Some(envelope.clone());
        self.writes.lock().unwrap().push(envelope.clone());
        Ok(())
    }
}

/// An in-memory fallback tier. Can be made to report its contents corrupt.
pub struct NullFallbackStore {
    corrupt: AtomicBool,
    stored: Mutex<Option<VersionedEnvelope>>,
    writes: Mutex<Vec<VersionedEnvelope>>,
}

impl NullFallbackStore {
    pub fn new() -> Self {
        Self {
            corrupt: AtomicBool::new(false),
            stored: Mutex::new(None),
            writes: Mutex::new(Vec::new()),
        }
    }

    pub fn with_envelope(envelope: VersionedEnvelope) -> Self {
        let store = Self::new();
        *store.stored.lock().unwrap() = Some(envelope);
        store
    }

    /// Make every subsequent `get_state` fail as undecodable.
    pub fn set_corrupt(&self, corrupt: bool) {
        self.corrupt.store(corrupt, Ordering::SeqCst);
    }

    pub fn writes(&self) -> Vec<VersionedEnvelope> {
        self.writes.lock().unwrap().clone()
    }
}

impl Default for NullFallbackStore {
    fn default() -> Self {
        Self::new()
    }
}

impl FallbackStore for NullFallbackStore {
    fn get_state(&self) -> Result<Option<VersionedEnvelope>, StoreError> {
        if self.corrupt.load(Ordering::SeqCst) {
            return Err(StoreError::Corruption("null store marked corrupt".into()));
        }
        Ok(self.stored.lock().unwrap().clone())
    }

    fn put_state(&self, envelope: &VersionedEnvelope) -> Result<(), StoreError> {
        *self.stored.lock().unwrap() = Some(envelope.clone());
        self.writes.lock().unwrap().push(envelope.clone());
        Ok(())
    }
}
