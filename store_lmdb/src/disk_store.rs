//! JSON-file implementation of the fallback storage tier.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use hearth_store::{FallbackStore, StoreError};
use hearth_types::VersionedEnvelope;

use crate::LmdbError;

/// Fallback tier: one JSON document at `<dir>/<storage_key>.json`.
///
/// Writes go to a sibling temp file that is then renamed over the target,
/// so a crash mid-write leaves the previous document intact.
pub struct JsonDiskStore {
    path: PathBuf,
}

impl JsonDiskStore {
    pub fn new(dir: &Path, storage_key: &str) -> Self {
        Self {
            path: dir.join(format!("{storage_key}.json")),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read(&self) -> Result<Option<VersionedEnvelope>, LmdbError> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(None);
        }
        Ok(Some(serde_json::from_slice(&bytes)?))
    }

    fn write(&self, envelope: &VersionedEnvelope) -> Result<(), LmdbError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, serde_json::to_vec_pretty(envelope)?)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

impl FallbackStore for JsonDiskStore {
    fn get_state(&self) -> Result<Option<VersionedEnvelope>, StoreError> {
        self.read().map_err(|e| match e {
            LmdbError::Serialization(msg) => {
                StoreError::Corruption(format!("{}: {msg}", self.path.display()))
            }
            other => other.into(),
        })
    }

    fn put_state(&self, envelope: &VersionedEnvelope) -> Result<(), StoreError> {
        self.write(envelope)?;
        tracing::trace!(path = %self.path.display(), "envelope written to disk tier");
        Ok(())
    }
}
