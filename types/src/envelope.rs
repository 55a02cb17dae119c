//! The versioned state envelope persisted across restarts.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The `{ version, data }` wrapper written to every storage tier.
///
/// `version` is the highest migration version that has been applied to
/// `data`. A JSON `null` or absent `data` field deserializes to `None`,
/// which marks the envelope as corrupt.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct VersionedEnvelope {
    #[serde(default)]
    pub version: u32,
    #[serde(default)]
    pub data: Option<Value>,
}

impl VersionedEnvelope {
    pub fn new(version: u32, data: Value) -> Self {
        Self {
            version,
            data: Some(data),
        }
    }

    /// An envelope at `version` that carries no state.
    pub fn empty(version: u32) -> Self {
        Self {
            version,
            data: None,
        }
    }

    /// Whether the envelope carries usable state.
    pub fn has_data(&self) -> bool {
        matches!(&self.data, Some(v) if !v.is_null())
    }

    /// Replace the state, keeping the version.
    pub fn with_data(&self, data: Value) -> Self {
        Self {
            version: self.version,
            data: Some(data),
        }
    }

    /// Consume the envelope and return its state, if any.
    pub fn into_data(self) -> Option<Value> {
        self.data.filter(|v| !v.is_null())
    }
}
