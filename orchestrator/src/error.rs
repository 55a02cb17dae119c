use thiserror::Error;

use crate::migrator::MigrationError;
use crate::persistence::PersistenceError;

#[derive(Debug, Error)]
pub enum OrchestratorError {
    #[error("store error: {0}")]
    Store(#[from] hearth_store::StoreError),

    #[error("migration error: {0}")]
    Migration(#[from] MigrationError),

    #[error("persistence pipeline failed: {0}")]
    Persistence(#[from] PersistenceError),

    #[error("platform error: {0}")]
    Platform(#[from] hearth_interfaces::PlatformError),

    /// Every recovery path was exhausted and the migrated envelope has no data.
    #[error("state has no data after migration")]
    FatalInitState,

    /// The preferred storage tier is not available on this platform.
    #[error("preferred storage tier not supported")]
    UnsupportedStorageTier,

    #[error("config error: {0}")]
    Config(String),

    #[error("controller error: {0}")]
    Controller(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
