use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("storage tier is not supported on this platform")]
    Unsupported,

    #[error("storage backend error: {0}")]
    Backend(String),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("stored envelope is corrupted: {0}")]
    Corruption(String),
}
