//! Top-level error type shared across crates.

use thiserror::Error;

/// Errors raised while interpreting values that cross a trust boundary.
#[derive(Debug, Error)]
pub enum TypesError {
    #[error("invalid sender url: {0}")]
    InvalidUrl(String),

    #[error("sender url has no host: {0}")]
    MissingHost(String),
}
