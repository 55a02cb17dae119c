//! Abstract storage tiers for the persisted state envelope.
//!
//! The envelope lives in two cooperating tiers: a fast, asynchronous
//! *preferred* tier and a synchronous *fallback* tier kept for recovery.
//! Every backend (LMDB, JSON file, in-memory for testing) implements these
//! traits. The rest of the codebase depends only on the traits.

pub mod error;
pub mod fallback;
pub mod preferred;

pub use error::StoreError;
pub use fallback::FallbackStore;
pub use preferred::PreferredStore;
