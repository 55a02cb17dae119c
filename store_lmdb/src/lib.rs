//! On-disk storage tiers for the Hearth state envelope.
//!
//! - [`LmdbLocalStore`] implements the preferred tier on top of the `heed`
//!   LMDB bindings. Reads and writes run on the blocking pool.
//! - [`JsonDiskStore`] implements the synchronous fallback tier as a single
//!   JSON document, replaced atomically on write.

pub mod disk_store;
pub mod environment;
pub mod error;
pub mod local_store;

pub use disk_store::JsonDiskStore;
pub use environment::LmdbEnvironment;
pub use error::LmdbError;
pub use local_store::LmdbLocalStore;
