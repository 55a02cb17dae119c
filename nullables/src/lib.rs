//! Nullable infrastructure for deterministic testing.
//!
//! All external collaborators of the orchestrator (storage tiers, platform,
//! telemetry, the wallet controller) are abstracted behind traits. This crate
//! provides test-friendly implementations that:
//! - Return deterministic values
//! - Can be controlled programmatically
//! - Record every call for assertions
//! - Never touch the filesystem, a browser or the network
//!
//! Usage: swap real implementations for nullables in tests.

pub mod controller;
pub mod platform;
pub mod store;
pub mod telemetry;

pub use controller::{NullController, StreamSetup};
pub use platform::NullPlatform;
pub use store::{NullFallbackStore, NullPreferredStore};
pub use telemetry::NullTelemetry;
