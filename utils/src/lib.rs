//! Shared utilities for the Hearth wallet orchestrator.

pub mod structure;

pub use structure::obj_structure;
