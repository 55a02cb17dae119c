//! Hearth background orchestrator.
//!
//! Keeps one persisted wallet state document consistent across restarts and
//! schema changes, and routes every UI surface and web page that connects to
//! the wallet controller:
//!
//! - [`state_store`] and [`migrator`] load, repair and migrate the envelope.
//! - [`persistence`] writes controller state back, debounced.
//! - [`router`] and [`registry`] classify and track inbound connections.
//! - [`badge`] and [`popup`] drive the toolbar badge and approval window.
//! - [`orchestrator`] wires them together.

pub mod badge;
pub mod config;
pub mod error;
pub mod first_time;
pub mod lifecycle;
pub mod logging;
pub mod migrator;
pub mod orchestrator;
pub mod persistence;
pub mod popup;
pub mod registry;
pub mod router;
pub mod shutdown;
pub mod state_store;
pub mod telemetry;
pub mod tx_reporter;

pub use badge::{badge_label, PendingRequestAggregator};
pub use config::{MigrationFailurePolicy, OrchestratorConfig};
pub use error::OrchestratorError;
pub use first_time::{default_first_time_state, load_first_time_state};
pub use lifecycle::{LifecycleTracker, SurfaceState};
pub use logging::{init_logging, LogFormat};
pub use migrator::{FnMigration, Migration, MigrationError, Migrator};
pub use orchestrator::{ControllerInit, Orchestrator, RunningOrchestrator};
pub use persistence::{PersistenceError, PersistencePipeline};
pub use popup::{NotificationManager, PopupCoordinator};
pub use registry::{Connection, ContextRegistry, LifecycleChange, SharedRegistry};
pub use router::{ConnectionOutcome, ConnectionRouter};
pub use shutdown::ShutdownController;
pub use state_store::VersionedStateStore;
pub use telemetry::TracingTelemetry;
pub use tx_reporter::TxStatusReporter;
