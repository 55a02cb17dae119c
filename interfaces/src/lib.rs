//! Contracts between the orchestrator and its external collaborators.
//!
//! The orchestrator never talks to a browser, a telemetry backend or the
//! wallet controller directly. It depends only on the traits in this crate:
//! - [`Platform`]: windows, tabs, notifications, badge
//! - [`Telemetry`]: structure-only diagnostic events
//! - [`Controller`]: the wallet controller's narrow connection contract
//!
//! plus the channel types that carry frames between a remote context and
//! the controller.

pub mod controller;
pub mod mux;
pub mod platform;
pub mod telemetry;
pub mod transport;

pub use controller::{Controller, ControllerEvent, ControllerEventSink};
pub use mux::Multiplexer;
pub use platform::{
    Badge, Notification, Platform, PlatformError, TabInfo, WindowInfo, WindowKind, WindowOptions,
};
pub use telemetry::{DiagnosticEvent, Telemetry};
pub use transport::{DuplexStream, PortEnd, RemotePort, PORT_BUFFER};
