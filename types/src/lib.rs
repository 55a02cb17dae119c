//! Fundamental types for the Hearth wallet orchestrator.
//!
//! This crate defines the types shared across every other crate in the workspace:
//! the persisted state envelope, connection contexts and trust levels, sender
//! metadata, inbound message shapes, pending approval queues and transaction
//! status updates.

pub mod context;
pub mod envelope;
pub mod error;
pub mod message;
pub mod pending;
pub mod sender;
pub mod tx;

pub use context::{ConnectionId, ContextKind, Lifecycle, Trust};
pub use envelope::VersionedEnvelope;
pub use error::TypesError;
pub use message::{InboundMessage, MessageData, REQUEST_ACCOUNTS_METHOD};
pub use pending::{ApprovalQueue, PendingQueueSnapshot};
pub use sender::{SenderMetadata, TabId};
pub use tx::{ExplorerLink, TxStatus, TxStatusUpdate};
