//! Context registry: the live connection table.
//!
//! Shared between the connection router (which registers connections as
//! they arrive and removes them on end-of-stream), the popup coordinator
//! (which reads surface state) and the controller (through read snapshots).
//! Owners wrap it in [`SharedRegistry`].

use std::collections::HashMap;
use std::sync::Arc;

use hearth_types::{ConnectionId, ContextKind, Lifecycle, TabId, Trust};
use tokio::sync::{watch, Mutex};

use crate::lifecycle::{LifecycleTracker, SurfaceState};

pub type SharedRegistry = Arc<Mutex<ContextRegistry>>;

/// One inbound channel.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Connection {
    pub id: ConnectionId,
    pub kind: ContextKind,
    pub trust: Trust,
    /// Hostname of the sending page, for untrusted channels that correlate
    /// account requests.
    pub origin_host: Option<String>,
    pub tab_id: Option<TabId>,
    pub lifecycle: Lifecycle,
}

/// Result of a registration or removal.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LifecycleChange {
    pub connection: Connection,
    /// The new client-open value, if this change flipped it.
    pub client_open: Option<bool>,
}

pub struct ContextRegistry {
    next_id: u64,
    connections: HashMap<ConnectionId, Connection>,
    origin_tabs: HashMap<String, TabId>,
    lifecycle: LifecycleTracker,
}

impl ContextRegistry {
    pub fn new() -> Self {
        Self {
            next_id: 1,
            connections: HashMap::new(),
            origin_tabs: HashMap::new(),
            lifecycle: LifecycleTracker::new(),
        }
    }

    pub fn shared() -> SharedRegistry {
        Arc::new(Mutex::new(Self::new()))
    }

    /// Add a connection and mark its surface open.
    pub fn register(
        &mut self,
        kind: ContextKind,
        tab_id: Option<TabId>,
        origin_host: Option<String>,
    ) -> LifecycleChange {
        let id = ConnectionId::new(self.next_id);
        self.next_id += 1;
        let connection = Connection {
            id,
            kind,
            trust: kind.trust(),
            origin_host,
            tab_id,
            lifecycle: Lifecycle::Open,
        };

        let before = self.lifecycle.client_open();
        self.lifecycle.mark_open(kind, tab_id);
        self.connections.insert(id, connection.clone());
        tracing::debug!(connection = %id, kind = %kind, "connection registered");

        LifecycleChange {
            connection,
            client_open: self.flipped(before),
        }
    }

    /// Remove a connection and mark its surface closed. Returns `None` for
    /// an unknown id.
    pub fn unregister(&mut self, id: ConnectionId) -> Option<LifecycleChange> {
        let mut connection = self.connections.remove(&id)?;
        connection.lifecycle = Lifecycle::Closed;

        let before = self.lifecycle.client_open();
        self.lifecycle.mark_closed(connection.kind, connection.tab_id);
        tracing::debug!(connection = %id, kind = %connection.kind, "connection closed");

        Some(LifecycleChange {
            client_open: self.flipped(before),
            connection,
        })
    }

    fn flipped(&self, before: bool) -> Option<bool> {
        let after = self.lifecycle.client_open();
        (after != before).then_some(after)
    }

    /// Remember that the page behind `id` asked for account access.
    /// Returns `false` when the connection carries no origin or tab.
    pub fn record_account_request(&mut self, id: ConnectionId) -> bool {
        let Some(conn) = self.connections.get(&id) else {
            return false;
        };
        let (Some(host), Some(tab)) = (conn.origin_host.clone(), conn.tab_id) else {
            return false;
        };
        tracing::debug!(origin = %host, tab = %tab, "account request correlated");
        self.origin_tabs.insert(host, tab);
        true
    }

    /// Snapshot of origin host to the tab that last requested accounts.
    pub fn request_account_tab_ids(&self) -> HashMap<String, TabId> {
        self.origin_tabs.clone()
    }

    pub fn open_fullscreen_tab_ids(&self) -> Vec<TabId> {
        self.lifecycle.fullscreen_tabs()
    }

    pub fn client_open(&self) -> bool {
        self.lifecycle.client_open()
    }

    pub fn popup_open(&self) -> bool {
        self.lifecycle.popup_open()
    }

    pub fn notification_open(&self) -> bool {
        self.lifecycle.notification_open()
    }

    pub fn surface_state(&self) -> SurfaceState {
        self.lifecycle.surface_state()
    }

    pub fn subscribe_surface(&self) -> watch::Receiver<SurfaceState> {
        self.lifecycle.subscribe_surface()
    }

    pub fn mark_surface_opening(&mut self) -> bool {
        self.lifecycle.mark_surface_opening()
    }

    pub fn reset_surface_if_opening(&mut self) {
        self.lifecycle.reset_surface_if_opening()
    }

    /// Live connections, oldest first.
    pub fn connections(&self) -> Vec<Connection> {
        let mut all: Vec<_> = self.connections.values().cloned().collect();
        all.sort_by_key(|c| c.id);
        all
    }

    pub fn len(&self) -> usize {
        self.connections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }
}

impl Default for ContextRegistry {
    fn default() -> Self {
        Self::new()
    }
}
