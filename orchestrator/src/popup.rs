//! Approval UI: at most one notification window, opened on demand.

use std::sync::Arc;

use hearth_interfaces::{Platform, PlatformError, WindowKind, WindowOptions};
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::{watch, Mutex};

use crate::lifecycle::SurfaceState;
use crate::registry::SharedRegistry;
use crate::OrchestratorError;

/// Owns the approval window. Showing it again focuses the existing window.
pub struct NotificationManager {
    platform: Arc<dyn Platform>,
    options: WindowOptions,
    window_id: Mutex<Option<i64>>,
}

impl NotificationManager {
    pub fn new(platform: Arc<dyn Platform>, url: impl Into<String>, width: u32, height: u32) -> Self {
        Self {
            platform,
            options: WindowOptions {
                url: url.into(),
                kind: WindowKind::Popup,
                width,
                height,
            },
            window_id: Mutex::new(None),
        }
    }

    /// Focus the approval window if it still exists, otherwise open one.
    /// Returns the window id.
    pub async fn show_popup(&self) -> Result<i64, PlatformError> {
        let mut current = self.window_id.lock().await;
        if let Some(id) = self.existing(*current).await? {
            self.platform.focus_window(id).await?;
            tracing::debug!(window = id, "focused approval window");
            return Ok(id);
        }
        let window = self.platform.open_window(self.options.clone()).await?;
        tracing::debug!(window = window.id, "opened approval window");
        *current = Some(window.id);
        Ok(window.id)
    }

    /// Close the approval window if it is open.
    pub async fn close_popup(&self) -> Result<(), PlatformError> {
        let mut current = self.window_id.lock().await;
        if let Some(id) = self.existing(current.take()).await? {
            self.platform.close_window(id).await?;
        }
        Ok(())
    }

    /// The approval window last opened, if it has not been seen closing.
    pub async fn window_id(&self) -> Option<i64> {
        *self.window_id.lock().await
    }

    /// Drop the tracked window if it is `id`. Returns whether it was.
    pub async fn forget_window(&self, id: i64) -> bool {
        let mut current = self.window_id.lock().await;
        if *current == Some(id) {
            *current = None;
            true
        } else {
            false
        }
    }

    async fn existing(&self, id: Option<i64>) -> Result<Option<i64>, PlatformError> {
        let Some(id) = id else {
            return Ok(None);
        };
        let windows = self.platform.get_all_windows().await?;
        Ok(windows
            .iter()
            .any(|w| w.id == id && w.kind == WindowKind::Popup)
            .then_some(id))
    }
}

pub struct PopupCoordinator {
    platform: Arc<dyn Platform>,
    registry: SharedRegistry,
    notifications: NotificationManager,
}

impl PopupCoordinator {
    pub fn new(
        platform: Arc<dyn Platform>,
        registry: SharedRegistry,
        notifications: NotificationManager,
    ) -> Self {
        Self {
            platform,
            registry,
            notifications,
        }
    }

    /// Show the approval window unless the user is already looking at the
    /// wallet: the browser popup is open or a fullscreen wallet tab is
    /// active. Returns whether a window was opened or focused.
    pub async fn trigger_ui(&self) -> Result<bool, OrchestratorError> {
        let active_tabs = self.platform.get_active_tabs().await?;
        let (popup_open, fullscreen_tabs) = {
            let registry = self.registry.lock().await;
            (registry.popup_open(), registry.open_fullscreen_tab_ids())
        };
        let fullscreen_active = active_tabs.iter().any(|t| fullscreen_tabs.contains(&t.id));
        if popup_open || fullscreen_active {
            tracing::debug!(popup_open, fullscreen_active, "wallet already visible");
            return Ok(false);
        }

        self.registry.lock().await.mark_surface_opening();
        if let Err(e) = self.notifications.show_popup().await {
            self.registry.lock().await.reset_surface_if_opening();
            return Err(e.into());
        }
        Ok(true)
    }

    /// [`trigger_ui`](Self::trigger_ui), then wait until the approval window
    /// has closed. Returns immediately when no window was needed.
    ///
    /// A window removed before its UI connects ends the wait as well.
    /// There is no timeout; drop the future to stop waiting.
    pub async fn open_popup_and_wait(&self) -> Result<(), OrchestratorError> {
        let mut surface = self.registry.lock().await.subscribe_surface();
        let mut removed = self.platform.subscribe_window_removed();
        self.trigger_ui().await?;

        let mut watching_removals = true;
        loop {
            tokio::select! {
                _ = surface_settled(&mut surface) => return Ok(()),
                event = removed.recv(), if watching_removals => match event {
                    Ok(id) => self.window_removed(id).await,
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::debug!(skipped, "missed window removals");
                        self.reset_if_window_gone().await?;
                    }
                    Err(RecvError::Closed) => watching_removals = false,
                },
            }
        }
    }

    /// Handle the platform removing window `id`.
    pub async fn window_removed(&self, id: i64) {
        if self.notifications.forget_window(id).await {
            tracing::debug!(window = id, "approval window removed");
            self.registry.lock().await.reset_surface_if_opening();
        }
    }

    async fn reset_if_window_gone(&self) -> Result<(), OrchestratorError> {
        if let Some(id) = self.notifications.window_id().await {
            if self.notifications.existing(Some(id)).await?.is_none() {
                self.window_removed(id).await;
            }
        }
        Ok(())
    }

    /// Close the approval window. A surface whose UI never connected is
    /// reset; a connected one settles when its UI disconnects.
    pub async fn close_popup(&self) -> Result<(), OrchestratorError> {
        self.notifications.close_popup().await?;
        self.registry.lock().await.reset_surface_if_opening();
        Ok(())
    }
}

/// Resolves once no approval surface is opening or open. A dropped
/// registry counts as settled.
async fn surface_settled(surface: &mut watch::Receiver<SurfaceState>) {
    let _ = surface.wait_for(|state| !state.is_active()).await;
}
