//! Open/closed tracking for the internal UI surfaces.
//!
//! Each surface kind is tracked independently: closing the popup never
//! touches the notification flag or the fullscreen tab set. The approval
//! surface (the notification window) additionally runs a small state machine
//! published over a watch channel so callers can wait for it to close.

use std::collections::BTreeSet;

use hearth_types::{ContextKind, TabId};
use tokio::sync::watch;

/// Approval surface state.
///
/// `NoSurfaceOpen -> SurfaceOpening -> SurfaceOpen -> SurfaceClosed -> NoSurfaceOpen`
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SurfaceState {
    NoSurfaceOpen,
    SurfaceOpening,
    SurfaceOpen,
    SurfaceClosed,
}

impl SurfaceState {
    /// An approval surface is being shown or about to be.
    pub fn is_active(self) -> bool {
        matches!(self, Self::SurfaceOpening | Self::SurfaceOpen)
    }
}

pub struct LifecycleTracker {
    popup_open: bool,
    notification_open: bool,
    fullscreen_tabs: BTreeSet<TabId>,
    surface: watch::Sender<SurfaceState>,
}

impl LifecycleTracker {
    pub fn new() -> Self {
        let (surface, _) = watch::channel(SurfaceState::NoSurfaceOpen);
        Self {
            popup_open: false,
            notification_open: false,
            fullscreen_tabs: BTreeSet::new(),
            surface,
        }
    }

    /// Popup open, notification open, or at least one fullscreen tab open.
    pub fn client_open(&self) -> bool {
        self.popup_open || self.notification_open || !self.fullscreen_tabs.is_empty()
    }

    pub fn popup_open(&self) -> bool {
        self.popup_open
    }

    pub fn notification_open(&self) -> bool {
        self.notification_open
    }

    pub fn fullscreen_tabs(&self) -> Vec<TabId> {
        self.fullscreen_tabs.iter().copied().collect()
    }

    /// Record a surface opening. External pages are not tracked.
    pub fn mark_open(&mut self, kind: ContextKind, tab_id: Option<TabId>) {
        match kind {
            ContextKind::Popup => self.popup_open = true,
            ContextKind::Notification => {
                self.notification_open = true;
                self.surface.send_replace(SurfaceState::SurfaceOpen);
            }
            ContextKind::FullscreenTab => {
                if let Some(tab) = tab_id {
                    self.fullscreen_tabs.insert(tab);
                }
            }
            ContextKind::ExternalPage => {}
        }
    }

    pub fn mark_closed(&mut self, kind: ContextKind, tab_id: Option<TabId>) {
        match kind {
            ContextKind::Popup => self.popup_open = false,
            ContextKind::Notification => {
                self.notification_open = false;
                self.surface.send_replace(SurfaceState::SurfaceClosed);
                self.surface.send_replace(SurfaceState::NoSurfaceOpen);
            }
            ContextKind::FullscreenTab => {
                if let Some(tab) = tab_id {
                    self.fullscreen_tabs.remove(&tab);
                }
            }
            ContextKind::ExternalPage => {}
        }
    }

    pub fn surface_state(&self) -> SurfaceState {
        *self.surface.borrow()
    }

    pub fn subscribe_surface(&self) -> watch::Receiver<SurfaceState> {
        self.surface.subscribe()
    }

    /// An approval window has been requested. Returns `false` if one is
    /// already opening or open.
    pub fn mark_surface_opening(&mut self) -> bool {
        if self.surface_state().is_active() {
            return false;
        }
        self.surface.send_replace(SurfaceState::SurfaceOpening);
        true
    }

    /// Undo [`mark_surface_opening`](Self::mark_surface_opening) after the
    /// window failed to open.
    pub fn reset_surface_if_opening(&mut self) {
        if self.surface_state() == SurfaceState::SurfaceOpening {
            self.surface.send_replace(SurfaceState::NoSurfaceOpen);
        }
    }
}

impl Default for LifecycleTracker {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn surfaces_are_independent() {
        let mut tracker = LifecycleTracker::new();
        tracker.mark_open(ContextKind::Popup, None);
        tracker.mark_open(ContextKind::FullscreenTab, Some(TabId::new(4)));
        tracker.mark_closed(ContextKind::Popup, None);

        assert!(!tracker.popup_open());
        assert_eq!(tracker.fullscreen_tabs(), vec![TabId::new(4)]);
        assert!(tracker.client_open());

        tracker.mark_closed(ContextKind::FullscreenTab, Some(TabId::new(4)));
        assert!(!tracker.client_open());
    }

    #[test]
    fn fullscreen_tabs_are_tracked_per_tab() {
        let mut tracker = LifecycleTracker::new();
        tracker.mark_open(ContextKind::FullscreenTab, Some(TabId::new(1)));
        tracker.mark_open(ContextKind::FullscreenTab, Some(TabId::new(2)));
        tracker.mark_closed(ContextKind::FullscreenTab, Some(TabId::new(1)));
        assert_eq!(tracker.fullscreen_tabs(), vec![TabId::new(2)]);

        tracker.mark_open(ContextKind::FullscreenTab, None);
        assert_eq!(tracker.fullscreen_tabs().len(), 1);
    }

    #[test]
    fn external_pages_never_open_the_client() {
        let mut tracker = LifecycleTracker::new();
        tracker.mark_open(ContextKind::ExternalPage, Some(TabId::new(9)));
        assert!(!tracker.client_open());
    }

    #[test]
    fn approval_surface_state_machine() {
        let mut tracker = LifecycleTracker::new();
        assert_eq!(tracker.surface_state(), SurfaceState::NoSurfaceOpen);

        assert!(tracker.mark_surface_opening());
        assert!(!tracker.mark_surface_opening());
        assert_eq!(tracker.surface_state(), SurfaceState::SurfaceOpening);

        tracker.mark_open(ContextKind::Notification, None);
        assert_eq!(tracker.surface_state(), SurfaceState::SurfaceOpen);
        assert!(tracker.client_open());

        tracker.mark_closed(ContextKind::Notification, None);
        assert_eq!(tracker.surface_state(), SurfaceState::NoSurfaceOpen);
        assert!(!tracker.notification_open());
    }

    #[test]
    fn failed_open_resets_surface() {
        let mut tracker = LifecycleTracker::new();
        tracker.mark_surface_opening();
        tracker.reset_surface_if_opening();
        assert_eq!(tracker.surface_state(), SurfaceState::NoSurfaceOpen);

        tracker.mark_open(ContextKind::Notification, None);
        tracker.reset_surface_if_opening();
        assert_eq!(tracker.surface_state(), SurfaceState::SurfaceOpen);
    }

    #[tokio::test]
    async fn watchers_see_the_close() {
        let mut tracker = LifecycleTracker::new();
        tracker.mark_surface_opening();
        let mut rx = tracker.subscribe_surface();

        let waiter = tokio::spawn(async move {
            rx.wait_for(|s| !s.is_active()).await.map(|s| *s).ok()
        });
        tracker.mark_open(ContextKind::Notification, None);
        tracker.mark_closed(ContextKind::Notification, None);

        assert_eq!(waiter.await.unwrap(), Some(SurfaceState::NoSurfaceOpen));
    }
}
