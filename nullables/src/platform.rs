//! Nullable platform: an in-memory browser that records every call.

use std::sync::Mutex;

use async_trait::async_trait;
use hearth_interfaces::{
    Badge, Notification, Platform, PlatformError, TabInfo, WindowInfo, WindowOptions,
};
use hearth_types::TabId;
use tokio::sync::broadcast;

#[derive(Default)]
struct PlatformState {
    next_window_id: i64,
    next_tab_id: i64,
    windows: Vec<WindowInfo>,
    tabs: Vec<TabInfo>,
    opened_windows: Vec<WindowOptions>,
    focused_windows: Vec<i64>,
    badges: Vec<Badge>,
    notifications: Vec<Notification>,
    fail_calls: bool,
}

/// A deterministic platform for testing.
///
/// Windows and tabs exist only in memory. Tests arrange active tabs with
/// [`set_active_tabs`](NullPlatform::set_active_tabs) and simulate the user
/// closing a window with [`close_window`](Platform::close_window).
pub struct NullPlatform {
    version: String,
    languages: Vec<String>,
    state: Mutex<PlatformState>,
    window_removed: broadcast::Sender<i64>,
}

impl NullPlatform {
    pub fn new() -> Self {
        Self {
            version: "0.0.0-null".to_string(),
            languages: vec!["en-US".to_string()],
            state: Mutex::new(PlatformState {
                next_window_id: 1,
                next_tab_id: 1000,
                ..PlatformState::default()
            }),
            window_removed: broadcast::channel(16).0,
        }
    }

    pub fn with_languages(mut self, languages: &[&str]) -> Self {
        self.languages = languages.iter().map(|l| l.to_string()).collect();
        self
    }

    /// Replace the set of tabs; the given ids are active, the rest are not.
    pub fn set_active_tabs(&self, ids: &[TabId]) {
        let mut state = self.state.lock().unwrap();
        state.tabs = ids
            .iter()
            .map(|id| TabInfo {
                id: *id,
                url: None,
                active: true,
            })
            .collect();
    }

    /// Make every subsequent async call fail (or succeed again).
    pub fn set_fail_calls(&self, fail: bool) {
        self.state.lock().unwrap().fail_calls = fail;
    }

    pub fn opened_windows(&self) -> Vec<WindowOptions> {
        self.state.lock().unwrap().opened_windows.clone()
    }

    pub fn focused_windows(&self) -> Vec<i64> {
        self.state.lock().unwrap().focused_windows.clone()
    }

    pub fn windows(&self) -> Vec<WindowInfo> {
        self.state.lock().unwrap().windows.clone()
    }

    pub fn badges(&self) -> Vec<Badge> {
        self.state.lock().unwrap().badges.clone()
    }

    pub fn last_badge(&self) -> Option<Badge> {
        self.state.lock().unwrap().badges.last().cloned()
    }

    pub fn notifications(&self) -> Vec<Notification> {
        self.state.lock().unwrap().notifications.clone()
    }

    fn check(&self) -> Result<(), PlatformError> {
        if self.state.lock().unwrap().fail_calls {
            Err(PlatformError::Call("null platform refused the call".into()))
        } else {
            Ok(())
        }
    }
}

impl Default for NullPlatform {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Platform for NullPlatform {
    async fn open_window(&self, options: WindowOptions) -> Result<WindowInfo, PlatformError> {
        self.check()?;
        let mut state = self.state.lock().unwrap();
        let window = WindowInfo {
            id: state.next_window_id,
            kind: options.kind,
        };
        state.next_window_id += 1;
        state.windows.push(window.clone());
        state.opened_windows.push(options);
        Ok(window)
    }

    async fn close_window(&self, window_id: i64) -> Result<(), PlatformError> {
        self.check()?;
        let mut state = self.state.lock().unwrap();
        let before = state.windows.len();
        state.windows.retain(|w| w.id != window_id);
        if state.windows.len() == before {
            return Err(PlatformError::WindowNotFound(window_id));
        }
        drop(state);
        let _ = self.window_removed.send(window_id);
        Ok(())
    }

    async fn focus_window(&self, window_id: i64) -> Result<(), PlatformError> {
        self.check()?;
        let mut state = self.state.lock().unwrap();
        if !state.windows.iter().any(|w| w.id == window_id) {
            return Err(PlatformError::WindowNotFound(window_id));
        }
        state.focused_windows.push(window_id);
        Ok(())
    }

    async fn get_all_windows(&self) -> Result<Vec<WindowInfo>, PlatformError> {
        self.check()?;
        Ok(self.windows())
    }

    fn subscribe_window_removed(&self) -> broadcast::Receiver<i64> {
        self.window_removed.subscribe()
    }

    async fn open_tab(&self, url: &str) -> Result<TabInfo, PlatformError> {
        self.check()?;
        let mut state = self.state.lock().unwrap();
        let tab = TabInfo {
            id: TabId::new(state.next_tab_id),
            url: Some(url.to_string()),
            active: false,
        };
        state.next_tab_id += 1;
        state.tabs.push(tab.clone());
        Ok(tab)
    }

    async fn get_active_tabs(&self) -> Result<Vec<TabInfo>, PlatformError> {
        self.check()?;
        let state = self.state.lock().unwrap();
        Ok(state.tabs.iter().filter(|t| t.active).cloned().collect())
    }

    async fn switch_to_tab(&self, tab_id: TabId) -> Result<(), PlatformError> {
        self.check()?;
        let mut state = self.state.lock().unwrap();
        if !state.tabs.iter().any(|t| t.id == tab_id) {
            return Err(PlatformError::TabNotFound(tab_id));
        }
        for tab in state.tabs.iter_mut() {
            tab.active = tab.id == tab_id;
        }
        Ok(())
    }

    async fn close_tab(&self, tab_id: TabId) -> Result<(), PlatformError> {
        self.check()?;
        let mut state = self.state.lock().unwrap();
        let before = state.tabs.len();
        state.tabs.retain(|t| t.id != tab_id);
        if state.tabs.len() == before {
            return Err(PlatformError::TabNotFound(tab_id));
        }
        Ok(())
    }

    async fn show_notification(&self, notification: Notification) -> Result<(), PlatformError> {
        self.check()?;
        self.state.lock().unwrap().notifications.push(notification);
        Ok(())
    }

    async fn set_badge(&self, badge: Badge) -> Result<(), PlatformError> {
        self.check()?;
        self.state.lock().unwrap().badges.push(badge);
        Ok(())
    }

    fn version(&self) -> String {
        self.version.clone()
    }

    fn preferred_languages(&self) -> Vec<String> {
        self.languages.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hearth_interfaces::WindowKind;

    fn popup_options() -> WindowOptions {
        WindowOptions {
            url: "notification.html".into(),
            kind: WindowKind::Popup,
            width: 357,
            height: 620,
        }
    }

    #[tokio::test]
    async fn windows_open_focus_close() {
        let platform = NullPlatform::new();
        let window = platform.open_window(popup_options()).await.unwrap();
        assert_eq!(window.kind, WindowKind::Popup);
        platform.focus_window(window.id).await.unwrap();
        assert_eq!(platform.focused_windows(), vec![window.id]);
        platform.close_window(window.id).await.unwrap();
        assert!(platform.get_all_windows().await.unwrap().is_empty());
        assert!(matches!(
            platform.focus_window(window.id).await,
            Err(PlatformError::WindowNotFound(_))
        ));
    }

    #[tokio::test]
    async fn closing_a_window_announces_its_removal() {
        let platform = NullPlatform::new();
        let mut removed = platform.subscribe_window_removed();
        let window = platform.open_window(popup_options()).await.unwrap();
        platform.close_window(window.id).await.unwrap();
        assert_eq!(removed.recv().await.unwrap(), window.id);
        assert!(platform.close_window(window.id).await.is_err());
        assert!(removed.try_recv().is_err());
    }

    #[tokio::test]
    async fn switching_tabs_changes_the_active_set() {
        let platform = NullPlatform::new();
        let a = platform.open_tab("https://a.example").await.unwrap();
        let b = platform.open_tab("https://b.example").await.unwrap();
        assert!(platform.get_active_tabs().await.unwrap().is_empty());

        platform.switch_to_tab(b.id).await.unwrap();
        let active = platform.get_active_tabs().await.unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].id, b.id);

        platform.close_tab(a.id).await.unwrap();
        assert!(platform.close_tab(a.id).await.is_err());
    }

    #[tokio::test]
    async fn failing_platform_refuses_calls() {
        let platform = NullPlatform::new();
        platform.set_fail_calls(true);
        assert!(platform.open_window(popup_options()).await.is_err());
        assert!(platform.opened_windows().is_empty());
    }
}
