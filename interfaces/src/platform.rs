//! Platform capability surface (windows, tabs, notifications, badge).

use async_trait::async_trait;
use hearth_types::TabId;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::broadcast;

#[derive(Debug, Error)]
pub enum PlatformError {
    #[error("window {0} not found")]
    WindowNotFound(i64),

    #[error("tab {0} not found")]
    TabNotFound(TabId),

    #[error("platform call failed: {0}")]
    Call(String),
}

/// Type of a browser window.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WindowKind {
    Normal,
    Popup,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowInfo {
    pub id: i64,
    pub kind: WindowKind,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowOptions {
    pub url: String,
    pub kind: WindowKind,
    pub width: u32,
    pub height: u32,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TabInfo {
    pub id: TabId,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub active: bool,
}

/// Toolbar badge contents.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Badge {
    pub text: String,
    pub color: String,
}

/// A desktop notification.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub title: String,
    pub message: String,
    /// Link opened when the notification is clicked.
    #[serde(default)]
    pub url: Option<String>,
}

/// Everything the orchestrator needs from the host platform.
///
/// Implementations wrap the host's callback APIs; the orchestrator depends
/// only on this trait so it can run against an in-memory platform in tests.
#[async_trait]
pub trait Platform: Send + Sync {
    async fn open_window(&self, options: WindowOptions) -> Result<WindowInfo, PlatformError>;

    async fn close_window(&self, window_id: i64) -> Result<(), PlatformError>;

    async fn focus_window(&self, window_id: i64) -> Result<(), PlatformError>;

    async fn get_all_windows(&self) -> Result<Vec<WindowInfo>, PlatformError>;

    /// Ids of windows as they are removed, whether closed by the user or
    /// through [`close_window`](Platform::close_window).
    fn subscribe_window_removed(&self) -> broadcast::Receiver<i64>;

    async fn open_tab(&self, url: &str) -> Result<TabInfo, PlatformError>;

    /// Tabs that are currently active in any window.
    async fn get_active_tabs(&self) -> Result<Vec<TabInfo>, PlatformError>;

    /// Highlight and activate a tab.
    async fn switch_to_tab(&self, tab_id: TabId) -> Result<(), PlatformError>;

    async fn close_tab(&self, tab_id: TabId) -> Result<(), PlatformError>;

    async fn show_notification(&self, notification: Notification) -> Result<(), PlatformError>;

    async fn set_badge(&self, badge: Badge) -> Result<(), PlatformError>;

    /// Version of the running wallet build.
    fn version(&self) -> String;

    /// User's preferred languages, most preferred first (e.g. `"en-US"`).
    fn preferred_languages(&self) -> Vec<String>;
}
