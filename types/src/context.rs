//! Execution contexts that open channels to the orchestrator.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Port name used by the browser-action popup.
pub const POPUP_PORT_NAME: &str = "popup";
/// Port name used by the approval notification window.
pub const NOTIFICATION_PORT_NAME: &str = "notification";
/// Port name used by a full-screen wallet tab.
pub const FULLSCREEN_PORT_NAME: &str = "fullscreen";

/// The kind of execution context on the far side of a channel.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ContextKind {
    /// The browser-action popup.
    Popup,
    /// The approval notification window.
    Notification,
    /// A full-screen wallet tab. Several may be open at once.
    FullscreenTab,
    /// A web page or another extension.
    ExternalPage,
}

impl ContextKind {
    /// Classify a channel by its declared port name.
    ///
    /// Any name that is not one of the three internal surface names is an
    /// external page.
    pub fn from_port_name(name: &str) -> Self {
        match name {
            POPUP_PORT_NAME => Self::Popup,
            NOTIFICATION_PORT_NAME => Self::Notification,
            FULLSCREEN_PORT_NAME => Self::FullscreenTab,
            _ => Self::ExternalPage,
        }
    }

    /// The trust level granted to this kind of context.
    pub fn trust(&self) -> Trust {
        match self {
            Self::ExternalPage => Trust::Untrusted,
            _ => Trust::Trusted,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Popup => POPUP_PORT_NAME,
            Self::Notification => NOTIFICATION_PORT_NAME,
            Self::FullscreenTab => FULLSCREEN_PORT_NAME,
            Self::ExternalPage => "external",
        }
    }
}

impl fmt::Display for ContextKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether a channel gets the privileged controller API.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Trust {
    Trusted,
    Untrusted,
}

/// Open/closed state of a single connection.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Lifecycle {
    Open,
    Closed,
}

/// Router-assigned identifier of an accepted connection.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ConnectionId(u64);

impl ConnectionId {
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn internal_names_are_trusted() {
        for name in [POPUP_PORT_NAME, NOTIFICATION_PORT_NAME, FULLSCREEN_PORT_NAME] {
            assert_eq!(ContextKind::from_port_name(name).trust(), Trust::Trusted);
        }
    }

    #[test]
    fn anything_else_is_an_external_page() {
        let kind = ContextKind::from_port_name("contentscript");
        assert_eq!(kind, ContextKind::ExternalPage);
        assert_eq!(kind.trust(), Trust::Untrusted);
        // Names are matched exactly.
        assert_eq!(ContextKind::from_port_name("Popup"), ContextKind::ExternalPage);
    }
}
