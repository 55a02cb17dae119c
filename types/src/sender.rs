//! Metadata the platform attaches to an inbound channel.

use serde::{Deserialize, Serialize};
use std::fmt;
use url::Url;

use crate::TypesError;

/// A browser tab identifier.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TabId(i64);

impl TabId {
    pub fn new(raw: i64) -> Self {
        Self(raw)
    }

    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl fmt::Display for TabId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Who opened a channel, when the platform knows.
///
/// Both fields are optional: background scripts and other extensions
/// connect without a tab, and some platforms omit the url.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SenderMetadata {
    #[serde(default)]
    pub tab_id: Option<TabId>,
    #[serde(default)]
    pub url: Option<String>,
}

impl SenderMetadata {
    pub fn new(tab_id: Option<TabId>, url: Option<String>) -> Self {
        Self { tab_id, url }
    }

    /// Metadata for a sender that lives in a tab at `url`.
    pub fn tab(tab_id: TabId, url: impl Into<String>) -> Self {
        Self {
            tab_id: Some(tab_id),
            url: Some(url.into()),
        }
    }

    /// Hostname of the sender url (no scheme, no port).
    pub fn origin_host(&self) -> Result<Option<String>, TypesError> {
        match &self.url {
            Some(raw) => origin_host(raw).map(Some),
            None => Ok(None),
        }
    }
}

/// Extract the hostname from a url string.
pub fn origin_host(raw: &str) -> Result<String, TypesError> {
    let url = Url::parse(raw).map_err(|e| TypesError::InvalidUrl(format!("{raw}: {e}")))?;
    url.host_str()
        .map(str::to_string)
        .ok_or_else(|| TypesError::MissingHost(raw.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn origin_host_strips_scheme_port_and_path() {
        let meta = SenderMetadata::tab(TabId::new(3), "https://app.example.org:8443/swap?x=1");
        assert_eq!(
            meta.origin_host().expect("valid url"),
            Some("app.example.org".to_string())
        );
    }

    #[test]
    fn missing_url_has_no_origin() {
        let meta = SenderMetadata::new(Some(TabId::new(1)), None);
        assert_eq!(meta.origin_host().expect("no url is fine"), None);
    }

    #[test]
    fn garbage_url_is_an_error() {
        assert!(matches!(
            origin_host("not a url"),
            Err(TypesError::InvalidUrl(_))
        ));
    }

    #[test]
    fn url_without_host_is_an_error() {
        assert!(matches!(
            origin_host("data:text/plain,hello"),
            Err(TypesError::MissingHost(_))
        ));
    }
}
