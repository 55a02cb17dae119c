//! Shape of messages arriving on an untrusted channel.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// The provider method a page calls to ask for account access.
pub const REQUEST_ACCOUNTS_METHOD: &str = "eth_requestAccounts";

/// `{ data: { method, ... } }` as sent by page scripts.
///
/// Everything is optional; anything the router does not understand is
/// carried in `rest` and forwarded untouched.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct InboundMessage {
    #[serde(default)]
    pub data: Option<MessageData>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct MessageData {
    #[serde(default)]
    pub method: Option<String>,
    #[serde(flatten)]
    pub rest: Map<String, Value>,
}

impl InboundMessage {
    /// Parse a raw frame. Frames that are not objects of this shape yield
    /// an empty message rather than an error.
    pub fn from_value(value: &Value) -> Self {
        serde_json::from_value(value.clone()).unwrap_or_default()
    }

    pub fn method(&self) -> Option<&str> {
        self.data.as_ref().and_then(|d| d.method.as_deref())
    }

    pub fn is_account_request(&self) -> bool {
        self.method() == Some(REQUEST_ACCOUNTS_METHOD)
    }
}
