//! Transaction status updates emitted by the controller.

use serde::{Deserialize, Serialize};

/// Lifecycle status of a wallet transaction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TxStatus {
    Unapproved,
    Approved,
    Signed,
    Submitted,
    Confirmed,
    Failed,
    Rejected,
    Dropped,
}

impl TxStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unapproved => "unapproved",
            Self::Approved => "approved",
            Self::Signed => "signed",
            Self::Submitted => "submitted",
            Self::Confirmed => "confirmed",
            Self::Failed => "failed",
            Self::Rejected => "rejected",
            Self::Dropped => "dropped",
        }
    }
}

/// Where a mined transaction can be viewed, resolved by the controller
/// for the transaction's network.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExplorerLink {
    pub name: String,
    pub url: String,
}

/// A status transition for one transaction.
///
/// Carries only what the orchestrator needs for reporting and
/// notifications; transaction parameters never leave the controller.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxStatusUpdate {
    pub tx_id: u64,
    pub status: TxStatus,
    /// Account nonce as a hex string (`0x..`), when known.
    #[serde(default)]
    pub nonce: Option<String>,
    /// Receipt status (`0x1` success, `0x0` on-chain failure), when mined.
    #[serde(default)]
    pub receipt_status: Option<String>,
    /// Error message for failed transactions.
    #[serde(default)]
    pub error: Option<String>,
    /// Block explorer page for the transaction, when its network has one.
    #[serde(default)]
    pub explorer: Option<ExplorerLink>,
}

impl TxStatusUpdate {
    pub fn new(tx_id: u64, status: TxStatus) -> Self {
        Self {
            tx_id,
            status,
            nonce: None,
            receipt_status: None,
            error: None,
            explorer: None,
        }
    }

    /// Decoded nonce, if present and valid hex.
    pub fn nonce_value(&self) -> Option<u64> {
        let raw = self.nonce.as_deref()?;
        let digits = raw.strip_prefix("0x").unwrap_or(raw);
        u64::from_str_radix(digits, 16).ok()
    }

    /// Mined, but the receipt reports an on-chain failure.
    pub fn reverted_on_chain(&self) -> bool {
        self.status == TxStatus::Confirmed && self.receipt_status.as_deref() == Some("0x0")
    }
}
