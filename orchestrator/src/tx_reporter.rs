//! Reacts to transaction status changes: failures go to telemetry, final
//! outcomes become desktop notifications.

use std::sync::Arc;

use hearth_interfaces::{DiagnosticEvent, Notification, Platform, Telemetry};
use hearth_types::{TxStatus, TxStatusUpdate};

const REVERTED_MESSAGE: &str = "Transaction encountered an error.";

pub struct TxStatusReporter {
    platform: Arc<dyn Platform>,
    telemetry: Arc<dyn Telemetry>,
}

impl TxStatusReporter {
    pub fn new(platform: Arc<dyn Platform>, telemetry: Arc<dyn Telemetry>) -> Self {
        Self {
            platform,
            telemetry,
        }
    }

    pub async fn handle(&self, update: &TxStatusUpdate) {
        if update.status == TxStatus::Failed {
            tracing::warn!(tx_id = update.tx_id, error = ?update.error, "transaction failed");
            self.telemetry.capture(DiagnosticEvent::TransactionFailed {
                tx_id: update.tx_id,
                error: update.error.clone(),
            });
        }

        let Some(notification) = notification_for(update) else {
            return;
        };
        if let Err(e) = self.platform.show_notification(notification).await {
            tracing::warn!(tx_id = update.tx_id, error = %e, "failed to show notification");
        }
    }
}

/// The desktop notification for a final transaction status, if any.
pub fn notification_for(update: &TxStatusUpdate) -> Option<Notification> {
    let nonce = update
        .nonce_value()
        .map_or_else(|| format!("#{}", update.tx_id), |n| n.to_string());
    match update.status {
        TxStatus::Confirmed if update.reverted_on_chain() => Some(failed(&nonce, REVERTED_MESSAGE)),
        TxStatus::Confirmed => Some(match &update.explorer {
            Some(link) => Notification {
                title: "Confirmed transaction".to_string(),
                message: format!("Transaction {nonce} confirmed! View on {}", link.name),
                url: Some(link.url.clone()),
            },
            None => Notification {
                title: "Confirmed transaction".to_string(),
                message: format!("Transaction {nonce} confirmed!"),
                url: None,
            },
        }),
        TxStatus::Failed => Some(failed(
            &nonce,
            update.error.as_deref().unwrap_or("Unknown error"),
        )),
        _ => None,
    }
}

fn failed(nonce: &str, reason: &str) -> Notification {
    Notification {
        title: "Failed transaction".to_string(),
        message: format!("Transaction {nonce} failed! {reason}"),
        url: None,
    }
}
