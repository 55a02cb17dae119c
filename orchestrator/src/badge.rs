//! Toolbar badge showing the number of requests awaiting approval.

use std::sync::Arc;

use hearth_interfaces::{Badge, Platform, PlatformError};
use hearth_types::{ApprovalQueue, PendingQueueSnapshot};

/// Badge text for `count` pending requests: empty when there are none.
pub fn badge_label(count: u32) -> String {
    if count == 0 {
        String::new()
    } else {
        count.to_string()
    }
}

pub struct PendingRequestAggregator {
    platform: Arc<dyn Platform>,
    color: String,
    snapshot: PendingQueueSnapshot,
}

impl PendingRequestAggregator {
    pub fn new(platform: Arc<dyn Platform>, color: impl Into<String>) -> Self {
        Self {
            platform,
            color: color.into(),
            snapshot: PendingQueueSnapshot::default(),
        }
    }

    /// Record a queue's new size. Returns whether the badge count changed.
    pub fn update(&mut self, queue: ApprovalQueue, count: u32) -> bool {
        let before = self.badge_count();
        self.snapshot.set(queue, count);
        self.badge_count() != before
    }

    pub fn badge_count(&self) -> u32 {
        self.snapshot.badge_count()
    }

    pub fn snapshot(&self) -> PendingQueueSnapshot {
        self.snapshot
    }

    pub fn badge(&self) -> Badge {
        Badge {
            text: badge_label(self.badge_count()),
            color: self.color.clone(),
        }
    }

    pub async fn render(&self) -> Result<(), PlatformError> {
        let badge = self.badge();
        tracing::trace!(text = %badge.text, "updating badge");
        self.platform.set_badge(badge).await
    }
}
