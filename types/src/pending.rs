//! Pending user-approval queues and their combined count.

use serde::{Deserialize, Serialize};

/// The six independently owned approval queues.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ApprovalQueue {
    /// Unapproved transactions.
    Transaction,
    /// `eth_sign` messages.
    Message,
    /// `personal_sign` messages.
    PersonalMessage,
    /// `eth_decrypt` requests.
    DecryptMessage,
    /// `eth_getEncryptionPublicKey` requests.
    EncryptionPublicKey,
    /// `eth_signTypedData` messages.
    TypedMessage,
}

impl ApprovalQueue {
    pub const ALL: [ApprovalQueue; 6] = [
        Self::Transaction,
        Self::Message,
        Self::PersonalMessage,
        Self::DecryptMessage,
        Self::EncryptionPublicKey,
        Self::TypedMessage,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Transaction => "tx",
            Self::Message => "msg",
            Self::PersonalMessage => "personal_msg",
            Self::DecryptMessage => "decrypt_msg",
            Self::EncryptionPublicKey => "encryption_public_key",
            Self::TypedMessage => "typed_msg",
        }
    }
}

/// Current count of every approval queue.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingQueueSnapshot {
    pub transactions: u32,
    pub messages: u32,
    pub personal_messages: u32,
    pub decrypt_messages: u32,
    pub encryption_public_keys: u32,
    pub typed_messages: u32,
}

impl PendingQueueSnapshot {
    pub fn get(&self, queue: ApprovalQueue) -> u32 {
        match queue {
            ApprovalQueue::Transaction => self.transactions,
            ApprovalQueue::Message => self.messages,
            ApprovalQueue::PersonalMessage => self.personal_messages,
            ApprovalQueue::DecryptMessage => self.decrypt_messages,
            ApprovalQueue::EncryptionPublicKey => self.encryption_public_keys,
            ApprovalQueue::TypedMessage => self.typed_messages,
        }
    }

    pub fn set(&mut self, queue: ApprovalQueue, count: u32) {
        let slot = match queue {
            ApprovalQueue::Transaction => &mut self.transactions,
            ApprovalQueue::Message => &mut self.messages,
            ApprovalQueue::PersonalMessage => &mut self.personal_messages,
            ApprovalQueue::DecryptMessage => &mut self.decrypt_messages,
            ApprovalQueue::EncryptionPublicKey => &mut self.encryption_public_keys,
            ApprovalQueue::TypedMessage => &mut self.typed_messages,
        };
        *slot = count;
    }

    /// Sum of all queues. Saturates instead of wrapping.
    pub fn badge_count(&self) -> u32 {
        ApprovalQueue::ALL
            .iter()
            .fold(0u32, |acc, q| acc.saturating_add(self.get(*q)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_then_get_each_queue() {
        let mut snap = PendingQueueSnapshot::default();
        for (i, q) in ApprovalQueue::ALL.iter().enumerate() {
            snap.set(*q, i as u32 + 1);
        }
        for (i, q) in ApprovalQueue::ALL.iter().enumerate() {
            assert_eq!(snap.get(*q), i as u32 + 1);
        }
        assert_eq!(snap.badge_count(), 21);
    }

    #[test]
    fn badge_count_saturates() {
        let mut snap = PendingQueueSnapshot::default();
        snap.set(ApprovalQueue::Transaction, u32::MAX);
        snap.set(ApprovalQueue::TypedMessage, 3);
        assert_eq!(snap.badge_count(), u32::MAX);
    }
}
