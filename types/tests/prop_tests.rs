use hearth_types::{ApprovalQueue, ContextKind, PendingQueueSnapshot, Trust, VersionedEnvelope};
use proptest::prelude::*;

proptest! {
    /// Only the three reserved surface names are ever trusted.
    #[test]
    fn unreserved_names_are_untrusted(name in "[a-zA-Z_-]{0,24}") {
        prop_assume!(!["popup", "notification", "fullscreen"].contains(&name.as_str()));
        let kind = ContextKind::from_port_name(&name);
        prop_assert_eq!(kind, ContextKind::ExternalPage);
        prop_assert_eq!(kind.trust(), Trust::Untrusted);
    }

    /// The badge count is the plain sum of every queue (within u32 range).
    #[test]
    fn badge_count_is_sum(counts in prop::array::uniform6(0u32..10_000)) {
        let mut snap = PendingQueueSnapshot::default();
        for (queue, count) in ApprovalQueue::ALL.iter().zip(counts.iter()) {
            snap.set(*queue, *count);
        }
        prop_assert_eq!(snap.badge_count(), counts.iter().sum::<u32>());
    }

    /// An envelope survives JSON persistence with its version and data intact.
    #[test]
    fn envelope_survives_json(version in 0u32..500, key in "[a-z]{1,8}", value in any::<i64>()) {
        let mut data = serde_json::Map::new();
        data.insert(key, serde_json::Value::from(value));
        let env = VersionedEnvelope::new(version, serde_json::Value::Object(data));
        let bytes = serde_json::to_vec(&env).expect("serializable");
        let back: VersionedEnvelope = serde_json::from_slice(&bytes).expect("deserializable");
        prop_assert_eq!(back, env);
    }
}
