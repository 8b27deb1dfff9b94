//! Duplicate-delivery suppression.
//!
//! QoS 1 plus three subscribed forms of every command topic means the same
//! logical command can arrive twice back to back. Re-executing it would
//! double-apply state changes (toggling fullscreen twice cancels the
//! toggle), so the most recent content hash per topic *kind* is remembered
//! and an identical arrival inside the window is dropped.

use crate::topics::TopicKind;
use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};
use std::time::{Duration, Instant};
use tracing::debug;

pub const DEDUP_WINDOW: Duration = Duration::from_secs(1);

#[derive(Debug, Default)]
pub struct MessageDeduplicator {
    last_seen: HashMap<TopicKind, (u64, Instant)>,
}

impl MessageDeduplicator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns false when this payload is a duplicate of the previous one on
    /// the same topic kind within the window. Keyed on kind, not the full
    /// topic string: the targeted and broadcast forms carry the same command.
    pub fn observe(&mut self, kind: TopicKind, payload: &[u8], now: Instant) -> bool {
        let mut hasher = DefaultHasher::new();
        kind.base_name().hash(&mut hasher);
        payload.hash(&mut hasher);
        let digest = hasher.finish();

        if let Some((last_digest, last_time)) = self.last_seen.get(&kind) {
            if *last_digest == digest && now.duration_since(*last_time) < DEDUP_WINDOW {
                debug!(kind = kind.base_name(), "skipping duplicate message");
                return false;
            }
        }
        self.last_seen.insert(kind, (digest, now));
        true
    }
}
