//! Short-lived suppression of repeated notifications.
//!
//! The supervised server often logs the same fact several times within a
//! couple of seconds (a channel change is echoed by both the command and its
//! confirmation). Each `(box, action, channel)` key is admitted once per TTL.

use std::fmt;
use std::num::NonZeroUsize;
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};

use lru::LruCache;
use slingwatch_domain::classification::BoxAction;

/// How long an admitted key suppresses repeats.
pub const DEDUP_TTL: Duration = Duration::from_secs(5);

/// Upper bound on live keys; the least recently admitted key is evicted first.
pub const DEDUP_CAPACITY: usize = 1024;

/// Identity of a notification for deduplication purposes.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DedupKey {
    box_name: String,
    action: BoxAction,
    channel: i32,
}

impl DedupKey {
    #[must_use]
    pub fn new(box_name: impl Into<String>, action: BoxAction, channel: i32) -> Self {
        Self {
            box_name: box_name.into(),
            action,
            channel,
        }
    }

    fn with_action(&self, action: BoxAction) -> Self {
        Self {
            action,
            ..self.clone()
        }
    }
}

impl fmt::Display for DedupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "SlingBoxServerStatus_{}_{}_{}",
            self.box_name, self.action, self.channel
        )
    }
}

/// Thread-safe TTL cache deciding whether a notification may go out.
///
/// Entries hold their expiry instant. Keys are never promoted after
/// insertion, so the least recently used entry is always the first to expire.
#[derive(Debug)]
pub struct NotificationDeduplicator {
    ttl: Duration,
    expiries: Mutex<LruCache<DedupKey, Instant>>,
}

impl Default for NotificationDeduplicator {
    fn default() -> Self {
        Self::new(DEDUP_TTL)
    }
}

impl NotificationDeduplicator {
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        Self::with_capacity(ttl, DEDUP_CAPACITY)
    }

    /// Build a deduplicator holding at most `capacity` live keys (minimum 1).
    #[must_use]
    pub fn with_capacity(ttl: Duration, capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            ttl,
            expiries: Mutex::new(LruCache::new(capacity)),
        }
    }

    /// Whether a notification for this key may be emitted now.
    pub fn admit(&self, key: &DedupKey) -> bool {
        self.admit_at(key, Instant::now())
    }

    /// [`admit`](Self::admit) against an explicit clock reading.
    ///
    /// A live key suppresses the notification. A streaming-in-progress key is
    /// also suppressed while the matching channel-changed key is live, since a
    /// fresh channel change already implies streaming. An admitted key is
    /// (re)armed for the full TTL.
    pub fn admit_at(&self, key: &DedupKey, now: Instant) -> bool {
        let mut expiries = self.expiries.lock().unwrap_or_else(PoisonError::into_inner);
        while expiries
            .peek_lru()
            .is_some_and(|(_, expires_at)| *expires_at <= now)
        {
            expiries.pop_lru();
        }

        if expiries.contains(key) {
            return false;
        }
        if key.action == BoxAction::StreamingInProgress
            && expiries.contains(&key.with_action(BoxAction::ChannelChanged))
        {
            return false;
        }
        expiries.put(key.clone(), now + self.ttl);
        true
    }

    /// Number of live keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.expiries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
