//! Notification: the event handed to the delivery collaborator.

use serde::{Deserialize, Serialize};

use crate::classification::BoxAction;
use crate::id::EventId;
use crate::time::{Timestamp, now};

/// Origin tag for notifications raised from the console stream.
pub const SERVER_ORIGIN: &str = "server";

/// A deduplicated, deliverable record of something that happened to a box.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: EventId,
    pub box_name: String,
    pub kind: BoxAction,
    /// Only set for channel changes.
    pub channel: Option<i32>,
    pub origin: String,
    pub timestamp: Timestamp,
}

impl Notification {
    /// Build a server-originated notification stamped with the current time.
    ///
    /// `channel` is dropped for every kind but [`BoxAction::ChannelChanged`].
    #[must_use]
    pub fn new(box_name: impl Into<String>, kind: BoxAction, channel: i32) -> Self {
        Self {
            id: EventId::new(),
            box_name: box_name.into(),
            kind,
            channel: (kind == BoxAction::ChannelChanged).then_some(channel),
            origin: SERVER_ORIGIN.to_string(),
            timestamp: now(),
        }
    }
}
