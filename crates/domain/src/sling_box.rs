//! `SlingBox`: the tracked state of one box exposed by the supervised server.
//!
//! Channels use `-1` for "unknown". The current channel is only ever moved to
//! a non-negative value, and each move pushes the previous value into the last
//! channel slot so "last channel" always means the one watched just before.

use chrono::TimeDelta;

use crate::error::{SlingError, ValidationError};
use crate::time::Timestamp;

/// Sentinel for an unset channel.
pub const NO_CHANNEL: i32 = -1;

/// A heartbeat older than this no longer counts as streaming.
pub const STREAMING_WINDOW: TimeDelta = TimeDelta::seconds(100);

/// State of a single box.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlingBox {
    name: String,
    id: String,
    current_channel: i32,
    last_channel: i32,
    is_analogue: bool,
    last_heartbeat: Option<Timestamp>,
    tv_guide_url: Option<String>,
}

impl SlingBox {
    /// Create a box with no channel history, as announced at discovery.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::EmptyBoxName`] when `name` is blank.
    pub fn new(name: impl Into<String>, id: impl Into<String>) -> Result<Self, SlingError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(ValidationError::EmptyBoxName.into());
        }
        Ok(Self {
            name,
            id: id.into(),
            current_channel: NO_CHANNEL,
            last_channel: NO_CHANNEL,
            is_analogue: false,
            last_heartbeat: None,
            tv_guide_url: None,
        })
    }

    /// Restore channel values as persisted; anything negative becomes [`NO_CHANNEL`].
    #[must_use]
    pub fn with_channels(mut self, current: i32, last: i32) -> Self {
        self.current_channel = current.max(NO_CHANNEL);
        self.last_channel = last.max(NO_CHANNEL);
        self
    }

    #[must_use]
    pub fn with_analogue(mut self, is_analogue: bool) -> Self {
        self.is_analogue = is_analogue;
        self
    }

    #[must_use]
    pub fn with_heartbeat(mut self, heartbeat: Option<Timestamp>) -> Self {
        self.last_heartbeat = heartbeat;
        self
    }

    #[must_use]
    pub fn with_tv_guide_url(mut self, url: Option<String>) -> Self {
        self.tv_guide_url = url;
        self
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    #[must_use]
    pub fn current_channel(&self) -> i32 {
        self.current_channel
    }

    #[must_use]
    pub fn last_channel(&self) -> i32 {
        self.last_channel
    }

    #[must_use]
    pub fn is_analogue(&self) -> bool {
        self.is_analogue
    }

    #[must_use]
    pub fn last_heartbeat(&self) -> Option<Timestamp> {
        self.last_heartbeat
    }

    /// Per-box guide URL overriding the server-wide one.
    #[must_use]
    pub fn tv_guide_url(&self) -> Option<&str> {
        self.tv_guide_url.as_deref()
    }

    /// Whether the box has shown activity within [`STREAMING_WINDOW`] of `now`.
    #[must_use]
    pub fn is_streaming(&self, now: Timestamp) -> bool {
        self.last_heartbeat
            .is_some_and(|heartbeat| now - heartbeat < STREAMING_WINDOW)
    }

    /// Move to `channel`, keeping the previous one as last channel.
    ///
    /// Negative values and the already-current channel are ignored. A move
    /// also counts as activity, so the heartbeat is refreshed.
    /// Returns whether anything changed.
    pub fn set_current_channel(&mut self, channel: i32, now: Timestamp) -> bool {
        if channel < 0 || channel == self.current_channel {
            return false;
        }
        if self.current_channel >= 0 {
            self.last_channel = self.current_channel;
        }
        self.current_channel = channel;
        self.last_heartbeat = Some(now);
        true
    }

    /// Step up one channel; a box already on the highest channel stays put.
    pub fn channel_up(&mut self, now: Timestamp) -> bool {
        if self.current_channel < 0 {
            return false;
        }
        match self.current_channel.checked_add(1) {
            Some(channel) => self.set_current_channel(channel, now),
            None => false,
        }
    }

    /// Step down one channel; never goes below zero.
    pub fn channel_down(&mut self, now: Timestamp) -> bool {
        if self.current_channel < 1 {
            return false;
        }
        self.set_current_channel(self.current_channel - 1, now)
    }

    pub fn change_channel(&mut self, channel: i32, now: Timestamp) -> bool {
        self.set_current_channel(channel, now)
    }

    /// Swap back to the previously watched channel.
    pub fn select_last_channel(&mut self, now: Timestamp) -> bool {
        if self.last_channel < 0 {
            return false;
        }
        self.set_current_channel(self.last_channel, now)
    }

    /// Record activity (`Some`) or mark the box as stopped (`None`).
    pub fn set_heartbeat(&mut self, heartbeat: Option<Timestamp>) -> bool {
        let changed = self.last_heartbeat != heartbeat;
        self.last_heartbeat = heartbeat;
        changed
    }

    pub fn set_analogue(&mut self, is_analogue: bool) -> bool {
        let changed = self.is_analogue != is_analogue;
        self.is_analogue = is_analogue;
        changed
    }

    pub fn set_tv_guide_url(&mut self, url: Option<String>) -> bool {
        let changed = self.tv_guide_url != url;
        self.tv_guide_url = url;
        changed
    }
}
