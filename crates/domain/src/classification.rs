//! Result of classifying one console line.

use serde::{Deserialize, Serialize};

/// What a recognized line means for a box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BoxAction {
    /// The box tuned to a different channel.
    ChannelChanged,
    /// The box is actively streaming.
    StreamingInProgress,
    /// The box stopped streaming.
    StreamingStopped,
    /// The box failed to start a session and may be bricked.
    #[serde(rename = "SlingBoxBricked")]
    Faulted,
    /// A remote command was refused because another client holds the remote.
    #[serde(rename = "RemoteControlLocked")]
    RemoteLocked,
    /// Recognized, but nothing to report (e.g. discovery).
    None,
}

impl BoxAction {
    /// Stable wire name, also used in dedup keys.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ChannelChanged => "ChannelChanged",
            Self::StreamingInProgress => "StreamingInProgress",
            Self::StreamingStopped => "StreamingStopped",
            Self::Faulted => "SlingBoxBricked",
            Self::RemoteLocked => "RemoteControlLocked",
            Self::None => "None",
        }
    }

    /// Whether this action produces an outgoing notification.
    #[must_use]
    pub fn is_notifiable(self) -> bool {
        !matches!(self, Self::None)
    }
}

impl std::fmt::Display for BoxAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classification of a single line. Transient, never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub recognized: bool,
    pub action: BoxAction,
    pub box_name: Option<String>,
}

impl Classification {
    /// The line matched no rule, or matched one whose fragments did not parse.
    #[must_use]
    pub fn unrecognized() -> Self {
        Self {
            recognized: false,
            action: BoxAction::None,
            box_name: None,
        }
    }

    /// Recognized without a box to report on.
    #[must_use]
    pub fn silent() -> Self {
        Self {
            recognized: true,
            action: BoxAction::None,
            box_name: None,
        }
    }

    #[must_use]
    pub fn recognized(action: BoxAction, box_name: impl Into<String>) -> Self {
        Self {
            recognized: true,
            action,
            box_name: Some(box_name.into()),
        }
    }
}
