//! Infra-red key codes the supervised server logs for named remote buttons.

use std::collections::HashMap;

use slingwatch_domain::error::ValidationError;

/// Mapping key for channel up.
pub const CHANNEL_UP_KEY: &str = "Ch+";
/// Mapping key for channel down.
pub const CHANNEL_DOWN_KEY: &str = "Ch-";
/// Mapping key for last channel.
pub const LAST_CHANNEL_KEY: &str = "Last";

/// Key codes for the three named channel commands.
///
/// Injected into the interpreter so each instance decodes with its own codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RemoteCodes {
    channel_up: u32,
    channel_down: u32,
    last_channel: u32,
}

impl Default for RemoteCodes {
    fn default() -> Self {
        Self {
            channel_up: 4,
            channel_down: 5,
            last_channel: 56,
        }
    }
}

impl RemoteCodes {
    /// # Errors
    ///
    /// Returns [`ValidationError::DuplicateRemoteCode`] when two commands share a code.
    pub fn new(
        channel_up: u32,
        channel_down: u32,
        last_channel: u32,
    ) -> Result<Self, ValidationError> {
        if channel_up == channel_down || channel_up == last_channel {
            return Err(ValidationError::DuplicateRemoteCode(channel_up));
        }
        if channel_down == last_channel {
            return Err(ValidationError::DuplicateRemoteCode(channel_down));
        }
        Ok(Self {
            channel_up,
            channel_down,
            last_channel,
        })
    }

    /// Build from a `{"Ch+": "4", "Ch-": "5", "Last": "56"}` style mapping.
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] when a key is missing, a value is not a
    /// non-negative integer, or two commands share a code.
    pub fn from_map(map: &HashMap<String, String>) -> Result<Self, ValidationError> {
        Self::new(
            code(map, CHANNEL_UP_KEY)?,
            code(map, CHANNEL_DOWN_KEY)?,
            code(map, LAST_CHANNEL_KEY)?,
        )
    }

    #[must_use]
    pub fn channel_up(&self) -> u32 {
        self.channel_up
    }

    #[must_use]
    pub fn channel_down(&self) -> u32 {
        self.channel_down
    }

    #[must_use]
    pub fn last_channel(&self) -> u32 {
        self.last_channel
    }
}

fn code(map: &HashMap<String, String>, key: &'static str) -> Result<u32, ValidationError> {
    let raw = map.get(key).ok_or(ValidationError::MissingRemoteCode(key))?;
    raw.trim()
        .parse()
        .map_err(|_| ValidationError::InvalidRemoteCode {
            key,
            value: raw.clone(),
        })
}
