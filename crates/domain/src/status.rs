//! Compact per-box streaming status, as consumed by the TV guide site.

use serde_json::{Map, Value, json};

use crate::registry::BoxRegistry;
use crate::time::Timestamp;

/// Streaming status for the requested boxes.
#[derive(Debug, Clone, PartialEq)]
pub struct StreamingStatus {
    /// `{"slingBoxes": {name: {"currentChannelNumber": n, "isStreaming": b}}}`.
    pub document: Value,
    /// Requested names that are not registered.
    pub unknown: Vec<String>,
}

/// Build the status document for `names`, or for every box when `names` is empty.
#[must_use]
pub fn streaming_status(
    registry: &BoxRegistry,
    names: &[String],
    now: Timestamp,
) -> StreamingStatus {
    let mut boxes = Map::new();
    let mut unknown = Vec::new();

    let selected: Vec<&str> = if names.is_empty() {
        registry.iter().map(|sb| sb.name()).collect()
    } else {
        names.iter().map(String::as_str).collect()
    };

    for name in selected {
        match registry.get(name) {
            Some(sb) => {
                boxes.insert(
                    name.to_string(),
                    json!({
                        "currentChannelNumber": sb.current_channel(),
                        "isStreaming": sb.is_streaming(now),
                    }),
                );
            }
            None => unknown.push(name.to_string()),
        }
    }

    StreamingStatus {
        document: json!({ "slingBoxes": boxes }),
        unknown,
    }
}
