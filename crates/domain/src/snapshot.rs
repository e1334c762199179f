//! JSON snapshot of the registry, as exchanged with the persistence layer.
//!
//! Reading is lenient: property names match case-insensitively, missing
//! fields fall back to defaults, and a heartbeat stored as the string
//! `"null"` is read as absent.

use serde_json::{Map, Value, json};

use crate::error::{SlingError, ValidationError};
use crate::registry::BoxRegistry;
use crate::sling_box::{NO_CHANNEL, SlingBox};
use crate::time::{Timestamp, format_snapshot, parse_snapshot};

const SLING_BOXES: &str = "slingBoxes";
const SLING_BOX_ID: &str = "slingBoxId";
const CURRENT_CHANNEL: &str = "currentChannelNumber";
const LAST_CHANNEL: &str = "lastChannelNumber";
const IS_ANALOGUE: &str = "isAnalogue";
const LAST_HEARTBEAT: &str = "lastHeartBeatTimeStamp";
const TV_GUIDE_URL: &str = "tvGuideUrl";
const URL_BASE: &str = "urlBase";
const REMOTE_CONTROL_SERVICE_URL: &str = "slingRemoteControlServiceUrl";

/// Encode the registry as a pretty-printed snapshot document.
///
/// # Errors
///
/// Returns [`SlingError::Snapshot`] if serialization fails.
pub fn to_json(registry: &BoxRegistry) -> Result<String, SlingError> {
    Ok(serde_json::to_string_pretty(&to_value(registry))?)
}

/// Build the snapshot document as a JSON value.
#[must_use]
pub fn to_value(registry: &BoxRegistry) -> Value {
    let boxes: Map<String, Value> = registry
        .iter()
        .map(|sb| (sb.name().to_string(), box_entry(sb)))
        .collect();

    json!({
        SLING_BOXES: boxes,
        URL_BASE: registry.url_base(),
        TV_GUIDE_URL: registry.tv_guide_url(),
        REMOTE_CONTROL_SERVICE_URL: registry.remote_control_service_url(),
    })
}

/// Snapshot representation of a single box.
#[must_use]
pub fn box_entry(sb: &SlingBox) -> Value {
    let mut entry = Map::new();
    entry.insert(SLING_BOX_ID.into(), sb.id().into());
    entry.insert(CURRENT_CHANNEL.into(), sb.current_channel().into());
    entry.insert(LAST_CHANNEL.into(), sb.last_channel().into());
    entry.insert(IS_ANALOGUE.into(), sb.is_analogue().into());
    entry.insert(
        LAST_HEARTBEAT.into(),
        sb.last_heartbeat()
            .map_or(Value::Null, |ts| format_snapshot(ts).into()),
    );
    if let Some(url) = sb.tv_guide_url().filter(|url| is_web_url(url)) {
        entry.insert(TV_GUIDE_URL.into(), url.into());
    }
    Value::Object(entry)
}

/// Decode a snapshot document into a registry.
///
/// # Errors
///
/// Returns [`SlingError::Snapshot`] for invalid JSON, a validation error when
/// the document is not an object or a heartbeat cannot be parsed, and an
/// invariant error if the same box appears twice under differently cased keys.
pub fn from_json(content: &str) -> Result<BoxRegistry, SlingError> {
    let root: Value = serde_json::from_str(content)?;
    let root = root
        .as_object()
        .ok_or(ValidationError::MalformedSnapshot("root is not an object"))?;

    let mut registry = BoxRegistry::new();
    registry.set_url_base(string_field(root, URL_BASE));
    registry.set_server_tv_guide_url(string_field(root, TV_GUIDE_URL));
    registry.set_remote_control_service_url(string_field(root, REMOTE_CONTROL_SERVICE_URL));

    if let Some(boxes) = field(root, SLING_BOXES).and_then(Value::as_object) {
        for (name, entry) in boxes {
            let entry = entry
                .as_object()
                .ok_or(ValidationError::MalformedSnapshot("box entry is not an object"))?;
            registry.insert(read_box(name, entry)?)?;
        }
    }
    Ok(registry)
}

fn read_box(name: &str, entry: &Map<String, Value>) -> Result<SlingBox, SlingError> {
    let tv_guide_url = field(entry, TV_GUIDE_URL)
        .and_then(Value::as_str)
        .filter(|url| !url.trim().is_empty())
        .map(str::to_string);

    Ok(SlingBox::new(name, string_field(entry, SLING_BOX_ID))?
        .with_channels(
            channel_field(entry, CURRENT_CHANNEL),
            channel_field(entry, LAST_CHANNEL),
        )
        .with_analogue(field(entry, IS_ANALOGUE).and_then(Value::as_bool).unwrap_or(false))
        .with_heartbeat(heartbeat_field(entry)?)
        .with_tv_guide_url(tv_guide_url))
}

fn heartbeat_field(entry: &Map<String, Value>) -> Result<Option<Timestamp>, SlingError> {
    match field(entry, LAST_HEARTBEAT).and_then(Value::as_str).map(str::trim) {
        None => Ok(None),
        Some(raw) if raw.is_empty() || raw.eq_ignore_ascii_case("null") => Ok(None),
        Some(raw) => parse_snapshot(raw)
            .map(Some)
            .map_err(|_| ValidationError::InvalidTimestamp(raw.to_string()).into()),
    }
}

fn field<'a>(object: &'a Map<String, Value>, name: &str) -> Option<&'a Value> {
    object.get(name).or_else(|| {
        object
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value)
    })
}

fn string_field(object: &Map<String, Value>, name: &str) -> String {
    field(object, name)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

fn channel_field(object: &Map<String, Value>, name: &str) -> i32 {
    field(object, name)
        .and_then(Value::as_i64)
        .and_then(|value| i32::try_from(value).ok())
        .unwrap_or(NO_CHANNEL)
}

/// Absolute `http`/`https` URL check used before writing per-box guide URLs.
#[must_use]
pub fn is_web_url(candidate: &str) -> bool {
    url::Url::parse(candidate).is_ok_and(|url| matches!(url.scheme(), "http" | "https"))
}
