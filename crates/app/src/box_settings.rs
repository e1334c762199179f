//! Per-box settings that come from configuration rather than the console.
//!
//! The supervised server only announces box ids and names. Tuner kind and
//! guide URL are operator settings, applied at startup to restored boxes and
//! again when the roster line registers boxes for the first time.

use tracing::{debug, warn};

use slingwatch_domain::registry::BoxRegistry;
use slingwatch_domain::snapshot::is_web_url;

/// Operator settings for one box.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BoxSettings {
    pub name: String,
    /// Whether the box has an analogue tuner.
    pub analogue: Option<bool>,
    /// Guide URL replacing the server-wide one; empty clears it.
    pub tv_guide_url: Option<String>,
}

impl BoxSettings {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_analogue(mut self, analogue: bool) -> Self {
        self.analogue = Some(analogue);
        self
    }

    #[must_use]
    pub fn with_tv_guide_url(mut self, url: impl Into<String>) -> Self {
        self.tv_guide_url = Some(url.into());
        self
    }

    /// Apply to the named box. Returns `false` when the box is not registered.
    ///
    /// A guide URL that is not an absolute http(s) URL is logged and left out.
    pub fn apply(&self, registry: &mut BoxRegistry) -> bool {
        if !registry.contains(&self.name) {
            return false;
        }
        if let Some(analogue) = self.analogue {
            registry.update_box(&self.name, |sb| sb.set_analogue(analogue));
        }
        match self.tv_guide_url.as_deref() {
            Some("") => {
                registry.update_box(&self.name, |sb| sb.set_tv_guide_url(None));
            }
            Some(url) if is_web_url(url) => {
                registry.update_box(&self.name, |sb| {
                    sb.set_tv_guide_url(Some(url.to_string()))
                });
            }
            Some(url) => {
                warn!(box_name = %self.name, url, "ignoring guide URL that is not http(s)");
            }
            None => {}
        }
        debug!(box_name = %self.name, "box settings applied");
        true
    }
}

/// Apply every entry, returning the names of boxes that are not registered.
pub fn apply_all<'a>(
    settings: impl IntoIterator<Item = &'a BoxSettings>,
    registry: &mut BoxRegistry,
) -> Vec<&'a str> {
    settings
        .into_iter()
        .filter(|entry| !entry.apply(registry))
        .map(|entry| entry.name.as_str())
        .collect()
}
