//! `BoxRegistry`: the authoritative set of known boxes plus server-wide settings.
//!
//! Boxes keep their discovery order so listings and snapshots are stable.
//! Every mutator that changes state bumps [`BoxRegistry::revision`], which
//! lets callers decide whether a snapshot needs to be written.

use std::fmt;

use crate::error::{InvariantError, NotFoundError, SlingError};
use crate::sling_box::SlingBox;
use crate::time::{Timestamp, now};

/// Ordered registry of boxes keyed by name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BoxRegistry {
    boxes: Vec<SlingBox>,
    url_base: String,
    tv_guide_url: String,
    remote_control_service_url: String,
    revision: u64,
}

impl BoxRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.boxes.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.boxes.len()
    }

    /// Boxes in discovery order.
    pub fn iter(&self) -> impl Iterator<Item = &SlingBox> {
        self.boxes.iter()
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    /// Tolerant lookup used on the log path.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&SlingBox> {
        self.boxes.iter().find(|sb| sb.name() == name)
    }

    /// Strict lookup: an unknown name is a caller bug.
    ///
    /// # Errors
    ///
    /// Returns [`SlingError::NotFound`] when no box is called `name`.
    pub fn box_status(&self, name: &str) -> Result<&SlingBox, SlingError> {
        self.get(name).ok_or_else(|| not_found(name))
    }

    /// Monotonic counter bumped by every state-changing mutation.
    #[must_use]
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Register a newly discovered box.
    ///
    /// # Errors
    ///
    /// Returns [`InvariantError::DuplicateBox`] when the name is taken, or a
    /// validation error when the name is blank.
    pub fn add_box(&mut self, name: &str, id: &str) -> Result<(), SlingError> {
        self.insert(SlingBox::new(name, id)?)
    }

    /// Register a fully built box (used when restoring a snapshot).
    ///
    /// # Errors
    ///
    /// Returns [`InvariantError::DuplicateBox`] when the name is taken.
    pub fn insert(&mut self, sling_box: SlingBox) -> Result<(), SlingError> {
        if self.contains(sling_box.name()) {
            return Err(InvariantError::DuplicateBox {
                name: sling_box.name().to_string(),
            }
            .into());
        }
        self.boxes.push(sling_box);
        self.touch();
        Ok(())
    }

    pub fn remove_box(&mut self, name: &str) -> Option<SlingBox> {
        let index = self.position(name)?;
        self.touch();
        Some(self.boxes.remove(index))
    }

    /// Run `mutate` against the named box, if it exists.
    ///
    /// `mutate` reports whether it changed anything; the revision only moves
    /// when it did. Returns `None` for an unknown name.
    pub fn update_box(
        &mut self,
        name: &str,
        mutate: impl FnOnce(&mut SlingBox) -> bool,
    ) -> Option<bool> {
        let index = self.position(name)?;
        let changed = mutate(&mut self.boxes[index]);
        if changed {
            self.touch();
        }
        Some(changed)
    }

    /// # Errors
    ///
    /// Returns [`SlingError::NotFound`] for an unknown name.
    pub fn set_current_channel(
        &mut self,
        name: &str,
        channel: i32,
        at: Timestamp,
    ) -> Result<bool, SlingError> {
        self.update_box(name, |sb| sb.set_current_channel(channel, at))
            .ok_or_else(|| not_found(name))
    }

    /// # Errors
    ///
    /// Returns [`SlingError::NotFound`] for an unknown name.
    pub fn set_heartbeat(
        &mut self,
        name: &str,
        heartbeat: Option<Timestamp>,
    ) -> Result<(), SlingError> {
        self.update_box(name, |sb| sb.set_heartbeat(heartbeat))
            .map(|_| ())
            .ok_or_else(|| not_found(name))
    }

    /// # Errors
    ///
    /// Returns [`SlingError::NotFound`] for an unknown name.
    pub fn set_analogue(&mut self, name: &str, is_analogue: bool) -> Result<(), SlingError> {
        self.update_box(name, |sb| sb.set_analogue(is_analogue))
            .map(|_| ())
            .ok_or_else(|| not_found(name))
    }

    /// # Errors
    ///
    /// Returns [`SlingError::NotFound`] for an unknown name.
    pub fn set_tv_guide_url(&mut self, name: &str, url: Option<String>) -> Result<(), SlingError> {
        self.update_box(name, |sb| sb.set_tv_guide_url(url))
            .map(|_| ())
            .ok_or_else(|| not_found(name))
    }

    /// Clear every heartbeat; nothing can be streaming while the server is down.
    pub fn set_all_stopped(&mut self) {
        let mut changed = false;
        for sling_box in &mut self.boxes {
            changed |= sling_box.set_heartbeat(None);
        }
        if changed {
            self.touch();
        }
    }

    /// URL segment prefixing every box route on the supervised server.
    #[must_use]
    pub fn url_base(&self) -> &str {
        &self.url_base
    }

    /// Server-wide guide URL, used when a box has no override.
    #[must_use]
    pub fn tv_guide_url(&self) -> &str {
        &self.tv_guide_url
    }

    /// URL the guide site calls back to change channels.
    #[must_use]
    pub fn remote_control_service_url(&self) -> &str {
        &self.remote_control_service_url
    }

    /// Guide URL for `name`: its own override, else the server-wide one.
    #[must_use]
    pub fn effective_tv_guide_url(&self, name: &str) -> &str {
        self.get(name)
            .and_then(SlingBox::tv_guide_url)
            .unwrap_or(&self.tv_guide_url)
    }

    pub fn set_url_base(&mut self, value: impl Into<String>) {
        self.url_base = value.into();
        self.touch();
    }

    pub fn set_server_tv_guide_url(&mut self, value: impl Into<String>) {
        self.tv_guide_url = value.into();
        self.touch();
    }

    pub fn set_remote_control_service_url(&mut self, value: impl Into<String>) {
        self.remote_control_service_url = value.into();
        self.touch();
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.boxes.iter().position(|sb| sb.name() == name)
    }

    fn touch(&mut self) {
        self.revision = self.revision.wrapping_add(1);
    }
}

fn not_found(name: &str) -> SlingError {
    NotFoundError {
        entity: "SlingBox",
        id: name.to_string(),
    }
    .into()
}

impl fmt::Display for BoxRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return writeln!(f, "No SlingBoxes saved in previous session");
        }
        let at = now();
        writeln!(f, "SlingBoxes")?;
        for sb in &self.boxes {
            writeln!(
                f,
                "Name: {}, \tId: {},   Channel: {:>5},   Last: {:>5},   isAnalogue: {},   isStreaming: {}",
                sb.name(),
                sb.id(),
                sb.current_channel(),
                sb.last_channel(),
                sb.is_analogue(),
                sb.is_streaming(at),
            )?;
        }
        Ok(())
    }
}
