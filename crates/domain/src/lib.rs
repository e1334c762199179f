//! # slingwatch-domain
//!
//! Pure domain model for slingwatch, the console watcher for a SlingBox server.
//!
//! ## Responsibilities
//! - Foundational types: error conventions, timestamps, event identifiers
//! - Define **`SlingBox`** state (channels, analogue flag, heartbeat, guide URL)
//! - Define the **`BoxRegistry`** and its invariant-preserving mutators
//! - Define **classifications** and **notifications** produced from console lines
//! - Encode and decode the persisted **snapshot** document
//!
//! ## Dependency rule
//! This crate has **no internal dependencies**.
//! It must never import anything from `app`, adapters, or external IO crates.
//! All IO boundaries are expressed as traits in the `app` crate (ports).

pub mod error;
pub mod id;
pub mod time;

pub mod classification;
pub mod notification;
pub mod registry;
pub mod sling_box;
pub mod snapshot;
pub mod status;
