//! # slingwatch-adapter-storage-json
//!
//! JSON file persistence adapter for the box registry.
//!
//! ## Responsibilities
//! - Implement the `StatusStore` port defined in `slingwatch-app::ports`
//! - Read the snapshot at startup, treating a missing or blank file as "no
//!   previous session"
//! - Write the snapshot atomically (temp file then rename), retrying transient
//!   IO failures
//!
//! ## Dependency rule
//! Depends on `slingwatch-app` (for port traits) and `slingwatch-domain` (for domain types).
//! The `app` and `domain` crates must never reference this adapter.

pub mod error;
pub mod store;

pub use store::JsonFileStore;
