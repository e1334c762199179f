//! # slingwatch-app
//!
//! Application layer: console-line use-cases and **port definitions** (traits).
//!
//! ## Responsibilities
//! - Define **port traits** that adapters must implement (driven/outbound ports):
//!   - `StatusStore`: load & save the box registry snapshot
//!   - `EventPublisher`: deliver notifications to listeners
//! - Interpret channel commands (analogue triples, typed digits, IR keycodes
//!   and raw IR bytes) against the registry
//! - Classify console lines through an ordered rule table with a one-line
//!   lookback register
//! - Apply operator box settings (tuner kind, guide URL) to registered boxes
//! - Suppress repeated notifications within a short TTL
//! - Drive the whole pipeline line by line (`ConsoleReader`)
//! - Provide **in-process infrastructure** (event bus) that doesn't need IO
//!
//! ## Dependency rule
//! Depends on `slingwatch-domain` only (plus `tokio::sync` for channels and locks).
//! Never imports adapter crates. Adapters depend on *this* crate, not the reverse.

pub mod box_settings;
pub mod classifier;
pub mod command;
pub mod console_reader;
pub mod dedup;
pub mod event_bus;
pub mod ports;
pub mod remote_codes;
