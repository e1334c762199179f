//! # slingwatch-adapter-http-axum
//!
//! HTTP adapter built on [axum](https://docs.rs/axum).
//!
//! ## Responsibilities
//! - Serve a small **read-only JSON API** over the box registry
//!   (`/api/boxes`, `/api/boxes/{name}`, `/api/status`)
//! - Stream engine notifications to clients as **Server-Sent Events**
//!   (`/api/events/stream`)
//! - Map application errors into HTTP responses
//!
//! ## Dependency rule
//! Depends on `slingwatch-app` (for the shared registry and event bus) and
//! `slingwatch-domain` (for the snapshot and status documents). Never leaks
//! axum types into the domain.

pub mod api;
pub mod error;
pub mod router;
pub mod state;
