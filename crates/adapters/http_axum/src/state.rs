//! Shared application state for axum handlers.

use std::sync::Arc;

use slingwatch_app::console_reader::SharedRegistry;
use slingwatch_app::event_bus::InProcessEventBus;

/// Application state shared across all axum handlers.
///
/// Handlers only ever take the registry's read lock; the console reader is
/// the sole writer.
#[derive(Clone)]
pub struct AppState {
    /// Registry mutated by the console reader.
    pub registry: SharedRegistry,
    /// Bus the console reader publishes notifications on.
    pub event_bus: Arc<InProcessEventBus>,
}

impl AppState {
    #[must_use]
    pub fn new(registry: SharedRegistry, event_bus: Arc<InProcessEventBus>) -> Self {
        Self {
            registry,
            event_bus,
        }
    }
}
