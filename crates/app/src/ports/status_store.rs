//! Status store port: durable snapshot of the box registry.

use std::future::Future;

use slingwatch_domain::error::SlingError;
use slingwatch_domain::registry::BoxRegistry;

/// Loads and saves the registry snapshot.
pub trait StatusStore {
    /// Load the last saved registry, `None` when nothing was saved yet.
    fn load(&self) -> impl Future<Output = Result<Option<BoxRegistry>, SlingError>> + Send;

    /// Persist the given registry, replacing any previous snapshot.
    fn save(&self, registry: &BoxRegistry) -> impl Future<Output = Result<(), SlingError>> + Send;
}

impl<T: StatusStore + Send + Sync> StatusStore for std::sync::Arc<T> {
    fn load(&self) -> impl Future<Output = Result<Option<BoxRegistry>, SlingError>> + Send {
        (**self).load()
    }

    fn save(&self, registry: &BoxRegistry) -> impl Future<Output = Result<(), SlingError>> + Send {
        (**self).save(registry)
    }
}
