//! Event bus port: delivery of box notifications.

use std::future::Future;

use slingwatch_domain::error::SlingError;
use slingwatch_domain::notification::Notification;

/// Delivers deduplicated notifications to interested parties.
pub trait EventPublisher {
    /// Publish a notification to all current subscribers.
    fn publish(
        &self,
        notification: Notification,
    ) -> impl Future<Output = Result<(), SlingError>> + Send;
}

impl<T: EventPublisher + Send + Sync> EventPublisher for std::sync::Arc<T> {
    fn publish(
        &self,
        notification: Notification,
    ) -> impl Future<Output = Result<(), SlingError>> + Send {
        (**self).publish(notification)
    }
}
