//! Console reader service: turns the supervised server's output into
//! registry updates and notifications.

use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::{debug, error, info, warn};

use slingwatch_domain::classification::{BoxAction, Classification};
use slingwatch_domain::error::SlingError;
use slingwatch_domain::notification::Notification;
use slingwatch_domain::registry::BoxRegistry;
use slingwatch_domain::time::now;

use crate::box_settings::{self, BoxSettings};
use crate::classifier::{LineClassifier, Lookback};
use crate::dedup::{DedupKey, NotificationDeduplicator};
use crate::ports::{EventPublisher, StatusStore};

/// Registry shared between the console reader (writer) and status readers.
pub type SharedRegistry = Arc<RwLock<BoxRegistry>>;

/// What happened to one console line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineOutcome {
    /// Blank line.
    Ignored,
    /// No rule recognized the line; it was only echoed.
    Unrecognized,
    /// Recognized, nothing to notify (e.g. discovery).
    Silent,
    /// A notification was published.
    Notified(Notification),
    /// An equivalent notification went out less than a TTL ago.
    Suppressed,
    /// The line named a box the registry does not know.
    UnknownBox(String),
}

/// Processes console lines one at a time, in order.
///
/// Holds the lookback state, so it takes `&mut self` per line and must not be
/// shared between producers.
pub struct ConsoleReader<S, P> {
    registry: SharedRegistry,
    classifier: LineClassifier,
    dedup: NotificationDeduplicator,
    store: S,
    publisher: P,
    lookback: Lookback,
    settings: Vec<BoxSettings>,
}

impl<S, P> ConsoleReader<S, P>
where
    S: StatusStore + Send + Sync,
    P: EventPublisher + Send + Sync,
{
    /// Create a reader over `registry`, persisting through `store` and
    /// notifying through `publisher`.
    pub fn new(
        registry: SharedRegistry,
        classifier: LineClassifier,
        store: S,
        publisher: P,
    ) -> Self {
        Self {
            registry,
            classifier,
            dedup: NotificationDeduplicator::default(),
            store,
            publisher,
            lookback: Lookback::Idle,
            settings: Vec::new(),
        }
    }

    /// Box settings to apply when the roster line registers the boxes.
    #[must_use]
    pub fn with_box_settings(mut self, settings: Vec<BoxSettings>) -> Self {
        self.settings = settings;
        self
    }

    /// Replace the default five-second deduplicator.
    #[must_use]
    pub fn with_deduplicator(mut self, dedup: NotificationDeduplicator) -> Self {
        self.dedup = dedup;
        self
    }

    /// Handle to the registry this reader mutates.
    #[must_use]
    pub fn registry(&self) -> SharedRegistry {
        Arc::clone(&self.registry)
    }

    #[must_use]
    pub fn lookback(&self) -> &Lookback {
        &self.lookback
    }

    /// Classify `line`, persist any registry change, then notify.
    ///
    /// Unknown boxes, persistence failures and delivery failures are logged
    /// and do not fail the call.
    ///
    /// # Errors
    ///
    /// Returns the classifier's error when a registry or command invariant is
    /// broken; the ingest loop should stop.
    #[tracing::instrument(skip(self), level = "debug")]
    pub async fn process_line(&mut self, line: &str) -> Result<LineOutcome, SlingError> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(LineOutcome::Ignored);
        }

        let (classification, changed, channel) = {
            let mut registry = self.registry.write().await;
            let revision = registry.revision();
            let was_empty = registry.is_empty();
            let classification =
                self.classifier
                    .classify(line, &self.lookback, &mut registry, now())?;
            if was_empty && !registry.is_empty() {
                for name in box_settings::apply_all(&self.settings, &mut registry) {
                    warn!(box_name = %name, "configured box was not in the roster");
                }
            }
            let channel = classification
                .box_name
                .as_deref()
                .and_then(|name| registry.get(name))
                .map(|sb| sb.current_channel());
            if classification.recognized {
                debug!(target: "console", "\n{}", *registry);
            }
            (classification, registry.revision() != revision, channel)
        };

        info!(target: "console", recognized = classification.recognized, "{line}");
        self.lookback.advance(line);

        if changed {
            self.persist().await;
        }

        Ok(self.notify(classification, channel).await)
    }

    /// Clear every heartbeat and persist, e.g. when the supervised server
    /// starts or exits.
    pub async fn mark_all_stopped(&self) {
        let changed = {
            let mut registry = self.registry.write().await;
            let revision = registry.revision();
            registry.set_all_stopped();
            registry.revision() != revision
        };
        if changed {
            self.persist().await;
        }
    }

    async fn persist(&self) {
        let registry = self.registry.read().await;
        if let Err(err) = self.store.save(&registry).await {
            error!(error = %err, "failed to persist box status");
        }
    }

    async fn notify(&self, classification: Classification, channel: Option<i32>) -> LineOutcome {
        if !classification.recognized {
            return LineOutcome::Unrecognized;
        }
        let Some(box_name) = classification.box_name else {
            return LineOutcome::Silent;
        };
        if classification.action == BoxAction::None {
            return LineOutcome::Silent;
        }
        let Some(channel) = channel else {
            warn!(%box_name, action = %classification.action, "box not found in registry");
            return LineOutcome::UnknownBox(box_name);
        };

        let key = DedupKey::new(box_name.as_str(), classification.action, channel);
        if !self.dedup.admit(&key) {
            debug!(%key, "already notified");
            return LineOutcome::Suppressed;
        }

        let notification = Notification::new(box_name, classification.action, channel);
        if let Err(err) = self.publisher.publish(notification.clone()).await {
            warn!(
                error = %err,
                box_name = %notification.box_name,
                "failed to publish notification"
            );
        }
        LineOutcome::Notified(notification)
    }
}
