//! File-backed implementation of [`StatusStore`].

use std::future::Future;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Duration;

use tracing::{debug, info, warn};

use slingwatch_app::ports::StatusStore;
use slingwatch_domain::error::SlingError;
use slingwatch_domain::registry::BoxRegistry;
use slingwatch_domain::snapshot;

use crate::error::StoreError;

/// Snapshot file name used when none is configured.
pub const DEFAULT_STATUS_FILE: &str = "SlingBoxStatus.json";
/// Extra write attempts after the first one fails.
pub const DEFAULT_RETRIES: u32 = 3;
/// Pause between write attempts.
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(2);

/// Stores the registry as a pretty-printed JSON document.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
    retries: u32,
    retry_delay: Duration,
}

impl JsonFileStore {
    /// Create a store writing to `path`, with the default retry policy.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            retries: DEFAULT_RETRIES,
            retry_delay: DEFAULT_RETRY_DELAY,
        }
    }

    /// Override how many times a failed write is retried, and how long to wait
    /// between attempts.
    #[must_use]
    pub fn with_retry(mut self, retries: u32, retry_delay: Duration) -> Self {
        self.retries = retries;
        self.retry_delay = retry_delay;
        self
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self.path.clone().into_os_string();
        name.push(".tmp");
        PathBuf::from(name)
    }

    async fn write_atomically(&self, content: &str) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        let temp = self.temp_path();
        tokio::fs::write(&temp, content).await?;
        tokio::fs::rename(&temp, &self.path).await
    }
}

impl Default for JsonFileStore {
    fn default() -> Self {
        Self::new(DEFAULT_STATUS_FILE)
    }
}

impl StatusStore for JsonFileStore {
    fn load(&self) -> impl Future<Output = Result<Option<BoxRegistry>, SlingError>> + Send {
        async move {
            let content = match tokio::fs::read_to_string(&self.path).await {
                Ok(content) => content,
                Err(err) if err.kind() == ErrorKind::NotFound => {
                    debug!(path = %self.path.display(), "no saved box status");
                    return Ok(None);
                }
                Err(err) => return Err(StoreError::Io(err).into()),
            };

            if content.trim().is_empty() {
                warn!(path = %self.path.display(), "removing empty box status file");
                tokio::fs::remove_file(&self.path)
                    .await
                    .map_err(StoreError::Io)?;
                return Ok(None);
            }

            let registry = snapshot::from_json(&content)?;
            info!(path = %self.path.display(), boxes = registry.len(), "box status restored");
            Ok(Some(registry))
        }
    }

    fn save(&self, registry: &BoxRegistry) -> impl Future<Output = Result<(), SlingError>> + Send {
        let content = snapshot::to_json(registry);
        async move {
            let content = content?;
            let mut attempts = 0;
            loop {
                attempts += 1;
                match self.write_atomically(&content).await {
                    Ok(()) => {
                        debug!(path = %self.path.display(), "box status saved");
                        return Ok(());
                    }
                    Err(err) if attempts <= self.retries => {
                        warn!(
                            path = %self.path.display(),
                            attempt = attempts,
                            error = %err,
                            "failed to save box status, retrying"
                        );
                        tokio::time::sleep(self.retry_delay).await;
                    }
                    Err(source) => {
                        return Err(StoreError::Write {
                            path: self.path.clone(),
                            attempts,
                            source,
                        }
                        .into());
                    }
                }
            }
        }
    }
}
