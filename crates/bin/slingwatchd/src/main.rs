//! # slingwatchd: slingwatch daemon
//!
//! Composition root that wires all adapters together and starts the engine.
//!
//! ## Responsibilities
//! - Parse configuration (config file, env vars)
//! - Restore the box registry from the JSON status file and apply overrides;
//!   boxes first seen in the roster line get their overrides from the reader
//! - Construct the console reader, injecting the store and event bus via port traits
//! - Build the axum router over the shared registry and event bus
//! - Read the supervised server's console output line by line from stdin
//! - Handle graceful shutdown (stdin closed, SIGINT)
//!
//! ## Dependency rule
//! This is the **only** crate that depends on all other crates.
//! It is the wiring layer; no domain logic belongs here.

mod config;

use std::io::ErrorKind;
use std::sync::Arc;

use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio::sync::{Notify, RwLock};
use tracing::{error, info, warn};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use slingwatch_adapter_http_axum::state::AppState;
use slingwatch_adapter_storage_json::JsonFileStore;
use slingwatch_app::classifier::LineClassifier;
use slingwatch_app::command::CommandInterpreter;
use slingwatch_app::console_reader::ConsoleReader;
use slingwatch_app::event_bus::InProcessEventBus;
use slingwatch_app::ports::{EventPublisher, StatusStore};

use crate::config::Config;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_new(&config.logging.filter)
                .unwrap_or_else(|_| "slingwatchd=info,slingwatch=info,console=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Storage
    let store = JsonFileStore::new(&config.storage.status_file)
        .with_retry(config.storage.retries, config.retry_delay());
    let mut registry = store.load().await?.unwrap_or_default();
    config.apply_to(&mut registry);
    info!(boxes = registry.len(), "registry ready\n{registry}");

    // Engine
    let registry = Arc::new(RwLock::new(registry));
    let event_bus = Arc::new(InProcessEventBus::new(config.events.capacity));
    let classifier = LineClassifier::new(CommandInterpreter::new(config.remote_codes()?));
    let mut reader = ConsoleReader::new(
        Arc::clone(&registry),
        classifier,
        store,
        Arc::clone(&event_bus),
    )
    .with_box_settings(config.box_settings());
    // nothing can be streaming before the supervised server has printed a line
    reader.mark_all_stopped().await;

    // HTTP
    let app = slingwatch_adapter_http_axum::router::build(AppState::new(registry, event_bus));
    let bind_addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    info!("slingwatchd listening on http://{bind_addr}");

    let shutdown = Arc::new(Notify::new());
    let server = {
        let shutdown = Arc::clone(&shutdown);
        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async move { shutdown.notified().await })
                .await
        })
    };

    let stdin = BufReader::new(tokio::io::stdin());
    let result = tokio::select! {
        result = ingest(&mut reader, stdin) => result,
        _ = tokio::signal::ctrl_c() => {
            info!("interrupted");
            Ok(())
        }
    };

    reader.mark_all_stopped().await;
    shutdown.notify_one();
    if let Err(err) = server.await? {
        error!(error = %err, "http server failed");
    }

    result
}

/// Feed every console line to the reader until the stream closes.
///
/// Only fatal engine errors and unreadable input end the loop early.
async fn ingest<S, P, R>(
    reader: &mut ConsoleReader<S, P>,
    input: R,
) -> Result<(), Box<dyn std::error::Error>>
where
    S: StatusStore + Send + Sync,
    P: EventPublisher + Send + Sync,
    R: AsyncBufRead + Unpin,
{
    let mut lines = input.lines();
    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => {
                info!("console stream closed, supervised server stopped");
                return Ok(());
            }
            Err(err) if err.kind() == ErrorKind::InvalidData => {
                warn!(error = %err, "skipping console line that is not UTF-8");
                continue;
            }
            Err(err) => return Err(err.into()),
        };
        if let Err(err) = reader.process_line(&line).await {
            if err.is_fatal() {
                error!(error = %err, %line, "stopping console reader");
                return Err(err.into());
            }
            warn!(error = %err, %line, "console line failed");
        }
    }
}
