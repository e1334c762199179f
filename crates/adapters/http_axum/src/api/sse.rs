//! Server-Sent Events (SSE) stream of engine notifications.

use axum::extract::State;
use axum::response::sse::{Event, KeepAlive, Sse};
use tokio_stream::StreamExt;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;

use crate::state::AppState;

/// `GET /api/events/stream`: SSE stream of box notifications.
///
/// Each notification is sent as a JSON `data:` frame whose SSE event name is
/// the notification kind (`ChannelChanged`, `StreamingStopped`, ...). The
/// stream continues until the client disconnects or the bus is closed.
pub async fn stream(
    State(state): State<AppState>,
) -> Sse<impl tokio_stream::Stream<Item = Result<Event, std::convert::Infallible>>> {
    let rx = state.event_bus.subscribe();
    let events = BroadcastStream::new(rx).filter_map(|result| match result {
        Ok(notification) => match serde_json::to_string(&notification) {
            Ok(json) => Some(Ok(Event::default()
                .id(notification.id.to_string())
                .event(notification.kind.as_str())
                .data(json))),
            Err(err) => {
                tracing::warn!(%err, "failed to serialize notification for SSE stream");
                None
            }
        },
        Err(BroadcastStreamRecvError::Lagged(n)) => {
            tracing::warn!(skipped = n, "SSE subscriber lagged, some notifications were dropped");
            None
        }
    });

    Sse::new(events).keep_alive(KeepAlive::default())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::body::Body;
    use axum::http::{Request, StatusCode, header};
    use http_body_util::BodyExt;
    use slingwatch_app::event_bus::InProcessEventBus;
    use slingwatch_app::ports::EventPublisher;
    use slingwatch_domain::classification::BoxAction;
    use slingwatch_domain::notification::Notification;
    use slingwatch_domain::registry::BoxRegistry;
    use tokio::sync::RwLock;
    use tower::ServiceExt;

    use super::*;

    fn test_state() -> (AppState, Arc<InProcessEventBus>) {
        let event_bus = Arc::new(InProcessEventBus::new(16));
        let state = AppState::new(
            Arc::new(RwLock::new(BoxRegistry::new())),
            Arc::clone(&event_bus),
        );
        (state, event_bus)
    }

    #[tokio::test]
    async fn should_subscribe_to_event_bus_when_stream_created() {
        let (state, event_bus) = test_state();
        let mut rx = event_bus.subscribe();

        let _sse_response = stream(State(state)).await;

        let notification = Notification::new("slingbox2", BoxAction::ChannelChanged, 155);
        let id = notification.id;
        event_bus.publish(notification).await.unwrap();

        let received = rx.recv().await.unwrap();
        assert_eq!(received.id, id);
        assert_eq!(received.channel, Some(155));
    }

    #[tokio::test]
    async fn should_stream_published_notification_as_json_frame() {
        let (state, event_bus) = test_state();
        let app = crate::router::build(state);

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/events/stream")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "text/event-stream"
        );

        event_bus
            .publish(Notification::new("slingbox1", BoxAction::StreamingStopped, -1))
            .await
            .unwrap();

        let mut body = response.into_body();
        let frame = body.frame().await.unwrap().unwrap();
        let text = String::from_utf8(frame.into_data().unwrap().to_vec()).unwrap();
        assert!(text.contains("event: StreamingStopped"));
        assert!(text.contains("\"boxName\":\"slingbox1\""));
    }
}
