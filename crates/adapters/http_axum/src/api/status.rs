//! Streaming status query used by the TV guide site.

use axum::Json;
use axum::extract::{Query, State};
use serde_json::Value;
use tracing::warn;

use slingwatch_domain::status::streaming_status;
use slingwatch_domain::time::now;

use crate::state::AppState;

const NAME_PARAM: &str = "slingBoxName";

/// `GET /api/status?slingBoxName=a&slingBoxName=b`
///
/// Without any `slingBoxName` the status of every box is returned. Unknown
/// names are left out of the document.
pub async fn get(
    State(state): State<AppState>,
    Query(params): Query<Vec<(String, String)>>,
) -> Json<Value> {
    let names: Vec<String> = params
        .into_iter()
        .filter(|(key, _)| key == NAME_PARAM)
        .map(|(_, value)| value)
        .collect();

    let registry = state.registry.read().await;
    let status = streaming_status(&registry, &names, now());
    for name in &status.unknown {
        warn!(box_name = %name, "status requested for unknown box");
    }
    Json(status.document)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use http_body_util::BodyExt;
    use slingwatch_app::event_bus::InProcessEventBus;
    use slingwatch_domain::registry::BoxRegistry;
    use tokio::sync::RwLock;
    use tower::ServiceExt;

    use super::*;

    async fn get_json(uri: &str) -> Value {
        let mut registry = BoxRegistry::new();
        registry.add_box("slingbox1", "sb1").unwrap();
        registry.add_box("slingbox2", "sb2").unwrap();
        registry.set_current_channel("slingbox1", 7, now()).unwrap();
        registry.set_heartbeat("slingbox1", Some(now())).unwrap();
        let app = crate::router::build(AppState::new(
            Arc::new(RwLock::new(registry)),
            Arc::new(InProcessEventBus::new(4)),
        ));

        let response = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&body).unwrap()
    }

    #[tokio::test]
    async fn should_report_requested_boxes_only() {
        let body = get_json("/api/status?slingBoxName=slingbox1").await;

        let boxes = body["slingBoxes"].as_object().unwrap();
        assert_eq!(boxes.len(), 1);
        assert_eq!(boxes["slingbox1"]["currentChannelNumber"], 7);
        assert_eq!(boxes["slingbox1"]["isStreaming"], true);
    }

    #[tokio::test]
    async fn should_report_every_box_when_no_name_given() {
        let body = get_json("/api/status").await;

        let boxes = body["slingBoxes"].as_object().unwrap();
        assert_eq!(boxes.len(), 2);
        assert_eq!(boxes["slingbox2"]["isStreaming"], false);
    }

    #[tokio::test]
    async fn should_skip_unknown_names() {
        let body = get_json("/api/status?slingBoxName=ghost&slingBoxName=slingbox2").await;

        let boxes = body["slingBoxes"].as_object().unwrap();
        assert_eq!(boxes.len(), 1);
        assert!(boxes.contains_key("slingbox2"));
    }
}
