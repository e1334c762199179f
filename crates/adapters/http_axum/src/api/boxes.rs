//! JSON handlers for the box registry.

use axum::Json;
use axum::extract::{Path, State};
use axum::response::{IntoResponse, Response};
use serde_json::Value;

use slingwatch_domain::snapshot;
use slingwatch_domain::time::now;

use crate::error::ApiError;
use crate::state::AppState;

/// Possible responses from the list endpoint.
pub enum ListResponse {
    Ok(Json<Value>),
}

impl IntoResponse for ListResponse {
    fn into_response(self) -> Response {
        match self {
            Self::Ok(json) => json.into_response(),
        }
    }
}

/// Possible responses from the get endpoint.
pub enum GetResponse {
    Ok(Json<Value>),
}

impl IntoResponse for GetResponse {
    fn into_response(self) -> Response {
        match self {
            Self::Ok(json) => json.into_response(),
        }
    }
}

/// `GET /api/boxes`
///
/// The whole registry in its persisted snapshot shape.
pub async fn list(State(state): State<AppState>) -> ListResponse {
    let registry = state.registry.read().await;
    ListResponse::Ok(Json(snapshot::to_value(&registry)))
}

/// `GET /api/boxes/:name`
pub async fn get(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<GetResponse, ApiError> {
    let registry = state.registry.read().await;
    let sling_box = registry.box_status(&name)?;
    let mut entry = snapshot::box_entry(sling_box);
    if let Value::Object(fields) = &mut entry {
        fields.insert("name".into(), sling_box.name().into());
        fields.insert("isStreaming".into(), sling_box.is_streaming(now()).into());
    }
    Ok(GetResponse::Ok(Json(entry)))
}
