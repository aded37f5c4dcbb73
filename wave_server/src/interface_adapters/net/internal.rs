use crate::interface_adapters::http::json_error;
use crate::interface_adapters::net::client::spawn_world_serializer;
use crate::interface_adapters::state::AppState;
use crate::interface_adapters::utils::ids::next_id;
use crate::use_cases::WorldError;

use axum::{
    extract::{Json, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use tracing::info;

#[derive(Debug, serde::Deserialize)]
pub struct CreateWorldRequest {
    // Optional caller-chosen id; one is generated when absent or blank.
    #[serde(default)]
    world_id: Option<String>,
}

#[derive(Debug, serde::Serialize)]
struct CreateWorldResponse {
    world_id: String,
}

pub async fn create_world_handler(
    State(state): State<Arc<AppState>>,
    payload: Option<Json<CreateWorldRequest>>,
) -> Response {
    let world_id = payload
        .and_then(|Json(body)| body.world_id)
        .map(|id| id.trim().to_string())
        .filter(|id| !id.is_empty())
        .unwrap_or_else(|| format!("w{}", next_id()));

    // Created worlds are not pinned and will be removed on last disconnect.
    match state
        .world_registry
        .create_world(world_id.clone(), false)
        .await
    {
        Ok(world) => {
            // Serializer must exist before the first client subscribes.
            spawn_world_serializer(&world);
            info!(world_id = %world_id, "world created over http");
            (StatusCode::CREATED, Json(CreateWorldResponse { world_id })).into_response()
        }
        Err(err @ WorldError::AlreadyExists) => json_error(StatusCode::CONFLICT, err.to_string()),
    }
}
