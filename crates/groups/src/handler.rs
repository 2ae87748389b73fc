use crate::models::{Group, GroupDetail, RawCreateGroupRequest, RawUpdateGroupRequest};
use crate::service::{GroupError, GroupService};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use common::AppState;
use serde_json::json;
use std::sync::Arc;

impl IntoResponse for GroupError {
    fn into_response(self) -> Response {
        let (status, msg) = match self {
            GroupError::InvalidInput(msg) => (StatusCode::BAD_REQUEST, msg),
            GroupError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            GroupError::NotFound => (StatusCode::NOT_FOUND, "Group not found".to_string()),
            GroupError::Infrastructure(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
            ),
        };

        (status, Json(json!({ "error": msg }))).into_response()
    }
}

pub fn groups_router(state: Arc<AppState>) -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(list_groups).post(create_group))
        .route("/{id}", get(get_group).put(update_group).delete(delete_group))
        .with_state(state)
}

async fn list_groups(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<Group>>, GroupError> {
    let groups = GroupService::list_groups(&state.db).await?;
    Ok(Json(groups))
}

async fn get_group(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<GroupDetail>, GroupError> {
    let detail = GroupService::get_group_detail(&state.db, id).await?;
    Ok(Json(detail))
}

async fn create_group(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<RawCreateGroupRequest>,
) -> Result<impl IntoResponse, GroupError> {
    let group = GroupService::create_group(&state.db, payload).await.map_err(|e| {
        tracing::error!("create_group error: {:?}", e);
        e
    })?;
    Ok((StatusCode::CREATED, Json(group)))
}

async fn update_group(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(payload): Json<RawUpdateGroupRequest>,
) -> Result<Json<Group>, GroupError> {
    let group = GroupService::update_group(&state.db, id, payload).await.map_err(|e| {
        tracing::error!("update_group error: {:?}", e);
        e
    })?;
    Ok(Json(group))
}

async fn delete_group(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, GroupError> {
    GroupService::delete_group(&state.db, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
