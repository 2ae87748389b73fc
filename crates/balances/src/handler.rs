use crate::models::{BalanceQuery, GroupBalanceSummary, ParticipantGroupBalance};
use crate::service::{BalanceError, BalanceService};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use common::AppState;
use serde_json::json;
use std::sync::Arc;

impl IntoResponse for BalanceError {
    fn into_response(self) -> Response {
        let (status, msg) = match self {
            BalanceError::InvalidInput(msg) => (StatusCode::BAD_REQUEST, msg),
            BalanceError::NotFound => (StatusCode::NOT_FOUND, "Group not found".to_string()),
            BalanceError::DataIntegrity(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Data integrity error: {}", msg),
            ),
            BalanceError::Infrastructure(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
            ),
        };

        (status, Json(json!({ "error": msg }))).into_response()
    }
}

pub fn balances_router(state: Arc<AppState>) -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(group_balances))
        .route("/participant/{name}", get(participant_balances))
        .with_state(state)
}

async fn group_balances(
    State(state): State<Arc<AppState>>,
    Query(query): Query<BalanceQuery>,
) -> Result<Json<Vec<GroupBalanceSummary>>, BalanceError> {
    let summaries = BalanceService::group_balances(&state.db, state.owner(), query.group_id)
        .await
        .map_err(|e| {
            tracing::error!("group_balances error: {:?}", e);
            e
        })?;
    Ok(Json(summaries))
}

async fn participant_balances(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
    Query(query): Query<BalanceQuery>,
) -> Result<Json<Vec<ParticipantGroupBalance>>, BalanceError> {
    let balances = BalanceService::participant_balances(&state.db, state.owner(), &name, query.group_id)
        .await
        .map_err(|e| {
            tracing::error!("participant_balances error: {:?}", e);
            e
        })?;
    Ok(Json(balances))
}
