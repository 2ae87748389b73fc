use crate::models::{Expense, ExpenseFilter, RawCreateExpenseRequest, RawUpdateExpenseRequest};
use crate::service::{ExpenseError, ExpenseService};
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

impl IntoResponse for ExpenseError {
    fn into_response(self) -> Response {
        let (status, msg) = match self {
            ExpenseError::InvalidInput(msg) => (StatusCode::BAD_REQUEST, msg),
            ExpenseError::NotFound => (StatusCode::NOT_FOUND, "Expense not found".to_string()),
            ExpenseError::GroupNotFound => (StatusCode::NOT_FOUND, "Group not found".to_string()),
            ExpenseError::DataIntegrity(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Data integrity error: {}", msg),
            ),
            ExpenseError::Infrastructure(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
            ),
        };

        (status, Json(json!({ "error": msg }))).into_response()
    }
}

pub fn expenses_router(state: Arc<AppState>) -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(list_expenses).post(create_expense))
        .route("/{id}", get(get_expense).put(update_expense).delete(delete_expense))
        .with_state(state)
}

async fn list_expenses(
    State(state): State<Arc<AppState>>,
    Query(filter): Query<ExpenseFilter>,
) -> Result<Json<Vec<Expense>>, ExpenseError> {
    let expenses = ExpenseService::list_expenses(&state.db, filter).await?;
    Ok(Json(expenses))
}

async fn get_expense(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<Expense>, ExpenseError> {
    let expense = ExpenseService::get_expense(&state.db, id).await?;
    Ok(Json(expense))
}

async fn create_expense(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<RawCreateExpenseRequest>,
) -> Result<impl IntoResponse, ExpenseError> {
    let expense = ExpenseService::create_expense(&state.db, payload).await.map_err(|e| {
        tracing::error!("create_expense error: {:?}", e);
        e
    })?;
    Ok((StatusCode::CREATED, Json(expense)))
}

async fn update_expense(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(payload): Json<RawUpdateExpenseRequest>,
) -> Result<Json<Expense>, ExpenseError> {
    let expense = ExpenseService::update_expense(&state.db, id, payload).await.map_err(|e| {
        tracing::error!("update_expense error: {:?}", e);
        e
    })?;
    Ok(Json(expense))
}

async fn delete_expense(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ExpenseError> {
    ExpenseService::delete_expense(&state.db, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
