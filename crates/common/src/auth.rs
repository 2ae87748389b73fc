use axum::{
    extract::{Request, State},
    http::{StatusCode, header},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
    Json,
};
use serde_json::json;
use std::sync::Arc;
use tower_sessions::Session;
use crate::AppState;

pub const AUTH_SESSION_KEY: &str = "authenticated";

pub async fn auth_middleware(
    State(state): State<Arc<AppState>>,
    session: Session,
    request: Request,
    next: Next,
) -> Response {
    // If no password is set, authentication is disabled
    if state.config.app_password.is_none() {
        return next.run(request).await;
    }

    let authenticated: bool = session
        .get(AUTH_SESSION_KEY)
        .await
        .unwrap_or(None)
        .unwrap_or(false);

    if authenticated {
        return next.run(request).await;
    }

    tracing::debug!(path = %request.uri().path(), "rejecting unauthenticated request");
    if wants_html(&request) {
        Redirect::to("/login").into_response()
    } else {
        (StatusCode::UNAUTHORIZED, Json(json!({ "error": "Authentication required" }))).into_response()
    }
}

/// Browsers get redirected to the login page; API clients get a 401.
fn wants_html(request: &Request) -> bool {
    request
        .headers()
        .get(header::ACCEPT)
        .and_then(|v| v.to_str().ok())
        .map(|accept| accept.contains("text/html"))
        .unwrap_or(false)
}
