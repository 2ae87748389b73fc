use askama::Template;
use axum::{
    extract::State,
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
    Form,
};
use common::{AppState, auth::AUTH_SESSION_KEY};
use serde::Deserialize;
use std::sync::Arc;
use tower_sessions::Session;

#[derive(Template)]
#[template(path = "login.html")]
pub struct LoginTemplate {
    pub error: Option<String>,
}

#[derive(Deserialize)]
pub struct LoginForm {
    pub password: String,
}

pub async fn root_redirect() -> Response {
    Redirect::to("/groups").into_response()
}

pub async fn login_get(State(state): State<Arc<AppState>>) -> Response {
    if state.config.app_password.is_none() {
        return Redirect::to("/").into_response();
    }

    render(StatusCode::OK, LoginTemplate { error: None })
}

pub async fn login_post(
    State(state): State<Arc<AppState>>,
    session: Session,
    Form(payload): Form<LoginForm>,
) -> Response {
    if let Some(correct_password) = &state.config.app_password {
        if payload.password == *correct_password {
            if let Err(e) = session.insert(AUTH_SESSION_KEY, true).await {
                tracing::error!("failed to store session: {:?}", e);
                return (StatusCode::INTERNAL_SERVER_ERROR, "Session Error").into_response();
            }
            return Redirect::to("/").into_response();
        }
    }

    tracing::warn!("rejected login attempt");
    render(
        StatusCode::UNAUTHORIZED,
        LoginTemplate { error: Some("Invalid password".into()) },
    )
}

pub async fn logout(session: Session) -> Response {
    if let Err(e) = session.flush().await {
        tracing::error!("failed to clear session: {:?}", e);
    }
    Redirect::to("/login").into_response()
}

fn render(status: StatusCode, template: LoginTemplate) -> Response {
    match template.render() {
        Ok(html) => (status, Html(html)).into_response(),
        Err(e) => {
            tracing::error!("template error: {:?}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Template Error").into_response()
        }
    }
}
