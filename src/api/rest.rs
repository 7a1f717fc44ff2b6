use axum::body::Bytes;
use axum::extract::State;
use axum::http::header::AUTHORIZATION;
use axum::http::HeaderMap;
use axum::routing::{get, post, put};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::domain::board_service::BoardService;
use crate::domain::session::{Action, DisplayMode};
use crate::domain::view::BoardView;
use crate::errors::BoardError;

/// Shared application state for all API handlers.
#[derive(Clone)]
pub struct AppState {
    pub board: Arc<BoardService>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/v1/session", post(login).delete(logout))
        .route("/api/v1/session/next", post(next_centre))
        .route("/api/v1/session/previous", post(previous_centre))
        .route("/api/v1/session/centre", put(select_centre))
        .route("/api/v1/session/mode", post(set_mode))
        .route("/api/v1/view", get(view))
        .route("/api/v1/refresh", post(refresh))
        .with_state(state)
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Health {
    pub version: String,
    pub sessions: usize,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    pub view: BoardView,
}

#[derive(Debug, Deserialize)]
pub struct SelectCentre {
    pub index: usize,
}

/// Body for `POST /session/mode`. An empty body toggles.
#[derive(Debug, Default, Deserialize)]
pub struct ModeRequest {
    pub mode: Option<DisplayMode>,
}

async fn health(State(state): State<AppState>) -> Json<Health> {
    Json(Health {
        version: env!("CARGO_PKG_VERSION").to_string(),
        sessions: state.board.session_count().await,
    })
}

async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, BoardError> {
    let (token, view) = state.board.login(&req.username, &req.password).await?;
    Ok(Json(LoginResponse { token, view }))
}

async fn logout(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<BoardView>, BoardError> {
    let token = bearer(&headers)?;
    state.board.logout(token).await.map(Json)
}

async fn view(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<BoardView>, BoardError> {
    let token = bearer(&headers)?;
    state.board.view(token).await.map(Json)
}

async fn next_centre(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<BoardView>, BoardError> {
    let token = bearer(&headers)?;
    state.board.act(token, Action::Next).await.map(Json)
}

async fn previous_centre(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<BoardView>, BoardError> {
    let token = bearer(&headers)?;
    state.board.act(token, Action::Previous).await.map(Json)
}

async fn select_centre(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<SelectCentre>,
) -> Result<Json<BoardView>, BoardError> {
    let token = bearer(&headers)?;
    state.board.act(token, Action::Select(req.index)).await.map(Json)
}

async fn set_mode(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<BoardView>, BoardError> {
    let token = bearer(&headers)?;
    let req: ModeRequest = if body.iter().all(u8::is_ascii_whitespace) {
        ModeRequest::default()
    } else {
        serde_json::from_slice(&body).map_err(|e| BoardError::BadRequest(e.to_string()))?
    };
    let action = match req.mode {
        Some(mode) => Action::SetMode(mode),
        None => Action::ToggleMode,
    };
    state.board.act(token, action).await.map(Json)
}

/// Re-read every source, ignoring the cache.
async fn refresh(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<BoardView>, BoardError> {
    let token = bearer(&headers)?;
    state.board.refresh(token).await.map(Json)
}

fn bearer(headers: &HeaderMap) -> Result<&str, BoardError> {
    headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or(BoardError::NotSignedIn)
}
