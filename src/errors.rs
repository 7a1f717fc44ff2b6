use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BoardError {
    #[error("unknown user")]
    UnknownUser,

    #[error("invalid password")]
    InvalidPassword,

    #[error("data source unavailable: {0}")]
    DataSourceUnavailable(String),

    #[error("no centres are assigned to this user")]
    NoAuthorizedCentres,

    #[error("not signed in")]
    NotSignedIn,

    #[error("bad request: {0}")]
    BadRequest(String),
}

impl BoardError {
    pub fn unavailable(err: impl std::fmt::Display) -> Self {
        BoardError::DataSourceUnavailable(err.to_string())
    }

    pub fn is_auth_failure(&self) -> bool {
        matches!(self, BoardError::UnknownUser | BoardError::InvalidPassword)
    }
}

impl IntoResponse for BoardError {
    fn into_response(self) -> Response {
        match &self {
            // Do not tell the caller which half of the credentials was wrong.
            BoardError::UnknownUser | BoardError::InvalidPassword => {
                tracing::debug!(reason = %self, "login rejected");
                (
                    StatusCode::UNAUTHORIZED,
                    Json(json!({ "error": "invalid username or password" })),
                )
                    .into_response()
            }
            BoardError::DataSourceUnavailable(detail) => {
                tracing::error!(error = %detail, "data source unavailable");
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    Json(json!({ "error": self.to_string(), "retry": true })),
                )
                    .into_response()
            }
            BoardError::NoAuthorizedCentres => (
                StatusCode::FORBIDDEN,
                Json(json!({ "error": self.to_string() })),
            )
                .into_response(),
            BoardError::NotSignedIn => (
                StatusCode::UNAUTHORIZED,
                Json(json!({ "error": self.to_string() })),
            )
                .into_response(),
            BoardError::BadRequest(_) => (
                StatusCode::BAD_REQUEST,
                Json(json!({ "error": self.to_string() })),
            )
                .into_response(),
        }
    }
}
