use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use docreg_registry::{ErrorKind, RegistryError};
use serde::Serialize;

#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("key error: {0}")]
    Key(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

pub type ServerResult<T> = Result<T, ServerError>;

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: &'static str,
    pub message: String,
}

impl ServerError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Registry(e) => match e.kind() {
                ErrorKind::Validation => StatusCode::BAD_REQUEST,
                ErrorKind::Conflict => StatusCode::CONFLICT,
                ErrorKind::NotFound => StatusCode::NOT_FOUND,
                ErrorKind::Authorization => StatusCode::FORBIDDEN,
                ErrorKind::Transport => StatusCode::SERVICE_UNAVAILABLE,
                ErrorKind::Integrity => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Config(_) | Self::Key(_) | Self::Io(_) | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn label(&self) -> &'static str {
        match self {
            Self::Registry(e) => e.kind().as_str(),
            Self::BadRequest(_) => "validation",
            _ => "internal",
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::warn!(status = status.as_u16(), error = %self, "request failed");
        }
        let body = ErrorBody {
            error: self.label(),
            message: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}
