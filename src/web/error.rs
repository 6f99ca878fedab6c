use crate::errors::Error;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use tracing::error;

impl Error {
    /// HTTP status this error is reported with.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::InvalidInput { .. } => StatusCode::BAD_REQUEST,
            Self::Conflict { .. } => StatusCode::CONFLICT,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::Forbidden { .. } => StatusCode::FORBIDDEN,
            Self::Config { .. } | Self::Database(_) | Self::Template(_) | Self::Io(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = match &self {
            Self::Unauthorized => {
                "Login required: sign in through the competition portal to continue".to_string()
            }
            _ if status.is_server_error() => {
                error!("Request failed: {self}");
                "Internal server error".to_string()
            }
            _ => self.to_string(),
        };

        (status, body).into_response()
    }
}
