use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use logger_libs::error_logger;
use serde_json::json;
use thiserror::Error;

/// Failures a request handler can end with. Each variant maps to exactly one
/// HTTP status; the rendered body is `{"status": "failed", "message": ...}`.
#[derive(Debug, Error)]
pub enum PostError {
    #[error("{0}")]
    Unauthenticated(String),

    #[error("{0}")]
    InvalidInput(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    AlreadyDone(String),

    /// `message` goes to the client, `detail` only to the log.
    #[error("{message}")]
    Internal { message: String, detail: String },
}

impl PostError {
    /// Logs `detail` and returns an error that only exposes `message`.
    pub fn internal(message: &str, detail: impl std::fmt::Display) -> Self {
        let detail = detail.to_string();
        error_logger(message, &detail);
        PostError::Internal {
            message: message.to_string(),
            detail,
        }
    }
}

impl ResponseError for PostError {
    fn status_code(&self) -> StatusCode {
        match self {
            PostError::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
            PostError::InvalidInput(_) | PostError::AlreadyDone(_) => StatusCode::BAD_REQUEST,
            PostError::Forbidden(_) => StatusCode::FORBIDDEN,
            PostError::NotFound(_) => StatusCode::NOT_FOUND,
            PostError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(json!({
            "status": "failed",
            "message": self.to_string()
        }))
    }
}

/// Persistence failures, whichever backend produced them.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("encoding error: {0}")]
    Encoding(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::body::to_bytes;

    #[test]
    fn statuses_follow_taxonomy() {
        assert_eq!(
            PostError::Unauthenticated("x".into()).status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            PostError::InvalidInput("x".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            PostError::AlreadyDone("x".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(PostError::Forbidden("x".into()).status_code(), StatusCode::FORBIDDEN);
        assert_eq!(PostError::NotFound("x".into()).status_code(), StatusCode::NOT_FOUND);
        assert_eq!(
            PostError::internal("Failed", "boom").status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[actix_web::test]
    async fn internal_detail_is_not_rendered() {
        let response = PostError::internal("Failed to create post", "relation posts does not exist")
            .error_response();
        let body = to_bytes(response.into_body()).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&body).unwrap();

        assert_eq!(body["status"], "failed");
        assert_eq!(body["message"], "Failed to create post");
        assert!(!body.to_string().contains("relation"));
    }
}
