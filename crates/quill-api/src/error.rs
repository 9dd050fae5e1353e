use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use thiserror::Error;
use tracing::error;

#[derive(Debug, Serialize)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

pub fn field(field: &'static str, message: impl Into<String>) -> FieldError {
    FieldError {
        field,
        message: message.into(),
    }
}

/// Typed failure surface of every operation. Validation and authorization
/// failures are raised before any store mutation; storage constraint
/// violations (lost races included) are translated to `Conflict` instead
/// of leaking rusqlite shapes.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("validation failed")]
    Validation(Vec<FieldError>),
    #[error("{0} not found")]
    NotFound(&'static str),
    #[error("authentication required")]
    Unauthenticated,
    #[error("access denied")]
    Forbidden,
    #[error("{0}")]
    Conflict(String),
    #[error("server error")]
    Internal(#[source] anyhow::Error),
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        if let Some(columns) = quill_db::unique_violation(&err) {
            return ApiError::Conflict(conflict_message(columns).to_string());
        }
        ApiError::Internal(err)
    }
}

impl From<tokio::task::JoinError> for ApiError {
    fn from(err: tokio::task::JoinError) -> Self {
        ApiError::Internal(err.into())
    }
}

/// Map a violated UNIQUE column list, as SQLite reports it, to the
/// caller-facing conflict message.
fn conflict_message(columns: &str) -> &'static str {
    match columns {
        "posts.title" => "a post with this title already exists",
        "posts.slug" => "a post with this slug already exists",
        "categories.name" => "a category with this name already exists",
        "categories.slug" => "a category with this slug already exists",
        "users.username" => "this username is taken",
        "users.email" => "this email is already registered",
        c if c.starts_with("comments.") => "you have already posted this comment",
        _ => "duplicate value",
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Unauthenticated => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden => StatusCode::FORBIDDEN,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        match self {
            ApiError::Validation(errors) => {
                (status, Json(serde_json::json!({ "errors": errors }))).into_response()
            }
            ApiError::Internal(err) => {
                // Surfaced without internal detail.
                error!("internal error: {:#}", err);
                (status, Json(serde_json::json!({ "message": "server error" }))).into_response()
            }
            other => {
                (status, Json(serde_json::json!({ "message": other.to_string() }))).into_response()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conflict_messages_cover_every_unique_index() {
        assert_eq!(
            conflict_message("posts.title"),
            "a post with this title already exists"
        );
        assert_eq!(
            conflict_message("comments.author_id, comments.post_id, comments.content"),
            "you have already posted this comment"
        );
        assert_eq!(conflict_message("users.email"), "this email is already registered");
        assert_eq!(conflict_message("something.else"), "duplicate value");
    }
}
