use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

/// Application error, mapped once at the HTTP boundary.
///
/// Every failure, domain or internal, is returned as the same JSON envelope
/// with status 422; only the `error_type` tag and message differ. Internal
/// errors are logged and reported with a generic message.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("user not found")]
    UserNotFound,

    #[error("tweet not found")]
    TweetNotFound,

    #[error("you can only delete your own tweets")]
    NotTweetOwner,

    #[error("already following this user")]
    AlreadyFollowing,

    #[error("you are not subscribed to this user")]
    NotFollowing,

    #[error("tweet already liked")]
    AlreadyLiked,

    #[error("like not found")]
    LikeNotFound,

    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Pool error: {0}")]
    Pool(#[from] r2d2::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Token error: {0}")]
    Token(#[from] jsonwebtoken::errors::Error),

    #[error("Multipart error: {0}")]
    Multipart(#[from] axum::extract::multipart::MultipartError),
}

/// The fixed failure envelope every error response carries.
#[derive(Debug, Serialize, Deserialize)]
pub struct Failure {
    pub result: bool,
    pub error_type: String,
    pub error_message: String,
}

impl AppError {
    pub fn error_type(&self) -> &'static str {
        match self {
            AppError::UserNotFound => "user_not_found",
            AppError::TweetNotFound => "tweet_not_found",
            AppError::NotTweetOwner => "not_tweet_owner",
            AppError::AlreadyFollowing => "already_following",
            AppError::NotFollowing => "not_following",
            AppError::AlreadyLiked => "already_liked",
            AppError::LikeNotFound => "like_not_found",
            AppError::BadRequest(_) => "bad_request",
            AppError::Database(_)
            | AppError::Pool(_)
            | AppError::Io(_)
            | AppError::Token(_)
            | AppError::Multipart(_) => "internal_error",
        }
    }

    fn is_internal(&self) -> bool {
        self.error_type() == "internal_error"
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let error_message = if self.is_internal() {
            tracing::error!("{}", self);
            "internal server error".to_string()
        } else {
            self.to_string()
        };

        let body = Failure {
            result: false,
            error_type: self.error_type().to_string(),
            error_message,
        };

        (StatusCode::UNPROCESSABLE_ENTITY, Json(body)).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_error_maps_to_422() {
        for err in [
            AppError::UserNotFound,
            AppError::TweetNotFound,
            AppError::AlreadyFollowing,
            AppError::BadRequest("oops".into()),
            AppError::Database(rusqlite::Error::InvalidQuery),
        ] {
            let response = err.into_response();
            assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        }
    }

    #[test]
    fn domain_errors_keep_their_tags() {
        assert_eq!(AppError::UserNotFound.error_type(), "user_not_found");
        assert_eq!(AppError::AlreadyLiked.error_type(), "already_liked");
        assert_eq!(AppError::NotFollowing.error_type(), "not_following");
    }

    #[test]
    fn lower_level_errors_are_tagged_internal() {
        let err = AppError::Database(rusqlite::Error::InvalidQuery);
        assert_eq!(err.error_type(), "internal_error");
        let err = AppError::Io(std::io::Error::other("disk on fire"));
        assert_eq!(err.error_type(), "internal_error");
    }
}
