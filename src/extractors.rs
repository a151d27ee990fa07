use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use crate::auth;
use crate::db::models::User;
use crate::error::AppError;
use crate::repo;
use crate::state::AppState;

/// The caller, resolved from the `api-key` request header.
///
/// The raw header value (any string, possibly absent) is encoded under the
/// configured signing key and matched against stored `api_token` values.
/// No match means the caller is unauthenticated; handlers see that as a
/// `user_not_found` domain error, never a crash.
#[derive(Debug, Clone)]
pub struct ApiUser(pub User);

impl FromRequestParts<AppState> for ApiUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let raw = parts
            .headers
            .get("api-key")
            .and_then(|value| value.to_str().ok());

        let token = auth::encode_api_key(
            raw,
            &state.config.auth.secret_key,
            state.config.token_algorithm()?,
        )?;

        let conn = state.db.get()?;
        repo::users::find_by_token(&conn, &token)?
            .map(ApiUser)
            .ok_or(AppError::UserNotFound)
    }
}
