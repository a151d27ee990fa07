use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};

use crate::error::AppResult;
use crate::extractors::ApiUser;
use crate::repo;
use crate::routes::Success;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route(
        "/api/tweets/{tweet_id}/likes",
        post(like_tweet).delete(unlike_tweet),
    )
}

async fn like_tweet(
    State(state): State<AppState>,
    ApiUser(user): ApiUser,
    Path(tweet_id): Path<i64>,
) -> AppResult<(StatusCode, Json<Success>)> {
    let conn = state.db.get()?;
    repo::tweets::add_like(&conn, tweet_id, user.id)?;

    Ok((StatusCode::CREATED, Json(Success::ok())))
}

async fn unlike_tweet(
    State(state): State<AppState>,
    ApiUser(user): ApiUser,
    Path(tweet_id): Path<i64>,
) -> AppResult<Json<Success>> {
    let conn = state.db.get()?;
    repo::tweets::remove_like(&conn, tweet_id, user.id)?;

    Ok(Json(Success::ok()))
}
