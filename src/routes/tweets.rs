use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{delete, get};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};
use crate::extractors::ApiUser;
use crate::repo;
use crate::repo::tweets::TweetView;
use crate::routes::Success;
use crate::state::AppState;
use crate::storage;

#[derive(Debug, Deserialize)]
pub struct TweetIn {
    pub tweet_data: String,
    #[serde(default)]
    pub tweet_media_ids: Vec<i64>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TweetsOut {
    pub result: bool,
    pub tweets: Vec<TweetView>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct NewTweetOut {
    pub result: bool,
    pub tweet_id: i64,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/tweets", get(list_tweets).post(create_tweet))
        .route("/api/tweets/{tweet_id}", delete(delete_tweet))
}

async fn list_tweets(State(state): State<AppState>, _user: ApiUser) -> AppResult<Json<TweetsOut>> {
    let conn = state.db.get()?;
    let tweets = repo::tweets::list(&conn)?;

    Ok(Json(TweetsOut {
        result: true,
        tweets,
    }))
}

async fn create_tweet(
    State(state): State<AppState>,
    ApiUser(user): ApiUser,
    Json(tweet): Json<TweetIn>,
) -> AppResult<(StatusCode, Json<NewTweetOut>)> {
    let content = tweet.tweet_data.trim();
    if content.is_empty() {
        return Err(AppError::BadRequest("tweet content cannot be empty".into()));
    }

    let mut conn = state.db.get()?;
    let tweet_id = repo::tweets::create(&mut conn, user.id, content, &tweet.tweet_media_ids)?;
    tracing::info!("User {} created tweet {}", user.id, tweet_id);

    Ok((
        StatusCode::CREATED,
        Json(NewTweetOut {
            result: true,
            tweet_id,
        }),
    ))
}

async fn delete_tweet(
    State(state): State<AppState>,
    ApiUser(user): ApiUser,
    Path(tweet_id): Path<i64>,
) -> AppResult<Json<Success>> {
    let paths = {
        let mut conn = state.db.get()?;
        repo::tweets::delete(&mut conn, tweet_id, user.id)?
    };

    // Rows are gone; orphaned files only cost disk space, so unlink
    // failures are logged rather than surfaced.
    storage::remove_files(state.config.uploads_path(), &paths).await;
    tracing::info!("User {} deleted tweet {}", user.id, tweet_id);

    Ok(Json(Success::ok()))
}
