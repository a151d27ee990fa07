use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};

use crate::db::models::User;
use crate::error::{AppError, AppResult};
use crate::extractors::ApiUser;
use crate::repo;
use crate::repo::users::UserRef;
use crate::routes::Success;
use crate::state::AppState;

#[derive(Debug, Serialize, Deserialize)]
pub struct Profile {
    pub id: i64,
    pub name: String,
    pub followers: Vec<UserRef>,
    pub following: Vec<UserRef>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UserOut {
    pub result: bool,
    pub user: Profile,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/users/me", get(current_user))
        .route("/api/users/{user_id}", get(user_by_id))
        .route(
            "/api/users/{user_id}/follow",
            post(follow_user).delete(unfollow_user),
        )
}

fn load_profile(conn: &Connection, user: &User) -> Result<Profile, AppError> {
    Ok(Profile {
        id: user.id,
        name: user.username.clone(),
        followers: repo::users::followers_of(conn, user.id)?,
        following: repo::users::following_of(conn, user.id)?,
    })
}

async fn current_user(
    State(state): State<AppState>,
    ApiUser(user): ApiUser,
) -> AppResult<Json<UserOut>> {
    let conn = state.db.get()?;
    let profile = load_profile(&conn, &user)?;

    Ok(Json(UserOut {
        result: true,
        user: profile,
    }))
}

async fn user_by_id(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
) -> AppResult<Json<UserOut>> {
    let conn = state.db.get()?;
    let user = repo::users::get(&conn, user_id)?.ok_or(AppError::UserNotFound)?;
    let profile = load_profile(&conn, &user)?;

    Ok(Json(UserOut {
        result: true,
        user: profile,
    }))
}

async fn follow_user(
    State(state): State<AppState>,
    ApiUser(user): ApiUser,
    Path(user_id): Path<i64>,
) -> AppResult<(StatusCode, Json<Success>)> {
    let conn = state.db.get()?;
    repo::users::follow(&conn, user.id, user_id)?;
    tracing::info!("User {} followed user {}", user.id, user_id);

    Ok((StatusCode::CREATED, Json(Success::ok())))
}

async fn unfollow_user(
    State(state): State<AppState>,
    ApiUser(user): ApiUser,
    Path(user_id): Path<i64>,
) -> AppResult<Json<Success>> {
    let conn = state.db.get()?;
    repo::users::unfollow(&conn, user.id, user_id)?;
    tracing::info!("User {} unfollowed user {}", user.id, user_id);

    Ok(Json(Success::ok()))
}
