use axum::extract::{Multipart, State};
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};
use crate::extractors::ApiUser;
use crate::repo;
use crate::state::AppState;
use crate::storage;

#[derive(Debug, Serialize, Deserialize)]
pub struct FileSuccess {
    pub result: bool,
    pub media_id: i64,
}

pub fn router() -> Router<AppState> {
    Router::new().route("/api/medias", post(upload_media))
}

/// Accept a multipart upload, store the bytes under the uploads directory
/// and record a detached media row. The returned id is attached to a tweet
/// later, on tweet creation.
async fn upload_media(
    State(state): State<AppState>,
    ApiUser(user): ApiUser,
    mut multipart: Multipart,
) -> AppResult<(StatusCode, Json<FileSuccess>)> {
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some("file") {
            continue;
        }

        let original_name = field.file_name().map(str::to_string);
        let content_type = field.content_type().map(str::to_string);
        let data = field.bytes().await?;

        let stored_path = storage::save_upload(
            state.config.uploads_path(),
            original_name.as_deref(),
            content_type.as_deref(),
            data,
        )
        .await?;

        let conn = state.db.get()?;
        let media_id = repo::media::insert(&conn, &stored_path)?;
        tracing::info!("User {} uploaded media {} ({})", user.id, media_id, stored_path);

        return Ok((
            StatusCode::CREATED,
            Json(FileSuccess {
                result: true,
                media_id,
            }),
        ));
    }

    Err(AppError::BadRequest("multipart field `file` is required".into()))
}
