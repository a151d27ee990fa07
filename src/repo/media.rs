use rusqlite::{params, Connection, OptionalExtension};

use crate::db::models::Media;
use crate::error::AppError;

/// Record an uploaded file. The row starts detached (`tweet_id` NULL) and
/// is linked when a tweet is created with its id.
pub fn insert(conn: &Connection, file_path: &str) -> Result<i64, AppError> {
    conn.execute(
        "INSERT INTO media (file_path) VALUES (?1)",
        params![file_path],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn get(conn: &Connection, media_id: i64) -> Result<Option<Media>, AppError> {
    conn.query_row(
        "SELECT id, tweet_id, file_path FROM media WHERE id = ?1",
        params![media_id],
        |row| {
            Ok(Media {
                id: row.get(0)?,
                tweet_id: row.get(1)?,
                file_path: row.get(2)?,
            })
        },
    )
    .optional()
    .map_err(Into::into)
}

/// Link a detached media row to a tweet. Returns false when the id is
/// unknown or already attached elsewhere.
pub fn attach(conn: &Connection, media_id: i64, tweet_id: i64) -> Result<bool, AppError> {
    let updated = conn.execute(
        "UPDATE media SET tweet_id = ?1 WHERE id = ?2 AND tweet_id IS NULL",
        params![tweet_id, media_id],
    )?;
    Ok(updated > 0)
}

pub fn paths_for_tweet(conn: &Connection, tweet_id: i64) -> Result<Vec<String>, AppError> {
    let mut stmt =
        conn.prepare("SELECT file_path FROM media WHERE tweet_id = ?1 ORDER BY id")?;
    let paths = stmt
        .query_map(params![tweet_id], |row| row.get(0))?
        .collect::<Result<Vec<String>, _>>()?;
    Ok(paths)
}
