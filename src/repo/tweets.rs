use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};

use crate::db::models::Tweet;
use crate::error::AppError;
use crate::repo::media;
use crate::repo::users::UserRef;

/// A tweet as it is listed: author identity, attachment URLs, like list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TweetView {
    pub id: i64,
    pub content: String,
    pub author: UserRef,
    pub attachments: Vec<String>,
    pub likes: Vec<LikeView>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LikeView {
    pub user_id: i64,
    pub name: String,
}

fn row_to_tweet(row: &rusqlite::Row) -> rusqlite::Result<Tweet> {
    Ok(Tweet {
        id: row.get(0)?,
        user_id: row.get(1)?,
        content: row.get(2)?,
        created_at: row.get(3)?,
    })
}

pub fn get(conn: &Connection, tweet_id: i64) -> Result<Option<Tweet>, AppError> {
    conn.query_row(
        "SELECT id, user_id, content, created_at FROM tweets WHERE id = ?1",
        params![tweet_id],
        row_to_tweet,
    )
    .optional()
    .map_err(Into::into)
}

/// Fetch a tweet only if `user_id` owns it.
pub fn get_owned(
    conn: &Connection,
    user_id: i64,
    tweet_id: i64,
) -> Result<Option<Tweet>, AppError> {
    conn.query_row(
        "SELECT id, user_id, content, created_at FROM tweets \
         WHERE id = ?1 AND user_id = ?2",
        params![tweet_id, user_id],
        row_to_tweet,
    )
    .optional()
    .map_err(Into::into)
}

/// All tweets, newest first, with author, attachments and likes populated.
pub fn list(conn: &Connection) -> Result<Vec<TweetView>, AppError> {
    let mut stmt = conn.prepare(
        "SELECT t.id, t.content, u.id, u.username \
         FROM tweets t JOIN users u ON u.id = t.user_id \
         ORDER BY t.created_at DESC, t.id DESC",
    )?;
    let rows = stmt
        .query_map([], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, i64>(2)?,
                row.get::<_, String>(3)?,
            ))
        })?
        .collect::<Result<Vec<_>, _>>()?;

    let mut likes_stmt = conn.prepare(
        "SELECT l.user_id, u.username FROM likes l \
         JOIN users u ON u.id = l.user_id \
         WHERE l.tweet_id = ?1 ORDER BY l.id",
    )?;

    let mut tweets = Vec::with_capacity(rows.len());
    for (id, content, author_id, author_name) in rows {
        let attachments = media::paths_for_tweet(conn, id)?;
        let likes = likes_stmt
            .query_map(params![id], |row| {
                Ok(LikeView {
                    user_id: row.get(0)?,
                    name: row.get(1)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        tweets.push(TweetView {
            id,
            content,
            author: UserRef {
                id: author_id,
                name: author_name,
            },
            attachments,
            likes,
        });
    }

    Ok(tweets)
}

/// Insert a tweet and attach the given pre-uploaded media rows to it.
/// Unknown or already-attached media ids are skipped, as the original
/// upload flow only hands out fresh ids.
pub fn create(
    conn: &mut Connection,
    user_id: i64,
    content: &str,
    media_ids: &[i64],
) -> Result<i64, AppError> {
    let tx = conn.transaction()?;

    tx.execute(
        "INSERT INTO tweets (user_id, content) VALUES (?1, ?2)",
        params![user_id, content],
    )?;
    let tweet_id = tx.last_insert_rowid();

    for &media_id in media_ids {
        media::attach(&tx, media_id, tweet_id)?;
    }

    tx.commit()?;
    Ok(tweet_id)
}

/// Delete a tweet owned by `user_id`: media rows, like rows, then the
/// tweet row, in one transaction. Returns the stored file paths of the
/// removed media so the caller can unlink them from disk.
pub fn delete(
    conn: &mut Connection,
    tweet_id: i64,
    user_id: i64,
) -> Result<Vec<String>, AppError> {
    let tweet = get(conn, tweet_id)?.ok_or(AppError::TweetNotFound)?;
    if tweet.user_id != user_id {
        return Err(AppError::NotTweetOwner);
    }

    let paths = media::paths_for_tweet(conn, tweet_id)?;

    let tx = conn.transaction()?;
    tx.execute("DELETE FROM media WHERE tweet_id = ?1", params![tweet_id])?;
    tx.execute("DELETE FROM likes WHERE tweet_id = ?1", params![tweet_id])?;
    tx.execute("DELETE FROM tweets WHERE id = ?1", params![tweet_id])?;
    tx.commit()?;

    Ok(paths)
}

/// Add a like edge; at most one per (tweet, user).
pub fn add_like(conn: &Connection, tweet_id: i64, user_id: i64) -> Result<(), AppError> {
    if get(conn, tweet_id)?.is_none() {
        return Err(AppError::TweetNotFound);
    }

    let duplicate: bool = conn.query_row(
        "SELECT COUNT(*) > 0 FROM likes WHERE tweet_id = ?1 AND user_id = ?2",
        params![tweet_id, user_id],
        |row| row.get(0),
    )?;
    if duplicate {
        return Err(AppError::AlreadyLiked);
    }

    conn.execute(
        "INSERT INTO likes (tweet_id, user_id) VALUES (?1, ?2)",
        params![tweet_id, user_id],
    )?;
    Ok(())
}

/// Remove a like edge; removing one that does not exist is an error.
pub fn remove_like(conn: &Connection, tweet_id: i64, user_id: i64) -> Result<(), AppError> {
    if get(conn, tweet_id)?.is_none() {
        return Err(AppError::TweetNotFound);
    }

    let deleted = conn.execute(
        "DELETE FROM likes WHERE tweet_id = ?1 AND user_id = ?2",
        params![tweet_id, user_id],
    )?;
    if deleted == 0 {
        return Err(AppError::LikeNotFound);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_conn() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch("PRAGMA foreign_keys = ON;").unwrap();
        conn.execute_batch(include_str!("../../migrations/001_initial.sql"))
            .unwrap();
        for name in ["alice", "bob"] {
            conn.execute(
                "INSERT INTO users (username, api_token) VALUES (?1, ?2)",
                params![name, format!("token-{name}")],
            )
            .unwrap();
        }
        conn
    }

    #[test]
    fn create_then_list_includes_tweet() {
        let mut conn = test_conn();
        let id = create(&mut conn, 1, "hello", &[]).unwrap();
        assert_eq!(id, 1);

        let tweets = list(&conn).unwrap();
        assert_eq!(tweets.len(), 1);
        assert_eq!(tweets[0].content, "hello");
        assert_eq!(tweets[0].author.id, 1);
        assert_eq!(tweets[0].author.name, "alice");
        assert!(tweets[0].attachments.is_empty());
        assert!(tweets[0].likes.is_empty());
    }

    #[test]
    fn list_is_newest_first() {
        let mut conn = test_conn();
        create(&mut conn, 1, "first", &[]).unwrap();
        create(&mut conn, 2, "second", &[]).unwrap();

        let tweets = list(&conn).unwrap();
        assert_eq!(tweets[0].content, "second");
        assert_eq!(tweets[1].content, "first");
    }

    #[test]
    fn create_attaches_uploaded_media() {
        let mut conn = test_conn();
        let media_id = media::insert(&conn, "images/a.png").unwrap();
        let tweet_id = create(&mut conn, 1, "with pic", &[media_id, 999]).unwrap();

        let tweets = list(&conn).unwrap();
        assert_eq!(tweets[0].attachments, vec!["images/a.png".to_string()]);

        let row = media::get(&conn, media_id).unwrap().unwrap();
        assert_eq!(row.tweet_id, Some(tweet_id));
    }

    #[test]
    fn get_owned_scopes_to_owner() {
        let mut conn = test_conn();
        let id = create(&mut conn, 1, "mine", &[]).unwrap();
        assert!(get_owned(&conn, 1, id).unwrap().is_some());
        assert!(get_owned(&conn, 2, id).unwrap().is_none());
    }

    #[test]
    fn delete_removes_media_likes_and_tweet() {
        let mut conn = test_conn();
        let media_id = media::insert(&conn, "images/a.png").unwrap();
        let tweet_id = create(&mut conn, 1, "bye", &[media_id]).unwrap();
        add_like(&conn, tweet_id, 2).unwrap();

        let paths = delete(&mut conn, tweet_id, 1).unwrap();
        assert_eq!(paths, vec!["images/a.png".to_string()]);

        assert!(get(&conn, tweet_id).unwrap().is_none());
        assert!(media::get(&conn, media_id).unwrap().is_none());
        let likes: i64 = conn
            .query_row("SELECT COUNT(*) FROM likes", [], |row| row.get(0))
            .unwrap();
        assert_eq!(likes, 0);
    }

    #[test]
    fn delete_requires_ownership() {
        let mut conn = test_conn();
        let tweet_id = create(&mut conn, 1, "mine", &[]).unwrap();
        assert!(matches!(
            delete(&mut conn, tweet_id, 2),
            Err(AppError::NotTweetOwner)
        ));
        assert!(matches!(
            delete(&mut conn, 999, 1),
            Err(AppError::TweetNotFound)
        ));
        // Still there
        assert!(get(&conn, tweet_id).unwrap().is_some());
    }

    #[test]
    fn double_like_is_refused() {
        let mut conn = test_conn();
        let tweet_id = create(&mut conn, 1, "likeable", &[]).unwrap();
        add_like(&conn, tweet_id, 2).unwrap();
        assert!(matches!(
            add_like(&conn, tweet_id, 2),
            Err(AppError::AlreadyLiked)
        ));

        let tweets = list(&conn).unwrap();
        assert_eq!(tweets[0].likes.len(), 1);
        assert_eq!(tweets[0].likes[0].user_id, 2);
        assert_eq!(tweets[0].likes[0].name, "bob");
    }

    #[test]
    fn unlike_without_like_is_refused() {
        let mut conn = test_conn();
        let tweet_id = create(&mut conn, 1, "unliked", &[]).unwrap();
        assert!(matches!(
            remove_like(&conn, tweet_id, 2),
            Err(AppError::LikeNotFound)
        ));
        assert!(matches!(
            remove_like(&conn, 999, 2),
            Err(AppError::TweetNotFound)
        ));

        add_like(&conn, tweet_id, 2).unwrap();
        remove_like(&conn, tweet_id, 2).unwrap();
        assert!(list(&conn).unwrap()[0].likes.is_empty());
    }
}
