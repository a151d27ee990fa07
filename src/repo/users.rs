use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};

use crate::db::models::User;
use crate::error::AppError;

/// Minimal user identity as it appears in follower/following lists and
/// tweet author fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserRef {
    pub id: i64,
    pub name: String,
}

fn row_to_user(row: &rusqlite::Row) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get(0)?,
        username: row.get(1)?,
        api_token: row.get(2)?,
        created_at: row.get(3)?,
    })
}

pub fn get(conn: &Connection, user_id: i64) -> Result<Option<User>, AppError> {
    conn.query_row(
        "SELECT id, username, api_token, created_at FROM users WHERE id = ?1",
        params![user_id],
        row_to_user,
    )
    .optional()
    .map_err(Into::into)
}

pub fn find_by_token(conn: &Connection, api_token: &str) -> Result<Option<User>, AppError> {
    conn.query_row(
        "SELECT id, username, api_token, created_at FROM users WHERE api_token = ?1",
        params![api_token],
        row_to_user,
    )
    .optional()
    .map_err(Into::into)
}

pub fn list(conn: &Connection) -> Result<Vec<UserRef>, AppError> {
    let mut stmt = conn.prepare("SELECT id, username FROM users ORDER BY id")?;
    let users = stmt
        .query_map([], |row| {
            Ok(UserRef {
                id: row.get(0)?,
                name: row.get(1)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(users)
}

/// Users following `user_id`.
pub fn followers_of(conn: &Connection, user_id: i64) -> Result<Vec<UserRef>, AppError> {
    let mut stmt = conn.prepare(
        "SELECT u.id, u.username FROM follows f \
         JOIN users u ON u.id = f.follower_id \
         WHERE f.followed_id = ?1 ORDER BY u.id",
    )?;
    let users = stmt
        .query_map(params![user_id], |row| {
            Ok(UserRef {
                id: row.get(0)?,
                name: row.get(1)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(users)
}

/// Users that `user_id` follows.
pub fn following_of(conn: &Connection, user_id: i64) -> Result<Vec<UserRef>, AppError> {
    let mut stmt = conn.prepare(
        "SELECT u.id, u.username FROM follows f \
         JOIN users u ON u.id = f.followed_id \
         WHERE f.follower_id = ?1 ORDER BY u.id",
    )?;
    let users = stmt
        .query_map(params![user_id], |row| {
            Ok(UserRef {
                id: row.get(0)?,
                name: row.get(1)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(users)
}

/// Create a follow edge. The directed edge must not already exist; the
/// uniqueness check is application-level, on the same connection.
pub fn follow(conn: &Connection, follower_id: i64, followed_id: i64) -> Result<(), AppError> {
    if get(conn, followed_id)?.is_none() {
        return Err(AppError::UserNotFound);
    }

    let duplicate: bool = conn.query_row(
        "SELECT COUNT(*) > 0 FROM follows WHERE follower_id = ?1 AND followed_id = ?2",
        params![follower_id, followed_id],
        |row| row.get(0),
    )?;
    if duplicate {
        return Err(AppError::AlreadyFollowing);
    }

    conn.execute(
        "INSERT INTO follows (follower_id, followed_id) VALUES (?1, ?2)",
        params![follower_id, followed_id],
    )?;
    Ok(())
}

/// Remove a follow edge; removing one that does not exist is an error.
pub fn unfollow(conn: &Connection, follower_id: i64, followed_id: i64) -> Result<(), AppError> {
    if get(conn, followed_id)?.is_none() {
        return Err(AppError::UserNotFound);
    }

    let deleted = conn.execute(
        "DELETE FROM follows WHERE follower_id = ?1 AND followed_id = ?2",
        params![follower_id, followed_id],
    )?;
    if deleted == 0 {
        return Err(AppError::NotFollowing);
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
        for name in ["alice", "bob", "carol"] {
            conn.execute(
                "INSERT INTO users (username, api_token) VALUES (?1, ?2)",
                params![name, format!("token-{name}")],
            )
            .unwrap();
        }
        conn
    }

    #[test]
    fn get_returns_user_row() {
        let conn = test_conn();
        let user = get(&conn, 1).unwrap().unwrap();
        assert_eq!(user.username, "alice");
        assert!(get(&conn, 99).unwrap().is_none());
    }

    #[test]
    fn find_by_token_matches_exactly() {
        let conn = test_conn();
        let user = find_by_token(&conn, "token-bob").unwrap().unwrap();
        assert_eq!(user.id, 2);
        assert!(find_by_token(&conn, "token-nobody").unwrap().is_none());
    }

    #[test]
    fn list_returns_all_users() {
        let conn = test_conn();
        let users = list(&conn).unwrap();
        assert_eq!(users.len(), 3);
        assert_eq!(users[0].name, "alice");
    }

    #[test]
    fn follow_populates_both_directions() {
        let conn = test_conn();
        follow(&conn, 1, 2).unwrap();

        let following = following_of(&conn, 1).unwrap();
        assert_eq!(following.len(), 1);
        assert_eq!(following[0].name, "bob");

        let followers = followers_of(&conn, 2).unwrap();
        assert_eq!(followers.len(), 1);
        assert_eq!(followers[0].name, "alice");

        // The other direction stays empty
        assert!(followers_of(&conn, 1).unwrap().is_empty());
    }

    #[test]
    fn duplicate_follow_is_refused() {
        let conn = test_conn();
        follow(&conn, 1, 2).unwrap();
        assert!(matches!(
            follow(&conn, 1, 2),
            Err(AppError::AlreadyFollowing)
        ));
        // Reverse edge is still allowed
        follow(&conn, 2, 1).unwrap();
    }

    #[test]
    fn follow_unknown_user_is_refused() {
        let conn = test_conn();
        assert!(matches!(follow(&conn, 1, 99), Err(AppError::UserNotFound)));
    }

    #[test]
    fn unfollow_removes_the_edge() {
        let conn = test_conn();
        follow(&conn, 1, 2).unwrap();
        unfollow(&conn, 1, 2).unwrap();
        assert!(following_of(&conn, 1).unwrap().is_empty());
    }

    #[test]
    fn unfollow_without_edge_is_refused() {
        let conn = test_conn();
        assert!(matches!(unfollow(&conn, 1, 2), Err(AppError::NotFollowing)));
        assert!(matches!(
            unfollow(&conn, 1, 99),
            Err(AppError::UserNotFound)
        ));
    }
}
