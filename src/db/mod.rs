pub mod models;

use jsonwebtoken::Algorithm;
use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::params;
use std::path::Path;

use crate::auth;
use crate::state::DbPool;

const MIGRATIONS: &[(&str, &str)] = &[(
    "001_initial",
    include_str!("../../migrations/001_initial.sql"),
)];

/// Usernames inserted by `seed_users`; their api keys equal their names.
pub const SEED_USERNAMES: &[&str] = &["test", "test1", "test2", "test3"];

pub fn create_pool(db_path: &Path) -> anyhow::Result<DbPool> {
    // Ensure parent directory exists
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let manager = SqliteConnectionManager::file(db_path);
    let pool = Pool::builder().max_size(8).build(manager)?;

    // Configure SQLite for performance
    let conn = pool.get()?;
    conn.execute_batch(
        "
        PRAGMA journal_mode = WAL;
        PRAGMA synchronous = NORMAL;
        PRAGMA foreign_keys = ON;
        PRAGMA busy_timeout = 5000;
        ",
    )?;

    Ok(pool)
}

pub fn run_migrations(pool: &DbPool) -> anyhow::Result<()> {
    let conn = pool.get()?;

    // Create migrations tracking table
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_version (
            name TEXT PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        );",
    )?;

    for (name, sql) in MIGRATIONS {
        let already_applied: bool = conn.query_row(
            "SELECT COUNT(*) > 0 FROM schema_version WHERE name = ?1",
            params![name],
            |row| row.get(0),
        )?;

        if !already_applied {
            tracing::info!("Applying migration: {}", name);
            conn.execute_batch(sql)?;
            conn.execute(
                "INSERT INTO schema_version (name) VALUES (?1)",
                params![name],
            )?;
        }
    }

    tracing::info!("Database migrations complete");
    Ok(())
}

/// Insert the demo users with tokens minted under the running secret, so a
/// plain `api-key: test` header resolves to the `test` user.
pub fn seed_users(pool: &DbPool, secret: &str, algorithm: Algorithm) -> anyhow::Result<()> {
    let conn = pool.get()?;

    for &username in SEED_USERNAMES {
        let token = auth::encode_api_key(Some(username), secret, algorithm)?;
        conn.execute(
            "INSERT OR IGNORE INTO users (username, api_token) VALUES (?1, ?2)",
            params![username, token],
        )?;
    }

    tracing::info!("Seeded {} demo users", SEED_USERNAMES.len());
    Ok(())
}
