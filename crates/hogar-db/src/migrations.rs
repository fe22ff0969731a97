//! Embedded SQL migrations and runner.
//!
//! Migrations are stored as `&str` constants and executed in order.  A
//! `schema_migrations` table tracks which versions have been applied.

use hogar_core::{Error, Result};
use rusqlite::Connection;

/// V1: initial schema -- creates all core tables and indexes.
const V1_INITIAL: &str = r#"
-- Users and auth
CREATE TABLE users (
    id            TEXT PRIMARY KEY,
    username      TEXT UNIQUE NOT NULL,
    email         TEXT,
    password_hash TEXT NOT NULL,
    role          TEXT NOT NULL DEFAULT 'user',
    created_at    TEXT NOT NULL
);

CREATE TABLE auth_tokens (
    id         TEXT PRIMARY KEY,
    user_id    TEXT NOT NULL REFERENCES users(id),
    token      TEXT UNIQUE NOT NULL,
    expires_at TEXT NOT NULL
);

-- Movies. genres/actors are JSON text arrays.
CREATE TABLE movies (
    id               TEXT PRIMARY KEY,
    title            TEXT NOT NULL,
    subtitle         TEXT,
    description      TEXT,
    img_banner       TEXT,
    year             INTEGER,
    director         TEXT,
    duration_minutes INTEGER,
    seen             INTEGER DEFAULT 0,
    rating           REAL,
    trailer          TEXT,
    path             TEXT NOT NULL,
    genres           TEXT NOT NULL DEFAULT '[]',
    actors           TEXT NOT NULL DEFAULT '[]',
    created_at       TEXT NOT NULL
);

-- Photos. tags/albums/people are JSON text arrays.
CREATE TABLE photos (
    id          TEXT PRIMARY KEY,
    name        TEXT NOT NULL,
    description TEXT,
    upload_by   TEXT,
    is_favorite INTEGER DEFAULT 0,
    is_private  INTEGER DEFAULT 0,
    orientation TEXT,
    path        TEXT NOT NULL,
    location    TEXT,
    dimensions  TEXT,
    size_bytes  INTEGER,
    photo_date  TEXT,
    photo_time  TEXT,
    tags        TEXT NOT NULL DEFAULT '[]',
    albums      TEXT NOT NULL DEFAULT '[]',
    people      TEXT NOT NULL DEFAULT '[]',
    created_at  TEXT NOT NULL
);

-- Audio tracks belonging to a movie
CREATE TABLE audios (
    id         TEXT PRIMARY KEY,
    movie_id   TEXT NOT NULL REFERENCES movies(id) ON DELETE CASCADE,
    language   TEXT,
    path       TEXT NOT NULL,
    created_at TEXT NOT NULL
);

-- Subtitle files belonging to a movie
CREATE TABLE subtitles (
    id         TEXT PRIMARY KEY,
    movie_id   TEXT NOT NULL REFERENCES movies(id) ON DELETE CASCADE,
    name       TEXT,
    language   TEXT,
    path       TEXT NOT NULL,
    created_at TEXT NOT NULL
);

-- Indexes
CREATE INDEX idx_movies_title     ON movies(title);
CREATE INDEX idx_audios_movie     ON audios(movie_id);
CREATE INDEX idx_subtitles_movie  ON subtitles(movie_id);
CREATE INDEX idx_auth_tokens_user ON auth_tokens(user_id);
"#;

/// V2: seed the anonymous user used when auth is disabled.
///
/// The auth middleware returns this well-known UUID for unauthenticated
/// requests.  The placeholder hash can never match a bcrypt verification.
const V2_ANONYMOUS_USER: &str = r#"
INSERT OR IGNORE INTO users (id, username, password_hash, role, created_at)
VALUES ('00000000-0000-0000-0000-000000000000', 'anonymous', '!disabled', 'user', datetime('now'));
"#;

/// Ordered list of (version, sql) pairs.
const MIGRATIONS: &[(i64, &str)] = &[(1, V1_INITIAL), (2, V2_ANONYMOUS_USER)];

/// Run all pending migrations on `conn`.
///
/// Creates the `schema_migrations` tracking table if it does not exist,
/// then applies each outstanding migration inside a transaction.
pub fn run_migrations(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            version    INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        )",
    )
    .map_err(|e| Error::database(format!("Failed to create schema_migrations: {e}")))?;

    for &(version, sql) in MIGRATIONS {
        let already: bool = conn
            .query_row(
                "SELECT COUNT(*) > 0 FROM schema_migrations WHERE version = ?1",
                [version],
                |row| row.get(0),
            )
            .map_err(|e| Error::database(e.to_string()))?;

        if already {
            continue;
        }

        let tx = conn
            .unchecked_transaction()
            .map_err(|e| Error::database(e.to_string()))?;

        tx.execute_batch(sql)
            .map_err(|e| Error::database(format!("Migration V{version} failed: {e}")))?;

        tx.execute(
            "INSERT INTO schema_migrations (version) VALUES (?1)",
            [version],
        )
        .map_err(|e| Error::database(e.to_string()))?;

        tx.commit().map_err(|e| Error::database(e.to_string()))?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::Connection;

    #[test]
    fn test_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn).unwrap();
        // second call is a no-op
        run_migrations(&conn).unwrap();
    }

    #[test]
    fn test_all_tables_created() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch("PRAGMA foreign_keys = ON;").unwrap();
        run_migrations(&conn).unwrap();

        let tables = [
            "users",
            "auth_tokens",
            "movies",
            "photos",
            "audios",
            "subtitles",
            "schema_migrations",
        ];
        for t in &tables {
            let exists: bool = conn
                .query_row(
                    "SELECT COUNT(*) > 0 FROM sqlite_master WHERE type='table' AND name=?1",
                    [t],
                    |row| row.get(0),
                )
                .unwrap();
            assert!(exists, "table {t} should exist");
        }
    }

    #[test]
    fn anonymous_user_seeded() {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn).unwrap();

        let username: String = conn
            .query_row(
                "SELECT username FROM users WHERE id = '00000000-0000-0000-0000-000000000000'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(username, "anonymous");
    }
}
