//! Audio track CRUD operations.

use chrono::Utc;
use hogar_core::{AudioId, Error, MovieId, Result};
use rusqlite::Connection;

use crate::models::Audio;

const COLS: &str = "id, movie_id, language, path, created_at";

/// Create a new audio track for a movie.
pub fn create_audio(
    conn: &Connection,
    movie_id: MovieId,
    language: Option<&str>,
    path: &str,
) -> Result<Audio> {
    let id = AudioId::new();
    let created_at = Utc::now().to_rfc3339();

    conn.execute(
        "INSERT INTO audios (id, movie_id, language, path, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        rusqlite::params![id.to_string(), movie_id.to_string(), language, path, created_at],
    )
    .map_err(|e| Error::database(e.to_string()))?;

    Ok(Audio {
        id,
        movie_id,
        language: language.map(str::to_string),
        path: path.to_string(),
        created_at,
    })
}

/// Get an audio track by primary key.
pub fn get_audio(conn: &Connection, id: AudioId) -> Result<Option<Audio>> {
    let q = format!("SELECT {COLS} FROM audios WHERE id = ?1");
    let result = conn.query_row(&q, [id.to_string()], Audio::from_row);
    match result {
        Ok(a) => Ok(Some(a)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(Error::database(e.to_string())),
    }
}

/// List all audio tracks for a movie, oldest first.
pub fn list_audios_by_movie(conn: &Connection, movie_id: MovieId) -> Result<Vec<Audio>> {
    let q = format!("SELECT {COLS} FROM audios WHERE movie_id = ?1 ORDER BY created_at ASC");
    let mut stmt = conn.prepare(&q).map_err(|e| Error::database(e.to_string()))?;
    let rows = stmt
        .query_map([movie_id.to_string()], Audio::from_row)
        .map_err(|e| Error::database(e.to_string()))?
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| Error::database(e.to_string()))?;
    Ok(rows)
}

/// List every audio track.
pub fn list_audios(conn: &Connection) -> Result<Vec<Audio>> {
    let q = format!("SELECT {COLS} FROM audios ORDER BY created_at ASC");
    let mut stmt = conn.prepare(&q).map_err(|e| Error::database(e.to_string()))?;
    let rows = stmt
        .query_map([], Audio::from_row)
        .map_err(|e| Error::database(e.to_string()))?
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| Error::database(e.to_string()))?;
    Ok(rows)
}

/// Update an audio track's language and path. Returns true if a row changed.
pub fn update_audio(
    conn: &Connection,
    id: AudioId,
    language: Option<&str>,
    path: &str,
) -> Result<bool> {
    let n = conn
        .execute(
            "UPDATE audios SET language = ?1, path = ?2 WHERE id = ?3",
            rusqlite::params![language, path, id.to_string()],
        )
        .map_err(|e| Error::database(e.to_string()))?;
    Ok(n > 0)
}

/// Delete an audio track by ID. Returns true if a row was deleted.
pub fn delete_audio(conn: &Connection, id: AudioId) -> Result<bool> {
    let n = conn
        .execute("DELETE FROM audios WHERE id = ?1", [id.to_string()])
        .map_err(|e| Error::database(e.to_string()))?;
    Ok(n > 0)
}
