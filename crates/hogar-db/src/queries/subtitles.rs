//! Subtitle file CRUD operations.

use chrono::Utc;
use hogar_core::{Error, MovieId, Result, SubtitleId};
use rusqlite::Connection;

use crate::models::Subtitle;

const COLS: &str = "id, movie_id, name, language, path, created_at";

/// Create a new subtitle entry for a movie.
pub fn create_subtitle(
    conn: &Connection,
    movie_id: MovieId,
    name: Option<&str>,
    language: Option<&str>,
    path: &str,
) -> Result<Subtitle> {
    let id = SubtitleId::new();
    let created_at = Utc::now().to_rfc3339();

    conn.execute(
        "INSERT INTO subtitles (id, movie_id, name, language, path, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        rusqlite::params![
            id.to_string(),
            movie_id.to_string(),
            name,
            language,
            path,
            created_at
        ],
    )
    .map_err(|e| Error::database(e.to_string()))?;

    Ok(Subtitle {
        id,
        movie_id,
        name: name.map(str::to_string),
        language: language.map(str::to_string),
        path: path.to_string(),
        created_at,
    })
}

/// Get a subtitle by primary key.
pub fn get_subtitle(conn: &Connection, id: SubtitleId) -> Result<Option<Subtitle>> {
    let q = format!("SELECT {COLS} FROM subtitles WHERE id = ?1");
    let result = conn.query_row(&q, [id.to_string()], Subtitle::from_row);
    match result {
        Ok(s) => Ok(Some(s)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(Error::database(e.to_string())),
    }
}

/// List all subtitles for a movie.
pub fn list_subtitles_by_movie(conn: &Connection, movie_id: MovieId) -> Result<Vec<Subtitle>> {
    let q = format!("SELECT {COLS} FROM subtitles WHERE movie_id = ?1 ORDER BY created_at ASC");
    let mut stmt = conn.prepare(&q).map_err(|e| Error::database(e.to_string()))?;
    let rows = stmt
        .query_map([movie_id.to_string()], Subtitle::from_row)
        .map_err(|e| Error::database(e.to_string()))?
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| Error::database(e.to_string()))?;
    Ok(rows)
}

/// List every subtitle.
pub fn list_subtitles(conn: &Connection) -> Result<Vec<Subtitle>> {
    let q = format!("SELECT {COLS} FROM subtitles ORDER BY created_at ASC");
    let mut stmt = conn.prepare(&q).map_err(|e| Error::database(e.to_string()))?;
    let rows = stmt
        .query_map([], Subtitle::from_row)
        .map_err(|e| Error::database(e.to_string()))?
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| Error::database(e.to_string()))?;
    Ok(rows)
}

/// Update a subtitle's name, language, and path. Returns true if a row changed.
pub fn update_subtitle(
    conn: &Connection,
    id: SubtitleId,
    name: Option<&str>,
    language: Option<&str>,
    path: &str,
) -> Result<bool> {
    let n = conn
        .execute(
            "UPDATE subtitles SET name = ?1, language = ?2, path = ?3 WHERE id = ?4",
            rusqlite::params![name, language, path, id.to_string()],
        )
        .map_err(|e| Error::database(e.to_string()))?;
    Ok(n > 0)
}

/// Delete a subtitle by ID. Returns true if a row was deleted.
pub fn delete_subtitle(conn: &Connection, id: SubtitleId) -> Result<bool> {
    let n = conn
        .execute("DELETE FROM subtitles WHERE id = ?1", [id.to_string()])
        .map_err(|e| Error::database(e.to_string()))?;
    Ok(n > 0)
}
