//! Movie CRUD operations.

use chrono::Utc;
use hogar_core::{Error, MovieId, Result};
use rusqlite::Connection;

use crate::models::Movie;

const COLS: &str = "id, title, subtitle, description, img_banner, year, director, \
                    duration_minutes, seen, rating, trailer, path, genres, actors, created_at";

/// Field set for creating or replacing a movie row.
#[derive(Debug, Clone, Default)]
pub struct MovieFields {
    pub title: String,
    pub subtitle: Option<String>,
    pub description: Option<String>,
    pub img_banner: Option<String>,
    pub year: Option<i32>,
    pub director: Option<String>,
    pub duration_minutes: Option<i32>,
    pub seen: bool,
    pub rating: Option<f64>,
    pub trailer: Option<String>,
    pub path: String,
    pub genres: Vec<String>,
    pub actors: Vec<String>,
}

/// Create a new movie and return it.
pub fn create_movie(conn: &Connection, fields: &MovieFields) -> Result<Movie> {
    let id = MovieId::new();
    let created_at = Utc::now().to_rfc3339();
    let genres_json = serde_json::to_string(&fields.genres).unwrap_or_else(|_| "[]".into());
    let actors_json = serde_json::to_string(&fields.actors).unwrap_or_else(|_| "[]".into());

    conn.execute(
        "INSERT INTO movies (id, title, subtitle, description, img_banner, year, director,
                             duration_minutes, seen, rating, trailer, path, genres, actors, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)",
        rusqlite::params![
            id.to_string(),
            fields.title,
            fields.subtitle,
            fields.description,
            fields.img_banner,
            fields.year,
            fields.director,
            fields.duration_minutes,
            fields.seen as i64,
            fields.rating,
            fields.trailer,
            fields.path,
            genres_json,
            actors_json,
            created_at,
        ],
    )
    .map_err(|e| Error::database(e.to_string()))?;

    get_movie(conn, id)?.ok_or_else(|| Error::Internal("movie missing after insert".into()))
}

/// Get a movie by primary key.
pub fn get_movie(conn: &Connection, id: MovieId) -> Result<Option<Movie>> {
    let q = format!("SELECT {COLS} FROM movies WHERE id = ?1");
    let result = conn.query_row(&q, [id.to_string()], Movie::from_row);
    match result {
        Ok(m) => Ok(Some(m)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(Error::database(e.to_string())),
    }
}

/// Get a movie by exact title.
pub fn get_movie_by_title(conn: &Connection, title: &str) -> Result<Option<Movie>> {
    let q = format!("SELECT {COLS} FROM movies WHERE title = ?1");
    let result = conn.query_row(&q, [title], Movie::from_row);
    match result {
        Ok(m) => Ok(Some(m)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(Error::database(e.to_string())),
    }
}

/// List all movies ordered by title.
pub fn list_movies(conn: &Connection) -> Result<Vec<Movie>> {
    let q = format!("SELECT {COLS} FROM movies ORDER BY title ASC");
    let mut stmt = conn.prepare(&q).map_err(|e| Error::database(e.to_string()))?;
    let rows = stmt
        .query_map([], Movie::from_row)
        .map_err(|e| Error::database(e.to_string()))?
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| Error::database(e.to_string()))?;
    Ok(rows)
}

/// Replace all mutable fields of a movie. Returns true if a row was updated.
pub fn update_movie(conn: &Connection, id: MovieId, fields: &MovieFields) -> Result<bool> {
    let genres_json = serde_json::to_string(&fields.genres).unwrap_or_else(|_| "[]".into());
    let actors_json = serde_json::to_string(&fields.actors).unwrap_or_else(|_| "[]".into());

    let n = conn
        .execute(
            "UPDATE movies SET title = ?1, subtitle = ?2, description = ?3, img_banner = ?4,
                               year = ?5, director = ?6, duration_minutes = ?7, seen = ?8,
                               rating = ?9, trailer = ?10, path = ?11, genres = ?12, actors = ?13
             WHERE id = ?14",
            rusqlite::params![
                fields.title,
                fields.subtitle,
                fields.description,
                fields.img_banner,
                fields.year,
                fields.director,
                fields.duration_minutes,
                fields.seen as i64,
                fields.rating,
                fields.trailer,
                fields.path,
                genres_json,
                actors_json,
                id.to_string(),
            ],
        )
        .map_err(|e| Error::database(e.to_string()))?;
    Ok(n > 0)
}

/// Mark a movie as seen or unseen.
pub fn set_seen(conn: &Connection, id: MovieId, seen: bool) -> Result<bool> {
    let n = conn
        .execute(
            "UPDATE movies SET seen = ?1 WHERE id = ?2",
            rusqlite::params![seen as i64, id.to_string()],
        )
        .map_err(|e| Error::database(e.to_string()))?;
    Ok(n > 0)
}

/// Delete a movie by ID. Returns true if a row was deleted.
pub fn delete_movie(conn: &Connection, id: MovieId) -> Result<bool> {
    let n = conn
        .execute("DELETE FROM movies WHERE id = ?1", [id.to_string()])
        .map_err(|e| Error::database(e.to_string()))?;
    Ok(n > 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::init_memory_pool;

    fn sample(title: &str) -> MovieFields {
        MovieFields {
            title: title.into(),
            year: Some(1999),
            path: format!("/movies/{title}.mp4"),
            genres: vec!["drama".into(), "scifi".into()],
            actors: vec!["K. Reeves".into()],
            ..Default::default()
        }
    }

    #[test]
    fn create_and_get() {
        let pool = init_memory_pool().unwrap();
        let conn = pool.get().unwrap();
        let m = create_movie(&conn, &sample("Matrix")).unwrap();
        assert_eq!(m.title, "Matrix");
        assert_eq!(m.genres, vec!["drama", "scifi"]);

        let found = get_movie(&conn, m.id).unwrap().unwrap();
        assert_eq!(found.title, "Matrix");
        assert!(!found.seen);
    }

    #[test]
    fn get_by_title() {
        let pool = init_memory_pool().unwrap();
        let conn = pool.get().unwrap();
        create_movie(&conn, &sample("Alien")).unwrap();
        assert!(get_movie_by_title(&conn, "Alien").unwrap().is_some());
        assert!(get_movie_by_title(&conn, "Aliens").unwrap().is_none());
    }

    #[test]
    fn list_ordered() {
        let pool = init_memory_pool().unwrap();
        let conn = pool.get().unwrap();
        create_movie(&conn, &sample("Zulu")).unwrap();
        create_movie(&conn, &sample("Amelie")).unwrap();
        let all = list_movies(&conn).unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].title, "Amelie");
    }

    #[test]
    fn update_fields() {
        let pool = init_memory_pool().unwrap();
        let conn = pool.get().unwrap();
        let m = create_movie(&conn, &sample("Old")).unwrap();

        let mut fields = sample("New");
        fields.rating = Some(8.5);
        assert!(update_movie(&conn, m.id, &fields).unwrap());

        let updated = get_movie(&conn, m.id).unwrap().unwrap();
        assert_eq!(updated.title, "New");
        assert_eq!(updated.rating, Some(8.5));
    }

    #[test]
    fn seen_flag() {
        let pool = init_memory_pool().unwrap();
        let conn = pool.get().unwrap();
        let m = create_movie(&conn, &sample("Seen")).unwrap();
        assert!(set_seen(&conn, m.id, true).unwrap());
        assert!(get_movie(&conn, m.id).unwrap().unwrap().seen);
    }

    #[test]
    fn delete() {
        let pool = init_memory_pool().unwrap();
        let conn = pool.get().unwrap();
        let m = create_movie(&conn, &sample("Gone")).unwrap();
        assert!(delete_movie(&conn, m.id).unwrap());
        assert!(get_movie(&conn, m.id).unwrap().is_none());
    }
}
