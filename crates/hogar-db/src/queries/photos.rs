//! Photo CRUD operations.

use chrono::Utc;
use hogar_core::{Error, PhotoId, Result};
use rusqlite::Connection;

use crate::models::Photo;

const COLS: &str = "id, name, description, upload_by, is_favorite, is_private, orientation, \
                    path, location, dimensions, size_bytes, photo_date, photo_time, tags, \
                    albums, people, created_at";

/// Field set for creating or replacing a photo row.
#[derive(Debug, Clone, Default)]
pub struct PhotoFields {
    pub name: String,
    pub description: Option<String>,
    pub upload_by: Option<String>,
    pub is_favorite: bool,
    pub is_private: bool,
    pub orientation: Option<String>,
    pub path: String,
    pub location: Option<String>,
    pub dimensions: Option<String>,
    pub size_bytes: Option<i64>,
    pub photo_date: Option<String>,
    pub photo_time: Option<String>,
    pub tags: Vec<String>,
    pub albums: Vec<String>,
    pub people: Vec<String>,
}

fn list_json(list: &[String]) -> String {
    serde_json::to_string(list).unwrap_or_else(|_| "[]".into())
}

/// Create a new photo and return it.
pub fn create_photo(conn: &Connection, fields: &PhotoFields) -> Result<Photo> {
    let id = PhotoId::new();
    let created_at = Utc::now().to_rfc3339();

    conn.execute(
        "INSERT INTO photos (id, name, description, upload_by, is_favorite, is_private,
                             orientation, path, location, dimensions, size_bytes, photo_date,
                             photo_time, tags, albums, people, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17)",
        rusqlite::params![
            id.to_string(),
            fields.name,
            fields.description,
            fields.upload_by,
            fields.is_favorite as i64,
            fields.is_private as i64,
            fields.orientation,
            fields.path,
            fields.location,
            fields.dimensions,
            fields.size_bytes,
            fields.photo_date,
            fields.photo_time,
            list_json(&fields.tags),
            list_json(&fields.albums),
            list_json(&fields.people),
            created_at,
        ],
    )
    .map_err(|e| Error::database(e.to_string()))?;

    get_photo(conn, id)?.ok_or_else(|| Error::Internal("photo missing after insert".into()))
}

/// Get a photo by primary key.
pub fn get_photo(conn: &Connection, id: PhotoId) -> Result<Option<Photo>> {
    let q = format!("SELECT {COLS} FROM photos WHERE id = ?1");
    let result = conn.query_row(&q, [id.to_string()], Photo::from_row);
    match result {
        Ok(p) => Ok(Some(p)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(Error::database(e.to_string())),
    }
}

/// List all photos, newest first.
pub fn list_photos(conn: &Connection) -> Result<Vec<Photo>> {
    let q = format!("SELECT {COLS} FROM photos ORDER BY created_at DESC");
    let mut stmt = conn.prepare(&q).map_err(|e| Error::database(e.to_string()))?;
    let rows = stmt
        .query_map([], Photo::from_row)
        .map_err(|e| Error::database(e.to_string()))?
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| Error::database(e.to_string()))?;
    Ok(rows)
}

/// Replace all mutable fields of a photo. Returns true if a row was updated.
pub fn update_photo(conn: &Connection, id: PhotoId, fields: &PhotoFields) -> Result<bool> {
    let n = conn
        .execute(
            "UPDATE photos SET name = ?1, description = ?2, upload_by = ?3, is_favorite = ?4,
                               is_private = ?5, orientation = ?6, path = ?7, location = ?8,
                               dimensions = ?9, size_bytes = ?10, photo_date = ?11,
                               photo_time = ?12, tags = ?13, albums = ?14, people = ?15
             WHERE id = ?16",
            rusqlite::params![
                fields.name,
                fields.description,
                fields.upload_by,
                fields.is_favorite as i64,
                fields.is_private as i64,
                fields.orientation,
                fields.path,
                fields.location,
                fields.dimensions,
                fields.size_bytes,
                fields.photo_date,
                fields.photo_time,
                list_json(&fields.tags),
                list_json(&fields.albums),
                list_json(&fields.people),
                id.to_string(),
            ],
        )
        .map_err(|e| Error::database(e.to_string()))?;
    Ok(n > 0)
}

/// Delete a photo by ID. Returns true if a row was deleted.
pub fn delete_photo(conn: &Connection, id: PhotoId) -> Result<bool> {
    let n = conn
        .execute("DELETE FROM photos WHERE id = ?1", [id.to_string()])
        .map_err(|e| Error::database(e.to_string()))?;
    Ok(n > 0)
}
