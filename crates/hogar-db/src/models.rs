//! Rust structs mapping to database tables.
//!
//! Each model implements `from_row` for constructing itself from a
//! `rusqlite::Row`.

use hogar_core::{AudioId, MovieId, PhotoId, SessionId, SubtitleId, UserId};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// helpers
// ---------------------------------------------------------------------------

/// Parse a UUID-based ID from a text column.
fn parse_id<T: From<Uuid>>(row: &rusqlite::Row, idx: usize) -> rusqlite::Result<T> {
    let s: String = row.get(idx)?;
    let uuid = Uuid::parse_str(&s).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
    })?;
    Ok(T::from(uuid))
}

/// Decode a JSON text column holding a string array.
fn parse_json_list(row: &rusqlite::Row, idx: usize) -> rusqlite::Result<Vec<String>> {
    let s: String = row.get(idx)?;
    Ok(serde_json::from_str(&s).unwrap_or_default())
}

// ---------------------------------------------------------------------------
// User
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub email: Option<String>,
    pub password_hash: String,
    pub role: String,
    pub created_at: String,
}

impl User {
    pub fn from_row(row: &rusqlite::Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: parse_id(row, 0)?,
            username: row.get(1)?,
            email: row.get(2)?,
            password_hash: row.get(3)?,
            role: row.get(4)?,
            created_at: row.get(5)?,
        })
    }
}

// ---------------------------------------------------------------------------
// AuthToken
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct AuthToken {
    pub id: SessionId,
    pub user_id: UserId,
    pub token: String,
    pub expires_at: String,
}

impl AuthToken {
    pub fn from_row(row: &rusqlite::Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: parse_id(row, 0)?,
            user_id: parse_id(row, 1)?,
            token: row.get(2)?,
            expires_at: row.get(3)?,
        })
    }
}

// ---------------------------------------------------------------------------
// Movie
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct Movie {
    pub id: MovieId,
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
    pub created_at: String,
}

impl Movie {
    /// Build from a row selected as:
    /// id, title, subtitle, description, img_banner, year, director,
    /// duration_minutes, seen, rating, trailer, path, genres, actors,
    /// created_at
    pub fn from_row(row: &rusqlite::Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: parse_id(row, 0)?,
            title: row.get(1)?,
            subtitle: row.get(2)?,
            description: row.get(3)?,
            img_banner: row.get(4)?,
            year: row.get(5)?,
            director: row.get(6)?,
            duration_minutes: row.get(7)?,
            seen: row.get::<_, i64>(8)? != 0,
            rating: row.get(9)?,
            trailer: row.get(10)?,
            path: row.get(11)?,
            genres: parse_json_list(row, 12)?,
            actors: parse_json_list(row, 13)?,
            created_at: row.get(14)?,
        })
    }
}

// ---------------------------------------------------------------------------
// Photo
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct Photo {
    pub id: PhotoId,
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
    pub created_at: String,
}

impl Photo {
    /// Build from a row selected as:
    /// id, name, description, upload_by, is_favorite, is_private,
    /// orientation, path, location, dimensions, size_bytes, photo_date,
    /// photo_time, tags, albums, people, created_at
    pub fn from_row(row: &rusqlite::Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: parse_id(row, 0)?,
            name: row.get(1)?,
            description: row.get(2)?,
            upload_by: row.get(3)?,
            is_favorite: row.get::<_, i64>(4)? != 0,
            is_private: row.get::<_, i64>(5)? != 0,
            orientation: row.get(6)?,
            path: row.get(7)?,
            location: row.get(8)?,
            dimensions: row.get(9)?,
            size_bytes: row.get(10)?,
            photo_date: row.get(11)?,
            photo_time: row.get(12)?,
            tags: parse_json_list(row, 13)?,
            albums: parse_json_list(row, 14)?,
            people: parse_json_list(row, 15)?,
            created_at: row.get(16)?,
        })
    }
}

// ---------------------------------------------------------------------------
// Audio
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct Audio {
    pub id: AudioId,
    pub movie_id: MovieId,
    pub language: Option<String>,
    pub path: String,
    pub created_at: String,
}

impl Audio {
    pub fn from_row(row: &rusqlite::Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: parse_id(row, 0)?,
            movie_id: parse_id(row, 1)?,
            language: row.get(2)?,
            path: row.get(3)?,
            created_at: row.get(4)?,
        })
    }
}

// ---------------------------------------------------------------------------
// Subtitle
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct Subtitle {
    pub id: SubtitleId,
    pub movie_id: MovieId,
    pub name: Option<String>,
    pub language: Option<String>,
    pub path: String,
    pub created_at: String,
}

impl Subtitle {
    pub fn from_row(row: &rusqlite::Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: parse_id(row, 0)?,
            movie_id: parse_id(row, 1)?,
            name: row.get(2)?,
            language: row.get(3)?,
            path: row.get(4)?,
            created_at: row.get(5)?,
        })
    }
}
