//! Photo CRUD and file-serving routes.

use axum::extract::{Path, State};
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};

use hogar_db::queries::photos::PhotoFields;

use crate::context::AppContext;
use crate::error::AppError;
use crate::streaming;

#[derive(Debug, Serialize)]
pub struct PhotoResponse {
    pub id: String,
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

impl From<hogar_db::models::Photo> for PhotoResponse {
    fn from(p: hogar_db::models::Photo) -> Self {
        Self {
            id: p.id.to_string(),
            name: p.name,
            description: p.description,
            upload_by: p.upload_by,
            is_favorite: p.is_favorite,
            is_private: p.is_private,
            orientation: p.orientation,
            path: p.path,
            location: p.location,
            dimensions: p.dimensions,
            size_bytes: p.size_bytes,
            photo_date: p.photo_date,
            photo_time: p.photo_time,
            tags: p.tags,
            albums: p.albums,
            people: p.people,
            created_at: p.created_at,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct PhotoRequest {
    pub name: String,
    pub description: Option<String>,
    pub upload_by: Option<String>,
    #[serde(default)]
    pub is_favorite: bool,
    #[serde(default)]
    pub is_private: bool,
    pub orientation: Option<String>,
    pub path: String,
    pub location: Option<String>,
    pub dimensions: Option<String>,
    pub size_bytes: Option<i64>,
    pub photo_date: Option<String>,
    pub photo_time: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub albums: Vec<String>,
    #[serde(default)]
    pub people: Vec<String>,
}

impl PhotoRequest {
    fn validate(&self) -> Result<(), hogar_core::Error> {
        if self.name.trim().is_empty() {
            return Err(hogar_core::Error::Validation("Name must not be empty".into()));
        }
        if self.path.trim().is_empty() {
            return Err(hogar_core::Error::Validation("Path must not be empty".into()));
        }
        Ok(())
    }

    fn into_fields(self) -> PhotoFields {
        PhotoFields {
            name: self.name,
            description: self.description,
            upload_by: self.upload_by,
            is_favorite: self.is_favorite,
            is_private: self.is_private,
            orientation: self.orientation,
            path: self.path,
            location: self.location,
            dimensions: self.dimensions,
            size_bytes: self.size_bytes,
            photo_date: self.photo_date,
            photo_time: self.photo_time,
            tags: self.tags,
            albums: self.albums,
            people: self.people,
        }
    }
}

/// GET /api/photos
pub async fn list_photos(
    State(ctx): State<AppContext>,
) -> Result<Json<Vec<PhotoResponse>>, AppError> {
    let conn = hogar_db::pool::get_conn(&ctx.db)?;
    let photos = hogar_db::queries::photos::list_photos(&conn)?;
    Ok(Json(photos.into_iter().map(PhotoResponse::from).collect()))
}

/// GET /api/photos/{id}
pub async fn get_photo(
    State(ctx): State<AppContext>,
    Path(photo_id): Path<String>,
) -> Result<Json<PhotoResponse>, AppError> {
    let id = parse_photo_id(&photo_id)?;
    let conn = hogar_db::pool::get_conn(&ctx.db)?;
    let photo = hogar_db::queries::photos::get_photo(&conn, id)?
        .ok_or_else(|| hogar_core::Error::not_found("photo", id))?;
    Ok(Json(photo.into()))
}

/// POST /api/photos
pub async fn create_photo(
    State(ctx): State<AppContext>,
    Json(payload): Json<PhotoRequest>,
) -> Result<(StatusCode, Json<PhotoResponse>), AppError> {
    payload.validate()?;
    let conn = hogar_db::pool::get_conn(&ctx.db)?;
    let photo = hogar_db::queries::photos::create_photo(&conn, &payload.into_fields())?;
    Ok((StatusCode::CREATED, Json(photo.into())))
}

/// PUT /api/photos/{id}
pub async fn update_photo(
    State(ctx): State<AppContext>,
    Path(photo_id): Path<String>,
    Json(payload): Json<PhotoRequest>,
) -> Result<Json<PhotoResponse>, AppError> {
    let id = parse_photo_id(&photo_id)?;
    payload.validate()?;

    let conn = hogar_db::pool::get_conn(&ctx.db)?;
    if !hogar_db::queries::photos::update_photo(&conn, id, &payload.into_fields())? {
        return Err(hogar_core::Error::not_found("photo", id).into());
    }

    let photo = hogar_db::queries::photos::get_photo(&conn, id)?
        .ok_or_else(|| hogar_core::Error::not_found("photo", id))?;
    Ok(Json(photo.into()))
}

/// DELETE /api/photos/{id}
pub async fn delete_photo(
    State(ctx): State<AppContext>,
    Path(photo_id): Path<String>,
) -> Result<StatusCode, AppError> {
    let id = parse_photo_id(&photo_id)?;
    let conn = hogar_db::pool::get_conn(&ctx.db)?;
    if !hogar_db::queries::photos::delete_photo(&conn, id)? {
        return Err(hogar_core::Error::not_found("photo", id).into());
    }
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/photos/{id}/file — serve the image bytes.
pub async fn get_photo_file(
    State(ctx): State<AppContext>,
    Path(photo_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let id = parse_photo_id(&photo_id)?;

    let conn = hogar_db::pool::get_conn(&ctx.db)?;
    let photo = hogar_db::queries::photos::get_photo(&conn, id)?
        .ok_or_else(|| hogar_core::Error::not_found("photo", id))?;
    drop(conn);

    let ext = streaming::file_extension(&photo.path);
    let response = streaming::serve_file_range(
        std::path::Path::new(&photo.path),
        streaming::guess_content_type(&ext),
        None,
    )
    .await?;
    Ok(response)
}

/// GET /api/photos/image/{name} — serve an image from the photo upload dir.
pub async fn get_photo_by_name(
    State(ctx): State<AppContext>,
    Path(name): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    // Reject anything that could escape the upload directory.
    if name.contains('/') || name.contains('\\') || name.contains("..") || name.starts_with('.') {
        return Err(hogar_core::Error::Validation("Invalid image filename".into()).into());
    }

    let path = ctx.config.media.photo_dir.join(&name);
    let ext = streaming::file_extension(&name);

    let content = tokio::fs::read(&path)
        .await
        .map_err(|_| hogar_core::Error::not_found("image", &name))?;

    Ok((
        StatusCode::OK,
        [(
            header::CONTENT_TYPE.as_str(),
            streaming::guess_content_type(&ext),
        )],
        content,
    ))
}

fn parse_photo_id(s: &str) -> Result<hogar_core::PhotoId, hogar_core::Error> {
    s.parse()
        .map_err(|_| hogar_core::Error::Validation("Invalid photo_id".into()))
}
