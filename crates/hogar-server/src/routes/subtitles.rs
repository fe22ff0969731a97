//! Subtitle CRUD and streaming routes.

use axum::extract::{Path, State};
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::context::AppContext;
use crate::error::AppError;

#[derive(Debug, Serialize)]
pub struct SubtitleResponse {
    pub id: String,
    pub movie_id: String,
    pub name: Option<String>,
    pub language: Option<String>,
    pub path: String,
    pub created_at: String,
}

impl From<hogar_db::models::Subtitle> for SubtitleResponse {
    fn from(s: hogar_db::models::Subtitle) -> Self {
        Self {
            id: s.id.to_string(),
            movie_id: s.movie_id.to_string(),
            name: s.name,
            language: s.language,
            path: s.path,
            created_at: s.created_at,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateSubtitleRequest {
    pub movie_id: String,
    pub name: Option<String>,
    pub language: Option<String>,
    pub path: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateSubtitleRequest {
    pub name: Option<String>,
    pub language: Option<String>,
    pub path: String,
}

/// GET /api/subtitles
pub async fn list_subtitles(
    State(ctx): State<AppContext>,
) -> Result<Json<Vec<SubtitleResponse>>, AppError> {
    let conn = hogar_db::pool::get_conn(&ctx.db)?;
    let subs = hogar_db::queries::subtitles::list_subtitles(&conn)?;
    Ok(Json(subs.into_iter().map(SubtitleResponse::from).collect()))
}

/// GET /api/subtitles/{id}
pub async fn get_subtitle(
    State(ctx): State<AppContext>,
    Path(subtitle_id): Path<String>,
) -> Result<Json<SubtitleResponse>, AppError> {
    let id = parse_subtitle_id(&subtitle_id)?;
    let conn = hogar_db::pool::get_conn(&ctx.db)?;
    let sub = hogar_db::queries::subtitles::get_subtitle(&conn, id)?
        .ok_or_else(|| hogar_core::Error::not_found("subtitle", id))?;
    Ok(Json(sub.into()))
}

/// POST /api/subtitles
pub async fn create_subtitle(
    State(ctx): State<AppContext>,
    Json(payload): Json<CreateSubtitleRequest>,
) -> Result<(StatusCode, Json<SubtitleResponse>), AppError> {
    if payload.path.trim().is_empty() {
        return Err(hogar_core::Error::Validation("Path must not be empty".into()).into());
    }
    let movie_id: hogar_core::MovieId = payload
        .movie_id
        .parse()
        .map_err(|_| hogar_core::Error::Validation("Invalid movie_id".into()))?;

    let conn = hogar_db::pool::get_conn(&ctx.db)?;
    if hogar_db::queries::movies::get_movie(&conn, movie_id)?.is_none() {
        return Err(hogar_core::Error::not_found("movie", movie_id).into());
    }

    let sub = hogar_db::queries::subtitles::create_subtitle(
        &conn,
        movie_id,
        payload.name.as_deref(),
        payload.language.as_deref(),
        &payload.path,
    )?;
    Ok((StatusCode::CREATED, Json(sub.into())))
}

/// PUT /api/subtitles/{id}
pub async fn update_subtitle(
    State(ctx): State<AppContext>,
    Path(subtitle_id): Path<String>,
    Json(payload): Json<UpdateSubtitleRequest>,
) -> Result<StatusCode, AppError> {
    let id = parse_subtitle_id(&subtitle_id)?;
    if payload.path.trim().is_empty() {
        return Err(hogar_core::Error::Validation("Path must not be empty".into()).into());
    }

    let conn = hogar_db::pool::get_conn(&ctx.db)?;
    if !hogar_db::queries::subtitles::update_subtitle(
        &conn,
        id,
        payload.name.as_deref(),
        payload.language.as_deref(),
        &payload.path,
    )? {
        return Err(hogar_core::Error::not_found("subtitle", id).into());
    }
    Ok(StatusCode::NO_CONTENT)
}

/// DELETE /api/subtitles/{id}
pub async fn delete_subtitle(
    State(ctx): State<AppContext>,
    Path(subtitle_id): Path<String>,
) -> Result<StatusCode, AppError> {
    let id = parse_subtitle_id(&subtitle_id)?;
    let conn = hogar_db::pool::get_conn(&ctx.db)?;
    if !hogar_db::queries::subtitles::delete_subtitle(&conn, id)? {
        return Err(hogar_core::Error::not_found("subtitle", id).into());
    }
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/subtitles/{id}/stream — whole file as UTF-8 text.
///
/// Subtitle files are small, so no Range support here; the text is served
/// verbatim with no format conversion.
pub async fn stream_subtitle(
    State(ctx): State<AppContext>,
    Path(subtitle_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let id = parse_subtitle_id(&subtitle_id)?;

    let conn = hogar_db::pool::get_conn(&ctx.db)?;
    let sub = hogar_db::queries::subtitles::get_subtitle(&conn, id)?
        .ok_or_else(|| hogar_core::Error::not_found("subtitle", id))?;
    drop(conn);

    let content = tokio::fs::read(&sub.path)
        .await
        .map_err(|_| hogar_core::Error::not_found("file", &sub.path))?;

    Ok((
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        content,
    ))
}

fn parse_subtitle_id(s: &str) -> Result<hogar_core::SubtitleId, hogar_core::Error> {
    s.parse()
        .map_err(|_| hogar_core::Error::Validation("Invalid subtitle_id".into()))
}
