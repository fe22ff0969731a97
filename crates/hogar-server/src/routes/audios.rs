//! Audio track CRUD and streaming routes.

use axum::extract::{Path, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::context::AppContext;
use crate::error::AppError;
use crate::streaming;

#[derive(Debug, Serialize)]
pub struct AudioResponse {
    pub id: String,
    pub movie_id: String,
    pub language: Option<String>,
    pub path: String,
    pub created_at: String,
}

impl From<hogar_db::models::Audio> for AudioResponse {
    fn from(a: hogar_db::models::Audio) -> Self {
        Self {
            id: a.id.to_string(),
            movie_id: a.movie_id.to_string(),
            language: a.language,
            path: a.path,
            created_at: a.created_at,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateAudioRequest {
    pub movie_id: String,
    pub language: Option<String>,
    pub path: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateAudioRequest {
    pub language: Option<String>,
    pub path: String,
}

/// GET /api/audios
pub async fn list_audios(
    State(ctx): State<AppContext>,
) -> Result<Json<Vec<AudioResponse>>, AppError> {
    let conn = hogar_db::pool::get_conn(&ctx.db)?;
    let audios = hogar_db::queries::audios::list_audios(&conn)?;
    Ok(Json(audios.into_iter().map(AudioResponse::from).collect()))
}

/// GET /api/audios/{id}
pub async fn get_audio(
    State(ctx): State<AppContext>,
    Path(audio_id): Path<String>,
) -> Result<Json<AudioResponse>, AppError> {
    let id = parse_audio_id(&audio_id)?;
    let conn = hogar_db::pool::get_conn(&ctx.db)?;
    let audio = hogar_db::queries::audios::get_audio(&conn, id)?
        .ok_or_else(|| hogar_core::Error::not_found("audio", id))?;
    Ok(Json(audio.into()))
}

/// POST /api/audios
pub async fn create_audio(
    State(ctx): State<AppContext>,
    Json(payload): Json<CreateAudioRequest>,
) -> Result<(StatusCode, Json<AudioResponse>), AppError> {
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

    let audio = hogar_db::queries::audios::create_audio(
        &conn,
        movie_id,
        payload.language.as_deref(),
        &payload.path,
    )?;
    Ok((StatusCode::CREATED, Json(audio.into())))
}

/// PUT /api/audios/{id}
pub async fn update_audio(
    State(ctx): State<AppContext>,
    Path(audio_id): Path<String>,
    Json(payload): Json<UpdateAudioRequest>,
) -> Result<StatusCode, AppError> {
    let id = parse_audio_id(&audio_id)?;
    if payload.path.trim().is_empty() {
        return Err(hogar_core::Error::Validation("Path must not be empty".into()).into());
    }

    let conn = hogar_db::pool::get_conn(&ctx.db)?;
    if !hogar_db::queries::audios::update_audio(
        &conn,
        id,
        payload.language.as_deref(),
        &payload.path,
    )? {
        return Err(hogar_core::Error::not_found("audio", id).into());
    }
    Ok(StatusCode::NO_CONTENT)
}

/// DELETE /api/audios/{id}
pub async fn delete_audio(
    State(ctx): State<AppContext>,
    Path(audio_id): Path<String>,
) -> Result<StatusCode, AppError> {
    let id = parse_audio_id(&audio_id)?;
    let conn = hogar_db::pool::get_conn(&ctx.db)?;
    if !hogar_db::queries::audios::delete_audio(&conn, id)? {
        return Err(hogar_core::Error::not_found("audio", id).into());
    }
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/audios/{id}/stream — range streaming with an audio MIME type.
pub async fn stream_audio(
    State(ctx): State<AppContext>,
    Path(audio_id): Path<String>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, AppError> {
    let id = parse_audio_id(&audio_id)?;

    let conn = hogar_db::pool::get_conn(&ctx.db)?;
    let audio = hogar_db::queries::audios::get_audio(&conn, id)?
        .ok_or_else(|| hogar_core::Error::not_found("audio", id))?;
    drop(conn);

    let ext = streaming::file_extension(&audio.path);
    let range = headers.get(header::RANGE).and_then(|v| v.to_str().ok());
    let response = streaming::serve_file_range(
        std::path::Path::new(&audio.path),
        streaming::guess_content_type(&ext),
        range,
    )
    .await?;
    Ok(response)
}

fn parse_audio_id(s: &str) -> Result<hogar_core::AudioId, hogar_core::Error> {
    s.parse()
        .map_err(|_| hogar_core::Error::Validation("Invalid audio_id".into()))
}
