//! Movie CRUD and streaming routes.
//!
//! `GET /api/movies/{id}/stream` picks the delivery path per container:
//! native containers are served directly with Range support, everything
//! else is transcoded live to fragmented MP4. `GET /api/movies/{id}/muxed`
//! serves the cached mux artifact, producing it on first request.

use axum::body::Body;
use axum::extract::{Path, Query, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};

use hogar_av::{TranscodeSettings, TranscodeStream};
use hogar_db::queries::movies::MovieFields;

use crate::context::AppContext;
use crate::error::AppError;
use crate::mux_prep;
use crate::streaming;

#[derive(Debug, Serialize)]
pub struct MovieResponse {
    pub id: String,
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

impl From<hogar_db::models::Movie> for MovieResponse {
    fn from(m: hogar_db::models::Movie) -> Self {
        Self {
            id: m.id.to_string(),
            title: m.title,
            subtitle: m.subtitle,
            description: m.description,
            img_banner: m.img_banner,
            year: m.year,
            director: m.director,
            duration_minutes: m.duration_minutes,
            seen: m.seen,
            rating: m.rating,
            trailer: m.trailer,
            path: m.path,
            genres: m.genres,
            actors: m.actors,
            created_at: m.created_at,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct MovieRequest {
    pub title: String,
    pub subtitle: Option<String>,
    pub description: Option<String>,
    pub img_banner: Option<String>,
    pub year: Option<i32>,
    pub director: Option<String>,
    pub duration_minutes: Option<i32>,
    #[serde(default)]
    pub seen: bool,
    pub rating: Option<f64>,
    pub trailer: Option<String>,
    pub path: String,
    #[serde(default)]
    pub genres: Vec<String>,
    #[serde(default)]
    pub actors: Vec<String>,
}

impl MovieRequest {
    fn validate(&self) -> Result<(), hogar_core::Error> {
        if self.title.trim().is_empty() {
            return Err(hogar_core::Error::Validation("Title must not be empty".into()));
        }
        if self.path.trim().is_empty() {
            return Err(hogar_core::Error::Validation("Path must not be empty".into()));
        }
        Ok(())
    }

    fn into_fields(self) -> MovieFields {
        MovieFields {
            title: self.title,
            subtitle: self.subtitle,
            description: self.description,
            img_banner: self.img_banner,
            year: self.year,
            director: self.director,
            duration_minutes: self.duration_minutes,
            seen: self.seen,
            rating: self.rating,
            trailer: self.trailer,
            path: self.path,
            genres: self.genres,
            actors: self.actors,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct SeenRequest {
    pub seen: bool,
}

#[derive(Debug, Deserialize)]
pub struct MuxQuery {
    pub language: Option<String>,
}

/// GET /api/movies
pub async fn list_movies(
    State(ctx): State<AppContext>,
) -> Result<Json<Vec<MovieResponse>>, AppError> {
    let conn = hogar_db::pool::get_conn(&ctx.db)?;
    let movies = hogar_db::queries::movies::list_movies(&conn)?;
    Ok(Json(movies.into_iter().map(MovieResponse::from).collect()))
}

/// GET /api/movies/{id}
pub async fn get_movie(
    State(ctx): State<AppContext>,
    Path(movie_id): Path<String>,
) -> Result<Json<MovieResponse>, AppError> {
    let id = parse_movie_id(&movie_id)?;
    let conn = hogar_db::pool::get_conn(&ctx.db)?;
    let movie = hogar_db::queries::movies::get_movie(&conn, id)?
        .ok_or_else(|| hogar_core::Error::not_found("movie", id))?;
    Ok(Json(movie.into()))
}

/// POST /api/movies
pub async fn create_movie(
    State(ctx): State<AppContext>,
    Json(payload): Json<MovieRequest>,
) -> Result<(StatusCode, Json<MovieResponse>), AppError> {
    payload.validate()?;

    let conn = hogar_db::pool::get_conn(&ctx.db)?;

    if hogar_db::queries::movies::get_movie_by_title(&conn, &payload.title)?.is_some() {
        return Err(hogar_core::Error::Conflict(format!(
            "Movie '{}' already exists",
            payload.title
        ))
        .into());
    }

    let movie = hogar_db::queries::movies::create_movie(&conn, &payload.into_fields())?;
    Ok((StatusCode::CREATED, Json(movie.into())))
}

/// PUT /api/movies/{id}
pub async fn update_movie(
    State(ctx): State<AppContext>,
    Path(movie_id): Path<String>,
    Json(payload): Json<MovieRequest>,
) -> Result<Json<MovieResponse>, AppError> {
    let id = parse_movie_id(&movie_id)?;
    payload.validate()?;

    let conn = hogar_db::pool::get_conn(&ctx.db)?;
    if !hogar_db::queries::movies::update_movie(&conn, id, &payload.into_fields())? {
        return Err(hogar_core::Error::not_found("movie", id).into());
    }

    let movie = hogar_db::queries::movies::get_movie(&conn, id)?
        .ok_or_else(|| hogar_core::Error::not_found("movie", id))?;
    Ok(Json(movie.into()))
}

/// POST /api/movies/{id}/seen
pub async fn set_seen(
    State(ctx): State<AppContext>,
    Path(movie_id): Path<String>,
    Json(payload): Json<SeenRequest>,
) -> Result<StatusCode, AppError> {
    let id = parse_movie_id(&movie_id)?;
    let conn = hogar_db::pool::get_conn(&ctx.db)?;
    if !hogar_db::queries::movies::set_seen(&conn, id, payload.seen)? {
        return Err(hogar_core::Error::not_found("movie", id).into());
    }
    Ok(StatusCode::NO_CONTENT)
}

/// DELETE /api/movies/{id}
pub async fn delete_movie(
    State(ctx): State<AppContext>,
    Path(movie_id): Path<String>,
) -> Result<StatusCode, AppError> {
    let id = parse_movie_id(&movie_id)?;
    let conn = hogar_db::pool::get_conn(&ctx.db)?;
    if !hogar_db::queries::movies::delete_movie(&conn, id)? {
        return Err(hogar_core::Error::not_found("movie", id).into());
    }
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/movies/{id}/audios
pub async fn list_movie_audios(
    State(ctx): State<AppContext>,
    Path(movie_id): Path<String>,
) -> Result<Json<Vec<super::audios::AudioResponse>>, AppError> {
    let id = parse_movie_id(&movie_id)?;
    let conn = hogar_db::pool::get_conn(&ctx.db)?;
    if hogar_db::queries::movies::get_movie(&conn, id)?.is_none() {
        return Err(hogar_core::Error::not_found("movie", id).into());
    }
    let audios = hogar_db::queries::audios::list_audios_by_movie(&conn, id)?;
    Ok(Json(audios.into_iter().map(Into::into).collect()))
}

/// GET /api/movies/{id}/subtitles
pub async fn list_movie_subtitles(
    State(ctx): State<AppContext>,
    Path(movie_id): Path<String>,
) -> Result<Json<Vec<super::subtitles::SubtitleResponse>>, AppError> {
    let id = parse_movie_id(&movie_id)?;
    let conn = hogar_db::pool::get_conn(&ctx.db)?;
    if hogar_db::queries::movies::get_movie(&conn, id)?.is_none() {
        return Err(hogar_core::Error::not_found("movie", id).into());
    }
    let subs = hogar_db::queries::subtitles::list_subtitles_by_movie(&conn, id)?;
    Ok(Json(subs.into_iter().map(Into::into).collect()))
}

/// GET /api/movies/{id}/stream
///
/// Containers listed in `stream.direct_containers` are served as-is with
/// Range support. Everything else is transcoded to fragmented MP4 on the
/// fly: 200 chunked, no Content-Length, Range ignored.
pub async fn stream_movie(
    State(ctx): State<AppContext>,
    Path(movie_id): Path<String>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, AppError> {
    let id = parse_movie_id(&movie_id)?;

    let conn = hogar_db::pool::get_conn(&ctx.db)?;
    let movie = hogar_db::queries::movies::get_movie(&conn, id)?
        .ok_or_else(|| hogar_core::Error::not_found("movie", id))?;
    drop(conn);

    let ext = streaming::file_extension(&movie.path);
    let source = streaming::resolve_media_path(&ctx.config.media.movie_dir, &movie.path);

    if ctx.config.stream.direct_containers.iter().any(|c| *c == ext) {
        let range = headers
            .get(header::RANGE)
            .and_then(|v| v.to_str().ok());
        let response =
            streaming::serve_file_range(&source, streaming::guess_content_type(&ext), range)
                .await?;
        return Ok(response);
    }

    // Transcode path. The source must exist before we spawn ffmpeg.
    if !tokio::fs::try_exists(&source).await.unwrap_or(false) {
        return Err(hogar_core::Error::not_found("file", &movie.path).into());
    }

    let ffmpeg = ctx.tools.require("ffmpeg")?;
    let settings = TranscodeSettings::from(&ctx.config.stream);
    let ts = TranscodeStream::spawn(&ffmpeg.path, &source, &settings)?;

    tracing::info!(movie_id = %id, container = %ext, "Transcoding to fragmented MP4");

    Ok((
        StatusCode::OK,
        [(header::CONTENT_TYPE.as_str(), "video/mp4")],
        Body::from_stream(ts.into_stream()),
    )
        .into_response())
}

/// GET /api/movies/{id}/banner
///
/// Serves the movie's banner image. Relative `img_banner` values resolve
/// against `media.banner_dir`.
pub async fn get_banner(
    State(ctx): State<AppContext>,
    Path(movie_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let id = parse_movie_id(&movie_id)?;

    let conn = hogar_db::pool::get_conn(&ctx.db)?;
    let movie = hogar_db::queries::movies::get_movie(&conn, id)?
        .ok_or_else(|| hogar_core::Error::not_found("movie", id))?;
    drop(conn);

    let banner = movie
        .img_banner
        .ok_or_else(|| hogar_core::Error::not_found("banner", id))?;
    let path = streaming::resolve_media_path(&ctx.config.media.banner_dir, &banner);
    let ext = streaming::file_extension(&banner);

    let response =
        streaming::serve_file_range(&path, streaming::guess_content_type(&ext), None).await?;
    Ok(response)
}

/// GET /api/movies/{id}/muxed
///
/// Serves the cached mux artifact, producing it on first request. Once the
/// artifact exists this behaves exactly like a direct file stream.
pub async fn stream_muxed(
    State(ctx): State<AppContext>,
    Path(movie_id): Path<String>,
    Query(query): Query<MuxQuery>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, AppError> {
    let id = parse_movie_id(&movie_id)?;

    let artifact = mux_prep::get_or_mux(&ctx, id, query.language.as_deref()).await?;

    let range = headers.get(header::RANGE).and_then(|v| v.to_str().ok());
    let response = streaming::serve_file_range(&artifact, "video/mp4", range).await?;
    Ok(response)
}

fn parse_movie_id(s: &str) -> Result<hogar_core::MovieId, hogar_core::Error> {
    s.parse()
        .map_err(|_| hogar_core::Error::Validation("Invalid movie_id".into()))
}
