//! On-demand mux artifact preparation with request coalescing.
//!
//! The first request for a movie's muxed artifact runs ffmpeg; concurrent
//! requests for the same movie wait on a shared Notify instead of spawning
//! duplicate muxes. Finished artifacts are immutable and served straight
//! from the cache directory on every later request.

use std::path::PathBuf;
use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use tokio::sync::Notify;

use hogar_core::{MovieId, Result};

use crate::context::AppContext;

/// Path of the cached mux artifact for a movie.
pub fn artifact_path(ctx: &AppContext, movie_id: MovieId) -> PathBuf {
    ctx.config.media.mux_cache_dir.join(format!("{movie_id}.mp4"))
}

/// Get the mux artifact for a movie, producing it on demand if missing.
///
/// Uses coalescing via `ctx.mux_pending` so that concurrent requests for the
/// same movie trigger a single ffmpeg run.
pub async fn get_or_mux(
    ctx: &AppContext,
    movie_id: MovieId,
    language: Option<&str>,
) -> Result<PathBuf> {
    let artifact = artifact_path(ctx, movie_id);

    // Fast path: artifact already on disk.
    if tokio::fs::try_exists(&artifact).await.unwrap_or(false) {
        return Ok(artifact);
    }

    loop {
        match ctx.mux_pending.entry(movie_id) {
            Entry::Occupied(e) => {
                // Another task is already muxing this movie. Register with
                // its Notify before releasing the entry guard: notify_waiters
                // wakes only already-registered waiters, and the muxer cannot
                // remove the entry while we hold the guard. Registering after
                // the drop could miss a wakeup and sleep forever.
                let notify = e.get().clone();
                let mut notified = std::pin::pin!(notify.notified());
                notified.as_mut().enable();
                drop(e);
                notified.await;

                // Re-check: the muxer should have produced the artifact.
                if tokio::fs::try_exists(&artifact).await.unwrap_or(false) {
                    return Ok(artifact);
                }
                // Muxer failed. Loop to try becoming the muxer ourselves.
            }
            Entry::Vacant(e) => {
                // We're the muxer. Insert our Notify so others can wait.
                let notify = Arc::new(Notify::new());
                e.insert(notify.clone());

                let result = do_mux(ctx, movie_id, language, &artifact).await;

                ctx.mux_pending.remove(&movie_id);
                notify.notify_waiters();

                return result.map(|_| artifact);
            }
        }
    }
}

/// Resolve the movie's video and audio sources and run the mux.
async fn do_mux(
    ctx: &AppContext,
    movie_id: MovieId,
    language: Option<&str>,
    artifact: &std::path::Path,
) -> Result<()> {
    let conn = hogar_db::pool::get_conn(&ctx.db)?;
    let movie = hogar_db::queries::movies::get_movie(&conn, movie_id)?
        .ok_or_else(|| hogar_core::Error::not_found("movie", movie_id))?;

    let audios = hogar_db::queries::audios::list_audios_by_movie(&conn, movie_id)?;
    drop(conn);

    // Pick the requested language if present, otherwise the first track.
    let audio = match language {
        Some(lang) => audios
            .iter()
            .find(|a| a.language.as_deref() == Some(lang))
            .ok_or_else(|| {
                hogar_core::Error::not_found("audio", format!("{movie_id} lang={lang}"))
            })?,
        None => audios
            .first()
            .ok_or_else(|| hogar_core::Error::not_found("audio", movie_id))?,
    };

    let video_path = crate::streaming::resolve_media_path(&ctx.config.media.movie_dir, &movie.path);
    let audio_path = PathBuf::from(&audio.path);

    // Both sources must exist before we spawn ffmpeg; the tool's own error
    // for a missing input is far less useful than a 404 here.
    if !tokio::fs::try_exists(&video_path).await.unwrap_or(false) {
        return Err(hogar_core::Error::not_found("file", &movie.path));
    }
    if !tokio::fs::try_exists(&audio_path).await.unwrap_or(false) {
        return Err(hogar_core::Error::not_found("file", &audio.path));
    }

    if let Some(parent) = artifact.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }

    hogar_av::mux::mux_to_file(
        &ctx.tools,
        &video_path,
        &audio_path,
        artifact,
        &ctx.config.stream.mux_audio_bitrate,
    )
    .await?;

    tracing::info!(movie_id = %movie_id, "Mux artifact ready: {}", artifact.display());
    Ok(())
}
