//! Axum router construction.
//!
//! Builds the full application router with all route groups and middleware
//! layers.

use axum::middleware;
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::context::AppContext;
use crate::middleware::auth::auth_middleware;
use crate::routes;

/// Build the complete Axum router.
pub fn build_router(ctx: AppContext) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Auth routes, always accessible.
    let auth_routes = Router::new()
        .route("/auth/login", post(routes::auth::login))
        .route("/auth/logout", post(routes::auth::logout))
        .route("/auth/status", get(routes::auth::auth_status));

    // Protected API routes.
    let protected_routes = Router::new()
        // Movies
        .route(
            "/movies",
            get(routes::movies::list_movies).post(routes::movies::create_movie),
        )
        .route(
            "/movies/{id}",
            get(routes::movies::get_movie)
                .put(routes::movies::update_movie)
                .delete(routes::movies::delete_movie),
        )
        .route("/movies/{id}/seen", post(routes::movies::set_seen))
        .route("/movies/{id}/stream", get(routes::movies::stream_movie))
        .route("/movies/{id}/banner", get(routes::movies::get_banner))
        .route("/movies/{id}/muxed", get(routes::movies::stream_muxed))
        .route("/movies/{id}/audios", get(routes::movies::list_movie_audios))
        .route(
            "/movies/{id}/subtitles",
            get(routes::movies::list_movie_subtitles),
        )
        // Audios
        .route(
            "/audios",
            get(routes::audios::list_audios).post(routes::audios::create_audio),
        )
        .route(
            "/audios/{id}",
            get(routes::audios::get_audio)
                .put(routes::audios::update_audio)
                .delete(routes::audios::delete_audio),
        )
        .route("/audios/{id}/stream", get(routes::audios::stream_audio))
        // Subtitles
        .route(
            "/subtitles",
            get(routes::subtitles::list_subtitles).post(routes::subtitles::create_subtitle),
        )
        .route(
            "/subtitles/{id}",
            get(routes::subtitles::get_subtitle)
                .put(routes::subtitles::update_subtitle)
                .delete(routes::subtitles::delete_subtitle),
        )
        .route(
            "/subtitles/{id}/stream",
            get(routes::subtitles::stream_subtitle),
        )
        // Photos
        .route(
            "/photos",
            get(routes::photos::list_photos).post(routes::photos::create_photo),
        )
        .route(
            "/photos/{id}",
            get(routes::photos::get_photo)
                .put(routes::photos::update_photo)
                .delete(routes::photos::delete_photo),
        )
        .route("/photos/{id}/file", get(routes::photos::get_photo_file))
        .route("/photos/image/{name}", get(routes::photos::get_photo_by_name))
        // Users
        .route(
            "/users",
            get(routes::users::list_users).post(routes::users::create_user),
        )
        .route(
            "/users/{id}",
            get(routes::users::get_user)
                .put(routes::users::update_user)
                .delete(routes::users::delete_user),
        );

    // Always apply auth middleware. It handles both enabled (validates
    // credentials) and disabled (injects anonymous UserId) modes.
    let protected_routes =
        protected_routes.layer(middleware::from_fn_with_state(ctx.clone(), auth_middleware));

    let api = auth_routes.merge(protected_routes);

    Router::new()
        .route("/health", get(routes::health::health_check))
        .nest("/api", api)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(ctx)
}
