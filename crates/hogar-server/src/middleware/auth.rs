//! Authentication middleware.
//!
//! Validates session tokens from the Authorization header, the session
//! cookie, or the configured API key. When auth is disabled every request
//! resolves to the anonymous user. On success the resolved [`UserId`] is
//! injected into request extensions for downstream handlers.

use axum::extract::State;
use axum::http::{Request, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use hogar_core::UserId;
use hogar_db::pool::DbPool;

use crate::context::AppContext;

/// Cookie name for browser sessions.
pub const SESSION_COOKIE: &str = "hogar_session";

/// Well-known user for unauthenticated requests, seeded by migration.
fn anonymous_user() -> UserId {
    UserId::from(uuid::Uuid::nil())
}

/// Resolve a user from raw header values.
///
/// Token resolution order:
/// 1. `Authorization: Bearer <token>` (API clients)
/// 2. Cookie: `hogar_session=<token>` (web browser)
pub fn validate_auth_headers(
    auth_config: &hogar_core::config::AuthConfig,
    db: &DbPool,
    authorization: Option<&str>,
    cookie: Option<&str>,
) -> Option<UserId> {
    if !auth_config.enabled {
        return Some(anonymous_user());
    }

    if let Some(auth_value) = authorization {
        if let Some(token) = auth_value.strip_prefix("Bearer ") {
            if let Some(uid) = validate_token(auth_config, db, token) {
                return Some(uid);
            }
        }
    }

    if let Some(cookies_str) = cookie {
        for part in cookies_str.split(';') {
            let part = part.trim();
            if let Some(value) = part.strip_prefix(&format!("{SESSION_COOKIE}=")) {
                if let Some(uid) = validate_token(auth_config, db, value) {
                    return Some(uid);
                }
            }
        }
    }

    None
}

/// Validate a single token against the config API key and DB sessions.
fn validate_token(
    auth_config: &hogar_core::config::AuthConfig,
    db: &DbPool,
    token: &str,
) -> Option<UserId> {
    if let Some(ref api_key) = auth_config.api_key {
        if token == api_key {
            return Some(anonymous_user());
        }
    }

    if let Ok(conn) = hogar_db::pool::get_conn(db) {
        let now = chrono::Utc::now().to_rfc3339();
        if let Ok(Some(tok)) = hogar_db::queries::auth::get_valid_token(&conn, token, &now) {
            return Some(tok.user_id);
        }
    }

    None
}

/// Authentication middleware. Applied to protected routes only.
///
/// Always applied even with auth disabled, so that `Extension<UserId>`
/// extractors keep working (they get the anonymous user).
pub async fn auth_middleware(
    State(ctx): State<AppContext>,
    mut request: Request<axum::body::Body>,
    next: Next,
) -> Result<Response, Response> {
    let authorization = request
        .headers()
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_owned());

    let cookie = request
        .headers()
        .get(axum::http::header::COOKIE)
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_owned());

    match validate_auth_headers(
        &ctx.config.auth,
        &ctx.db,
        authorization.as_deref(),
        cookie.as_deref(),
    ) {
        Some(user_id) => {
            request.extensions_mut().insert(user_id);
            Ok(next.run(request).await)
        }
        None => Err((StatusCode::UNAUTHORIZED, "Authentication required").into_response()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hogar_core::config::AuthConfig;

    fn pool() -> DbPool {
        hogar_db::pool::init_memory_pool().unwrap()
    }

    #[test]
    fn disabled_auth_resolves_anonymous() {
        let cfg = AuthConfig {
            enabled: false,
            ..Default::default()
        };
        let uid = validate_auth_headers(&cfg, &pool(), None, None).unwrap();
        assert_eq!(uid.as_uuid(), &uuid::Uuid::nil());
    }

    #[test]
    fn enabled_auth_rejects_missing_token() {
        let cfg = AuthConfig {
            enabled: true,
            ..Default::default()
        };
        assert!(validate_auth_headers(&cfg, &pool(), None, None).is_none());
    }

    #[test]
    fn api_key_accepted_as_bearer() {
        let cfg = AuthConfig {
            enabled: true,
            api_key: Some("secret-key".into()),
            ..Default::default()
        };
        let uid = validate_auth_headers(&cfg, &pool(), Some("Bearer secret-key"), None);
        assert!(uid.is_some());
        assert!(validate_auth_headers(&cfg, &pool(), Some("Bearer wrong"), None).is_none());
    }

    #[test]
    fn session_cookie_accepted() {
        let db = pool();
        let conn = hogar_db::pool::get_conn(&db).unwrap();
        let user = hogar_db::queries::users::create_user(
            &conn,
            "ana",
            None,
            "$2b$12$hashhashhashhashhashha",
            "user",
        )
        .unwrap();
        let expires = (chrono::Utc::now() + chrono::Duration::hours(1)).to_rfc3339();
        hogar_db::queries::auth::create_token(&conn, user.id, "tok123", &expires).unwrap();
        drop(conn);

        let cfg = AuthConfig {
            enabled: true,
            ..Default::default()
        };
        let cookie = format!("other=1; {SESSION_COOKIE}=tok123");
        let uid = validate_auth_headers(&cfg, &db, None, Some(&cookie)).unwrap();
        assert_eq!(uid, user.id);
    }

    #[test]
    fn expired_token_rejected() {
        let db = pool();
        let conn = hogar_db::pool::get_conn(&db).unwrap();
        let user = hogar_db::queries::users::create_user(
            &conn,
            "bea",
            None,
            "$2b$12$hashhashhashhashhashha",
            "user",
        )
        .unwrap();
        let expired = (chrono::Utc::now() - chrono::Duration::hours(2)).to_rfc3339();
        hogar_db::queries::auth::create_token(&conn, user.id, "oldtok", &expired).unwrap();
        drop(conn);

        let cfg = AuthConfig {
            enabled: true,
            ..Default::default()
        };
        assert!(validate_auth_headers(&cfg, &db, Some("Bearer oldtok"), None).is_none());
    }
}
