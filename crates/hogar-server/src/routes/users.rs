//! User management routes.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::context::AppContext;
use crate::error::AppError;

#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: String,
    pub username: String,
    pub email: Option<String>,
    pub role: String,
    pub created_at: String,
}

impl From<hogar_db::models::User> for UserResponse {
    fn from(u: hogar_db::models::User) -> Self {
        Self {
            id: u.id.to_string(),
            username: u.username,
            email: u.email,
            role: u.role,
            created_at: u.created_at,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    pub username: String,
    pub password: String,
    pub email: Option<String>,
    pub role: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateUserRequest {
    pub role: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

/// GET /api/users
pub async fn list_users(
    State(ctx): State<AppContext>,
) -> Result<Json<Vec<UserResponse>>, AppError> {
    let conn = hogar_db::pool::get_conn(&ctx.db)?;
    let users = hogar_db::queries::users::list_users(&conn)?;
    Ok(Json(users.into_iter().map(UserResponse::from).collect()))
}

/// GET /api/users/{id}
pub async fn get_user(
    State(ctx): State<AppContext>,
    Path(user_id): Path<String>,
) -> Result<Json<UserResponse>, AppError> {
    let id = parse_user_id(&user_id)?;
    let conn = hogar_db::pool::get_conn(&ctx.db)?;
    let user = hogar_db::queries::users::get_user_by_id(&conn, id)?
        .ok_or_else(|| hogar_core::Error::not_found("user", id))?;
    Ok(Json(user.into()))
}

/// POST /api/users
pub async fn create_user(
    State(ctx): State<AppContext>,
    Json(payload): Json<CreateUserRequest>,
) -> Result<(StatusCode, Json<UserResponse>), AppError> {
    if payload.username.trim().is_empty() {
        return Err(hogar_core::Error::Validation("Username must not be empty".into()).into());
    }
    if payload.password.len() < 8 {
        return Err(
            hogar_core::Error::Validation("Password must be at least 8 characters".into()).into(),
        );
    }

    let hash = bcrypt::hash(&payload.password, bcrypt::DEFAULT_COST)
        .map_err(|e| hogar_core::Error::Internal(format!("bcrypt error: {e}")))?;
    let role = payload.role.as_deref().unwrap_or("user");

    let conn = hogar_db::pool::get_conn(&ctx.db)?;
    let user = hogar_db::queries::users::create_user(
        &conn,
        &payload.username,
        payload.email.as_deref(),
        &hash,
        role,
    )?;

    Ok((StatusCode::CREATED, Json(user.into())))
}

/// PUT /api/users/{id}
pub async fn update_user(
    State(ctx): State<AppContext>,
    Path(user_id): Path<String>,
    Json(payload): Json<UpdateUserRequest>,
) -> Result<StatusCode, AppError> {
    let id = parse_user_id(&user_id)?;
    let conn = hogar_db::pool::get_conn(&ctx.db)?;

    if hogar_db::queries::users::get_user_by_id(&conn, id)?.is_none() {
        return Err(hogar_core::Error::not_found("user", id).into());
    }

    if let Some(role) = &payload.role {
        hogar_db::queries::users::update_user_role(&conn, id, role)?;
    }

    if let Some(email) = &payload.email {
        hogar_db::queries::users::update_user_email(&conn, id, Some(email))?;
    }

    if let Some(password) = &payload.password {
        if password.len() < 8 {
            return Err(hogar_core::Error::Validation(
                "Password must be at least 8 characters".into(),
            )
            .into());
        }
        let hash = bcrypt::hash(password, bcrypt::DEFAULT_COST)
            .map_err(|e| hogar_core::Error::Internal(format!("bcrypt error: {e}")))?;
        hogar_db::queries::users::update_password(&conn, id, &hash)?;
    }

    Ok(StatusCode::NO_CONTENT)
}

/// DELETE /api/users/{id}
pub async fn delete_user(
    State(ctx): State<AppContext>,
    Path(user_id): Path<String>,
) -> Result<StatusCode, AppError> {
    let id = parse_user_id(&user_id)?;
    let conn = hogar_db::pool::get_conn(&ctx.db)?;
    if !hogar_db::queries::users::delete_user(&conn, id)? {
        return Err(hogar_core::Error::not_found("user", id).into());
    }
    Ok(StatusCode::NO_CONTENT)
}

fn parse_user_id(s: &str) -> Result<hogar_core::UserId, hogar_core::Error> {
    s.parse()
        .map_err(|_| hogar_core::Error::Validation("Invalid user_id".into()))
}
