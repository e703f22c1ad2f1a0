// src/handlers/auth.rs

use axum::{
    Json,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
};
use serde_json::json;
use sqlx::SqlitePool;
use validator::Validate;

use crate::{
    config::Config,
    error::AppError,
    models::user::{LoginRequest, RegisterRequest, User, UserSummary},
    utils::{
        hash::{hash_password, verify_password},
        jwt::{TOKEN_USE_ACCESS, TOKEN_USE_REFRESH, bearer_token, sign_jwt, verify_jwt},
    },
};

/// Registers a new user.
///
/// Hashes the password using Argon2 before storing it.
/// Returns 201 Created and the user summary (excluding the hash).
pub async fn register(
    State(pool): State<SqlitePool>,
    Json(payload): Json<RegisterRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    // Pre-check both unique columns so the caller learns which one clashed.
    let email_taken = sqlx::query_scalar::<_, i64>("SELECT id FROM users WHERE email = ?")
        .bind(&payload.email)
        .fetch_optional(&pool)
        .await?;
    if email_taken.is_some() {
        return Err(AppError::Conflict(
            "Email address already taken".to_string(),
        ));
    }

    let username_taken = sqlx::query_scalar::<_, i64>("SELECT id FROM users WHERE username = ?")
        .bind(&payload.username)
        .fetch_optional(&pool)
        .await?;
    if username_taken.is_some() {
        return Err(AppError::Conflict("Username already taken".to_string()));
    }

    let password_hash = hash_password(&payload.password)?;

    let user = sqlx::query_as::<_, UserSummary>(
        r#"
        INSERT INTO users (username, email, password_hash, is_admin, created_at)
        VALUES (?, ?, ?, 0, ?)
        RETURNING id, username, email, is_admin
        "#,
    )
    .bind(&payload.username)
    .bind(&payload.email)
    .bind(&password_hash)
    .bind(chrono::Utc::now())
    .fetch_one(&pool)
    .await
    .map_err(|e| {
        // Races with a concurrent registration still surface as a conflict.
        if e.as_database_error()
            .is_some_and(|db| db.is_unique_violation())
        {
            AppError::Conflict("Username or email already taken".to_string())
        } else {
            tracing::error!("Failed to register user: {:?}", e);
            AppError::from(e)
        }
    })?;

    Ok((StatusCode::CREATED, Json(user)))
}

/// Authenticates a user and returns access and refresh tokens.
///
/// Unknown email and wrong password produce the same generic 401 so accounts
/// cannot be enumerated.
pub async fn login(
    State(pool): State<SqlitePool>,
    State(config): State<Config>,
    Json(payload): Json<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    let user = sqlx::query_as::<_, User>(
        "SELECT id, username, email, password_hash, is_admin, created_at FROM users WHERE email = ?",
    )
    .bind(&payload.email)
    .fetch_optional(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Login DB error: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    let Some(user) = user else {
        return Err(AppError::AuthError("Invalid email or password".to_string()));
    };

    if !verify_password(&payload.password, &user.password_hash)? {
        return Err(AppError::AuthError("Invalid email or password".to_string()));
    }

    let access_token = sign_jwt(
        user.id,
        user.is_admin,
        TOKEN_USE_ACCESS,
        &config.jwt_secret,
        config.access_token_expiration,
    )?;
    let refresh_token = sign_jwt(
        user.id,
        user.is_admin,
        TOKEN_USE_REFRESH,
        &config.jwt_secret,
        config.refresh_token_expiration,
    )?;

    Ok(Json(json!({
        "access_token": access_token,
        "refresh_token": refresh_token,
        "user": {
            "id": user.id,
            "username": user.username,
            "email": user.email,
            "is_admin": user.is_admin
        }
    })))
}

/// Exchanges a valid refresh token for a new access token.
///
/// The user row is re-read so the fresh token carries the current admin flag,
/// and so tokens for deleted accounts stop working.
pub async fn refresh(
    State(pool): State<SqlitePool>,
    State(config): State<Config>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, AppError> {
    let token = bearer_token(&headers)?;

    let claims = verify_jwt(token, &config.jwt_secret)?;
    if claims.token_use != TOKEN_USE_REFRESH {
        return Err(AppError::AuthError("Refresh token required".to_string()));
    }

    let user_id = claims.user_id()?;
    let user = sqlx::query_as::<_, User>(
        "SELECT id, username, email, password_hash, is_admin, created_at FROM users WHERE id = ?",
    )
    .bind(user_id)
    .fetch_optional(&pool)
    .await?
    .ok_or_else(|| AppError::AuthError("Invalid refresh token".to_string()))?;

    let access_token = sign_jwt(
        user.id,
        user.is_admin,
        TOKEN_USE_ACCESS,
        &config.jwt_secret,
        config.access_token_expiration,
    )?;

    Ok(Json(json!({ "access_token": access_token })))
}
