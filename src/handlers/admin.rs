// src/handlers/admin.rs

use axum::{
    Json,
    extract::{Extension, Path, State},
    response::IntoResponse,
};
use serde_json::json;
use sqlx::SqlitePool;

use crate::{
    error::AppError,
    handlers::profile::delete_user_cascade,
    models::user::{AdminUpdateUserRequest, UserSummary},
    utils::{hash::hash_password, jwt::Claims},
};

/// Lists all users in the system.
/// Admin only.
pub async fn list_users(State(pool): State<SqlitePool>) -> Result<impl IntoResponse, AppError> {
    let users = sqlx::query_as::<_, UserSummary>(
        "SELECT id, username, email, is_admin FROM users ORDER BY id",
    )
    .fetch_all(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to list users: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    Ok(Json(users))
}

/// Fetches a single user by ID.
/// Admin only.
pub async fn get_user(
    State(pool): State<SqlitePool>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let user = sqlx::query_as::<_, UserSummary>(
        "SELECT id, username, email, is_admin FROM users WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(&pool)
    .await?
    .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    Ok(Json(user))
}

/// Updates user information.
/// Admin only. Username/email uniqueness is enforced; a supplied password is
/// re-hashed before storage.
pub async fn update_user(
    State(pool): State<SqlitePool>,
    Path(id): Path<i64>,
    Json(payload): Json<AdminUpdateUserRequest>,
) -> Result<impl IntoResponse, AppError> {
    let exists = sqlx::query_scalar::<_, i64>("SELECT id FROM users WHERE id = ?")
        .bind(id)
        .fetch_optional(&pool)
        .await?;
    if exists.is_none() {
        return Err(AppError::NotFound("User not found".to_string()));
    }

    // Perform updates sequentially if fields are present
    if let Some(new_username) = payload.username {
        let taken =
            sqlx::query_scalar::<_, i64>("SELECT id FROM users WHERE username = ? AND id != ?")
                .bind(&new_username)
                .bind(id)
                .fetch_optional(&pool)
                .await?;
        if taken.is_some() {
            return Err(AppError::Conflict("Username already taken".to_string()));
        }
        sqlx::query("UPDATE users SET username = ? WHERE id = ?")
            .bind(&new_username)
            .bind(id)
            .execute(&pool)
            .await?;
    }

    if let Some(new_email) = payload.email {
        let taken =
            sqlx::query_scalar::<_, i64>("SELECT id FROM users WHERE email = ? AND id != ?")
                .bind(&new_email)
                .bind(id)
                .fetch_optional(&pool)
                .await?;
        if taken.is_some() {
            return Err(AppError::Conflict(
                "Email address already taken".to_string(),
            ));
        }
        sqlx::query("UPDATE users SET email = ? WHERE id = ?")
            .bind(&new_email)
            .bind(id)
            .execute(&pool)
            .await?;
    }

    if let Some(new_password) = payload.password {
        let hashed = hash_password(&new_password)?;
        sqlx::query("UPDATE users SET password_hash = ? WHERE id = ?")
            .bind(&hashed)
            .bind(id)
            .execute(&pool)
            .await?;
    }

    if let Some(is_admin) = payload.is_admin {
        sqlx::query("UPDATE users SET is_admin = ? WHERE id = ?")
            .bind(is_admin)
            .bind(id)
            .execute(&pool)
            .await?;
    }

    Ok(Json(json!({ "message": "User updated successfully" })))
}

/// Deletes a user by ID, cascading to their quizzes and results.
/// Admin only. Admins cannot delete their own account.
pub async fn delete_user(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    if id == claims.user_id()? {
        return Err(AppError::Forbidden(
            "Administrators cannot delete their own account".to_string(),
        ));
    }

    let exists = sqlx::query_scalar::<_, i64>("SELECT id FROM users WHERE id = ?")
        .bind(id)
        .fetch_optional(&pool)
        .await?;
    if exists.is_none() {
        return Err(AppError::NotFound("User not found".to_string()));
    }

    delete_user_cascade(&pool, id).await?;

    Ok(Json(json!({ "message": "User deleted successfully" })))
}
