// src/handlers/topics.rs

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde_json::json;
use sqlx::SqlitePool;
use validator::Validate;

use crate::{
    error::AppError,
    models::topic::{Topic, TopicRequest},
};

/// Lists all topics, alphabetically. Public.
pub async fn list_topics(State(pool): State<SqlitePool>) -> Result<impl IntoResponse, AppError> {
    let topics = sqlx::query_as::<_, Topic>("SELECT id, name FROM topics ORDER BY name")
        .fetch_all(&pool)
        .await?;

    Ok(Json(topics))
}

/// Fetches a single topic by ID. Public.
pub async fn get_topic(
    State(pool): State<SqlitePool>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let topic = sqlx::query_as::<_, Topic>("SELECT id, name FROM topics WHERE id = ?")
        .bind(id)
        .fetch_optional(&pool)
        .await?
        .ok_or_else(|| AppError::NotFound("Topic not found".to_string()))?;

    Ok(Json(topic))
}

/// Creates a new topic.
/// Admin only. Names are unique.
pub async fn create_topic(
    State(pool): State<SqlitePool>,
    Json(payload): Json<TopicRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let topic =
        sqlx::query_as::<_, Topic>("INSERT INTO topics (name) VALUES (?) RETURNING id, name")
            .bind(&payload.name)
            .fetch_one(&pool)
            .await
            .map_err(|e| {
                if e.as_database_error()
                    .is_some_and(|db| db.is_unique_violation())
                {
                    AppError::Conflict("Topic already exists".to_string())
                } else {
                    tracing::error!("Failed to create topic: {:?}", e);
                    AppError::from(e)
                }
            })?;

    Ok((StatusCode::CREATED, Json(topic)))
}

/// Renames a topic.
/// Admin only. Renaming onto an existing name is a conflict.
pub async fn update_topic(
    State(pool): State<SqlitePool>,
    Path(id): Path<i64>,
    Json(payload): Json<TopicRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let exists = sqlx::query_scalar::<_, i64>("SELECT id FROM topics WHERE id = ?")
        .bind(id)
        .fetch_optional(&pool)
        .await?;
    if exists.is_none() {
        return Err(AppError::NotFound("Topic not found".to_string()));
    }

    let name_taken =
        sqlx::query_scalar::<_, i64>("SELECT id FROM topics WHERE name = ? AND id != ?")
            .bind(&payload.name)
            .bind(id)
            .fetch_optional(&pool)
            .await?;
    if name_taken.is_some() {
        return Err(AppError::Conflict("Topic already exists".to_string()));
    }

    sqlx::query("UPDATE topics SET name = ? WHERE id = ?")
        .bind(&payload.name)
        .bind(id)
        .execute(&pool)
        .await?;

    Ok(Json(Topic {
        id,
        name: payload.name,
    }))
}

/// Deletes a topic.
/// Admin only. Blocked while any quiz still references the topic; this is a
/// referential guard, not a cascade.
pub async fn delete_topic(
    State(pool): State<SqlitePool>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let exists = sqlx::query_scalar::<_, i64>("SELECT id FROM topics WHERE id = ?")
        .bind(id)
        .fetch_optional(&pool)
        .await?;
    if exists.is_none() {
        return Err(AppError::NotFound("Topic not found".to_string()));
    }

    let quiz_count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM quizzes WHERE topic_id = ?")
        .bind(id)
        .fetch_one(&pool)
        .await?;
    if quiz_count > 0 {
        return Err(AppError::Conflict(
            "Topic is being used by one or more quizzes".to_string(),
        ));
    }

    sqlx::query("DELETE FROM topics WHERE id = ?")
        .bind(id)
        .execute(&pool)
        .await?;

    Ok(Json(json!({ "message": "Topic deleted successfully" })))
}
