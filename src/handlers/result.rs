// src/handlers/result.rs

use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde_json::json;
use sqlx::SqlitePool;

use crate::{
    error::AppError,
    models::{
        question::Question,
        result::{QuizResult, SubmitResultRequest},
    },
    scoring,
    utils::jwt::{Claims, require_admin, require_owner_or_admin},
};

/// Submits a completed quiz attempt, evaluates it server-side and persists
/// the result. (Logged-in users)
///
/// The submitted option text is compared against the stored correct option;
/// the score never trusts anything the client computed.
pub async fn submit_result(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<SubmitResultRequest>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = claims.user_id()?;

    let quiz_exists = sqlx::query_scalar::<_, i64>("SELECT id FROM quizzes WHERE id = ?")
        .bind(payload.quiz_id)
        .fetch_optional(&pool)
        .await?;
    if quiz_exists.is_none() {
        return Err(AppError::NotFound("Quiz not found".to_string()));
    }

    let questions = sqlx::query_as::<_, Question>(
        "SELECT id, quiz_id, question_text, options, correct_option_index
         FROM questions WHERE quiz_id = ? ORDER BY id",
    )
    .bind(payload.quiz_id)
    .fetch_all(&pool)
    .await?;

    let score = scoring::evaluate(&questions, &payload.answers)?;

    let result_id = sqlx::query_scalar::<_, i64>(
        r#"
        INSERT INTO results (user_id, quiz_id, score, total_questions, completed_at)
        VALUES (?, ?, ?, ?, ?)
        RETURNING id
        "#,
    )
    .bind(user_id)
    .bind(payload.quiz_id)
    .bind(score.score)
    .bind(score.total_questions)
    .bind(chrono::Utc::now())
    .fetch_one(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to save result: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Result saved successfully",
            "result_id": result_id,
            "score": score.score,
            "total_questions": score.total_questions
        })),
    ))
}

/// Lists results. Admins see every result, regular users only their own.
pub async fn list_results(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let results = if claims.is_admin {
        sqlx::query_as::<_, QuizResult>(
            "SELECT id, user_id, quiz_id, score, total_questions, completed_at
             FROM results ORDER BY completed_at DESC",
        )
        .fetch_all(&pool)
        .await?
    } else {
        sqlx::query_as::<_, QuizResult>(
            "SELECT id, user_id, quiz_id, score, total_questions, completed_at
             FROM results WHERE user_id = ? ORDER BY completed_at DESC",
        )
        .bind(claims.user_id()?)
        .fetch_all(&pool)
        .await?
    };

    Ok(Json(results))
}

/// Fetches a single result. Owner or admin only.
pub async fn get_result(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let result = sqlx::query_as::<_, QuizResult>(
        "SELECT id, user_id, quiz_id, score, total_questions, completed_at
         FROM results WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(&pool)
    .await?
    .ok_or_else(|| AppError::NotFound("Result not found".to_string()))?;

    require_owner_or_admin(&claims, result.user_id)?;

    Ok(Json(result))
}

/// Lists all results for a specific user. Admin only.
pub async fn list_results_for_user(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
    Path(user_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    require_admin(&claims)?;

    let user_exists = sqlx::query_scalar::<_, i64>("SELECT id FROM users WHERE id = ?")
        .bind(user_id)
        .fetch_optional(&pool)
        .await?;
    if user_exists.is_none() {
        return Err(AppError::NotFound("User not found".to_string()));
    }

    let results = sqlx::query_as::<_, QuizResult>(
        "SELECT id, user_id, quiz_id, score, total_questions, completed_at
         FROM results WHERE user_id = ? ORDER BY completed_at DESC",
    )
    .bind(user_id)
    .fetch_all(&pool)
    .await?;

    Ok(Json(results))
}
