// src/handlers/quiz.rs

use std::sync::Arc;

use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde_json::json;
use sqlx::SqlitePool;

use crate::{
    ai::QuestionGenerator,
    error::AppError,
    models::{
        question::{PublicQuestion, Question, QuestionInput},
        quiz::{CreateQuizRequest, Quiz, QuizDetail, QuizSummary, UpdateQuizRequest},
    },
    utils::jwt::{Claims, require_owner_or_admin},
};

const QUIZ_SUMMARY_SELECT: &str = r#"
    SELECT
        q.id,
        q.topic_id,
        COALESCE(t.name, q.custom_topic) AS topic_name,
        q.difficulty,
        q.created_by_user_id,
        q.created_at,
        (SELECT COUNT(*) FROM questions WHERE quiz_id = q.id) AS question_count
    FROM quizzes q
    LEFT JOIN topics t ON t.id = q.topic_id
"#;

/// Lists all quizzes, newest first. Public; questions are omitted.
pub async fn list_quizzes(State(pool): State<SqlitePool>) -> Result<impl IntoResponse, AppError> {
    let quizzes = sqlx::query_as::<_, QuizSummary>(&format!(
        "{} ORDER BY q.created_at DESC",
        QUIZ_SUMMARY_SELECT
    ))
    .fetch_all(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to list quizzes: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    Ok(Json(quizzes))
}

/// Fetches a quiz with its questions. Public.
/// The `correct_option_index` is stripped from every question.
pub async fn get_quiz(
    State(pool): State<SqlitePool>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let header =
        sqlx::query_as::<_, QuizSummary>(&format!("{} WHERE q.id = ?", QUIZ_SUMMARY_SELECT))
            .bind(id)
            .fetch_optional(&pool)
            .await?
            .ok_or_else(|| AppError::NotFound("Quiz not found".to_string()))?;

    let questions = sqlx::query_as::<_, Question>(
        "SELECT id, quiz_id, question_text, options, correct_option_index
         FROM questions WHERE quiz_id = ? ORDER BY id",
    )
    .bind(id)
    .fetch_all(&pool)
    .await?;

    Ok(Json(QuizDetail {
        id: header.id,
        topic_id: header.topic_id,
        topic_name: header.topic_name,
        difficulty: header.difficulty,
        created_by_user_id: header.created_by_user_id,
        created_at: header.created_at,
        questions: questions.into_iter().map(PublicQuestion::from).collect(),
    }))
}

/// Creates a new quiz with its questions. (Logged-in users)
///
/// The questions come either from the request body or, with `ai_generate`,
/// from the external generator, which is handed the resolved topic name and
/// difficulty. Both paths run the same per-question schema validation, and
/// the quiz plus all questions are written in one transaction so a failure
/// persists nothing.
pub async fn create_quiz(
    State(pool): State<SqlitePool>,
    State(generator): State<Arc<dyn QuestionGenerator>>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<CreateQuizRequest>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = claims.user_id()?;

    // Exactly one of topic_id / custom_topic identifies the subject.
    let custom_topic = payload
        .custom_topic
        .as_deref()
        .filter(|s| !s.trim().is_empty());
    if payload.topic_id.is_some() == custom_topic.is_some() {
        return Err(AppError::BadRequest(
            "Exactly one of 'topic_id' or 'custom_topic' is required".to_string(),
        ));
    }

    let difficulty = payload
        .difficulty
        .as_deref()
        .filter(|s| !s.trim().is_empty())
        .ok_or_else(|| AppError::BadRequest("Missing 'difficulty'".to_string()))?;

    let topic_name = match payload.topic_id {
        Some(topic_id) => sqlx::query_scalar::<_, String>("SELECT name FROM topics WHERE id = ?")
            .bind(topic_id)
            .fetch_optional(&pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Topic with id {} not found", topic_id)))?,
        None => custom_topic.unwrap_or_default().to_string(),
    };

    let questions = if payload.ai_generate {
        let count = payload.num_questions.unwrap_or(5);
        if !(1..=15).contains(&count) {
            return Err(AppError::BadRequest(
                "'num_questions' must be between 1 and 15".to_string(),
            ));
        }

        let generated = generator.generate(&topic_name, difficulty, count).await?;
        for question in &generated {
            question.validate().map_err(|msg| {
                AppError::UpstreamFailure(format!("AI returned an invalid question: {}", msg))
            })?;
        }
        generated
    } else {
        let questions = payload.questions.unwrap_or_default();
        if questions.is_empty() {
            return Err(AppError::BadRequest(
                "Missing 'questions' list or list is empty".to_string(),
            ));
        }
        for question in &questions {
            question
                .validate()
                .map_err(|msg| AppError::BadRequest(format!("Invalid question data: {}", msg)))?;
        }
        questions
    };

    let mut tx = pool.begin().await?;

    let quiz_id = sqlx::query_scalar::<_, i64>(
        r#"
        INSERT INTO quizzes (topic_id, custom_topic, difficulty, created_by_user_id, created_at)
        VALUES (?, ?, ?, ?, ?)
        RETURNING id
        "#,
    )
    .bind(payload.topic_id)
    .bind(custom_topic)
    .bind(difficulty)
    .bind(user_id)
    .bind(chrono::Utc::now())
    .fetch_one(&mut *tx)
    .await?;

    insert_questions(&mut tx, quiz_id, &questions).await?;

    tx.commit().await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Quiz created successfully",
            "quiz_id": quiz_id,
            "questions_count": questions.len()
        })),
    ))
}

/// Updates a quiz. Owner or admin only.
///
/// Metadata fields are optional; a supplied `questions` list is an
/// authoritative replacement of the quiz's entire question set, not a merge.
pub async fn update_quiz(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateQuizRequest>,
) -> Result<impl IntoResponse, AppError> {
    let quiz = sqlx::query_as::<_, Quiz>(
        "SELECT id, topic_id, custom_topic, difficulty, created_by_user_id, created_at
         FROM quizzes WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(&pool)
    .await?
    .ok_or_else(|| AppError::NotFound("Quiz not found".to_string()))?;

    require_owner_or_admin(&claims, quiz.created_by_user_id)?;

    // Setting one subject field clears the other, keeping the pairing exclusive.
    let custom_topic = payload
        .custom_topic
        .as_deref()
        .filter(|s| !s.trim().is_empty());
    let (new_topic_id, new_custom_topic) = match (payload.topic_id, custom_topic) {
        (Some(_), Some(_)) => {
            return Err(AppError::BadRequest(
                "Only one of 'topic_id' or 'custom_topic' may be set".to_string(),
            ));
        }
        (Some(topic_id), None) => {
            let exists = sqlx::query_scalar::<_, i64>("SELECT id FROM topics WHERE id = ?")
                .bind(topic_id)
                .fetch_optional(&pool)
                .await?;
            if exists.is_none() {
                return Err(AppError::NotFound(format!(
                    "Topic with id {} not found",
                    topic_id
                )));
            }
            (Some(topic_id), None)
        }
        (None, Some(custom)) => (None, Some(custom.to_string())),
        (None, None) => (quiz.topic_id, quiz.custom_topic.clone()),
    };

    let difficulty = payload
        .difficulty
        .clone()
        .filter(|s| !s.trim().is_empty())
        .unwrap_or(quiz.difficulty);

    if let Some(questions) = &payload.questions {
        if questions.is_empty() {
            return Err(AppError::BadRequest(
                "'questions' must not be empty".to_string(),
            ));
        }
        for question in questions {
            question
                .validate()
                .map_err(|msg| AppError::BadRequest(format!("Invalid question data: {}", msg)))?;
        }
    }

    let mut tx = pool.begin().await?;

    sqlx::query("UPDATE quizzes SET topic_id = ?, custom_topic = ?, difficulty = ? WHERE id = ?")
        .bind(new_topic_id)
        .bind(&new_custom_topic)
        .bind(&difficulty)
        .bind(id)
        .execute(&mut *tx)
        .await?;

    if let Some(questions) = &payload.questions {
        sqlx::query("DELETE FROM questions WHERE quiz_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        insert_questions(&mut tx, id, questions).await?;
    }

    tx.commit().await?;

    Ok(Json(json!({ "message": "Quiz updated successfully" })))
}

/// Deletes a quiz. Owner or admin only.
/// Cascades to the quiz's questions and results, children first, in one
/// transaction.
pub async fn delete_quiz(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let owner_id =
        sqlx::query_scalar::<_, i64>("SELECT created_by_user_id FROM quizzes WHERE id = ?")
            .bind(id)
            .fetch_optional(&pool)
            .await?
            .ok_or_else(|| AppError::NotFound("Quiz not found".to_string()))?;

    require_owner_or_admin(&claims, owner_id)?;

    let mut tx = pool.begin().await?;

    sqlx::query("DELETE FROM results WHERE quiz_id = ?")
        .bind(id)
        .execute(&mut *tx)
        .await?;
    sqlx::query("DELETE FROM questions WHERE quiz_id = ?")
        .bind(id)
        .execute(&mut *tx)
        .await?;
    sqlx::query("DELETE FROM quizzes WHERE id = ?")
        .bind(id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;

    Ok(Json(json!({ "message": "Quiz deleted successfully" })))
}

/// Inserts a validated question set for a quiz inside the caller's
/// transaction.
async fn insert_questions(
    tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>,
    quiz_id: i64,
    questions: &[QuestionInput],
) -> Result<(), AppError> {
    for question in questions {
        sqlx::query(
            "INSERT INTO questions (quiz_id, question_text, options, correct_option_index)
             VALUES (?, ?, ?, ?)",
        )
        .bind(quiz_id)
        .bind(&question.question_text)
        .bind(sqlx::types::Json(&question.options))
        .bind(question.correct_option_index)
        .execute(&mut **tx)
        .await?;
    }
    Ok(())
}
