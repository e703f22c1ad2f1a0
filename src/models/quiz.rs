// src/models/quiz.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::models::question::{PublicQuestion, QuestionInput};

/// Represents the 'quizzes' table in the database.
/// Exactly one of `topic_id` / `custom_topic` identifies the subject.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Quiz {
    pub id: i64,
    pub topic_id: Option<i64>,
    pub custom_topic: Option<String>,
    pub difficulty: String,
    pub created_by_user_id: i64,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// Row of the public quiz listing. Questions are omitted; `topic_name` is the
/// joined topic name or the quiz's custom topic.
#[derive(Debug, Serialize, FromRow)]
pub struct QuizSummary {
    pub id: i64,
    pub topic_id: Option<i64>,
    pub topic_name: String,
    pub difficulty: String,
    pub created_by_user_id: i64,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub question_count: i64,
}

/// Quiz detail view with its questions, correct answers hidden.
#[derive(Debug, Serialize)]
pub struct QuizDetail {
    pub id: i64,
    pub topic_id: Option<i64>,
    pub topic_name: String,
    pub difficulty: String,
    pub created_by_user_id: i64,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub questions: Vec<PublicQuestion>,
}

/// DTO for creating a quiz, either from a supplied question list or by
/// delegating to the AI generator.
#[derive(Debug, Deserialize)]
pub struct CreateQuizRequest {
    pub topic_id: Option<i64>,
    pub custom_topic: Option<String>,
    pub difficulty: Option<String>,
    pub questions: Option<Vec<QuestionInput>>,
    #[serde(default)]
    pub ai_generate: bool,
    pub num_questions: Option<u8>,
}

/// DTO for updating a quiz. A supplied `questions` list replaces the quiz's
/// entire question set.
#[derive(Debug, Deserialize)]
pub struct UpdateQuizRequest {
    pub topic_id: Option<i64>,
    pub custom_topic: Option<String>,
    pub difficulty: Option<String>,
    pub questions: Option<Vec<QuestionInput>>,
}
