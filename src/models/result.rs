// src/models/result.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Represents the 'results' table in the database.
/// Rows are immutable once written; they only disappear when their user or
/// quiz is deleted.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct QuizResult {
    pub id: i64,
    pub user_id: i64,
    pub quiz_id: i64,
    pub score: i64,
    pub total_questions: i64,
    pub completed_at: chrono::DateTime<chrono::Utc>,
}

/// One submitted answer: the question it targets and the selected option text.
#[derive(Debug, Clone, Deserialize)]
pub struct AnswerInput {
    pub question_id: i64,
    pub selected_answer: String,
}

/// DTO for submitting a completed quiz attempt.
#[derive(Debug, Deserialize)]
pub struct SubmitResultRequest {
    pub quiz_id: i64,
    pub answers: Vec<AnswerInput>,
}

/// Aggregated row joined from `results` and `users`.
#[derive(Debug, Serialize, FromRow)]
pub struct LeaderboardRow {
    pub user_id: i64,
    pub username: String,
    pub total_score: i64,
}

/// Leaderboard entry as returned to clients, with the 1-based rank attached.
#[derive(Debug, Serialize)]
pub struct LeaderboardEntry {
    pub rank: usize,
    pub user_id: i64,
    pub username: String,
    pub total_score: i64,
}
