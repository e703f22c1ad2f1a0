// src/models/question.rs

use serde::{Deserialize, Serialize};
use sqlx::{prelude::FromRow, types::Json};

/// Represents the 'questions' table in the database.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Question {
    pub id: i64,

    pub quiz_id: i64,

    pub question_text: String,

    /// List of answer options (e.g., ["Option A", "Option B"]).
    /// Stored as a JSON array in the database.
    pub options: Json<Vec<String>>,

    /// 0-based index into `options` marking the correct answer.
    pub correct_option_index: i64,
}

impl Question {
    /// The stored text of the correct option, if the index is in range.
    pub fn correct_answer(&self) -> Option<&str> {
        self.options
            .0
            .get(self.correct_option_index as usize)
            .map(String::as_str)
    }
}

/// DTO for sending a question to clients (hides the correct answer).
#[derive(Debug, Serialize)]
pub struct PublicQuestion {
    pub id: i64,
    pub question_text: String,
    pub options: Json<Vec<String>>,
}

impl From<Question> for PublicQuestion {
    fn from(question: Question) -> Self {
        Self {
            id: question.id,
            question_text: question.question_text,
            options: question.options,
        }
    }
}

/// Incoming question payload. Shared by manual quiz creation and the output
/// of the AI generator, so both go through the same schema rules.
#[derive(Debug, Clone, Deserialize)]
pub struct QuestionInput {
    pub question_text: String,
    pub options: Vec<String>,
    pub correct_option_index: i64,
}

impl QuestionInput {
    /// Schema rules applied to every question regardless of origin.
    pub fn validate(&self) -> Result<(), String> {
        if self.question_text.trim().is_empty() {
            return Err("'question_text' must not be empty".to_string());
        }
        if self.options.len() < 2 {
            return Err("'options' must contain at least 2 entries".to_string());
        }
        if self.correct_option_index < 0
            || self.correct_option_index as usize >= self.options.len()
        {
            return Err("'correct_option_index' is out of range".to_string());
        }
        Ok(())
    }
}
