// src/models/topic.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// Represents the 'topics' table in the database.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Topic {
    pub id: i64,
    pub name: String,
}

/// DTO for creating or renaming a topic.
#[derive(Debug, Deserialize, Validate)]
pub struct TopicRequest {
    #[validate(length(
        min = 1,
        max = 100,
        message = "Topic name must be between 1 and 100 characters."
    ))]
    pub name: String,
}
