// src/handlers/leaderboard.rs

use axum::{Json, extract::State, response::IntoResponse};
use sqlx::SqlitePool;

use crate::{
    error::AppError,
    models::result::{LeaderboardEntry, LeaderboardRow},
};

/// Returns the top 10 users ranked by lifetime summed score.
/// (Authenticated users)
///
/// Equal totals are ordered by ascending user id so the ranking is
/// deterministic across reads.
pub async fn get_leaderboard(
    State(pool): State<SqlitePool>,
) -> Result<impl IntoResponse, AppError> {
    let rows = sqlx::query_as::<_, LeaderboardRow>(
        r#"
        SELECT
            u.id AS user_id,
            u.username,
            SUM(r.score) AS total_score
        FROM results r
        JOIN users u ON u.id = r.user_id
        GROUP BY u.id, u.username
        ORDER BY total_score DESC, u.id ASC
        LIMIT 10
        "#,
    )
    .fetch_all(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to fetch leaderboard: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    let leaderboard: Vec<LeaderboardEntry> = rows
        .into_iter()
        .enumerate()
        .map(|(index, row)| LeaderboardEntry {
            rank: index + 1,
            user_id: row.user_id,
            username: row.username,
            total_score: row.total_score,
        })
        .collect();

    Ok(Json(leaderboard))
}
