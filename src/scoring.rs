// src/scoring.rs

use std::collections::HashMap;

use crate::{
    error::AppError,
    models::{question::Question, result::AnswerInput},
};

/// Outcome of evaluating one submission against a quiz's stored answer key.
#[derive(Debug, PartialEq, Eq)]
pub struct Score {
    pub score: i64,
    pub total_questions: i64,
}

/// Evaluates submitted answers against the quiz's question set.
///
/// The number of answers must exactly match the number of questions in the
/// quiz. The submitted option *text* is compared against the stored correct
/// option, so client-provided indices are never trusted. Answers referencing
/// question ids outside the quiz are skipped without scoring or error; this
/// leniency is intentional and covered by tests.
pub fn evaluate(questions: &[Question], answers: &[AnswerInput]) -> Result<Score, AppError> {
    if answers.len() != questions.len() {
        return Err(AppError::BadRequest(
            "answer count does not match question count".to_string(),
        ));
    }

    let by_id: HashMap<i64, &Question> = questions.iter().map(|q| (q.id, q)).collect();

    let mut score = 0;
    for answer in answers {
        let Some(question) = by_id.get(&answer.question_id) else {
            // Not part of this quiz.
            continue;
        };
        if question.correct_answer() == Some(answer.selected_answer.as_str()) {
            score += 1;
        }
    }

    Ok(Score {
        score,
        total_questions: answers.len() as i64,
    })
}
