// src/ai.rs

use async_openai::{
    Client,
    config::OpenAIConfig,
    types::chat::{
        ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
        CreateChatCompletionRequestArgs, ResponseFormat,
    },
};
use async_trait::async_trait;

use crate::{config::Config, error::AppError, models::question::QuestionInput};

/// Port for the external question-generation collaborator.
///
/// Held in `AppState` as a trait object so tests can substitute a stub.
/// Implementations return the raw question objects; the caller applies the
/// same schema validation as for manually supplied questions.
#[async_trait]
pub trait QuestionGenerator: Send + Sync {
    async fn generate(
        &self,
        topic: &str,
        difficulty: &str,
        count: u8,
    ) -> Result<Vec<QuestionInput>, AppError>;
}

/// `QuestionGenerator` backed by an OpenAI-compatible chat completion API.
pub struct OpenAiQuestionGenerator {
    client: Option<Client<OpenAIConfig>>,
    model: String,
}

impl OpenAiQuestionGenerator {
    pub fn new(config: &Config) -> Self {
        let client = config.openai_api_key.as_ref().map(|api_key| {
            let mut openai_config = OpenAIConfig::new().with_api_key(api_key);
            if let Some(base_url) = &config.openai_base_url {
                openai_config = openai_config.with_api_base(base_url);
            }
            Client::with_config(openai_config)
        });

        if client.is_none() {
            tracing::warn!("OPENAI_API_KEY not set, AI quiz generation is disabled");
        }

        Self {
            client,
            model: config.openai_model.clone(),
        }
    }

    /// System prompt forcing the model to return only the JSON question list.
    fn build_prompt(topic: &str, difficulty: &str, count: u8) -> String {
        format!(
            r#"You are an expert quiz generator. Your task is to generate {count} multiple-choice quiz questions on the topic of "{topic}" with a difficulty of "{difficulty}".

You MUST return ONLY valid JSON and nothing else. Do not include ```json, preambles or any other text.

Return a JSON object with a single key "questions" whose value is an array. Each element MUST follow this exact schema:
{{
  "question_text": "The text of the question.",
  "options": ["Option A", "Option B", "Option C", "Option D"],
  "correct_option_index": 1
}}

- "question_text" MUST be a string.
- "options" MUST be an array of exactly 4 strings: one correct answer and three incorrect answers.
- "correct_option_index" MUST be the integer index (0, 1, 2, or 3) of the correct answer in the "options" array.
- Ensure the correct answer's position is varied across questions."#
        )
    }

    /// Accepts either a bare JSON array or an object wrapping one, since
    /// JSON-mode responses force a top-level object on some models.
    fn extract_questions(raw: &str) -> Result<Vec<QuestionInput>, AppError> {
        let value: serde_json::Value = serde_json::from_str(raw)
            .map_err(|e| AppError::UpstreamFailure(format!("AI returned invalid JSON: {}", e)))?;

        let items = match value {
            serde_json::Value::Array(items) => items,
            serde_json::Value::Object(map) => map
                .into_iter()
                .find_map(|(_, v)| match v {
                    serde_json::Value::Array(items) => Some(items),
                    _ => None,
                })
                .ok_or_else(|| {
                    AppError::UpstreamFailure(
                        "AI response contained no list of questions".to_string(),
                    )
                })?,
            _ => {
                return Err(AppError::UpstreamFailure(
                    "AI did not return a JSON list or object".to_string(),
                ));
            }
        };

        serde_json::from_value(serde_json::Value::Array(items)).map_err(|e| {
            AppError::UpstreamFailure(format!(
                "AI question objects did not match the expected schema: {}",
                e
            ))
        })
    }
}

#[async_trait]
impl QuestionGenerator for OpenAiQuestionGenerator {
    async fn generate(
        &self,
        topic: &str,
        difficulty: &str,
        count: u8,
    ) -> Result<Vec<QuestionInput>, AppError> {
        let client = self.client.as_ref().ok_or_else(|| {
            AppError::UpstreamFailure("OPENAI_API_KEY is not configured".to_string())
        })?;

        let messages = vec![ChatCompletionRequestMessage::System(
            ChatCompletionRequestSystemMessageArgs::default()
                .content(Self::build_prompt(topic, difficulty, count))
                .build()
                .map_err(|e| AppError::UpstreamFailure(e.to_string()))?,
        )];

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(messages)
            .temperature(0.7)
            .response_format(ResponseFormat::JsonObject)
            .build()
            .map_err(|e| AppError::UpstreamFailure(e.to_string()))?;

        let response = client
            .chat()
            .create(request)
            .await
            .map_err(|e| AppError::UpstreamFailure(format!("AI API request failed: {}", e)))?;

        let content = response
            .choices
            .first()
            .and_then(|choice| choice.message.content.clone())
            .ok_or_else(|| {
                AppError::UpstreamFailure("AI returned an empty response".to_string())
            })?;

        Self::extract_questions(&content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_bare_array() {
        let raw = r#"[{"question_text": "Q?", "options": ["A", "B"], "correct_option_index": 1}]"#;
        let questions = OpenAiQuestionGenerator::extract_questions(raw).unwrap();
        assert_eq!(questions.len(), 1);
        assert_eq!(questions[0].correct_option_index, 1);
    }

    #[test]
    fn extracts_array_nested_in_object() {
        let raw = r#"{"questions": [{"question_text": "Q?", "options": ["A", "B"], "correct_option_index": 0}]}"#;
        let questions = OpenAiQuestionGenerator::extract_questions(raw).unwrap();
        assert_eq!(questions.len(), 1);
        assert_eq!(questions[0].question_text, "Q?");
    }

    #[test]
    fn rejects_malformed_json() {
        let err = OpenAiQuestionGenerator::extract_questions("not json").unwrap_err();
        assert!(matches!(err, AppError::UpstreamFailure(_)));
    }

    #[test]
    fn rejects_object_without_a_list() {
        let err = OpenAiQuestionGenerator::extract_questions(r#"{"oops": 1}"#).unwrap_err();
        assert!(matches!(err, AppError::UpstreamFailure(_)));
    }

    #[test]
    fn rejects_schema_mismatch() {
        let raw = r#"[{"question_text": "Q?", "options": "not a list"}]"#;
        let err = OpenAiQuestionGenerator::extract_questions(raw).unwrap_err();
        assert!(matches!(err, AppError::UpstreamFailure(_)));
    }
}
