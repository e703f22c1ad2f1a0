// tests/common/mod.rs

#![allow(dead_code)]

use std::sync::Arc;

use async_trait::async_trait;
use quiz_backend::{
    ai::QuestionGenerator, config::Config, error::AppError, models::question::QuestionInput,
    routes, state::AppState,
};
use sqlx::{SqlitePool, sqlite::SqlitePoolOptions};

/// Stub question generator so tests never call the real AI API.
pub struct StubGenerator {
    pub questions: Vec<QuestionInput>,
    pub fail: bool,
}

impl StubGenerator {
    pub fn with_questions(questions: Vec<QuestionInput>) -> Arc<Self> {
        Arc::new(Self {
            questions,
            fail: false,
        })
    }

    pub fn failing() -> Arc<Self> {
        Arc::new(Self {
            questions: Vec::new(),
            fail: true,
        })
    }
}

#[async_trait]
impl QuestionGenerator for StubGenerator {
    async fn generate(
        &self,
        _topic: &str,
        _difficulty: &str,
        count: u8,
    ) -> Result<Vec<QuestionInput>, AppError> {
        if self.fail {
            return Err(AppError::UpstreamFailure(
                "stub generator is down".to_string(),
            ));
        }
        Ok(self
            .questions
            .iter()
            .take(count as usize)
            .cloned()
            .collect())
    }
}

pub struct TestApp {
    pub address: String,
    pub pool: SqlitePool,
}

/// Spawns the app on a random port against a fresh in-memory database.
/// Returns the base URL and the pool for direct seeding/inspection.
pub async fn spawn_app() -> TestApp {
    spawn_app_with_generator(StubGenerator::with_questions(Vec::new())).await
}

pub async fn spawn_app_with_generator(generator: Arc<dyn QuestionGenerator>) -> TestApp {
    // A single connection keeps the in-memory database alive and shared
    // between the server and the test body.
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("Failed to open in-memory SQLite database");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to migrate database");

    let config = Config {
        database_url: "sqlite::memory:".to_string(),
        jwt_secret: "test_secret_for_integration_tests".to_string(),
        access_token_expiration: 600,
        refresh_token_expiration: 3600,
        rust_log: "error".to_string(),
        admin_username: None,
        admin_email: None,
        admin_password: None,
        openai_api_key: None,
        openai_base_url: None,
        openai_model: "gpt-4o-mini".to_string(),
    };

    let state = AppState {
        pool: pool.clone(),
        config,
        generator,
    };

    let app = routes::create_router(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind random port");
    let port = listener.local_addr().unwrap().port();
    let address = format!("http://127.0.0.1:{}", port);

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    TestApp { address, pool }
}

pub fn unique_username(prefix: &str) -> String {
    format!("{}_{}", prefix, &uuid::Uuid::new_v4().to_string()[..8])
}

/// Registers a user (password "password123") and returns the login response.
pub async fn register_and_login(
    client: &reqwest::Client,
    app: &TestApp,
    username: &str,
) -> serde_json::Value {
    let email = format!("{}@example.com", username);

    let response = client
        .post(format!("{}/auth/register", app.address))
        .json(&serde_json::json!({
            "username": username,
            "email": email,
            "password": "password123"
        }))
        .send()
        .await
        .expect("Register failed");
    assert_eq!(response.status().as_u16(), 201);

    login(client, app, &email, "password123").await
}

pub async fn login(
    client: &reqwest::Client,
    app: &TestApp,
    email: &str,
    password: &str,
) -> serde_json::Value {
    let response = client
        .post(format!("{}/auth/login", app.address))
        .json(&serde_json::json!({ "email": email, "password": password }))
        .send()
        .await
        .expect("Login failed");
    assert_eq!(response.status().as_u16(), 200);

    response.json().await.expect("Failed to parse login json")
}

pub fn access_token(login_response: &serde_json::Value) -> String {
    login_response["access_token"]
        .as_str()
        .expect("access_token not found")
        .to_string()
}

pub fn user_id(login_response: &serde_json::Value) -> i64 {
    login_response["user"]["id"]
        .as_i64()
        .expect("user id not found")
}

/// Registers a fresh account, flips its admin flag directly in the store and
/// logs in again so the returned token carries the admin claim.
pub async fn admin_token(client: &reqwest::Client, app: &TestApp, username: &str) -> String {
    let login_response = register_and_login(client, app, username).await;
    let id = user_id(&login_response);

    sqlx::query("UPDATE users SET is_admin = 1 WHERE id = ?")
        .bind(id)
        .execute(&app.pool)
        .await
        .expect("Failed to promote user to admin");

    let email = format!("{}@example.com", username);
    let login_response = login(client, app, &email, "password123").await;
    access_token(&login_response)
}

pub fn sample_questions() -> serde_json::Value {
    serde_json::json!([
        {
            "question_text": "First question?",
            "options": ["A", "B"],
            "correct_option_index": 0
        },
        {
            "question_text": "Second question?",
            "options": ["C", "D"],
            "correct_option_index": 1
        }
    ])
}

/// Creates a custom-topic quiz through the API and returns its id.
pub async fn create_quiz(
    client: &reqwest::Client,
    app: &TestApp,
    token: &str,
    custom_topic: &str,
    questions: serde_json::Value,
) -> i64 {
    let response = client
        .post(format!("{}/quiz", app.address))
        .header("Authorization", format!("Bearer {}", token))
        .json(&serde_json::json!({
            "custom_topic": custom_topic,
            "difficulty": "Medium",
            "questions": questions
        }))
        .send()
        .await
        .expect("Quiz creation failed");
    assert_eq!(response.status().as_u16(), 201);

    let body: serde_json::Value = response.json().await.expect("Failed to parse quiz json");
    body["quiz_id"].as_i64().expect("quiz_id not found")
}

pub async fn count_rows(app: &TestApp, table: &str) -> i64 {
    sqlx::query_scalar::<_, i64>(&format!("SELECT COUNT(*) FROM {}", table))
        .fetch_one(&app.pool)
        .await
        .expect("Failed to count rows")
}
