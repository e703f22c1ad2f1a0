// tests/api_tests.rs

mod common;

use common::{
    access_token, admin_token, count_rows, create_quiz, login, register_and_login,
    sample_questions, spawn_app, unique_username, user_id,
};

#[tokio::test]
async fn health_check_works() {
    // Arrange
    let app = spawn_app().await;
    let client = reqwest::Client::new();

    // Act
    let response = client
        .get(format!("{}/health", app.address))
        .send()
        .await
        .expect("Failed to execute request");

    // Assert
    assert_eq!(response.status().as_u16(), 200);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn unknown_path_is_404() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();

    let response = client
        .get(format!("{}/random_path_that_does_not_exist", app.address))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status().as_u16(), 404);
}

#[tokio::test]
async fn register_works() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();
    let username = unique_username("u");

    let response = client
        .post(format!("{}/auth/register", app.address))
        .json(&serde_json::json!({
            "username": username,
            "email": format!("{}@example.com", username),
            "password": "password123"
        }))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status().as_u16(), 201);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["username"], username.as_str());
    assert_eq!(body["is_admin"], false);
    // The hash must never appear in any response shape.
    assert!(body.get("password_hash").is_none());
    assert!(body.get("password").is_none());
}

#[tokio::test]
async fn register_fails_validation() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();

    // Username too short
    let response = client
        .post(format!("{}/auth/register", app.address))
        .json(&serde_json::json!({
            "username": "yo",
            "email": "yo@example.com",
            "password": "password123"
        }))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status().as_u16(), 400);

    // Malformed email
    let response = client
        .post(format!("{}/auth/register", app.address))
        .json(&serde_json::json!({
            "username": "valid_name",
            "email": "not-an-email",
            "password": "password123"
        }))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status().as_u16(), 400);
}

#[tokio::test]
async fn duplicate_email_and_username_conflict() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();

    register_and_login(&client, &app, "first_user").await;

    // Same email, different username
    let response = client
        .post(format!("{}/auth/register", app.address))
        .json(&serde_json::json!({
            "username": "second_user",
            "email": "first_user@example.com",
            "password": "password123"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 409);

    // Same username, different email
    let response = client
        .post(format!("{}/auth/register", app.address))
        .json(&serde_json::json!({
            "username": "first_user",
            "email": "other@example.com",
            "password": "password123"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 409);
}

#[tokio::test]
async fn password_is_stored_hashed() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();

    register_and_login(&client, &app, "hash_check").await;

    let stored_hash =
        sqlx::query_scalar::<_, String>("SELECT password_hash FROM users WHERE username = ?")
            .bind("hash_check")
            .fetch_one(&app.pool)
            .await
            .unwrap();

    assert_ne!(stored_hash, "password123");
    assert!(stored_hash.starts_with("$argon2"));
}

#[tokio::test]
async fn login_returns_tokens_and_user_summary() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();

    let login_response = register_and_login(&client, &app, "login_user").await;

    assert!(login_response["access_token"].is_string());
    assert!(login_response["refresh_token"].is_string());
    assert_eq!(login_response["user"]["username"], "login_user");
    assert_eq!(login_response["user"]["email"], "login_user@example.com");
    assert_eq!(login_response["user"]["is_admin"], false);
}

#[tokio::test]
async fn bad_credentials_do_not_leak_which_part_was_wrong() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();

    register_and_login(&client, &app, "enum_target").await;

    // Wrong password for an existing account
    let wrong_password = client
        .post(format!("{}/auth/login", app.address))
        .json(&serde_json::json!({
            "email": "enum_target@example.com",
            "password": "wrong_password"
        }))
        .send()
        .await
        .unwrap();

    // Unknown email entirely
    let unknown_email = client
        .post(format!("{}/auth/login", app.address))
        .json(&serde_json::json!({
            "email": "nobody@example.com",
            "password": "password123"
        }))
        .send()
        .await
        .unwrap();

    assert_eq!(wrong_password.status().as_u16(), 401);
    assert_eq!(unknown_email.status().as_u16(), 401);

    let body_a: serde_json::Value = wrong_password.json().await.unwrap();
    let body_b: serde_json::Value = unknown_email.json().await.unwrap();
    assert_eq!(body_a, body_b);
}

#[tokio::test]
async fn refresh_token_issues_a_working_access_token() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();

    let login_response = register_and_login(&client, &app, "refresh_user").await;
    let refresh_token = login_response["refresh_token"].as_str().unwrap();

    let response = client
        .post(format!("{}/auth/refresh", app.address))
        .header("Authorization", format!("Bearer {}", refresh_token))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);

    let body: serde_json::Value = response.json().await.unwrap();
    let new_access_token = body["access_token"].as_str().unwrap();

    // The fresh access token works against a protected route.
    let profile = client
        .get(format!("{}/profile", app.address))
        .header("Authorization", format!("Bearer {}", new_access_token))
        .send()
        .await
        .unwrap();
    assert_eq!(profile.status().as_u16(), 200);
}

#[tokio::test]
async fn refresh_rejects_access_tokens_and_garbage() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();

    let login_response = register_and_login(&client, &app, "refresh_misuse").await;
    let token = access_token(&login_response);

    // An access token is not a refresh token.
    let response = client
        .post(format!("{}/auth/refresh", app.address))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 401);

    // No token at all
    let response = client
        .post(format!("{}/auth/refresh", app.address))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 401);

    // A refresh token must not pass the access-token middleware either.
    let refresh_token = login_response["refresh_token"].as_str().unwrap();
    let response = client
        .get(format!("{}/profile", app.address))
        .header("Authorization", format!("Bearer {}", refresh_token))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 401);
}

#[tokio::test]
async fn profile_requires_token_and_returns_current_user() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();

    let response = client
        .get(format!("{}/profile", app.address))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 401);

    let login_response = register_and_login(&client, &app, "profile_user").await;
    let token = access_token(&login_response);

    let response = client
        .get(format!("{}/profile", app.address))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);

    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["username"], "profile_user");
    assert_eq!(body["id"], user_id(&login_response));
}

#[tokio::test]
async fn deleting_profile_cascades_quizzes_and_results() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();

    let login_response = register_and_login(&client, &app, "doomed_user").await;
    let token = access_token(&login_response);

    // The user authors a quiz and takes it once.
    let quiz_id = create_quiz(&client, &app, &token, "History", sample_questions()).await;
    let response = client
        .post(format!("{}/result", app.address))
        .header("Authorization", format!("Bearer {}", token))
        .json(&serde_json::json!({
            "quiz_id": quiz_id,
            "answers": [
                { "question_id": 1, "selected_answer": "A" },
                { "question_id": 2, "selected_answer": "D" }
            ]
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 201);

    let response = client
        .delete(format!("{}/profile", app.address))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);

    // Everything the user owned or produced is gone.
    assert_eq!(count_rows(&app, "users").await, 0);
    assert_eq!(count_rows(&app, "quizzes").await, 0);
    assert_eq!(count_rows(&app, "questions").await, 0);
    assert_eq!(count_rows(&app, "results").await, 0);

    // And the credentials stop working.
    let response = client
        .post(format!("{}/auth/login", app.address))
        .json(&serde_json::json!({
            "email": "doomed_user@example.com",
            "password": "password123"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 401);
}

#[tokio::test]
async fn admin_routes_are_forbidden_for_regular_users() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();

    let login_response = register_and_login(&client, &app, "plain_user").await;
    let token = access_token(&login_response);

    let response = client
        .get(format!("{}/admin/users", app.address))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status().as_u16(), 403);
}

#[tokio::test]
async fn admin_can_list_and_update_users() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();

    let target = register_and_login(&client, &app, "managed_user").await;
    let target_id = user_id(&target);
    let token = admin_token(&client, &app, "the_admin").await;

    let response = client
        .get(format!("{}/admin/users", app.address))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);
    let users: Vec<serde_json::Value> = response.json().await.unwrap();
    assert_eq!(users.len(), 2);

    // Promote the managed user
    let response = client
        .put(format!("{}/admin/users/{}", app.address, target_id))
        .header("Authorization", format!("Bearer {}", token))
        .json(&serde_json::json!({ "is_admin": true }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);

    let response = client
        .get(format!("{}/admin/users/{}", app.address, target_id))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .unwrap();
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["is_admin"], true);

    // Renaming onto an existing username is a conflict
    let response = client
        .put(format!("{}/admin/users/{}", app.address, target_id))
        .header("Authorization", format!("Bearer {}", token))
        .json(&serde_json::json!({ "username": "the_admin" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 409);
}

#[tokio::test]
async fn admin_cannot_delete_themselves_but_can_delete_others() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();

    let target = register_and_login(&client, &app, "expendable").await;
    let target_id = user_id(&target);

    let admin_login = register_and_login(&client, &app, "root_admin").await;
    let admin_id = user_id(&admin_login);
    sqlx::query("UPDATE users SET is_admin = 1 WHERE id = ?")
        .bind(admin_id)
        .execute(&app.pool)
        .await
        .unwrap();
    let token = access_token(&login(&client, &app, "root_admin@example.com", "password123").await);

    // Self-deletion is refused outright.
    let response = client
        .delete(format!("{}/admin/users/{}", app.address, admin_id))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 403);

    // Deleting another user works.
    let response = client
        .delete(format!("{}/admin/users/{}", app.address, target_id))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);

    // And a second attempt is a 404.
    let response = client
        .delete(format!("{}/admin/users/{}", app.address, target_id))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 404);
}
