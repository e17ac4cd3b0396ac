//! API integration tests against a running server

use reqwest::{Client, StatusCode};
use serde_json::{json, Value};

const BASE_URL: &str = "http://localhost:3000";

/// Names must be unique across runs against the same database
fn unique(prefix: &str) -> String {
    format!("{} {}", prefix, chrono::Utc::now().timestamp_nanos_opt().unwrap_or_default())
}

async fn create(client: &Client, resource: &str, name: &str) -> i64 {
    let response = client
        .post(format!("{}/{}", BASE_URL, resource))
        .json(&json!({ "name": name }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), StatusCode::CREATED);
    let body: Value = response.json().await.expect("Failed to parse response");
    body["id"].as_i64().expect("No id in response")
}

#[tokio::test]
#[ignore] // Run with: cargo test -- --ignored
async fn test_health_check() {
    let client = Client::new();

    let response = client
        .get(format!("{}/health", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["status"], "success");
    assert_eq!(body["message"], "API is running");
}

#[tokio::test]
#[ignore]
async fn test_ready() {
    let client = Client::new();

    let response = client
        .get(format!("{}/ready", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
#[ignore]
async fn test_lending_flow() {
    let client = Client::new();
    let user_id = create(&client, "users", &unique("Reader")).await;
    let book_id = create(&client, "books", &unique("Book")).await;

    let response = client
        .post(format!("{}/users/{}/borrow/{}", BASE_URL, user_id, book_id))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = client
        .post(format!("{}/users/{}/borrow/{}", BASE_URL, user_id, book_id))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = client
        .post(format!("{}/users/{}/return/{}", BASE_URL, user_id, book_id))
        .json(&json!({ "score": 9 }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let user: Value = client
        .get(format!("{}/users/{}", BASE_URL, user_id))
        .send()
        .await
        .expect("Failed to send request")
        .json()
        .await
        .expect("Failed to parse response");
    assert_eq!(user["books"]["past"][0]["userScore"], 9);
    assert_eq!(user["books"]["present"], json!([]));

    let book: Value = client
        .get(format!("{}/books/{}", BASE_URL, book_id))
        .send()
        .await
        .expect("Failed to send request")
        .json()
        .await
        .expect("Failed to parse response");
    assert_eq!(book["score"], "9.00");
}

#[tokio::test]
#[ignore]
async fn test_missing_book() {
    let client = Client::new();

    let response = client
        .get(format!("{}/books/{}", BASE_URL, i64::MAX))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["error"], "NotFound");
}

#[tokio::test]
#[ignore]
async fn test_invalid_score() {
    let client = Client::new();
    let user_id = create(&client, "users", &unique("Reader")).await;
    let book_id = create(&client, "books", &unique("Book")).await;

    let response = client
        .post(format!("{}/users/{}/return/{}", BASE_URL, user_id, book_id))
        .json(&json!({ "score": 11 }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
