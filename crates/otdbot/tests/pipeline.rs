use chrono::NaiveDate;
use reqwest::Client;
use serde_json::json;
use wiremock::matchers::{body_json, body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use otdbot::config::{Credentials, Tunables};
use otdbot::publish::{PublishError, publish_post};
use otdbot::run_pipeline;

fn credentials() -> Credentials {
    Credentials {
        api_key: "consumer-key".to_string(),
        api_secret: "consumer-secret".to_string(),
        access_token: "access-token".to_string(),
        access_secret: "access-secret".to_string(),
        gemini_api_key: "gemini-key".to_string(),
        bearer_token: None,
    }
}

fn tunables(server: &MockServer) -> Tunables {
    Tunables {
        events_base_url: server.uri(),
        gemini_url: format!("{}/v1beta/generate", server.uri()),
        post_url: format!("{}/2/tweets", server.uri()),
    }
}

fn aug_14() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 8, 14).expect("valid date")
}

async fn mount_feed(server: &MockServer, events: serde_json::Value) {
    Mock::given(method("GET"))
        .and(path("/8/14/events.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "events": events })))
        .expect(1)
        .mount(server)
        .await;
}

fn five_events() -> serde_json::Value {
    json!([
        {"year": "1040", "description": "King Duncan I is killed in battle"},
        {"year": "1457", "description": "Oldest known exactly dated printed book"},
        {"year": 1848, "description": "The Oregon Territory is organized"},
        {"year": "1901", "description": "A claimed powered flight by Gustave Whitehead"},
        {"year": "1967", "description": "The Marine Broadcasting Offences Act comes into force"}
    ])
}

#[tokio::test]
async fn publishes_generated_post_end_to_end() {
    let server = MockServer::start().await;
    mount_feed(&server, five_events()).await;

    let completion = "📅 Aug 14th in history:\n• 1040 — King Duncan I killed in battle\n• 1457 — Oldest dated printed book\n• 1901 — Whitehead's claimed flight\n#OTD #History";
    assert!(completion.chars().count() <= 280);

    Mock::given(method("POST"))
        .and(path("/v1beta/generate"))
        .and(header("X-goog-api-key", "gemini-key"))
        .and(body_string_contains("Aug 14th in history:"))
        .and(body_string_contains("1040: King Duncan I is killed in battle"))
        .and(body_string_contains(
            "1457: Oldest known exactly dated printed book",
        ))
        .and(body_string_contains("1848: The Oregon Territory is organized"))
        .and(body_string_contains(
            "1901: A claimed powered flight by Gustave Whitehead",
        ))
        .and(body_string_contains(
            "1967: The Marine Broadcasting Offences Act comes into force",
        ))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "candidates": [
                {"content": {"parts": [{"text": completion}]}}
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    // A completion under the limit must reach the publisher unmodified.
    Mock::given(method("POST"))
        .and(path("/2/tweets"))
        .and(body_json(json!({ "text": completion })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "data": {"id": "1956178112", "text": completion}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let outcome = run_pipeline(&Client::new(), &credentials(), &tunables(&server), aug_14()).await;
    assert!(outcome);
}

#[tokio::test]
async fn repairs_overlong_completion_before_publishing() {
    let server = MockServer::start().await;
    mount_feed(&server, five_events()).await;

    let padding = "a very long description that keeps going ".repeat(2);
    let completion = format!(
        "📅 Aug 14th in history:\n• 1040 — {padding}\n• 1457 — {padding}\n• 1901 — {padding}\n#OTD #History"
    );
    assert!(completion.chars().count() > 280);

    Mock::given(method("POST"))
        .and(path("/v1beta/generate"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "candidates": [
                {"content": {"parts": [{"text": completion}]}}
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let repaired = format!(
        "📅 Aug 14th in history:\n• 1040 — {padding}\n• 1457 — {padding}\n#OTD #History"
    );
    assert!(repaired.chars().count() <= 280);

    Mock::given(method("POST"))
        .and(path("/2/tweets"))
        .and(body_json(json!({ "text": repaired })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "data": {"id": "1956178113"}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let outcome = run_pipeline(&Client::new(), &credentials(), &tunables(&server), aug_14()).await;
    assert!(outcome);
}

#[tokio::test]
async fn empty_feed_aborts_before_generation() {
    let server = MockServer::start().await;
    mount_feed(&server, json!([])).await;

    Mock::given(method("POST"))
        .and(path("/v1beta/generate"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/2/tweets"))
        .respond_with(ResponseTemplate::new(201))
        .expect(0)
        .mount(&server)
        .await;

    let outcome = run_pipeline(&Client::new(), &credentials(), &tunables(&server), aug_14()).await;
    assert!(!outcome);
}

#[tokio::test]
async fn feed_failure_aborts_the_run() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/8/14/events.json"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/v1beta/generate"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let outcome = run_pipeline(&Client::new(), &credentials(), &tunables(&server), aug_14()).await;
    assert!(!outcome);
}

#[tokio::test]
async fn empty_completion_aborts_before_publishing() {
    let server = MockServer::start().await;
    mount_feed(&server, five_events()).await;

    Mock::given(method("POST"))
        .and(path("/v1beta/generate"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "candidates": [] })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/2/tweets"))
        .respond_with(ResponseTemplate::new(201))
        .expect(0)
        .mount(&server)
        .await;

    let outcome = run_pipeline(&Client::new(), &credentials(), &tunables(&server), aug_14()).await;
    assert!(!outcome);
}

#[tokio::test]
async fn publisher_classifies_rate_limit_and_forbidden() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/2/tweets"))
        .respond_with(ResponseTemplate::new(429))
        .expect(1)
        .mount(&server)
        .await;

    let result = publish_post(&Client::new(), &credentials(), &tunables(&server), "hello").await;
    assert!(matches!(result, Err(PublishError::RateLimited)));

    let forbidden = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/2/tweets"))
        .respond_with(ResponseTemplate::new(403))
        .expect(1)
        .mount(&forbidden)
        .await;

    let result = publish_post(
        &Client::new(),
        &credentials(),
        &tunables(&forbidden),
        "hello",
    )
    .await;
    assert!(matches!(result, Err(PublishError::Forbidden)));
}
