//! Integration tests for the describe -> format -> notify pipeline against a
//! mock Bot API.

use reqalert::config::TelegramConfig;
use reqalert::core::{DeliveryOutcome, Notifier};
use reqalert::describe::RequestDescriber;
use reqalert::formatting::{AlertFormatter, PlainTextFormatter};
use reqalert::notification::TelegramNotifier;
use serde_json::{json, Value};
use std::sync::Arc;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[path = "../helpers/mod.rs"]
mod helpers;
use helpers::fake_geo::FakeLocator;

fn telegram_config(server: &MockServer) -> TelegramConfig {
    TelegramConfig {
        bot_token: Some("42:token".to_string()),
        chat_id: Some("-100555".to_string()),
        api_base_url: server.uri(),
    }
}

#[tokio::test]
async fn test_described_request_is_delivered_escaped() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/bot42:token/sendMessage"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "ok": true, "result": {} })))
        .expect(1)
        .mount(&server)
        .await;

    let request = axum::http::Request::builder()
        .uri("/admin/login")
        .header("x-forwarded-for", "203.0.113.7")
        .body(())
        .unwrap();
    let describer = RequestDescriber::new(Arc::new(FakeLocator::new("Bandung, Jawa Barat, Indonesia")));
    let snapshot = describer.describe(&request).await;
    let text = PlainTextFormatter.format("Akses ke path yang dipantau", &snapshot);

    let notifier = TelegramNotifier::new(telegram_config(&server));
    assert_eq!(notifier.notify(&text).await, DeliveryOutcome::Sent);

    let received = server.received_requests().await.unwrap();
    assert_eq!(received.len(), 1);
    let body: Value = serde_json::from_slice(&received[0].body).unwrap();
    assert_eq!(body["chat_id"], "-100555");
    assert_eq!(body["parse_mode"], "MarkdownV2");

    let sent = body["text"].as_str().unwrap();
    assert!(sent.starts_with("```\n"));
    assert!(sent.ends_with("\n```"));
    assert!(sent.contains("IP: 203\\.0\\.113\\.7"));
    assert!(sent.contains("URL: /admin/login"));
    assert!(sent.contains("Lokasi: Bandung, Jawa Barat, Indonesia"));
}

#[tokio::test]
async fn test_chat_not_found_is_reported_not_raised() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "ok": false,
            "error_code": 400,
            "description": "Bad Request: chat not found"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let notifier = TelegramNotifier::new(telegram_config(&server));
    let outcome = notifier.notify("test").await;

    match outcome {
        DeliveryOutcome::Rejected { description } => {
            assert!(description.contains("chat not found"))
        }
        other => panic!("expected rejection, got {:?}", other),
    }
}

#[tokio::test]
async fn test_missing_credentials_skip_without_calling_api() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "ok": true })))
        .expect(0)
        .mount(&server)
        .await;

    let notifier = TelegramNotifier::new(TelegramConfig {
        api_base_url: server.uri(),
        ..Default::default()
    });

    assert_eq!(notifier.notify("test").await, DeliveryOutcome::Skipped);
    assert!(server.received_requests().await.unwrap().is_empty());
}
