// ABOUTME: Tests for the participant directory HTTP client
// ABOUTME: Uses a wiremock server in place of the directory service

use serde_json::json;
use std::time::Duration;
use tagall_core::directory::{DirectoryClient, DirectoryError};
use tagall_core::{ChatId, ParticipantDirectory, UserId};
use wiremock::{
    matchers::{method, path, query_param},
    Mock, MockServer, ResponseTemplate,
};

fn client(server: &MockServer) -> DirectoryClient {
    DirectoryClient::new(&server.uri(), Duration::from_millis(500)).unwrap()
}

#[tokio::test]
async fn test_fetch_success_maps_ids_to_names() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/get"))
        .and(query_param("chat_id", "-100123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "11": "Alice",
            "22": "Bob",
            "33": "Carol"
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let participants = client(&mock_server).fetch(ChatId(-100123)).await;

    assert_eq!(participants.len(), 3);
    assert_eq!(participants.get(&UserId(11)).map(String::as_str), Some("Alice"));
    assert_eq!(participants.get(&UserId(33)).map(String::as_str), Some("Carol"));
}

#[tokio::test]
async fn test_fetch_non_success_is_empty() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/get"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({"error": "unknown chat"})))
        .mount(&mock_server)
        .await;

    let directory = client(&mock_server);
    assert!(directory.fetch(ChatId(-1)).await.is_empty());

    let err = directory.lookup(ChatId(-1)).await.unwrap_err();
    assert!(matches!(err, DirectoryError::Status(404)));
}

#[tokio::test]
async fn test_fetch_only_accepts_ok_status() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/get"))
        .respond_with(ResponseTemplate::new(203).set_body_json(json!({"11": "Alice"})))
        .mount(&mock_server)
        .await;

    let directory = client(&mock_server);
    assert!(directory.fetch(ChatId(-1)).await.is_empty());

    let err = directory.lookup(ChatId(-1)).await.unwrap_err();
    assert!(matches!(err, DirectoryError::Status(203)), "got {:?}", err);
}

#[tokio::test]
async fn test_fetch_timeout_is_empty() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/get"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"1": "Slow"}))
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&mock_server)
        .await;

    let directory = client(&mock_server);
    let err = directory.lookup(ChatId(-1)).await.unwrap_err();
    assert!(matches!(err, DirectoryError::Timeout), "got {:?}", err);
    assert!(directory.fetch(ChatId(-1)).await.is_empty());
}

#[tokio::test]
async fn test_fetch_malformed_body_is_empty() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/get"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&mock_server)
        .await;

    let directory = client(&mock_server);
    let err = directory.lookup(ChatId(-1)).await.unwrap_err();
    assert!(matches!(err, DirectoryError::Decode(_)));
    assert!(directory.fetch(ChatId(-1)).await.is_empty());
}

#[tokio::test]
async fn test_fetch_unreachable_is_empty() {
    let directory = DirectoryClient::new("http://127.0.0.1:1", Duration::from_millis(500)).unwrap();
    let err = directory.lookup(ChatId(-1)).await.unwrap_err();
    assert!(matches!(
        err,
        DirectoryError::Transport(_) | DirectoryError::Timeout
    ));
    assert!(directory.fetch(ChatId(-1)).await.is_empty());
}

#[tokio::test]
async fn test_fetch_skips_non_numeric_ids() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/get"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "42": "Real",
            "bot": "Not a user id"
        })))
        .mount(&mock_server)
        .await;

    let participants = client(&mock_server).fetch(ChatId(-1)).await;
    assert_eq!(participants.len(), 1);
    assert!(participants.contains_key(&UserId(42)));
}

#[tokio::test]
async fn test_fetch_ignores_alternate_spellings_of_an_id() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/get"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "011": "Padded",
            " 11": "Spaced",
            "11": "Alice",
            "+22": "Signed",
            "22": "Bob"
        })))
        .mount(&mock_server)
        .await;

    let participants = client(&mock_server).fetch(ChatId(-1)).await;
    assert_eq!(participants.len(), 2);
    assert_eq!(participants.get(&UserId(11)).map(String::as_str), Some("Alice"));
    assert_eq!(participants.get(&UserId(22)).map(String::as_str), Some("Bob"));
}
