use parley_server::sync::{ChatBackend, HttpChatBackend, SyncError};
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn conversation_doc(id: &str) -> serde_json::Value {
    json!({
        "_id": id,
        "userId": "u1",
        "history": [
            { "role": "user", "parts": [{ "text": "Hello" }] },
            { "role": "model", "parts": [{ "text": "Hi" }] }
        ],
        "createdAt": "2025-03-01T10:00:00Z",
        "updatedAt": "2025-03-01T10:00:05Z"
    })
}

#[tokio::test]
async fn test_create_chat_sends_bearer_and_text() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/chats"))
        .and(header("authorization", "Bearer tok"))
        .and(body_json(json!({ "text": "Hello" })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!("c1")))
        .expect(1)
        .mount(&server)
        .await;

    let backend = HttpChatBackend::new(server.uri(), "tok");
    assert_eq!(backend.create_chat("Hello").await.unwrap(), "c1");
}

#[tokio::test]
async fn test_fetch_chat_parses_document_or_null() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/chats/c1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(conversation_doc("c1")))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/chats/gone"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::Value::Null))
        .mount(&server)
        .await;

    // Trailing slash on the base URL is tolerated
    let backend = HttpChatBackend::new(format!("{}/", server.uri()), "tok");

    let conv = backend.fetch_chat("c1").await.unwrap().unwrap();
    assert_eq!(conv.id, "c1");
    assert_eq!(conv.history.len(), 2);
    assert_eq!(conv.history[1].first_text(), "Hi");

    assert!(backend.fetch_chat("gone").await.unwrap().is_none());
}

#[tokio::test]
async fn test_append_sends_exchange() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/api/chats/c1"))
        .and(body_json(json!({
            "question": "What is this?",
            "answer": "A cat",
            "img": "/uploads/cat.png"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "acknowledged": true, "matchedCount": 1, "modifiedCount": 1
        })))
        .expect(1)
        .mount(&server)
        .await;

    let backend = HttpChatBackend::new(server.uri(), "tok");
    let ack = backend
        .append("c1", Some("What is this?"), "A cat", Some("/uploads/cat.png"))
        .await
        .unwrap();

    assert!(ack.acknowledged);
    assert_eq!(ack.modified_count, 1);
}

#[tokio::test]
async fn test_append_unmatched_is_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/api/chats/c9"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "acknowledged": true, "matchedCount": 0, "modifiedCount": 0
        })))
        .mount(&server)
        .await;

    let backend = HttpChatBackend::new(server.uri(), "tok");
    let err = backend.append("c9", None, "answer", None).await.unwrap_err();

    assert!(matches!(err, SyncError::NotFound(id) if id == "c9"));
}

#[tokio::test]
async fn test_unauthorized_maps_to_unauthenticated() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/userchats"))
        .respond_with(ResponseTemplate::new(401).set_body_string("Unauthenticated!"))
        .mount(&server)
        .await;

    let backend = HttpChatBackend::new(server.uri(), "expired");
    assert!(matches!(backend.list_chats().await, Err(SyncError::Unauthenticated)));
}

#[tokio::test]
async fn test_server_error_carries_status_and_message() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/chats"))
        .respond_with(ResponseTemplate::new(500).set_body_string("Error creating chat!"))
        .mount(&server)
        .await;

    let backend = HttpChatBackend::new(server.uri(), "tok");
    match backend.create_chat("Hello").await {
        Err(SyncError::Api { status, message }) => {
            assert_eq!(status, 500);
            assert_eq!(message, "Error creating chat!");
        }
        other => panic!("expected Api error, got {:?}", other.map(|_| ())),
    }
}
