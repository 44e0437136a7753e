//! HTTP surface: the Firestore event endpoint, the operator queue API and
//! the health endpoints, driven through the router with `oneshot`.

mod common;

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::{json, Value};

use push_queue_dispatcher::store::MemoryDocumentStore;
use push_queue_dispatcher::triggers::CREATED_EVENT_TYPE;

use common::{call, test_app, test_settings, valid_entry, FakeGateway, FlakyStore, MESSAGE_ID};

const DOCUMENT_PREFIX: &str = "projects/demo-project/databases/(default)/documents";

fn event_data(id: &str, fields: Value) -> Value {
    json!({
        "value": {
            "name": format!("{}/notification_queue/{}", DOCUMENT_PREFIX, id),
            "fields": fields,
            "createTime": "2026-10-19T08:00:00.000000Z",
            "updateTime": "2026-10-19T08:00:00.000000Z"
        }
    })
}

fn typed_entry() -> Value {
    json!({
        "token": {"stringValue": "abc"},
        "notification": {"mapValue": {"fields": {
            "title": {"stringValue": "Alert"},
            "body": {"stringValue": "Flood warning"}
        }}}
    })
}

fn event_request(event_type: &str, id: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/events/firestore")
        .header("content-type", "application/json")
        .header("ce-id", "evt-1")
        .header("ce-specversion", "1.0")
        .header("ce-type", event_type)
        .header("ce-source", "//firestore.googleapis.com/projects/demo-project/databases/(default)")
        .header("ce-document", format!("notification_queue/{}", id))
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn test_created_event_dispatches_and_acknowledges() {
    let gateway = FakeGateway::accepting();
    let store = Arc::new(MemoryDocumentStore::new());
    store.insert("abc123", valid_entry());
    let (_state, router) = test_app(test_settings(), gateway.clone(), store.clone());

    let request = event_request(CREATED_EVENT_TYPE, "abc123", event_data("abc123", typed_entry()));
    let (status, body) = call(&router, request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["notificationId"], "abc123");
    assert_eq!(body["messageId"], MESSAGE_ID);
    assert_eq!(body["eventId"], "evt-1");
    assert_eq!(gateway.sent().len(), 1);
    assert_eq!(store.snapshot("abc123").unwrap()["status"], "sent");
}

#[tokio::test]
async fn test_invalid_entry_answers_bad_request() {
    let gateway = FakeGateway::accepting();
    let store = Arc::new(MemoryDocumentStore::new());
    store.insert("n2", common::doc(json!({"notification": {"title": "t", "body": "b"}})));
    let (_state, router) = test_app(test_settings(), gateway.clone(), store.clone());

    let fields = json!({"notification": {"mapValue": {"fields": {"title": {"stringValue": "t"}}}}});
    let (status, body) = call(&router, event_request(CREATED_EVENT_TYPE, "n2", event_data("n2", fields))).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    assert_eq!(body["error"]["message"], "Missing required notification data");
    assert!(gateway.sent().is_empty());
    assert_eq!(store.snapshot("n2").unwrap()["status"], "error");
}

#[tokio::test]
async fn test_gateway_failure_answers_bad_gateway() {
    let gateway = FakeGateway::rejecting("UNREGISTERED", "Requested entity was not found.");
    let store = Arc::new(MemoryDocumentStore::new());
    store.insert("n3", valid_entry());
    let (_state, router) = test_app(test_settings(), gateway, store.clone());

    let (status, body) =
        call(&router, event_request(CREATED_EVENT_TYPE, "n3", event_data("n3", typed_entry()))).await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["error"]["code"], "GATEWAY_ERROR");
    assert_eq!(body["error"]["message"], "Requested entity was not found.");
    assert_eq!(store.snapshot("n3").unwrap()["error"], "Requested entity was not found.");
}

#[tokio::test]
async fn test_persistence_failure_answers_server_error() {
    let gateway = FakeGateway::accepting();
    let store = FlakyStore::failing_on(&["sent", "error"]);
    store.inner.insert("n4", valid_entry());
    let (_state, router) = test_app(test_settings(), gateway, store);

    let (status, body) =
        call(&router, event_request(CREATED_EVENT_TYPE, "n4", event_data("n4", typed_entry()))).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"]["code"], "PERSISTENCE_ERROR");
}

#[tokio::test]
async fn test_other_event_types_are_refused() {
    let gateway = FakeGateway::accepting();
    let store = Arc::new(MemoryDocumentStore::new());
    store.insert("n5", valid_entry());
    let (_state, router) = test_app(test_settings(), gateway.clone(), store.clone());

    let request = event_request(
        "google.cloud.firestore.document.v1.updated",
        "n5",
        event_data("n5", typed_entry()),
    );
    let (status, _body) = call(&router, request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(gateway.sent().is_empty());
    assert!(!store.snapshot("n5").unwrap().contains_key("status"));
}

#[tokio::test]
async fn test_documents_outside_the_queue_are_refused() {
    let gateway = FakeGateway::accepting();
    let store = Arc::new(MemoryDocumentStore::new());
    let (_state, router) = test_app(test_settings(), gateway.clone(), store);

    let request = Request::builder()
        .method("POST")
        .uri("/events/firestore")
        .header("content-type", "application/json")
        .header("ce-id", "evt-9")
        .header("ce-type", CREATED_EVENT_TYPE)
        .body(Body::from(
            json!({"value": {"name": format!("{}/users/u1", DOCUMENT_PREFIX), "fields": typed_entry()}})
                .to_string(),
        ))
        .unwrap();
    let (status, body) = call(&router, request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    assert!(gateway.sent().is_empty());
}

#[tokio::test]
async fn test_enqueue_dispatches_inline_for_memory_store() {
    let gateway = FakeGateway::accepting();
    let store = Arc::new(MemoryDocumentStore::new());
    let (_state, router) = test_app(test_settings(), gateway.clone(), store.clone());

    let request = Request::builder()
        .method("POST")
        .uri("/api/v1/notification_queue")
        .header("content-type", "application/json")
        .body(Body::from(
            json!({
                "token": "abc",
                "notification": {"title": "Alert", "body": "Flood warning"},
                "data": {"zone": "7"}
            })
            .to_string(),
        ))
        .unwrap();
    let (status, body) = call(&router, request).await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["status"], "sent");
    assert_eq!(body["messageId"], MESSAGE_ID);
    assert_eq!(gateway.sent()[0].data.get("zone").map(String::as_str), Some("7"));

    let id = body["notificationId"].as_str().unwrap().to_string();
    let get = Request::builder()
        .uri(format!("/api/v1/notification_queue/{}", id))
        .body(Body::empty())
        .unwrap();
    let (status, body) = call(&router, get).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["notificationId"], id.as_str());
    assert_eq!(body["fields"]["status"], "sent");
    assert_eq!(body["fields"]["fcmResponse"], MESSAGE_ID);
    assert_eq!(body["fields"]["token"], "abc");
}

#[tokio::test]
async fn test_enqueue_reports_recorded_failure() {
    let gateway = FakeGateway::accepting();
    let store = Arc::new(MemoryDocumentStore::new());
    let (_state, router) = test_app(test_settings(), gateway.clone(), store.clone());

    let request = Request::builder()
        .method("POST")
        .uri("/api/v1/notification_queue")
        .header("content-type", "application/json")
        .body(Body::from(json!({"token": "abc"}).to_string()))
        .unwrap();
    let (status, body) = call(&router, request).await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["status"], "error");
    assert_eq!(body["error"], "Missing required notification data");
    assert!(gateway.sent().is_empty());
    assert_eq!(store.len(), 1);
}

#[tokio::test]
async fn test_enqueue_rejects_non_object_body() {
    let (_state, router) = test_app(
        test_settings(),
        FakeGateway::accepting(),
        Arc::new(MemoryDocumentStore::new()),
    );

    let request = Request::builder()
        .method("POST")
        .uri("/api/v1/notification_queue")
        .header("content-type", "application/json")
        .body(Body::from("[1, 2, 3]"))
        .unwrap();
    let (status, body) = call(&router, request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_unknown_queue_document_is_not_found() {
    let (_state, router) = test_app(
        test_settings(),
        FakeGateway::accepting(),
        Arc::new(MemoryDocumentStore::new()),
    );

    let request = Request::builder()
        .uri("/api/v1/notification_queue/missing")
        .body(Body::empty())
        .unwrap();
    let (status, body) = call(&router, request).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "NOT_FOUND");
}

#[tokio::test]
async fn test_queue_document_ids_cannot_escape_the_collection() {
    let (_state, router) = test_app(
        test_settings(),
        FakeGateway::accepting(),
        Arc::new(MemoryDocumentStore::new()),
    );

    for uri in [
        "/api/v1/notification_queue/..%2Fsecrets%2Fx",
        "/api/v1/notification_queue/..",
    ] {
        let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
        let (status, body) = call(&router, request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    }
}

#[tokio::test]
async fn test_oversized_body_is_rejected() {
    let (_state, router) = test_app(
        test_settings(),
        FakeGateway::accepting(),
        Arc::new(MemoryDocumentStore::new()),
    );

    let payload = serde_json::to_vec(&json!({
        "token": "abc",
        "notification": {"title": "Alert", "body": "x".repeat(2 * 1024 * 1024)}
    }))
    .unwrap();
    let request = Request::builder()
        .method("POST")
        .uri("/api/v1/notification_queue")
        .header("content-type", "application/json")
        .header("content-length", payload.len())
        .body(Body::from(payload))
        .unwrap();
    let (status, _) = call(&router, request).await;

    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
}

#[tokio::test]
async fn test_queue_api_requires_configured_key() {
    let mut settings = test_settings();
    settings.api.key = Some("secret".to_string());
    let (_state, router) = test_app(
        settings,
        FakeGateway::accepting(),
        Arc::new(MemoryDocumentStore::new()),
    );

    let without_key = Request::builder()
        .uri("/api/v1/notification_queue/n1")
        .body(Body::empty())
        .unwrap();
    let (status, body) = call(&router, without_key).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["code"], "UNAUTHORIZED");

    let wrong_key = Request::builder()
        .uri("/api/v1/notification_queue/n1")
        .header("X-API-Key", "guess")
        .body(Body::empty())
        .unwrap();
    let (status, _) = call(&router, wrong_key).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let with_key = Request::builder()
        .uri("/api/v1/notification_queue/n1")
        .header("X-API-Key", "secret")
        .body(Body::empty())
        .unwrap();
    let (status, _) = call(&router, with_key).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // Health stays open
    let health = Request::builder().uri("/health").body(Body::empty()).unwrap();
    let (status, _) = call(&router, health).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_health_stats_and_metrics() {
    let gateway = FakeGateway::accepting();
    let store = Arc::new(MemoryDocumentStore::new());
    store.insert("n1", valid_entry());
    let (state, router) = test_app(test_settings(), gateway, store);

    state.dispatcher.process("n1", &valid_entry()).await.unwrap();

    let (status, body) = call(&router, Request::builder().uri("/health").body(Body::empty()).unwrap()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["collection"], "notification_queue");
    assert_eq!(body["store"]["backend"], "memory");
    assert_eq!(body["store"]["emits_create_events"], false);
    assert_eq!(body["gateway"], "fake");

    let (status, body) = call(&router, Request::builder().uri("/stats").body(Body::empty()).unwrap()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["notifications"]["total_processed"], 1);
    assert_eq!(body["notifications"]["total_sent"], 1);
    assert_eq!(body["notifications"]["total_failed"], 0);

    let (status, body) = call(&router, Request::builder().uri("/metrics").body(Body::empty()).unwrap()).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body
        .as_str()
        .unwrap()
        .contains("push_dispatcher_notifications_processed_total"));
}
