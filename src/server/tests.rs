//! Router tests: status codes and bodies for every route.

use super::*;
use crate::clock::ManualClock;
use crate::locks::{LockManager, LockTable};
use crate::records::{Record, RecordBook};
use crate::store::MemoryStore;
use axum::body::{Body, to_bytes};
use axum::http::{Method, Request, StatusCode};
use serde_json::{Value, json};
use tower::ServiceExt;

struct Harness {
    state: AppState,
    clock: Arc<ManualClock>,
}

impl Harness {
    fn new() -> Self {
        let clock = Arc::new(ManualClock::at(0));
        let fanout = Fanout::default();
        let records = RecordBook::open(
            Box::new(MemoryStore::<Vec<Record>>::new(Vec::new())),
            fanout.clone(),
        )
        .unwrap();
        let locks = LockManager::open(
            Box::new(MemoryStore::new(LockTable::default())),
            clock.clone(),
            fanout.clone(),
            180,
        )
        .unwrap();
        let state = AppState {
            service: Arc::new(CaseService::new(Arc::new(records), Arc::new(locks))),
            fanout,
            settings: ClientSettings {
                lock_ttl_seconds: 180,
                heartbeat_interval_seconds: 60,
            },
        };
        Self { state, clock }
    }

    async fn call(&self, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = router(self.state.clone()).oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = serde_json::from_slice(&bytes)
            .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()));
        (status, value)
    }

    async fn create(&self, name: &str) -> Value {
        let (status, body) = self
            .call(Method::POST, "/api/records", Some(json!({ "name": name })))
            .await;
        assert_eq!(status, StatusCode::CREATED);
        body
    }

    async fn acquire(&self, case_id: &str, user: &str) -> (StatusCode, Value) {
        self.call(
            Method::POST,
            &format!("/api/locks/{case_id}"),
            Some(json!({ "userId": user, "username": user })),
        )
        .await
    }
}

#[tokio::test]
async fn test_health_and_settings() {
    let h = Harness::new();

    let (status, body) = h.call(Method::GET, "/", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "casebook running");

    let (status, body) = h.call(Method::GET, "/api/settings", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({ "lockTtlSeconds": 180, "heartbeatIntervalSeconds": 60 })
    );
}

#[tokio::test]
async fn test_create_and_list_records() {
    let h = Harness::new();

    let created = h.create("Ana").await;
    assert_eq!(created["caseId"], "1");
    assert_eq!(created["status"], "Pending");

    let (status, body) = h.call(Method::GET, "/api/records", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body[0]["name"], "Ana");
    assert_eq!(body[0]["lockedBy"], Value::Null);
}

#[tokio::test]
async fn test_create_without_name_is_400() {
    let h = Harness::new();

    let (status, body) = h
        .call(Method::POST, "/api/records", Some(json!({ "name": " " })))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());

    let (status, _) = h.call(Method::POST, "/api/records", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_update_locked_record_is_423_with_lock() {
    let h = Harness::new();
    h.create("Ana").await;
    h.acquire("1", "u-ana").await;

    let (status, body) = h
        .call(
            Method::PUT,
            "/api/records/1",
            Some(json!({ "name": "Changed", "userId": "u-ben" })),
        )
        .await;

    assert_eq!(status, StatusCode::LOCKED);
    assert_eq!(body["lock"]["owner"]["id"], "u-ana");

    let (status, body) = h
        .call(
            Method::PUT,
            "/api/records/1",
            Some(json!({ "name": "Changed", "userId": "u-ana" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "Changed");
}

#[tokio::test]
async fn test_unknown_record_is_404() {
    let h = Harness::new();

    let (status, _) = h
        .call(Method::PUT, "/api/records/9", Some(json!({ "name": "X" })))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = h.call(Method::DELETE, "/api/records/9", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_delete_record_drops_lock() {
    let h = Harness::new();
    h.create("Ana").await;
    h.acquire("1", "u-ana").await;

    let (status, body) = h.call(Method::DELETE, "/api/records/1", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "ok": true }));

    let (_, locks) = h.call(Method::GET, "/api/locks", None).await;
    assert_eq!(locks, json!({}));
}

#[tokio::test]
async fn test_acquire_conflict_and_missing_fields() {
    let h = Harness::new();

    let (status, lock) = h.acquire("1", "u-ana").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(lock["caseId"], "1");
    assert_eq!(lock["expiresAt"], 180);

    let (status, body) = h.acquire("1", "u-ben").await;
    assert_eq!(status, StatusCode::LOCKED);
    assert_eq!(body["lock"]["id"], lock["id"]);

    let (status, _) = h
        .call(Method::POST, "/api/locks/2", Some(json!({ "userId": "u-ana" })))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_heartbeat_extends_or_409() {
    let h = Harness::new();
    h.acquire("1", "u-ana").await;
    h.clock.set(100);

    let (status, lock) = h
        .call(
            Method::POST,
            "/api/locks/1/heartbeat",
            Some(json!({ "userId": "u-ana" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(lock["expiresAt"], 280);

    let (status, _) = h
        .call(
            Method::POST,
            "/api/locks/1/heartbeat",
            Some(json!({ "userId": "u-ben" })),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_release_by_other_is_423() {
    let h = Harness::new();
    h.acquire("1", "u-ana").await;

    let (status, _) = h
        .call(Method::DELETE, "/api/locks/1", Some(json!({ "userId": "u-ben" })))
        .await;
    assert_eq!(status, StatusCode::LOCKED);

    let (status, body) = h
        .call(Method::DELETE, "/api/locks/1", Some(json!({ "userId": "u-ana" })))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "ok": true }));

    // Releasing an absent lock is fine.
    let (status, _) = h.call(Method::DELETE, "/api/locks/1", None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_expired_lock_disappears_from_listing() {
    let h = Harness::new();
    h.acquire("1", "u-ana").await;
    h.clock.set(400);

    let (status, locks) = h.call(Method::GET, "/api/locks", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(locks, json!({}));
}

#[test]
fn test_error_status_mapping() {
    use crate::error::CasebookError;

    let cases = [
        (CasebookError::ValidationError("x".into()), StatusCode::BAD_REQUEST),
        (CasebookError::NotOwner, StatusCode::CONFLICT),
        (CasebookError::Forbidden, StatusCode::LOCKED),
        (CasebookError::NotFound("1".into()), StatusCode::NOT_FOUND),
        (
            CasebookError::Storage("disk".into()),
            StatusCode::INTERNAL_SERVER_ERROR,
        ),
    ];
    for (err, expected) in cases {
        assert_eq!(ApiError(err).status(), expected);
    }
}

#[tokio::test]
async fn test_cors_allows_any_origin() {
    let h = Harness::new();

    let preflight = Request::builder()
        .method(Method::OPTIONS)
        .uri("/api/records")
        .header("origin", "http://frontend.example")
        .header("access-control-request-method", "POST")
        .header("access-control-request-headers", "content-type")
        .body(Body::empty())
        .unwrap();
    let response = router(h.state.clone()).oneshot(preflight).await.unwrap();
    assert!(response.status().is_success());
    assert_eq!(response.headers()["access-control-allow-origin"], "*");
    assert!(response.headers().contains_key("access-control-allow-methods"));

    let simple = Request::builder()
        .method(Method::GET)
        .uri("/api/locks")
        .header("origin", "http://frontend.example")
        .body(Body::empty())
        .unwrap();
    let response = router(h.state.clone()).oneshot(simple).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["access-control-allow-origin"], "*");
}
