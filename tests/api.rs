//! Router-level tests: envelope shapes, routing precedence, rate limiting.

mod support;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;

use alexpetro::infra::http::build_router;

use support::TestBackend;

const BODY_LIMIT: usize = 10 * 1024 * 1024;

fn router(backend: &TestBackend) -> Router {
    build_router(backend.api_state(5), BODY_LIMIT)
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn health_reports_ok() {
    let dir = tempfile::tempdir().unwrap();
    let backend = TestBackend::new(dir.path());

    let response = router(&backend)
        .oneshot(Request::get("/api/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await, json!({"ok": true}));
}

#[tokio::test]
async fn unknown_routes_get_the_error_envelope() {
    let dir = tempfile::tempdir().unwrap();
    let backend = TestBackend::new(dir.path());

    let response = router(&backend)
        .oneshot(Request::get("/api/nope").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = body_json(response).await;
    assert_eq!(body["success"], false);
    assert_eq!(body["message"], "Not found");
}

#[tokio::test]
async fn sharing_rate_lifecycle_over_http() {
    let dir = tempfile::tempdir().unwrap();
    let backend = TestBackend::new(dir.path());
    let app = router(&backend);

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/sharing-rates",
            json!({"title": "Government share", "percentage": 75.5}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let created = body_json(response).await;
    assert_eq!(created["title"], "Government share");
    let id = created["id"].as_i64().unwrap();

    let response = app
        .clone()
        .oneshot(json_request(
            "PUT",
            &format!("/api/sharing-rates/{id}"),
            json!({"title": "Government share", "percentage": 60.0}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["percentage"], 60.0);

    let response = app
        .clone()
        .oneshot(
            Request::delete(format!("/api/sharing-rates/{id}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = app
        .oneshot(Request::get("/api/sharing-rates").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(body_json(response).await, json!([]));
}

#[tokio::test]
async fn invalid_percentage_is_rejected_with_field_errors() {
    let dir = tempfile::tempdir().unwrap();
    let backend = TestBackend::new(dir.path());

    let response = router(&backend)
        .oneshot(json_request(
            "POST",
            "/api/sharing-rates",
            json!({"title": "Broken", "percentage": 150}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["success"], false);
    assert_eq!(body["message"], "Validation failed");
    assert_eq!(body["errors"][0]["field"], "percentage");
    // Nothing was stored.
    assert_eq!(backend.rates.row_count(), 0);
}

#[tokio::test]
async fn ticker_routes_win_over_the_news_id_capture() {
    let dir = tempfile::tempdir().unwrap();
    let backend = TestBackend::new(dir.path());
    let app = router(&backend);

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/news/ticker",
            json!({"message": "Annual report published"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = app
        .oneshot(Request::get("/api/news/ticker").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body[0]["message"], "Annual report published");
}

#[tokio::test]
async fn missing_news_item_is_a_404_envelope() {
    let dir = tempfile::tempdir().unwrap();
    let backend = TestBackend::new(dir.path());

    let response = router(&backend)
        .oneshot(Request::get("/api/news/99").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(response).await["success"], false);
}

fn contact_payload() -> Value {
    json!({
        "name": "Laila Hassan",
        "email": "laila@example.com",
        "subject": "Supplier inquiry",
        "message": "We would like to discuss a long-term supply agreement.",
    })
}

fn submit_request(ip: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/api/contact/submit")
        .header(header::CONTENT_TYPE, "application/json")
        .header("x-forwarded-for", ip)
        .body(Body::from(contact_payload().to_string()))
        .unwrap()
}

#[tokio::test]
async fn contact_submission_returns_a_receipt() {
    let dir = tempfile::tempdir().unwrap();
    let backend = TestBackend::new(dir.path());

    let response = router(&backend)
        .oneshot(submit_request("203.0.113.7"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);
    let body = body_json(response).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["message"], "Your message has been sent successfully!");
    assert!(body["data"]["id"].is_i64());
    assert!(body["data"]["submittedAt"].is_string());
}

#[tokio::test]
async fn the_sixth_submission_in_a_window_is_rate_limited() {
    let dir = tempfile::tempdir().unwrap();
    let backend = TestBackend::new(dir.path());
    let app = router(&backend);

    for _ in 0..5 {
        let response = app
            .clone()
            .oneshot(submit_request("203.0.113.8"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
    }

    let response = app
        .clone()
        .oneshot(submit_request("203.0.113.8"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(response.headers().get(header::RETRY_AFTER).unwrap(), "60");
    let body = body_json(response).await;
    assert_eq!(body["success"], false);

    // A different source address is unaffected.
    let response = app.oneshot(submit_request("203.0.113.9")).await.unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
}

#[tokio::test]
async fn contact_validation_rejects_a_bad_name() {
    let dir = tempfile::tempdir().unwrap();
    let backend = TestBackend::new(dir.path());

    let mut payload = contact_payload();
    payload["name"] = json!("DROP TABLE contacts;");

    let response = router(&backend)
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/contact/submit")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(payload.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["message"], "Validation failed");
    assert_eq!(body["errors"][0]["field"], "name");
}

#[tokio::test]
async fn contact_admin_endpoints_wrap_in_the_data_envelope() {
    let dir = tempfile::tempdir().unwrap();
    let backend = TestBackend::new(dir.path());
    let app = router(&backend);

    let response = app
        .clone()
        .oneshot(submit_request("203.0.113.10"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = app
        .clone()
        .oneshot(
            Request::get("/api/admin/contacts")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["data"][0]["name"], "Laila Hassan");
    let id = body["data"][0]["id"].as_i64().unwrap();

    // The static stats segment is not shadowed by the id capture.
    let response = app
        .clone()
        .oneshot(
            Request::get("/api/admin/contacts/stats")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["data"]["total"], 1);
    assert_eq!(body["data"]["unreplied"], 1);

    let response = app
        .clone()
        .oneshot(json_request(
            "PUT",
            &format!("/api/admin/contacts/{id}/replied"),
            json!({"is_replied": true}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        body_json(response).await["message"],
        "Contact marked as replied"
    );

    let response = app
        .clone()
        .oneshot(
            Request::delete(format!("/api/admin/contacts/{id}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // Contact deletes are not idempotent: the second one is a 404.
    let response = app
        .oneshot(
            Request::delete(format!("/api/admin/contacts/{id}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn project_category_filter_rejects_unknown_values() {
    let dir = tempfile::tempdir().unwrap();
    let backend = TestBackend::new(dir.path());

    let response = router(&backend)
        .oneshot(
            Request::get("/api/projects?category=offshore")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["errors"][0]["field"], "category");
}

#[tokio::test]
async fn stream_frames_change_events_as_sse() {
    use futures::StreamExt;

    let dir = tempfile::tempdir().unwrap();
    let backend = TestBackend::new(dir.path());

    let response = router(&backend)
        .oneshot(Request::get("/api/stream").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get(header::CONTENT_TYPE).unwrap(),
        "text/event-stream"
    );
    assert_eq!(
        response.headers().get(header::CACHE_CONTROL).unwrap(),
        "no-cache"
    );
    assert_eq!(backend.hub.client_count(), 1);

    let mut frames = response.into_body().into_data_stream();
    backend.hub.broadcast(
        alexpetro_api_types::ChangeKind::News,
        alexpetro_api_types::ChangePayload::Deleted { id: 3 },
    );

    let frame = frames.next().await.unwrap().unwrap();
    let text = String::from_utf8(frame.to_vec()).unwrap();
    assert!(text.contains("event: news:update"));
    assert!(text.contains(r#"data: {"type":"deleted","id":3}"#));
    assert!(text.ends_with("\n\n"));

    // Dropping the connection deregisters the client.
    drop(frames);
    assert_eq!(backend.hub.client_count(), 0);
}

#[tokio::test]
async fn missing_upload_paths_are_404() {
    let dir = tempfile::tempdir().unwrap();
    let backend = TestBackend::new(dir.path());

    let response = router(&backend)
        .oneshot(
            Request::get("/uploads/2025/01/01/gone.png")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
