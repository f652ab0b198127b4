//! API integration tests.

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use tower::ServiceExt;

use lvid_api::{create_router, ApiConfig, AppState};

fn test_app() -> axum::Router {
    let state = AppState::new(ApiConfig::default()).expect("state");
    create_router(state)
}

fn create_body() -> String {
    serde_json::json!({
        "title": "Past Perfect Explained",
        "template_type": "grammar_lesson",
        "source_config": {
            "topic": "past perfect tense",
            "level": "B1",
            "target_duration_seconds": 300,
            "native_language": "Spanish"
        },
        "voice_config": {
            "provider": "speech",
            "voice_id": "v-1",
            "voice_name": "Clara"
        },
        "avatar_config": {
            "provider": "avatar",
            "character_id": "c-1",
            "character_name": "Maya"
        }
    })
    .to_string()
}

async fn response_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_health_endpoint() {
    let app = test_app();

    let response = app
        .oneshot(
            Request::builder()
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_create_and_get_project() {
    let app = test_app();

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/projects")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(create_body()))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);
    let created = response_json(response).await;
    assert_eq!(created["status"], "draft");
    let id = created["id"].as_str().unwrap().to_string();

    let response = app
        .oneshot(
            Request::builder()
                .uri(format!("/api/projects/{id}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let fetched = response_json(response).await;
    assert_eq!(fetched["title"], "Past Perfect Explained");
}

#[tokio::test]
async fn test_unknown_project_is_404() {
    let app = test_app();

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/projects/does-not-exist")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_empty_title_is_rejected() {
    let app = test_app();
    let mut body: serde_json::Value = serde_json::from_str(&create_body()).unwrap();
    body["title"] = serde_json::json!("");

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/projects")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_stage_skip_is_conflict() {
    let app = test_app();

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/projects")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(create_body()))
                .unwrap(),
        )
        .await
        .unwrap();
    let created = response_json(response).await;
    let id = created["id"].as_str().unwrap().to_string();

    // A draft project cannot enter audio generation
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(format!("/api/projects/{id}/generate-audio"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CONFLICT);
    let body = response_json(response).await;
    assert_eq!(body["code"], "invalid_transition");
}

#[tokio::test]
async fn test_stage_trigger_returns_accepted_and_marks_in_flight() {
    let app = test_app();

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/projects")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(create_body()))
                .unwrap(),
        )
        .await
        .unwrap();
    let created = response_json(response).await;
    let id = created["id"].as_str().unwrap().to_string();

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(format!("/api/projects/{id}/generate-content"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::ACCEPTED);
    let accepted = response_json(response).await;
    assert_eq!(accepted["status"], "accepted");
    assert_eq!(accepted["stage"], "content_generation");

    // An observer polling the store sees the in-flight status immediately
    let response = app
        .oneshot(
            Request::builder()
                .uri(format!("/api/projects/{id}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let fetched = response_json(response).await;
    assert_eq!(fetched["status"], "content_generating");
}
