//! Router-level tests: status codes, error bodies and the viewer header.
mod common;

use axum::{
    body::{to_bytes, Body},
    http::{Method, Request, StatusCode},
    Router,
};
use campus_backend::{
    auth::USER_ID_HEADER,
    config::Settings,
    middleware::rate_limit::CLIENT_IP_HEADER,
    router::create_router,
};
use chrono::Duration;
use serde_json::{json, Value};
use tower::ServiceExt;

use common::*;

fn request(method: Method, uri: &str, user: Option<&str>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(user) = user {
        builder = builder.header(USER_ID_HEADER, user);
    }
    match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

async fn send(app: &Router, req: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(req).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

fn schedule_body(start_in: i64) -> Value {
    json!({
        "title": "Distributed Systems",
        "description": "Consensus and replication",
        "tags": { "year": "Year 3", "module": "COMP3221" },
        "scheduledStart": (t0() + Duration::minutes(start_in)).to_rfc3339(),
        "durationMinutes": 60
    })
}

#[tokio::test]
async fn test_health_needs_no_identity() {
    let (state, _clock) = app_state(Settings::default());
    let app = create_router(state);

    let (status, body) = send(&app, request(Method::GET, "/health", None, None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_missing_or_unknown_viewer_is_unauthorized() {
    let (state, _clock) = app_state(Settings::default());
    let app = create_router(state);

    let (status, body) = send(&app, request(Method::GET, "/meetings/mine", None, None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["code"], "AUTH_001");

    let (status, _) = send(
        &app,
        request(Method::GET, "/meetings/mine", Some("mallory"), None),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_schedule_join_and_lifecycle_over_http() {
    let (state, clock) = app_state(Settings::default());
    let app = create_router(state);

    let (status, created) = send(
        &app,
        request(Method::POST, "/meetings", Some(HOST), Some(schedule_body(60))),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["phase"], "upcoming");
    assert_eq!(created["explicitState"], "scheduled");
    assert_eq!(created["isHost"], true);
    assert_eq!(created["canStart"], false);
    let id = created["id"].as_str().unwrap().to_string();
    assert!(created["joinLink"].as_str().unwrap().ends_with(&id));

    let join_uri = format!("/meetings/{id}/participation");
    let (status, body) = send(&app, request(Method::POST, &join_uri, Some(ALICE), None)).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["code"], "MEET_003");

    clock.advance(Duration::minutes(50));
    let (status, body) = send(&app, request(Method::POST, &join_uri, Some(ALICE), None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);

    let (status, view) = send(
        &app,
        request(Method::GET, &format!("/meetings/{id}"), Some(ALICE), None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(view["phase"], "starting-soon");
    assert_eq!(view["participantCount"], 1);
    assert!(view.get("participants").is_none());

    let (status, _) = send(
        &app,
        request(Method::POST, &format!("/meetings/{id}/start"), Some(ALICE), None),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, view) = send(
        &app,
        request(Method::POST, &format!("/meetings/{id}/start"), Some(HOST), None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(view["explicitState"], "in-progress");
    assert_eq!(view["participants"][0]["userId"], ALICE);

    let (status, body) = send(
        &app,
        request(Method::DELETE, &format!("/meetings/{id}"), Some(HOST), None),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["code"], "MEET_002");

    for _ in 0..2 {
        let (status, view) = send(
            &app,
            request(Method::POST, &format!("/meetings/{id}/end"), Some(HOST), None),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(view["phase"], "ended");
    }

    let (status, _) = send(
        &app,
        request(Method::DELETE, &format!("/meetings/{id}"), Some(HOST), None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(
        &app,
        request(Method::GET, &format!("/meetings/{id}"), Some(HOST), None),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "MEET_001");
}

#[tokio::test]
async fn test_invalid_input_is_bad_request() {
    let (state, _clock) = app_state(Settings::default());
    let app = create_router(state);

    let (status, body) = send(
        &app,
        request(Method::GET, "/meetings/bad.id", Some(ALICE), None),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "VAL_001");

    let (status, body) = send(
        &app,
        request(Method::POST, "/meetings", Some(HOST), Some(schedule_body(-5))),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "VAL_001");
}

#[tokio::test]
async fn test_public_listing_filters() {
    let (state, _clock) = app_state(Settings::default());
    let app = create_router(state);

    for start_in in [30, 90] {
        let (status, _) = send(
            &app,
            request(Method::POST, "/meetings", Some(HOST), Some(schedule_body(start_in))),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (status, list) = send(
        &app,
        request(Method::GET, "/meetings/public?module=comp3221&limit=1", Some(BOB), None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(list.as_array().unwrap().len(), 1);

    let (_, list) = send(
        &app,
        request(Method::GET, "/meetings/public?year=Year%201", Some(BOB), None),
    )
    .await;
    assert!(list.as_array().unwrap().is_empty());

    let (_, list) = send(&app, request(Method::GET, "/meetings/public", Some(HOST), None)).await;
    assert!(list.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_requests_over_budget_are_throttled() {
    let mut settings = Settings::default();
    settings.rate_limit.max_requests = 2;
    let (state, _clock) = app_state(settings);
    let app = create_router(state);

    let throttled = |user: &'static str| {
        Request::builder()
            .uri("/meetings/mine")
            .header(USER_ID_HEADER, user)
            .header(CLIENT_IP_HEADER, "10.1.2.3")
            .body(Body::empty())
            .unwrap()
    };
    assert_eq!(send(&app, throttled(ALICE)).await.0, StatusCode::OK);
    assert_eq!(send(&app, throttled(ALICE)).await.0, StatusCode::OK);
    let (status, body) = send(&app, throttled(ALICE)).await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(body["error"]["code"], "RATE_001");

    // Health checks bypass the limiter
    let (status, _) = send(&app, request(Method::GET, "/health", None, None)).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_malformed_requests_use_the_error_body() {
    let (state, _clock) = app_state(Settings::default());
    let app = create_router(state);

    let broken = Request::builder()
        .method(Method::POST)
        .uri("/meetings")
        .header(USER_ID_HEADER, HOST)
        .header("content-type", "application/json")
        .body(Body::from("{\"title\": \"Unclosed"))
        .unwrap();
    let (status, body) = send(&app, broken).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "VAL_001");

    // Well-formed JSON with a wrong field type
    let mut wrong_type = schedule_body(30);
    wrong_type["durationMinutes"] = json!("an hour");
    let (status, body) = send(
        &app,
        request(Method::POST, "/meetings", Some(HOST), Some(wrong_type)),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "VAL_001");

    let (status, body) = send(
        &app,
        request(Method::GET, "/meetings/public?limit=abc", Some(BOB), None),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "VAL_001");
    assert!(body["error"]["message"].is_string());
}

#[tokio::test]
async fn test_far_future_schedule_is_bad_request() {
    let (state, _clock) = app_state(Settings::default());
    let app = create_router(state);

    let mut body = schedule_body(30);
    body["scheduledStart"] = json!("+262142-12-31T23:59:59Z");
    body["durationMinutes"] = json!(480);
    let (status, err) = send(&app, request(Method::POST, "/meetings", Some(HOST), Some(body))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(err["error"]["code"], "VAL_001");

    let (_, list) = send(&app, request(Method::GET, "/meetings/mine", Some(HOST), None)).await;
    assert!(list.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_recording_and_invitations_over_http() {
    let (state, _clock) = app_state(Settings::default());
    let app = create_router(state);

    let (_, created) = send(
        &app,
        request(Method::POST, "/meetings", Some(HOST), Some(schedule_body(5))),
    )
    .await;
    let id = created["id"].as_str().unwrap().to_string();
    assert_eq!(created["allowRecording"], true);

    let (status, view) = send(
        &app,
        request(
            Method::POST,
            &format!("/meetings/{id}/participants"),
            Some(HOST),
            Some(json!({ "userIds": [ALICE, "nobody"] })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(view["participantCount"], 1);

    send(&app, request(Method::POST, &format!("/meetings/{id}/start"), Some(HOST), None)).await;
    let (status, rec) = send(
        &app,
        request(Method::POST, &format!("/meetings/{id}/recording/start"), Some(HOST), None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(rec["isRecording"], true);

    let (status, err) = send(
        &app,
        request(Method::POST, &format!("/meetings/{id}/recording/start"), Some(HOST), None),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(err["error"]["code"], "MEET_005");

    let (status, rec) = send(
        &app,
        request(Method::POST, &format!("/meetings/{id}/recording/stop"), Some(HOST), None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(rec["isRecording"], false);

    let (status, rec) = send(
        &app,
        request(
            Method::POST,
            &format!("/meetings/{id}/recordings"),
            Some(HOST),
            Some(json!({ "filename": "lecture.mp4", "fileSizeBytes": 1024 })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(rec["files"][0]["status"], "completed");

    let (status, rec) = send(
        &app,
        request(Method::GET, &format!("/meetings/{id}/recordings"), Some(ALICE), None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(rec["files"].as_array().unwrap().len(), 1);

    let (status, err) = send(
        &app,
        request(Method::GET, &format!("/meetings/{id}/recordings"), Some(BOB), None),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(err["error"]["code"], "AUTHZ_001");
}
