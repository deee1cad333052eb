use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use http_body_util::BodyExt;
use tower::ServiceExt;

use players::{create_router, init_pool, run_migrations, AppState, Config};

/// Create a test app with in-memory database.
async fn create_test_app() -> axum::Router {
    let pool = init_pool("sqlite::memory:").await.unwrap();
    run_migrations(&pool).await.unwrap();

    let config = Config::from_lookup(|_| None).unwrap();
    create_router(AppState::from_pool(pool, &config))
}

/// Helper to get response body as string.
async fn body_string(body: Body) -> String {
    let bytes = body.collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

async fn send(app: &axum::Router, method: &str, uri: &str, body: Option<serde_json::Value>) -> (StatusCode, serde_json::Value) {
    let request = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(json) => request
            .header("content-type", "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => request.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body = body_string(response.into_body()).await;
    let json = serde_json::from_str(&body).unwrap_or(serde_json::Value::Null);
    (status, json)
}

async fn send_raw(app: &axum::Router, uri: &str, body: &'static str) -> (StatusCode, serde_json::Value) {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body))
        .unwrap();

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body = body_string(response.into_body()).await;
    (status, serde_json::from_str(&body).unwrap())
}

async fn create_player(app: &axum::Router, email: &str) -> serde_json::Value {
    let (status, json) = send(
        app,
        "POST",
        "/players",
        Some(serde_json::json!({ "email": email })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    json
}

// ============================================================================
// Health endpoint tests
// ============================================================================

#[tokio::test]
async fn test_health_endpoint() {
    let app = create_test_app().await;

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

    let body = body_string(response.into_body()).await;
    assert_eq!(body, "OK");
}

// ============================================================================
// Player creation tests
// ============================================================================

#[tokio::test]
async fn test_create_player() {
    let app = create_test_app().await;

    let (status, json) = send(
        &app,
        "POST",
        "/players",
        Some(serde_json::json!({
            "email": "A@B.com ",
            "phone": "+4799887766",
            "first_name": "Ola",
            "birth_date": "1988-02-29",
            "gender": "Male",
            "country_code": "no",
            "locale": "nb_NO",
            "time_zone": "Europe/Oslo",
            "registration_ip": "2001:db8::1",
            "metadata": { "campaign": "spring" },
            "registered_at": "2024-03-01T10:00:00Z"
        })),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(json["email"], "a@b.com");
    assert_eq!(json["status"], "active");
    assert_eq!(json["version"], 1);
    assert_eq!(json["gender"], "male");
    assert_eq!(json["country_code"], "NO");
    assert_eq!(json["birth_date"], "1988-02-29");
    assert_eq!(json["registration_ip"], "2001:db8::1");
    assert_eq!(json["metadata"]["campaign"], "spring");
    assert!(json["id"].is_string());
}

#[tokio::test]
async fn test_create_player_invalid_email() {
    let app = create_test_app().await;

    let (status, json) = send(
        &app,
        "POST",
        "/players",
        Some(serde_json::json!({ "email": "not-an-email" })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "validation");
}

#[tokio::test]
async fn test_create_player_malformed_body() {
    let app = create_test_app().await;

    let (status, json) = send_raw(&app, "/players", r#"{"email": "a@b.com""#).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "bad_json");
    assert!(json["message"].is_string());
}

#[tokio::test]
async fn test_create_player_bad_dates() {
    let app = create_test_app().await;

    let (status, json) = send(
        &app,
        "POST",
        "/players",
        Some(serde_json::json!({ "email": "a@b.com", "birth_date": "29/02/1988" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "bad_birth_date");

    let (status, json) = send(
        &app,
        "POST",
        "/players",
        Some(serde_json::json!({ "email": "a@b.com", "registered_at": "2024-03-01" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "bad_registered_at");

    // Neither attempt registered the email.
    create_player(&app, "a@b.com").await;
}

#[tokio::test]
async fn test_create_player_duplicate_email() {
    let app = create_test_app().await;
    create_player(&app, "a@b.com").await;

    let (status, json) = send(
        &app,
        "POST",
        "/players",
        Some(serde_json::json!({ "email": "A@b.COM" })),
    )
    .await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(json["error"], "conflict");
}

// ============================================================================
// Player read tests
// ============================================================================

#[tokio::test]
async fn test_get_player() {
    let app = create_test_app().await;
    let created = create_player(&app, "a@b.com").await;
    let id = created["id"].as_str().unwrap();

    let (status, json) = send(&app, "GET", &format!("/players/{id}"), None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json, created);
}

#[tokio::test]
async fn test_get_player_not_found() {
    let app = create_test_app().await;

    let (status, json) = send(
        &app,
        "GET",
        "/players/550e8400-e29b-41d4-a716-446655440000",
        None,
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["error"], "not_found");
}

#[tokio::test]
async fn test_get_player_bad_id() {
    let app = create_test_app().await;

    let (status, json) = send(&app, "GET", "/players/not-a-uuid", None).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "bad_id");
}

// ============================================================================
// Status change tests
// ============================================================================

#[tokio::test]
async fn test_change_status() {
    let app = create_test_app().await;
    let created = create_player(&app, "a@b.com").await;
    let id = created["id"].as_str().unwrap();

    let (status, json) = send(
        &app,
        "POST",
        &format!("/players/{id}/status"),
        Some(serde_json::json!({
            "to_status": "blocked",
            "reason": "fraud",
            "actor": "admin"
        })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["player"]["status"], "blocked");
    assert_eq!(json["player"]["status_reason"], "fraud");
    assert_eq!(json["player"]["version"], 2);
    assert_eq!(json["event"]["from"], "active");
    assert_eq!(json["event"]["to"], "blocked");
    assert_eq!(json["event"]["reason"], "fraud");
    assert_eq!(json["event"]["actor"], "administrator");
    assert_eq!(json["event"]["player_id"], id);

    let (_, fetched) = send(&app, "GET", &format!("/players/{id}"), None).await;
    assert_eq!(fetched["version"], 2);
}

#[tokio::test]
async fn test_change_status_rejections() {
    let app = create_test_app().await;
    let created = create_player(&app, "a@b.com").await;
    let id = created["id"].as_str().unwrap();
    let uri = format!("/players/{id}/status");

    for body in [
        serde_json::json!({ "to_status": "active", "reason": "again", "actor": "player" }),
        serde_json::json!({ "to_status": "frozen", "reason": "  ", "actor": "system" }),
        serde_json::json!({ "to_status": "unknown", "reason": "x", "actor": "system" }),
    ] {
        let (status, json) = send(&app, "POST", &uri, Some(body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"], "validation");
    }

    let (_, fetched) = send(&app, "GET", &format!("/players/{id}"), None).await;
    assert_eq!(fetched["version"], 1);
    assert_eq!(fetched["status"], "active");
}

#[tokio::test]
async fn test_change_status_bad_body() {
    let app = create_test_app().await;
    let created = create_player(&app, "a@b.com").await;
    let id = created["id"].as_str().unwrap();
    let uri = format!("/players/{id}/status");

    let (status, json) = send(
        &app,
        "POST",
        &uri,
        Some(serde_json::json!({ "reason": "fraud", "actor": "admin" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "bad_json");

    let (status, json) = send_raw(&app, &uri, "not json").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "bad_json");

    let (_, fetched) = send(&app, "GET", &format!("/players/{id}"), None).await;
    assert_eq!(fetched["version"], 1);
}

#[tokio::test]
async fn test_change_status_unknown_player() {
    let app = create_test_app().await;

    let (status, json) = send(
        &app,
        "POST",
        "/players/550e8400-e29b-41d4-a716-446655440000/status",
        Some(serde_json::json!({ "to_status": "closed", "reason": "x" })),
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["error"], "not_found");
}

// ============================================================================
// Login tests
// ============================================================================

#[tokio::test]
async fn test_record_login() {
    let app = create_test_app().await;
    let created = create_player(&app, "a@b.com").await;
    let id = created["id"].as_str().unwrap();
    assert!(created["last_login_at"].is_null());

    let (status, json) = send(&app, "POST", &format!("/players/{id}/login"), None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["version"], 2);
    assert!(json["last_login_at"].is_string());
}
