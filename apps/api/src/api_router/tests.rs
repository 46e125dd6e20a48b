use std::sync::Arc;

use aegis_core::PrincipalId;
use aegis_infrastructure::{InMemoryRiskRepository, InMemorySecurityRepository};
use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::header::{CONTENT_TYPE, COOKIE, LOCATION, SET_COOKIE};
use axum::http::{Request, StatusCode};
use axum::response::Response;
use chrono::TimeDelta;
use serde_json::{Value, json};
use tower::ServiceExt;

use crate::api_config::{ApiConfig, StartupMode};
use crate::api_services::{RepositorySet, build_app_state};
use crate::state::AppState;

use super::{build_protected_routes, build_router};

struct TestApp {
    router: Router,
    state: AppState,
    security: Arc<InMemorySecurityRepository>,
}

fn test_config() -> ApiConfig {
    ApiConfig {
        startup_mode: StartupMode::Serve,
        database_url: "postgres://unused".to_owned(),
        frontend_url: "http://localhost:3000".to_owned(),
        frontend_dir: None,
        api_host: "127.0.0.1".to_owned(),
        api_port: 3001,
        auth_secret: "router-test-secret".to_owned(),
        session_ttl: TimeDelta::hours(1),
        cookie_secure: false,
    }
}

fn test_app() -> TestApp {
    let security = Arc::new(InMemorySecurityRepository::new());
    let repositories = RepositorySet {
        user_repository: security.clone(),
        authorization_repository: security.clone(),
        security_admin_repository: security.clone(),
        risk_repository: Arc::new(InMemoryRiskRepository::new()),
    };
    let config = test_config();
    let state = build_app_state(repositories, &config);
    let router = match build_router(state.clone(), &config.frontend_url, None) {
        Ok(router) => router,
        Err(error) => panic!("router should build: {error}"),
    };

    TestApp {
        router,
        state,
        security,
    }
}

async fn send(router: &Router, request: Request<Body>) -> Response {
    match router.clone().oneshot(request).await {
        Ok(response) => response,
        Err(error) => match error {},
    }
}

fn json_request(method: &str, uri: &str, cookie: Option<&str>, body: Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(CONTENT_TYPE, "application/json");
    if let Some(cookie) = cookie {
        builder = builder.header(COOKIE, cookie);
    }
    match builder.body(Body::from(body.to_string())) {
        Ok(request) => request,
        Err(error) => panic!("request should build: {error}"),
    }
}

fn get_request(uri: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(COOKIE, cookie);
    }
    match builder.body(Body::empty()) {
        Ok(request) => request,
        Err(error) => panic!("request should build: {error}"),
    }
}

async fn body_json(response: Response) -> Value {
    let bytes = match to_bytes(response.into_body(), usize::MAX).await {
        Ok(bytes) => bytes,
        Err(error) => panic!("body should be readable: {error}"),
    };
    match serde_json::from_slice(&bytes) {
        Ok(value) => value,
        Err(error) => panic!("body should be json: {error}"),
    }
}

fn set_cookie(response: &Response) -> String {
    let Some(cookie) = response
        .headers()
        .get(SET_COOKIE)
        .and_then(|value| value.to_str().ok())
    else {
        panic!("response should set a cookie");
    };
    cookie.to_owned()
}

/// Registers and logs in, returning the `name=value` cookie pair and user id.
async fn sign_in(app: &TestApp, email: &str) -> (String, i64) {
    let registered = send(
        &app.router,
        json_request(
            "POST",
            "/api/auth/register",
            None,
            json!({"email": email, "password": "correct horse"}),
        ),
    )
    .await;
    assert_eq!(registered.status(), StatusCode::CREATED);
    let Some(user_id) = body_json(registered).await["user"]["id"].as_i64() else {
        panic!("registration should return the user id");
    };

    let login = send(
        &app.router,
        json_request(
            "POST",
            "/api/auth/login",
            None,
            json!({"email": email, "password": "correct horse"}),
        ),
    )
    .await;
    assert_eq!(login.status(), StatusCode::OK);
    let cookie = set_cookie(&login);
    let pair = cookie.split(';').next().unwrap_or_default().to_owned();

    (pair, user_id)
}

#[tokio::test]
async fn public_paths_pass_without_a_cookie() {
    let app = test_app();

    let health = send(&app.router, get_request("/health", None)).await;
    assert_eq!(health.status(), StatusCode::OK);
    assert_eq!(body_json(health).await, json!({"status": "ok"}));

    let login_page = send(&app.router, get_request("/login", None)).await;
    assert_eq!(login_page.status(), StatusCode::NOT_FOUND);

    let logout = send(
        &app.router,
        json_request("POST", "/api/auth/logout", None, json!({})),
    )
    .await;
    assert_eq!(logout.status(), StatusCode::OK);
}

#[tokio::test]
async fn page_requests_without_session_redirect_to_login() {
    let app = test_app();

    let risks = send(&app.router, get_request("/risks", None)).await;
    assert_eq!(risks.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(
        risks.headers().get(LOCATION).and_then(|v| v.to_str().ok()),
        Some("/login?redirect=%2Frisks")
    );

    let root = send(&app.router, get_request("/", None)).await;
    assert_eq!(root.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(
        root.headers().get(LOCATION).and_then(|v| v.to_str().ok()),
        Some("/login")
    );
}

#[tokio::test]
async fn api_requests_without_session_get_json_401() {
    let app = test_app();

    let response = send(&app.router, get_request("/api/risk", None)).await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(response.headers().get(SET_COOKIE).is_none());
    assert_eq!(body_json(response).await, json!({"error": "Unauthorized"}));
}

#[tokio::test]
async fn rejected_cookie_is_cleared() {
    let app = test_app();

    let response = send(
        &app.router,
        get_request("/api/risks", Some("aegis_session=not-a-token")),
    )
    .await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let cleared = set_cookie(&response);
    assert!(cleared.starts_with("aegis_session="));
    assert!(cleared.contains("Max-Age=0"));
}

#[tokio::test]
async fn login_cookie_grants_access_to_me() {
    let app = test_app();
    let (cookie, user_id) = sign_in(&app, "Alice@Example.com").await;

    let response = send(&app.router, get_request("/api/auth/me", Some(&cookie))).await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["user"]["id"], json!(user_id));
    assert_eq!(body["user"]["email"], json!("alice@example.com"));
    assert_eq!(body["roles"], json!([]));
    assert_eq!(body["permissions"], json!([]));
}

#[tokio::test]
async fn wrong_password_is_rejected_with_generic_message() {
    let app = test_app();
    sign_in(&app, "bob@example.com").await;

    let response = send(
        &app.router,
        json_request(
            "POST",
            "/api/auth/login",
            None,
            json!({"email": "bob@example.com", "password": "wrong password"}),
        ),
    )
    .await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(
        body_json(response).await,
        json!({"error": "Invalid email or password"})
    );
}

#[tokio::test]
async fn deleted_user_token_is_unauthorized() {
    let app = test_app();
    let (cookie, user_id) = sign_in(&app, "carol@example.com").await;

    let removed = app.security.remove_user(PrincipalId::new(user_id)).await;
    assert!(removed.is_ok());

    let response = send(&app.router, get_request("/api/auth/me", Some(&cookie))).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn risk_scores_are_validated_before_storage() {
    let app = test_app();
    let (cookie, _) = sign_in(&app, "dave@example.com").await;

    let rejected = send(
        &app.router,
        json_request(
            "POST",
            "/api/risks",
            Some(&cookie),
            json!({"code": "R-1", "title": "Vendor outage", "impact": 6, "likelihood": 2}),
        ),
    )
    .await;
    assert_eq!(rejected.status(), StatusCode::BAD_REQUEST);

    let created = send(
        &app.router,
        json_request(
            "POST",
            "/api/risks",
            Some(&cookie),
            json!({"code": "R-1", "title": "Vendor outage", "impact": 4, "likelihood": 5}),
        ),
    )
    .await;
    assert_eq!(created.status(), StatusCode::CREATED);
    let risk = body_json(created).await;
    assert_eq!(risk["rating"], json!(20));
    assert_eq!(risk["level"], json!("critical"));

    let listed = send(&app.router, get_request("/api/risks?per_page=5", Some(&cookie))).await;
    assert_eq!(listed.status(), StatusCode::OK);
    let page = body_json(listed).await;
    assert_eq!(page["pagination"]["total"], json!(1));
    assert_eq!(page["pagination"]["per_page"], json!(5));
}

#[tokio::test]
async fn assigned_role_cannot_be_deleted() {
    let app = test_app();
    let (cookie, user_id) = sign_in(&app, "erin@example.com").await;

    let created = send(
        &app.router,
        json_request(
            "POST",
            "/api/roles",
            Some(&cookie),
            json!({"name": "Auditor", "permissions": ["risk.read", "audit.read"]}),
        ),
    )
    .await;
    assert_eq!(created.status(), StatusCode::CREATED);
    let Some(role_id) = body_json(created).await["id"].as_i64() else {
        panic!("created role should carry an id");
    };

    let assigned = send(
        &app.router,
        json_request(
            "POST",
            "/api/role-assignments",
            Some(&cookie),
            json!({"principal_id": user_id, "role_id": role_id}),
        ),
    )
    .await;
    assert_eq!(assigned.status(), StatusCode::CREATED);

    let permissions = send(
        &app.router,
        get_request(&format!("/api/users/{user_id}/permissions"), Some(&cookie)),
    )
    .await;
    assert_eq!(
        body_json(permissions).await["permissions"],
        json!(["audit.read", "risk.read"])
    );

    let delete_request = Request::builder()
        .method("DELETE")
        .uri(format!("/api/roles/{role_id}"))
        .header(COOKIE, cookie.as_str())
        .body(Body::empty());
    let Ok(delete_request) = delete_request else {
        panic!("delete request should build");
    };
    let deleted = send(&app.router, delete_request).await;
    assert_eq!(deleted.status(), StatusCode::CONFLICT);
    assert_eq!(
        body_json(deleted).await["details"],
        json!({"role_assignments": 1})
    );
}

#[tokio::test]
async fn unknown_api_path_is_json_404_for_signed_in_user() {
    let app = test_app();
    let (cookie, _) = sign_in(&app, "frank@example.com").await;

    let response = send(&app.router, get_request("/api/nothing-here", Some(&cookie))).await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(response).await, json!({"error": "Not found"}));
}

#[tokio::test]
async fn handlers_resolve_the_session_without_the_guard() {
    let app = test_app();
    let (cookie, user_id) = sign_in(&app, "grace@example.com").await;
    let unguarded = build_protected_routes().with_state(app.state.clone());

    let accepted = send(&unguarded, get_request("/api/auth/me", Some(&cookie))).await;
    assert_eq!(accepted.status(), StatusCode::OK);

    for cookie in [None, Some("aegis_session=forged.token.value")] {
        let response = send(&unguarded, get_request("/api/risks", cookie)).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(body_json(response).await, json!({"error": "Unauthorized"}));
    }

    let removed = app.security.remove_user(PrincipalId::new(user_id)).await;
    assert!(removed.is_ok());

    let response = send(&unguarded, get_request("/api/auth/me", Some(&cookie))).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(response).await, json!({"error": "Unauthorized"}));
}

#[tokio::test]
async fn malformed_input_is_a_json_400() {
    let app = test_app();
    let (cookie, _) = sign_in(&app, "heidi@example.com").await;

    let missing_field = send(
        &app.router,
        json_request(
            "POST",
            "/api/risks",
            Some(&cookie),
            json!({"code": "R-2", "title": "No scores", "likelihood": 2}),
        ),
    )
    .await;

    let bad_requests = [
        missing_field,
        send(&app.router, get_request("/api/risks/abc", Some(&cookie))).await,
        send(&app.router, get_request("/api/risks?page=abc", Some(&cookie))).await,
        send(
            &app.router,
            get_request("/api/role-assignments?principal_id=x", Some(&cookie)),
        )
        .await,
    ];

    for response in bad_requests {
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert!(body["error"].is_string());
    }
}
