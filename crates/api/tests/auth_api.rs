mod common;

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use serde_json::json;

use common::{body_json, get, post_json, send, set_cookie, setup, EMPLOYEE_TOKEN};

#[tokio::test]
async fn login_sets_session_cookie_and_returns_identity() {
    let (fake, app) = setup().await;

    let response = post_json(
        app,
        "/api/auth/login",
        None,
        json!({ "email": "anna@example.com", "password": "secret-pass" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let cookie = set_cookie(&response).unwrap();
    assert!(cookie.starts_with(&format!("be_access={EMPLOYEE_TOKEN};")));
    assert!(cookie.contains("HttpOnly"));
    assert!(cookie.contains("SameSite=Lax"));
    assert!(cookie.contains("Max-Age=900"));
    assert!(cookie.contains("Secure"));

    let json = body_json(response).await;
    assert_eq!(json["data"]["id"], "u1");
    assert_eq!(json["data"]["role"], "EMPLOYEE");

    let me = fake.last(Method::GET, "/users/me").unwrap();
    assert_eq!(
        me.authorization.as_deref(),
        Some("Bearer employee-token")
    );
}

#[tokio::test]
async fn login_accepts_nested_snake_case_token() {
    let (_fake, app) = setup().await;

    let response = post_json(
        app,
        "/api/auth/login",
        None,
        json!({ "email": "admin@example.com", "password": "admin-pass" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(set_cookie(&response).unwrap().starts_with("be_access=admin-token;"));
}

#[tokio::test]
async fn wrong_password_is_401_and_clears_cookie() {
    let (_fake, app) = setup().await;

    let response = post_json(
        app,
        "/api/auth/login",
        None,
        json!({ "email": "anna@example.com", "password": "nope" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(set_cookie(&response).unwrap().contains("Max-Age=0"));

    let json = body_json(response).await;
    assert_eq!(json["error"], "E-Mail oder Passwort ist falsch.");
    assert_eq!(json["redirect"], "/login");
}

#[tokio::test]
async fn malformed_email_is_rejected_before_upstream() {
    let (fake, app) = setup().await;

    let response = post_json(
        app,
        "/api/auth/login",
        None,
        json!({ "email": "not-an-email", "password": "x" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(fake.count(Method::POST, "/auth/login"), 0);
}

#[tokio::test]
async fn logout_clears_the_cookie() {
    let (_fake, app) = setup().await;

    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/auth/logout")
        .body(Body::empty())
        .unwrap();
    let response = send(app, request).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let cookie = set_cookie(&response).unwrap();
    assert!(cookie.starts_with("be_access=;"));
    assert!(cookie.contains("Max-Age=0"));
}

#[tokio::test]
async fn me_without_session_is_401_with_redirect() {
    let (fake, app) = setup().await;

    let response = get(app, "/api/auth/me", None).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let json = body_json(response).await;
    assert_eq!(json["redirect"], "/login");
    assert!(fake.calls().is_empty());
}

#[tokio::test]
async fn me_accepts_bearer_header_as_fallback() {
    let (_fake, app) = setup().await;

    let request = Request::builder()
        .uri("/api/auth/me")
        .header(header::AUTHORIZATION, "Bearer admin-token")
        .body(Body::empty())
        .unwrap();
    let response = send(app, request).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["data"]["role"], "ADMIN");
}

#[tokio::test]
async fn expired_upstream_token_is_401() {
    let (_fake, app) = setup().await;

    let response = get(app, "/api/auth/me", Some("stale-token")).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(set_cookie(&response).is_some());
}
