use std::sync::Arc;

use axum::{
    Router,
    body::{self, Body},
    http::{Request, StatusCode},
};
use serde_json::json;
use tower::ServiceExt; // for `oneshot`

use photoshare::{
    auth::{Role, TokenPurpose, password},
    db::{account_repo, entities::account, session_repo},
    routes::router,
    services::AuthService,
    state::AppState,
    test_helpers::test_state,
};

async fn app() -> (Arc<AppState>, Router) {
    let state = test_state(b"test-secret").await;
    let router = router(state.clone());
    (state, router)
}

async fn seed_account(
    state: &AppState,
    username: &str,
    email: &str,
    password_value: &str,
    role: Role,
    active: bool,
    confirmed: bool,
) -> account::Model {
    let hash = password::hash_password(password_value).unwrap();
    let account =
        account_repo::create_account(&state.db, username, email, &hash, role.as_str(), confirmed)
            .await
            .unwrap();
    if !active {
        account_repo::set_active(&state.db, &account.id, false)
            .await
            .unwrap();
    }
    account
}

async fn body_json(res: axum::response::Response) -> serde_json::Value {
    let bytes = body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

async fn post_json(app: &Router, uri: &str, payload: serde_json::Value) -> axum::response::Response {
    app.clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header("content-type", "application/json")
                .body(Body::from(payload.to_string()))
                .unwrap(),
        )
        .await
        .unwrap()
}

async fn get_bearer(app: &Router, uri: &str, token: &str) -> axum::response::Response {
    app.clone()
        .oneshot(
            Request::builder()
                .uri(uri)
                .header("authorization", format!("Bearer {token}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap()
}

async fn login(app: &Router, email: &str, password_value: &str) -> (String, String) {
    let res = post_json(
        app,
        "/auth/login",
        json!({"email": email, "password": password_value}),
    )
    .await;
    assert_eq!(res.status(), StatusCode::OK);
    let json = body_json(res).await;
    (
        json["access_token"].as_str().unwrap().to_string(),
        json["refresh_token"].as_str().unwrap().to_string(),
    )
}

#[tokio::test]
async fn health_route_works() {
    let (_state, app) = app().await;

    let res = app
        .oneshot(
            Request::builder()
                .uri("/healthz")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn login_returns_token_pair() {
    let (state, app) = app().await;
    seed_account(
        &state,
        "alice",
        "alice@example.com",
        "password123",
        Role::Member,
        true,
        true,
    )
    .await;

    let res = post_json(
        &app,
        "/auth/login",
        json!({"email": "alice@example.com", "password": "password123"}),
    )
    .await;

    assert_eq!(res.status(), StatusCode::OK);
    let json = body_json(res).await;
    assert!(json["access_token"].as_str().is_some());
    assert!(json["refresh_token"].as_str().is_some());
    assert_eq!(json["token_type"], "Bearer");
}

#[tokio::test]
async fn login_with_wrong_password_is_unauthorized() {
    let (state, app) = app().await;
    seed_account(
        &state,
        "alice",
        "alice@example.com",
        "password123",
        Role::Member,
        true,
        true,
    )
    .await;

    let res = post_json(
        &app,
        "/auth/login",
        json!({"email": "alice@example.com", "password": "wrong-password"}),
    )
    .await;

    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(res).await["error"], "Invalid credentials");
}

#[tokio::test]
async fn login_with_unknown_email_is_unauthorized() {
    let (_state, app) = app().await;

    let res = post_json(
        &app,
        "/auth/login",
        json!({"email": "ghost@example.com", "password": "password123"}),
    )
    .await;

    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(res).await["error"], "Invalid credentials");
}

#[tokio::test]
async fn login_blocked_account_is_forbidden() {
    let (state, app) = app().await;
    seed_account(
        &state,
        "banned",
        "banned@example.com",
        "password123",
        Role::Member,
        false,
        true,
    )
    .await;

    let res = post_json(
        &app,
        "/auth/login",
        json!({"email": "banned@example.com", "password": "password123"}),
    )
    .await;

    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    assert_eq!(body_json(res).await["error"], "Account blocked");
}

#[tokio::test]
async fn login_unconfirmed_account_is_unauthorized() {
    let (state, app) = app().await;
    seed_account(
        &state,
        "fresh",
        "fresh@example.com",
        "password123",
        Role::Member,
        true,
        false,
    )
    .await;

    let res = post_json(
        &app,
        "/auth/login",
        json!({"email": "fresh@example.com", "password": "password123"}),
    )
    .await;

    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(res).await["error"], "Email not confirmed");
}

#[tokio::test]
async fn me_without_token_is_rejected() {
    let (_state, app) = app().await;

    let res = app
        .oneshot(
            Request::builder()
                .uri("/users/me")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn me_with_token_returns_profile() {
    let (state, app) = app().await;
    seed_account(
        &state,
        "alice",
        "alice@example.com",
        "password123",
        Role::Member,
        true,
        true,
    )
    .await;
    let (access, _refresh) = login(&app, "alice@example.com", "password123").await;

    let res = get_bearer(&app, "/users/me", &access).await;

    assert_eq!(res.status(), StatusCode::OK);
    let json = body_json(res).await;
    assert_eq!(json["username"], "alice");
    assert_eq!(json["role"], "member");
}

#[tokio::test]
async fn refresh_token_is_rejected_on_protected_routes() {
    let (state, app) = app().await;
    seed_account(
        &state,
        "alice",
        "alice@example.com",
        "password123",
        Role::Member,
        true,
        true,
    )
    .await;
    let (_access, refresh) = login(&app, "alice@example.com", "password123").await;

    let res = get_bearer(&app, "/users/me", &refresh).await;

    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn access_token_cannot_be_used_to_refresh() {
    let (state, app) = app().await;
    seed_account(
        &state,
        "alice",
        "alice@example.com",
        "password123",
        Role::Member,
        true,
        true,
    )
    .await;
    let (access, _refresh) = login(&app, "alice@example.com", "password123").await;

    let res = get_bearer(&app, "/auth/refresh", &access).await;

    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(res).await["error"], "Invalid refresh token");
}

#[tokio::test]
async fn refresh_rotates_the_pair_and_invalidates_the_old_token() {
    let (state, app) = app().await;
    seed_account(
        &state,
        "alice",
        "alice@example.com",
        "password123",
        Role::Member,
        true,
        true,
    )
    .await;
    let (_access, refresh) = login(&app, "alice@example.com", "password123").await;

    let res = get_bearer(&app, "/auth/refresh", &refresh).await;
    assert_eq!(res.status(), StatusCode::OK);
    let json = body_json(res).await;
    let rotated = json["refresh_token"].as_str().unwrap().to_string();
    assert_ne!(rotated, refresh);

    // reuse of the pre-rotation token is stale
    let res = get_bearer(&app, "/auth/refresh", &refresh).await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(res).await["error"], "Invalid refresh token");

    // the stale presentation cleared the whole session, so even the rotated
    // token is now dead and a full re-login is required
    let res = get_bearer(&app, "/auth/refresh", &rotated).await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    login(&app, "alice@example.com", "password123").await;
}

#[tokio::test]
async fn concurrent_refreshes_with_the_same_token_admit_exactly_one() {
    let (state, app) = app().await;
    let account = seed_account(
        &state,
        "alice",
        "alice@example.com",
        "password123",
        Role::Member,
        true,
        true,
    )
    .await;
    let (_access, refresh) = login(&app, "alice@example.com", "password123").await;

    // two racers present the same stored token; the conditional swap lets
    // exactly one of them through
    let service = AuthService::new(&state.db, &state.tokens);
    let (first, second) = tokio::join!(service.refresh(&refresh), service.refresh(&refresh));
    assert!(first.is_ok() != second.is_ok());

    // the loser cleared the session on its stale presentation
    let session = session_repo::get_refresh(&state.db, &account.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(session.token, None);
}

#[tokio::test]
async fn logout_revokes_the_access_token_immediately() {
    let (state, app) = app().await;
    let account = seed_account(
        &state,
        "alice",
        "alice@example.com",
        "password123",
        Role::Member,
        true,
        true,
    )
    .await;
    let (access, refresh) = login(&app, "alice@example.com", "password123").await;

    let res = get_bearer(&app, "/auth/logout", &access).await;
    assert_eq!(res.status(), StatusCode::OK);

    // the session row survives with its token cleared
    let session = session_repo::get_refresh(&state.db, &account.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(session.token, None);

    // the token still satisfies signature and expiry, but resolution fails
    let res = get_bearer(&app, "/users/me", &access).await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    // the refresh session was cleared as well
    let res = get_bearer(&app, "/auth/refresh", &refresh).await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    // second logout with the same token fails at the revocation check
    let res = get_bearer(&app, "/auth/logout", &access).await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn first_registration_bootstraps_a_confirmed_admin() {
    let (_state, app) = app().await;

    let res = post_json(
        &app,
        "/auth/register",
        json!({"username": "root", "email": "root@example.com", "password": "password123"}),
    )
    .await;
    assert_eq!(res.status(), StatusCode::CREATED);
    let json = body_json(res).await;
    assert_eq!(json["role"], "admin");
    assert_eq!(json["confirmed"], true);

    let res = post_json(
        &app,
        "/auth/register",
        json!({"username": "second", "email": "second@example.com", "password": "password123"}),
    )
    .await;
    assert_eq!(res.status(), StatusCode::CREATED);
    let json = body_json(res).await;
    assert_eq!(json["role"], "member");
    assert_eq!(json["confirmed"], false);
}

#[tokio::test]
async fn duplicate_registration_conflicts() {
    let (_state, app) = app().await;

    let payload =
        json!({"username": "root", "email": "root@example.com", "password": "password123"});
    let res = post_json(&app, "/auth/register", payload.clone()).await;
    assert_eq!(res.status(), StatusCode::CREATED);

    let res = post_json(&app, "/auth/register", payload).await;
    assert_eq!(res.status(), StatusCode::CONFLICT);

    // same username, different email
    let res = post_json(
        &app,
        "/auth/register",
        json!({"username": "root", "email": "other@example.com", "password": "password123"}),
    )
    .await;
    assert_eq!(res.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn email_confirmation_unlocks_login() {
    let (state, app) = app().await;
    seed_account(
        &state,
        "fresh",
        "fresh@example.com",
        "password123",
        Role::Member,
        true,
        false,
    )
    .await;

    let token = state
        .tokens
        .issue("fresh@example.com", TokenPurpose::Email)
        .unwrap();
    let res = app
        .clone()
        .oneshot(
            Request::builder()
                .uri(format!("/auth/confirm/{token}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(body_json(res).await["message"], "Email confirmed");

    login(&app, "fresh@example.com", "password123").await;

    // confirming twice is reported distinctly
    let res = app
        .clone()
        .oneshot(
            Request::builder()
                .uri(format!("/auth/confirm/{token}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(body_json(res).await["message"], "Email already confirmed");
}

#[tokio::test]
async fn access_token_cannot_confirm_email() {
    let (state, app) = app().await;
    seed_account(
        &state,
        "fresh",
        "fresh@example.com",
        "password123",
        Role::Member,
        true,
        false,
    )
    .await;

    let token = state
        .tokens
        .issue("fresh@example.com", TokenPurpose::Access)
        .unwrap();
    let res = app
        .clone()
        .oneshot(
            Request::builder()
                .uri(format!("/auth/confirm/{token}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn banning_an_account_cuts_off_live_tokens() {
    let (state, app) = app().await;
    let account = seed_account(
        &state,
        "alice",
        "alice@example.com",
        "password123",
        Role::Member,
        true,
        true,
    )
    .await;
    let (access, _refresh) = login(&app, "alice@example.com", "password123").await;

    account_repo::set_active(&state.db, &account.id, false)
        .await
        .unwrap();

    // no caching of account state: the very next resolve sees the ban
    let res = get_bearer(&app, "/users/me", &access).await;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    assert_eq!(body_json(res).await["error"], "Account blocked");
}
