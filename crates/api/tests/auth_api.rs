//! HTTP-level integration tests for login, logout, `me`, and session
//! resolution (cookie, Bearer, expiry, renewal).

mod common;

use axum::body::Body;
use axum::http::header::{COOKIE, SET_COOKIE};
use axum::http::{Request, StatusCode};
use chrono::{Duration, Utc};
use common::{body_json, get, get_auth, post_auth, post_json};
use radiotaxi_core::access::hash_session_token;
use radiotaxi_core::types::Timestamp;
use radiotaxi_db::repositories::UserRepo;
use sqlx::PgPool;

fn set_cookie(response: &axum::response::Response) -> Option<String> {
    response
        .headers()
        .get(SET_COOKIE)
        .map(|v| v.to_str().unwrap().to_string())
}

// ---------------------------------------------------------------------------
// Login
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../db/migrations")]
async fn login_success_sets_session_cookie(pool: PgPool) {
    let seed = common::seed(&pool).await;
    let app = common::build_test_app(pool);

    let body = serde_json::json!({ "username": "cliente1", "password": common::PASSWORD });
    let response = post_json(app, "/api/v1/auth/login", body).await;
    assert_eq!(response.status(), StatusCode::OK);

    let cookie = set_cookie(&response).expect("login must set a cookie");
    assert!(cookie.starts_with("session="));
    assert!(cookie.contains("HttpOnly"));
    assert!(cookie.contains("SameSite=Lax"));
    assert!(cookie.contains("Max-Age=2592000"));
    assert!(!cookie.contains("Secure"), "no Secure flag outside production");

    let json = body_json(response).await;
    let token = json["token"].as_str().unwrap();
    assert!(cookie.contains(token));
    assert_eq!(json["user"]["user_id"], seed.client);
    assert_eq!(json["user"]["role"], "CLIENTE");
    assert!(json["user"]["permissions"]
        .as_array()
        .unwrap()
        .contains(&serde_json::json!("crear_reserva")));
    assert!(json["expires_at"].is_string());
}

#[sqlx::test(migrations = "../db/migrations")]
async fn login_stores_only_the_token_hash(pool: PgPool) {
    common::seed(&pool).await;
    let app = common::build_test_app(pool.clone());

    let token = common::login(app, "admin").await;

    let ids: Vec<String> = sqlx::query_scalar("SELECT id FROM sessions")
        .fetch_all(&pool)
        .await
        .unwrap();
    assert_eq!(ids, vec![hash_session_token(&token)]);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn login_wrong_password_returns_401(pool: PgPool) {
    common::seed(&pool).await;
    let app = common::build_test_app(pool);

    let body = serde_json::json!({ "username": "cliente1", "password": "incorrect" });
    let response = post_json(app, "/api/v1/auth/login", body).await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(response).await["code"], "UNAUTHORIZED");
}

#[sqlx::test(migrations = "../db/migrations")]
async fn login_unknown_user_returns_401(pool: PgPool) {
    let app = common::build_test_app(pool);

    let body = serde_json::json!({ "username": "nobody", "password": "whatever" });
    let response = post_json(app, "/api/v1/auth/login", body).await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn login_with_empty_username_is_a_validation_error(pool: PgPool) {
    let app = common::build_test_app(pool);

    let body = serde_json::json!({ "username": "", "password": "x" });
    let response = post_json(app, "/api/v1/auth/login", body).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["code"], "VALIDATION_ERROR");
}

#[sqlx::test(migrations = "../db/migrations")]
async fn deactivated_user_cannot_log_in(pool: PgPool) {
    let seed = common::seed(&pool).await;
    UserRepo::deactivate(&pool, seed.driver).await.unwrap();
    let app = common::build_test_app(pool);

    let body = serde_json::json!({ "username": "conductor1", "password": common::PASSWORD });
    let response = post_json(app, "/api/v1/auth/login", body).await;

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

// ---------------------------------------------------------------------------
// Session resolution
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../db/migrations")]
async fn me_with_bearer_token(pool: PgPool) {
    let seed = common::seed(&pool).await;
    let app = common::build_test_app(pool);
    let token = common::login(app.clone(), "conductor1").await;

    let response = get_auth(app, "/api/v1/auth/me", &token).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(set_cookie(&response).is_none());

    let json = body_json(response).await;
    assert_eq!(json["data"]["user"]["user_id"], seed.driver);
    assert_eq!(json["data"]["user"]["username"], "conductor1");
    assert_eq!(json["data"]["user"]["role"], "CONDUCTOR");
}

#[sqlx::test(migrations = "../db/migrations")]
async fn me_with_cookie_reissues_the_cookie(pool: PgPool) {
    common::seed(&pool).await;
    let app = common::build_test_app(pool);
    let token = common::login(app.clone(), "cliente1").await;

    let request = Request::get("/api/v1/auth/me")
        .header(COOKIE, format!("theme=dark; session={token}"))
        .body(Body::empty())
        .unwrap();
    let response = common::send(app, request).await;

    assert_eq!(response.status(), StatusCode::OK);
    let cookie = set_cookie(&response).expect("cookie clients get the cookie back");
    assert!(cookie.starts_with(&format!("session={token};")));
}

#[sqlx::test(migrations = "../db/migrations")]
async fn missing_or_unknown_token_is_an_invalid_session(pool: PgPool) {
    let app = common::build_test_app(pool);

    let response = get(app.clone(), "/api/v1/auth/me").await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(response).await["code"], "INVALID_SESSION");

    let response = get_auth(app, "/api/v1/auth/me", "not-a-real-token").await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(response).await["code"], "INVALID_SESSION");
}

#[sqlx::test(migrations = "../db/migrations")]
async fn logout_invalidates_the_session(pool: PgPool) {
    common::seed(&pool).await;
    let app = common::build_test_app(pool);
    let token = common::login(app.clone(), "cliente1").await;

    let response = post_auth(app.clone(), "/api/v1/auth/logout", &token).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    assert!(set_cookie(&response).unwrap().contains("Max-Age=0"));

    let response = get_auth(app, "/api/v1/auth/me", &token).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(response).await["code"], "INVALID_SESSION");
}

#[sqlx::test(migrations = "../db/migrations")]
async fn expired_session_is_purged(pool: PgPool) {
    common::seed(&pool).await;
    let app = common::build_test_app(pool.clone());
    let token = common::login(app.clone(), "cliente1").await;

    sqlx::query("UPDATE sessions SET expires_at = NOW() - INTERVAL '1 minute'")
        .execute(&pool)
        .await
        .unwrap();

    let response = get_auth(app, "/api/v1/auth/me", &token).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(response).await["code"], "INVALID_SESSION");

    let remaining: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM sessions")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(remaining, 0);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn session_near_expiry_is_renewed(pool: PgPool) {
    common::seed(&pool).await;
    let app = common::build_test_app(pool.clone());
    let token = common::login(app.clone(), "cliente1").await;

    sqlx::query("UPDATE sessions SET expires_at = NOW() + INTERVAL '10 days'")
        .execute(&pool)
        .await
        .unwrap();

    let response = get_auth(app, "/api/v1/auth/me", &token).await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    let expires_at: Timestamp = json["data"]["session_expires_at"]
        .as_str()
        .unwrap()
        .parse()
        .unwrap();
    assert!(expires_at > Utc::now() + Duration::days(29));

    let stored: Timestamp = sqlx::query_scalar("SELECT expires_at FROM sessions")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert!(stored > Utc::now() + Duration::days(29));
}

#[sqlx::test(migrations = "../db/migrations")]
async fn deactivating_a_user_kills_their_session(pool: PgPool) {
    let seed = common::seed(&pool).await;
    let app = common::build_test_app(pool.clone());
    let token = common::login(app.clone(), "conductor1").await;

    UserRepo::deactivate(&pool, seed.driver).await.unwrap();

    let response = get_auth(app, "/api/v1/auth/me", &token).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(response).await["code"], "INVALID_SESSION");
}
