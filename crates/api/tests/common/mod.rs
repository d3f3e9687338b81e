#![allow(dead_code)]

use std::sync::OnceLock;
use std::time::Duration;

use axum::body::Body;
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{HeaderName, Method, Request, StatusCode};
use axum::response::Response;
use axum::Router;
use http_body_util::BodyExt;
use rust_decimal::Decimal;
use sqlx::PgPool;
use tower::ServiceExt;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::CorsLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

use radiotaxi_api::auth::password::hash_password;
use radiotaxi_api::config::ServerConfig;
use radiotaxi_api::routes;
use radiotaxi_api::state::AppState;
use radiotaxi_core::types::DbId;
use radiotaxi_db::models::catalog::{CreateOffering, CreateTaxi};
use radiotaxi_db::models::user::CreateUser;
use radiotaxi_db::repositories::{OfferingRepo, RoleRepo, TaxiRepo, UserRepo};

pub const PASSWORD: &str = "radiotaxi-test-pass";

/// Build a test `ServerConfig` with safe defaults.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        app_env: "development".to_string(),
        session_sweep_interval_secs: 3600,
    }
}

/// Build the full application router with all middleware layers.
///
/// Mirrors the router construction in `main.rs` so integration tests
/// exercise the same middleware stack production uses.
pub fn build_test_app(pool: PgPool) -> Router {
    let state = AppState::new(pool, test_config());

    let cors = CorsLayer::new()
        .allow_origin(["http://localhost:5173".parse().unwrap()])
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([CONTENT_TYPE, AUTHORIZATION])
        .allow_credentials(true)
        .max_age(Duration::from_secs(3600));

    let request_id_header = HeaderName::from_static("x-request-id");

    Router::new()
        .merge(routes::health::router())
        .nest("/api/v1", routes::api_routes())
        .layer(CatchPanicLayer::new())
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            Duration::from_secs(30),
        ))
        .layer(PropagateRequestIdLayer::new(request_id_header.clone()))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(SetRequestIdLayer::new(request_id_header, MakeRequestUuid))
        .layer(cors)
        .with_state(state)
}

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

pub async fn send(app: Router, request: Request<Body>) -> Response {
    app.oneshot(request).await.unwrap()
}

pub async fn get(app: Router, uri: &str) -> Response {
    send(app, Request::get(uri).body(Body::empty()).unwrap()).await
}

pub async fn get_auth(app: Router, uri: &str, token: &str) -> Response {
    let request = Request::get(uri)
        .header(AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap();
    send(app, request).await
}

pub async fn post_json(app: Router, uri: &str, body: serde_json::Value) -> Response {
    let request = Request::post(uri)
        .header(CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    send(app, request).await
}

pub async fn post_json_auth(
    app: Router,
    uri: &str,
    body: serde_json::Value,
    token: &str,
) -> Response {
    let request = Request::post(uri)
        .header(CONTENT_TYPE, "application/json")
        .header(AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::from(body.to_string()))
        .unwrap();
    send(app, request).await
}

/// POST without a body.
pub async fn post_auth(app: Router, uri: &str, token: &str) -> Response {
    let request = Request::post(uri)
        .header(AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap();
    send(app, request).await
}

pub async fn body_json(response: Response) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

// ---------------------------------------------------------------------------
// Seed data
// ---------------------------------------------------------------------------

pub struct Seed {
    pub client: DbId,
    pub other_client: DbId,
    pub admin: DbId,
    pub driver: DbId,
    pub other_driver: DbId,
    pub priced_rate: DbId,
    pub unpriced_rate: DbId,
}

/// Argon2 is slow in debug builds; hash the shared test password once.
fn password_hash() -> String {
    static HASH: OnceLock<String> = OnceLock::new();
    HASH.get_or_init(|| hash_password(PASSWORD).expect("hashing should succeed"))
        .clone()
}

pub async fn create_user(pool: &PgPool, username: &str, role: &str) -> DbId {
    let role_id = RoleRepo::find_id_by_name(pool, role)
        .await
        .unwrap()
        .expect("seeded role");
    UserRepo::create(
        pool,
        &CreateUser {
            username: username.into(),
            full_name: format!("{username} test"),
            email: Some(format!("{username}@radiotaxi.test")),
            phone: None,
            password_hash: password_hash(),
            role_id,
        },
    )
    .await
    .expect("user creation should succeed")
    .id
}

/// Users of every role, taxis `T1` and `T2`, and two offerings of service
/// `EJECUTIVO`: one at 12.50 and one without a price.
pub async fn seed(pool: &PgPool) -> Seed {
    let client = create_user(pool, "cliente1", "CLIENTE").await;
    let other_client = create_user(pool, "cliente2", "CLIENTE").await;
    let admin = create_user(pool, "admin", "ADMINISTRADOR").await;
    let driver = create_user(pool, "conductor1", "CONDUCTOR").await;
    let other_driver = create_user(pool, "conductor2", "CONDUCTOR").await;

    for plate in ["T1", "T2"] {
        TaxiRepo::create(
            pool,
            &CreateTaxi {
                plate: plate.into(),
                model: None,
            },
        )
        .await
        .unwrap();
    }

    let priced_rate = OfferingRepo::create(
        pool,
        &CreateOffering {
            service_code: "EJECUTIVO".into(),
            service_name: "Ejecutivo".into(),
            rate_name: "Tarifa plana".into(),
            price: Some(Decimal::new(1250, 2)),
        },
    )
    .await
    .unwrap()
    .rate_id;

    let unpriced_rate = OfferingRepo::create(
        pool,
        &CreateOffering {
            service_code: "EJECUTIVO".into(),
            service_name: "Ejecutivo".into(),
            rate_name: "Sin precio".into(),
            price: None,
        },
    )
    .await
    .unwrap()
    .rate_id;

    Seed {
        client,
        other_client,
        admin,
        driver,
        other_driver,
        priced_rate,
        unpriced_rate,
    }
}

/// Log in through the API and return the session token.
pub async fn login(app: Router, username: &str) -> String {
    let body = serde_json::json!({ "username": username, "password": PASSWORD });
    let response = post_json(app, "/api/v1/auth/login", body).await;
    assert_eq!(response.status(), StatusCode::OK);
    body_json(response).await["token"]
        .as_str()
        .expect("login response carries a token")
        .to_string()
}
