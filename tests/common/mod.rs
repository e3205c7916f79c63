use axum::Router;
use axum::body::Body;
use axum::http::Request;
use http_body_util::BodyExt;
use sqlx::PgPool;
use tower::ServiceExt;
use uuid::Uuid;

use workforce_api::config::cors::CorsConfig;
use workforce_api::config::jwt::JwtConfig;
use workforce_api::config::session::SessionConfig;
use workforce_api::router::init_router;
use workforce_api::state::AppState;
use workforce_api::utils::password::hash_password;

#[allow(dead_code)]
pub struct TestUser {
    pub id: Uuid,
    pub email: String,
    pub password: String,
}

pub fn test_jwt_config() -> JwtConfig {
    JwtConfig {
        secret: "test_secret_key_for_testing_purposes".to_string(),
        access_token_expiry: 3600,
    }
}

#[allow(dead_code)]
pub fn test_session_config() -> SessionConfig {
    SessionConfig {
        max_idle_secs: 1800, // 30 minutes
        sweep_interval_secs: 300,
    }
}

pub fn setup_test_app(pool: PgPool) -> Router {
    let state = AppState {
        db: pool,
        jwt_config: test_jwt_config(),
        session_config: test_session_config(),
        cors_config: CorsConfig {
            allowed_origins: vec!["http://localhost:5173".to_string()],
        },
    };
    init_router(state)
}

pub fn generate_unique_email() -> String {
    format!("user-{}@test.com", Uuid::new_v4())
}

pub async fn create_test_user(pool: &PgPool, email: &str, password: &str) -> TestUser {
    let hashed = hash_password(password).unwrap();
    let username = format!("user-{}", Uuid::new_v4());

    let (id,): (Uuid,) = sqlx::query_as(
        "INSERT INTO users (name, username, email, password)
         VALUES ($1, $2, $3, $4)
         RETURNING id",
    )
    .bind("Test User")
    .bind(&username)
    .bind(email)
    .bind(&hashed)
    .fetch_one(pool)
    .await
    .unwrap();

    TestUser {
        id,
        email: email.to_string(),
        password: password.to_string(),
    }
}

/// Inserts a session row directly, bypassing the guard. `minutes_ago` sets
/// last-activity in the past for reaper tests.
#[allow(dead_code)]
pub async fn seed_session(
    pool: &PgPool,
    user_id: Uuid,
    token_hash: &str,
    is_active: bool,
    minutes_ago: i64,
) {
    sqlx::query(
        "INSERT INTO user_sessions (user_id, token, token_hash, ip_address, user_agent, last_activity, is_active)
         VALUES ($1, $2, $3, $4, $5, NOW() - make_interval(mins => $6), $7)",
    )
    .bind(user_id)
    .bind(format!("raw-token-{token_hash}"))
    .bind(token_hash)
    .bind("10.0.0.1")
    .bind("seed-agent")
    .bind(minutes_ago as i32)
    .bind(is_active)
    .execute(pool)
    .await
    .unwrap();
}

/// Removes the one-live-session-per-user index so tests can seed invariant
/// violations (e.g. a user with several live sessions).
#[allow(dead_code)]
pub async fn drop_exclusivity_index(pool: &PgPool) {
    sqlx::query("DROP INDEX uniq_user_sessions_one_live")
        .execute(pool)
        .await
        .unwrap();
}

#[allow(dead_code)]
pub async fn live_session_count(pool: &PgPool, user_id: Uuid) -> i64 {
    let (count,): (i64,) = sqlx::query_as(
        "SELECT COUNT(*) FROM user_sessions WHERE user_id = $1 AND is_active = TRUE",
    )
    .bind(user_id)
    .fetch_one(pool)
    .await
    .unwrap();
    count
}

#[allow(dead_code)]
pub async fn total_session_count(pool: &PgPool, user_id: Uuid) -> i64 {
    let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM user_sessions WHERE user_id = $1")
        .bind(user_id)
        .fetch_one(pool)
        .await
        .unwrap();
    count
}

/// POSTs `/auth/login`, returning status and parsed body.
#[allow(dead_code)]
pub async fn login(
    app: Router,
    email: &str,
    password: &str,
) -> (axum::http::StatusCode, serde_json::Value) {
    let request = Request::builder()
        .method("POST")
        .uri("/auth/login")
        .header("content-type", "application/json")
        .header("x-forwarded-for", "192.168.1.10")
        .header("user-agent", "integration-test")
        .body(Body::from(
            serde_json::to_string(&serde_json::json!({
                "email": email,
                "password": password
            }))
            .unwrap(),
        ))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    let body: serde_json::Value = serde_json::from_slice(&body).unwrap();
    (status, body)
}

/// Sends an authenticated request with an empty body.
#[allow(dead_code)]
pub async fn send_with_token(
    app: Router,
    method: &str,
    uri: &str,
    token: &str,
) -> (axum::http::StatusCode, serde_json::Value) {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header("authorization", format!("Bearer {token}"))
        .header("x-forwarded-for", "192.168.1.10")
        .header("user-agent", "integration-test")
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    let body: serde_json::Value = if body.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(&body).unwrap()
    };
    (status, body)
}
