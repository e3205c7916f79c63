use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use chrono::Utc;
use tracing::instrument;
use utoipa::ToSchema;

use super::model::{
    ActiveSessionsResponse, IsLoggedInResponse, LoginInfoResponse, LoginRequest, LoginResponse,
    MessageResponse, RegisterRequest, RegisterResponse,
};
use super::service::AuthService;
use crate::middleware::auth::{AuthUser, ClientMeta};
use crate::modules::sessions::guard::SessionGuard;
use crate::modules::users::model::User;
use crate::modules::users::service::UserService;
use crate::state::AppState;
use crate::utils::errors::AppError;
use crate::validator::ValidatedJson;

#[derive(ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

/// Register a new user and log them in
#[utoipa::path(
    post,
    path = "/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "User registered successfully", body = RegisterResponse),
        (status = 422, description = "Validation error or email/username taken", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "Authentication"
)]
#[instrument(skip(state, dto))]
pub async fn register_user(
    State(state): State<AppState>,
    meta: ClientMeta,
    ValidatedJson(dto): ValidatedJson<RegisterRequest>,
) -> Result<(StatusCode, Json<RegisterResponse>), AppError> {
    let response = AuthService::register(
        &state.db,
        &state.jwt_config,
        &state.session_config,
        dto,
        &meta.ip_address,
        meta.user_agent.as_deref(),
    )
    .await?;
    Ok((StatusCode::CREATED, Json(response)))
}

/// Login with email and password
///
/// Rejected with 409 if the user already holds a live session elsewhere.
#[utoipa::path(
    post,
    path = "/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = LoginResponse),
        (status = 401, description = "Wrong email or password", body = ErrorResponse),
        (status = 409, description = "Already logged in on another device", body = ErrorResponse),
        (status = 422, description = "Validation error", body = ErrorResponse)
    ),
    tag = "Authentication"
)]
#[instrument(skip(state, dto))]
pub async fn login_user(
    State(state): State<AppState>,
    meta: ClientMeta,
    ValidatedJson(dto): ValidatedJson<LoginRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    let response = AuthService::login(
        &state.db,
        &state.jwt_config,
        &state.session_config,
        dto,
        &meta.ip_address,
        meta.user_agent.as_deref(),
    )
    .await?;
    Ok(Json(response))
}

/// Logout the current session
#[utoipa::path(
    post,
    path = "/auth/logout",
    responses(
        (status = 200, description = "Signed out", body = MessageResponse),
        (status = 401, description = "Unauthenticated", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Authentication"
)]
pub async fn logout_user(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<MessageResponse>, AppError> {
    AuthService::logout(&state.db, auth.fingerprint()).await?;
    Ok(Json(MessageResponse {
        message: "User successfully signed out".to_string(),
    }))
}

/// Logout from all devices
#[utoipa::path(
    post,
    path = "/auth/logout-all-devices",
    responses(
        (status = 200, description = "All sessions revoked", body = MessageResponse),
        (status = 401, description = "Unauthenticated", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Authentication"
)]
pub async fn logout_all_devices(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<MessageResponse>, AppError> {
    let user_id = auth.user_id()?;
    AuthService::logout_everywhere(&state.db, user_id).await?;
    Ok(Json(MessageResponse {
        message: "Successfully logged out from all devices".to_string(),
    }))
}

/// Exchange the current token for a fresh one
///
/// The old token's session is revoked in the same transaction that registers
/// the new one.
#[utoipa::path(
    post,
    path = "/auth/refresh",
    responses(
        (status = 200, description = "New token issued", body = LoginResponse),
        (status = 401, description = "Invalid or expired token", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Authentication"
)]
#[instrument(skip(state, auth))]
pub async fn refresh_token(
    State(state): State<AppState>,
    meta: ClientMeta,
    auth: AuthUser,
) -> Result<Json<LoginResponse>, AppError> {
    let response = AuthService::refresh(
        &state.db,
        &state.jwt_config,
        &auth.claims,
        auth.fingerprint(),
        &meta.ip_address,
        meta.user_agent.as_deref(),
    )
    .await?;
    Ok(Json(response))
}

/// Current user profile
#[utoipa::path(
    get,
    path = "/auth/me",
    responses(
        (status = 200, description = "Current user", body = User),
        (status = 401, description = "Unauthenticated", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Authentication"
)]
pub async fn me(State(state): State<AppState>, auth: AuthUser) -> Result<Json<User>, AppError> {
    let user = UserService::find_by_id(&state.db, auth.user_id()?)
        .await?
        .ok_or_else(AppError::invalid_token)?;
    Ok(Json(user))
}

/// Check whether the presented token belongs to a live session
///
/// Never fails: a missing, invalid or revoked token answers
/// `is_logged_in: false`.
#[utoipa::path(
    get,
    path = "/auth/is-logged-in",
    responses(
        (status = 200, description = "Login status", body = IsLoggedInResponse)
    ),
    tag = "Authentication"
)]
pub async fn is_logged_in(
    State(state): State<AppState>,
    auth: Option<AuthUser>,
) -> Json<IsLoggedInResponse> {
    let logged_out = IsLoggedInResponse {
        is_logged_in: false,
        user: None,
        active_sessions: None,
    };

    let Some(auth) = auth else {
        return Json(logged_out);
    };
    let Ok(user_id) = auth.user_id() else {
        return Json(logged_out);
    };

    match AuthService::status(&state.db, user_id).await {
        Ok((Some(user), count)) => Json(IsLoggedInResponse {
            is_logged_in: true,
            user: Some(user),
            active_sessions: Some(count),
        }),
        _ => Json(logged_out),
    }
}

/// Live sessions of the current user
///
/// Views carry origin ip, user agent and timestamps only, never the token
/// or its fingerprint.
#[utoipa::path(
    get,
    path = "/auth/active-sessions",
    responses(
        (status = 200, description = "Active sessions", body = ActiveSessionsResponse),
        (status = 401, description = "Unauthenticated", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Authentication"
)]
pub async fn active_sessions(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<ActiveSessionsResponse>, AppError> {
    let sessions = SessionGuard::list_active(&state.db, auth.user_id()?).await?;
    let total_active_sessions = sessions.len();
    Ok(Json(ActiveSessionsResponse {
        sessions,
        total_active_sessions,
    }))
}

/// Last-login metadata for the current user
#[utoipa::path(
    get,
    path = "/auth/login-info",
    responses(
        (status = 200, description = "Login metadata", body = LoginInfoResponse),
        (status = 401, description = "Unauthenticated", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Authentication"
)]
pub async fn login_info(
    State(state): State<AppState>,
    meta: ClientMeta,
    auth: AuthUser,
) -> Result<Json<LoginInfoResponse>, AppError> {
    let user_id = auth.user_id()?;
    let user = UserService::find_by_id(&state.db, user_id)
        .await?
        .ok_or_else(AppError::invalid_token)?;
    let count = SessionGuard::active_count(&state.db, user_id).await?;

    let login_duration = user
        .last_login_at
        .map(|at| (Utc::now() - at).num_minutes().abs());

    Ok(Json(LoginInfoResponse {
        name: user.name,
        email: user.email,
        last_login_at: user.last_login_at,
        last_login_ip: user.last_login_ip,
        current_ip: meta.ip_address,
        login_duration,
        active_sessions_count: count,
    }))
}
