use axum::{
    Router,
    routing::{get, post},
};

use super::controller::{
    active_sessions, is_logged_in, login_info, login_user, logout_all_devices, logout_user, me,
    refresh_token, register_user,
};
use crate::state::AppState;

pub fn init_auth_router() -> Router<AppState> {
    Router::new()
        .route("/register", post(register_user))
        .route("/login", post(login_user))
        .route("/logout", post(logout_user))
        .route("/logout-all-devices", post(logout_all_devices))
        .route("/refresh", post(refresh_token))
        .route("/me", get(me))
        .route("/is-logged-in", get(is_logged_in))
        .route("/active-sessions", get(active_sessions))
        .route("/login-info", get(login_info))
}
