use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::modules::auth::controller::ErrorResponse;
use crate::modules::auth::model::{
    ActiveSessionsResponse, IsLoggedInResponse, LoginInfoResponse, LoginRequest, LoginResponse,
    MessageResponse, RegisterRequest, RegisterResponse,
};
use crate::modules::sessions::model::SessionView;
use crate::modules::users::model::User;

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::modules::auth::controller::register_user,
        crate::modules::auth::controller::login_user,
        crate::modules::auth::controller::logout_user,
        crate::modules::auth::controller::logout_all_devices,
        crate::modules::auth::controller::refresh_token,
        crate::modules::auth::controller::me,
        crate::modules::auth::controller::is_logged_in,
        crate::modules::auth::controller::active_sessions,
        crate::modules::auth::controller::login_info,
    ),
    components(
        schemas(
            User,
            SessionView,
            LoginRequest,
            LoginResponse,
            RegisterRequest,
            RegisterResponse,
            MessageResponse,
            IsLoggedInResponse,
            ActiveSessionsResponse,
            LoginInfoResponse,
            ErrorResponse,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Authentication", description = "Login, logout and session management")
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}
