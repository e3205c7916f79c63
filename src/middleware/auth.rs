use std::convert::Infallible;
use std::net::{IpAddr, SocketAddr};

use axum::{
    extract::{ConnectInfo, FromRequestParts, OptionalFromRequestParts},
    http::{header, request::Parts},
};
use uuid::Uuid;

use crate::modules::auth::model::Claims;
use crate::modules::sessions::guard::SessionGuard;
use crate::modules::sessions::model::Session;
use crate::state::AppState;
use crate::utils::errors::AppError;
use crate::utils::fingerprint::token_fingerprint;
use crate::utils::jwt::verify_token;

/// Extractor for authenticated requests.
///
/// Two gates, in order: the token must verify (signature + expiry), and its
/// session row must still be live. A cryptographically valid token whose
/// session was revoked is rejected the same way as a forged one. On success
/// the session's last-activity is touched, best effort.
#[derive(Debug)]
pub struct AuthUser {
    pub claims: Claims,
    pub session: Session,
}

impl AuthUser {
    pub fn user_id(&self) -> Result<Uuid, AppError> {
        Uuid::parse_str(&self.claims.sub).map_err(|_| AppError::invalid_token())
    }

    /// Fingerprint of the presenting token.
    pub fn fingerprint(&self) -> &str {
        &self.session.token_hash
    }

    pub fn email(&self) -> &str {
        &self.claims.email
    }
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(AppError::invalid_token)?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .ok_or_else(AppError::invalid_token)?;

        let claims = verify_token(token, &state.jwt_config)?;

        let fingerprint = token_fingerprint(token);
        let session = SessionGuard::check_live(&state.db, &fingerprint)
            .await?
            .ok_or_else(AppError::invalid_token)?;

        SessionGuard::touch(&state.db, &fingerprint).await;

        Ok(AuthUser { claims, session })
    }
}

/// `Option<AuthUser>` never rejects: endpoints like `/auth/is-logged-in`
/// answer "no" instead of failing.
impl OptionalFromRequestParts<AppState> for AuthUser {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Option<Self>, Self::Rejection> {
        Ok(<AuthUser as FromRequestParts<AppState>>::from_request_parts(parts, state)
            .await
            .ok())
    }
}

/// Request origin metadata recorded on each session.
#[derive(Debug, Clone)]
pub struct ClientMeta {
    pub ip_address: String,
    pub user_agent: Option<String>,
}

/// Proxy headers are client-controlled; only a value that parses as an IP
/// address is trusted. Anything else falls through to the socket address.
fn header_ip(parts: &Parts, name: &str) -> Option<IpAddr> {
    parts
        .headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .and_then(|value| value.trim().parse().ok())
}

impl<S> FromRequestParts<S> for ClientMeta
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        // Proxy headers first, then the socket address.
        let ip_address = header_ip(parts, "x-forwarded-for")
            .or_else(|| header_ip(parts, "x-real-ip"))
            .map(|ip| ip.to_string())
            .or_else(|| {
                parts
                    .extensions
                    .get::<ConnectInfo<SocketAddr>>()
                    .map(|ConnectInfo(addr)| addr.ip().to_string())
            })
            .unwrap_or_else(|| "unknown".to_string());

        let user_agent = parts
            .headers
            .get(header::USER_AGENT)
            .and_then(|value| value.to_str().ok())
            .map(|value| value.to_string());

        Ok(ClientMeta {
            ip_address,
            user_agent,
        })
    }
}
