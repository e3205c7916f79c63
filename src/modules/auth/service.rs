use serde_json::json;
use sqlx::PgPool;
use tracing::instrument;
use uuid::Uuid;

use crate::config::jwt::JwtConfig;
use crate::config::session::SessionConfig;
use crate::modules::sessions::guard::{SessionError, SessionGuard};
use crate::modules::sessions::store::{CreateSessionError, SessionStore};
use crate::modules::users::model::{User, UserWithPassword};
use crate::modules::users::service::UserService;
use crate::utils::errors::{AppError, codes};
use crate::utils::fingerprint::token_fingerprint;
use crate::utils::jwt::create_access_token;
use crate::utils::password::{hash_password, verify_password};

use super::model::{Claims, LoginRequest, LoginResponse, RegisterRequest, RegisterResponse};

pub struct AuthService;

impl AuthService {
    /// Credential check, token issue, session registration, in that order.
    ///
    /// When the guard refuses the login the freshly minted token is dropped
    /// here and never serialized into any response.
    #[instrument(skip(db, jwt_config, session_config, dto))]
    pub async fn login(
        db: &PgPool,
        jwt_config: &JwtConfig,
        session_config: &SessionConfig,
        dto: LoginRequest,
        ip_address: &str,
        user_agent: Option<&str>,
    ) -> Result<LoginResponse, AppError> {
        let user = UserService::find_by_email(db, &dto.email)
            .await?
            .ok_or_else(AppError::bad_credentials)?;

        if !verify_password(&dto.password, &user.password)? {
            return Err(AppError::bad_credentials());
        }

        let token =
            Self::issue_and_register(db, jwt_config, session_config, &user, ip_address, user_agent)
                .await?;

        UserService::update_last_login(db, user.id, ip_address).await;

        Ok(LoginResponse::new(
            token,
            jwt_config.access_token_expiry,
            user.into(),
        ))
    }

    /// Registers a new user and logs them in immediately.
    #[instrument(skip(db, jwt_config, session_config, dto))]
    pub async fn register(
        db: &PgPool,
        jwt_config: &JwtConfig,
        session_config: &SessionConfig,
        dto: RegisterRequest,
        ip_address: &str,
        user_agent: Option<&str>,
    ) -> Result<RegisterResponse, AppError> {
        if UserService::email_or_username_taken(db, &dto.email, &dto.username).await? {
            return Err(AppError::unprocessable(anyhow::anyhow!(
                "Email or username already taken"
            )));
        }

        let password_hash = hash_password(&dto.password)?;
        let user =
            UserService::create(db, &dto.name, &dto.username, &dto.email, &password_hash).await?;

        let with_password = UserWithPassword {
            id: user.id,
            name: user.name.clone(),
            username: user.username.clone(),
            email: user.email.clone(),
            password: password_hash,
            last_login_at: user.last_login_at,
            last_login_ip: user.last_login_ip.clone(),
            created_at: user.created_at,
        };

        let token = Self::issue_and_register(
            db,
            jwt_config,
            session_config,
            &with_password,
            ip_address,
            user_agent,
        )
        .await?;

        UserService::update_last_login(db, user.id, ip_address).await;

        Ok(RegisterResponse {
            message: "User successfully registered".to_string(),
            user,
            access_token: token,
            token_type: "bearer".to_string(),
            expires_in: jwt_config.access_token_expiry,
        })
    }

    /// Revokes the presenting token's session. Idempotent.
    pub async fn logout(db: &PgPool, token_hash: &str) -> Result<(), AppError> {
        SessionGuard::logout(db, token_hash).await
    }

    /// Revokes all of the user's sessions, including the presenting one.
    pub async fn logout_everywhere(db: &PgPool, user_id: Uuid) -> Result<u64, AppError> {
        SessionGuard::logout_everywhere(db, user_id).await
    }

    /// Issues a new token and rebinds the session to it: the old session is
    /// marked dead and the new one registered in a single transaction, so
    /// the exclusivity invariant holds at every instant and the old token is
    /// rejected by the liveness gate immediately afterwards.
    #[instrument(skip(db, jwt_config, claims, old_token_hash))]
    pub async fn refresh(
        db: &PgPool,
        jwt_config: &JwtConfig,
        claims: &Claims,
        old_token_hash: &str,
        ip_address: &str,
        user_agent: Option<&str>,
    ) -> Result<LoginResponse, AppError> {
        let user_id = Uuid::parse_str(&claims.sub).map_err(|_| AppError::invalid_token())?;

        let user = UserService::find_by_id(db, user_id)
            .await?
            .ok_or_else(AppError::invalid_token)?;

        let (new_token, _expires_at) = create_access_token(user.id, &user.email, jwt_config)?;
        let new_hash = token_fingerprint(&new_token);

        let mut tx = db.begin().await.map_err(AppError::database)?;

        SessionStore::mark_dead(&mut *tx, old_token_hash).await?;

        match SessionStore::create(
            &mut *tx,
            user.id,
            &new_token,
            &new_hash,
            ip_address,
            user_agent,
        )
        .await
        {
            Ok(_) => {}
            Err(CreateSessionError::DuplicateFingerprint) => {
                tracing::error!(user_id = %user.id, "token fingerprint collision on refresh");
                return Err(AppError::internal(anyhow::anyhow!(
                    "token fingerprint collision"
                )));
            }
            Err(CreateSessionError::LiveSessionExists) => {
                // Another session for this user went live between gate and
                // rebind; surface it as the usual conflict.
                return Err(AppError::conflict(
                    codes::ALREADY_LOGGED_IN,
                    anyhow::anyhow!("User is already logged in on another device"),
                )
                .with_details(json!({
                    "active_sessions": 1,
                    "last_login_at": user.last_login_at,
                    "last_login_ip": user.last_login_ip,
                })));
            }
            Err(CreateSessionError::Db(err)) => return Err(AppError::database(err)),
        }

        tx.commit().await.map_err(AppError::database)?;

        Ok(LoginResponse::new(
            new_token,
            jwt_config.access_token_expiry,
            user,
        ))
    }

    async fn issue_and_register(
        db: &PgPool,
        jwt_config: &JwtConfig,
        session_config: &SessionConfig,
        user: &UserWithPassword,
        ip_address: &str,
        user_agent: Option<&str>,
    ) -> Result<String, AppError> {
        let (token, _expires_at) = create_access_token(user.id, &user.email, jwt_config)?;
        let token_hash = token_fingerprint(&token);

        match SessionGuard::attempt_login(
            db,
            session_config,
            user.id,
            &token,
            &token_hash,
            ip_address,
            user_agent,
        )
        .await
        {
            // `token` is moved out only on success; every error arm below
            // drops it.
            Ok(_session) => Ok(token),
            Err(SessionError::AlreadyLoggedIn { active_sessions }) => Err(AppError::conflict(
                codes::ALREADY_LOGGED_IN,
                anyhow::anyhow!("User is already logged in on another device"),
            )
            .with_details(json!({
                "active_sessions": active_sessions,
                "last_login_at": user.last_login_at,
                "last_login_ip": user.last_login_ip,
            }))),
            Err(SessionError::DuplicateFingerprint) => Err(AppError::internal(anyhow::anyhow!(
                "token fingerprint collision"
            ))),
            Err(SessionError::Storage(err)) => Err(err),
        }
    }

    /// Status view of the presented token: who is logged in, how many live
    /// sessions they hold.
    pub async fn status(db: &PgPool, user_id: Uuid) -> Result<(Option<User>, i64), AppError> {
        let user = UserService::find_by_id(db, user_id).await?;
        let count = SessionGuard::active_count(db, user_id).await?;
        Ok((user, count))
    }
}
