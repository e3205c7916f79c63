use std::time::Duration;

use uuid::Uuid;
use workforce_api::config::jwt::JwtConfig;
use workforce_api::utils::jwt::{create_access_token, verify_token};

fn get_test_jwt_config() -> JwtConfig {
    JwtConfig {
        secret: "test_secret_key_for_testing_purposes".to_string(),
        access_token_expiry: 3600,
    }
}

#[test]
fn test_create_access_token_success() {
    let jwt_config = get_test_jwt_config();
    let user_id = Uuid::new_v4();

    let result = create_access_token(user_id, "test@example.com", &jwt_config);

    assert!(result.is_ok());
    let (token, expires_at) = result.unwrap();
    assert!(!token.is_empty());
    assert!(expires_at > chrono::Utc::now());
}

#[test]
fn test_verify_token_success() {
    let jwt_config = get_test_jwt_config();
    let user_id = Uuid::new_v4();
    let email = "test@example.com";

    let (token, _) = create_access_token(user_id, email, &jwt_config).unwrap();
    let claims = verify_token(&token, &jwt_config).unwrap();

    assert_eq!(claims.sub, user_id.to_string());
    assert_eq!(claims.email, email);
}

#[test]
fn test_tokens_are_unique_per_issue() {
    // Same subject, same second: the jti claim must still make the tokens
    // (and hence their fingerprints) distinct.
    let jwt_config = get_test_jwt_config();
    let user_id = Uuid::new_v4();

    let (first, _) = create_access_token(user_id, "test@example.com", &jwt_config).unwrap();
    let (second, _) = create_access_token(user_id, "test@example.com", &jwt_config).unwrap();

    assert_ne!(first, second);
}

#[test]
fn test_verify_token_invalid() {
    let jwt_config = get_test_jwt_config();

    assert!(verify_token("invalid.token.here", &jwt_config).is_err());
}

#[test]
fn test_verify_token_empty() {
    let jwt_config = get_test_jwt_config();

    assert!(verify_token("", &jwt_config).is_err());
}

#[test]
fn test_verify_token_wrong_secret() {
    let jwt_config = get_test_jwt_config();
    let user_id = Uuid::new_v4();

    let (token, _) = create_access_token(user_id, "test@example.com", &jwt_config).unwrap();

    let wrong_jwt_config = JwtConfig {
        secret: "different_secret_key".to_string(),
        access_token_expiry: 3600,
    };

    assert!(verify_token(&token, &wrong_jwt_config).is_err());
}

#[test]
fn test_expired_token_fails_verification() {
    // 1-second TTL; after 2 seconds the token must be rejected no matter
    // what the session store says.
    let jwt_config = JwtConfig {
        secret: "test_secret_key_for_testing_purposes".to_string(),
        access_token_expiry: 1,
    };
    let user_id = Uuid::new_v4();

    let (token, _) = create_access_token(user_id, "test@example.com", &jwt_config).unwrap();
    assert!(verify_token(&token, &jwt_config).is_ok());

    std::thread::sleep(Duration::from_secs(2));

    assert!(verify_token(&token, &jwt_config).is_err());
}
