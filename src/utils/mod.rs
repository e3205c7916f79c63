//! Shared utilities.
//!
//! - [`errors`]: application error type and stable client-facing codes
//! - [`fingerprint`]: one-way token fingerprinting
//! - [`jwt`]: access token creation and verification
//! - [`password`]: password hashing and verification

pub mod errors;
pub mod fingerprint;
pub mod jwt;
pub mod password;
