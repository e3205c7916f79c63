//! Request extractors for cross-cutting concerns.
//!
//! - [`auth`]: bearer-token authentication (`AuthUser`) and client origin
//!   metadata (`ClientMeta`)
//!
//! # Authentication flow
//!
//! 1. Client sends `Authorization: Bearer <token>`
//! 2. `AuthUser` verifies the JWT (signature, expiry)
//! 3. The token's session must still be live in the session store
//! 4. Last-activity is touched, best effort, and the handler runs

pub mod auth;
