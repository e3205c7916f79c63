//! Environment-driven configuration.
//!
//! - [`cors`]: allowed origins for the SPA frontend
//! - [`database`]: PostgreSQL pool initialization
//! - [`jwt`]: token secret and TTL
//! - [`session`]: session idle limit and reaper cadence

pub mod cors;
pub mod database;
pub mod jwt;
pub mod session;
