//! Session bookkeeping: one durable record per issued token.
//!
//! - [`model`]: the `Session` row and its client-safe view
//! - [`store`]: SQL access, keyed by fingerprint and by owner
//! - [`guard`]: the exclusivity policy layer
//! - [`reaper`]: background idle-session sweep

pub mod guard;
pub mod model;
pub mod reaper;
pub mod store;
