//! Periodic sweep that marks idle sessions dead.
//!
//! The per-owner reap inside `attempt_login` keeps logins correct on its
//! own; this task keeps the rest of the table from accumulating stale live
//! flags between logins.

use std::time::Duration;

use chrono::Utc;
use sqlx::PgPool;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{info, warn};

use super::store::SessionStore;
use crate::config::session::SessionConfig;

pub fn spawn(pool: PgPool, config: SessionConfig) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(config.sweep_interval_secs));
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            interval.tick().await;

            match SessionStore::purge_expired(&pool, Utc::now(), config.max_idle_secs).await {
                Ok(0) => {}
                Ok(reaped) => info!(reaped, "session sweep marked idle sessions dead"),
                Err(err) => warn!(error = %err.error, "session sweep failed"),
            }
        }
    })
}
