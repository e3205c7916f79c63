use std::env;

#[derive(Clone, Debug)]
pub struct SessionConfig {
    /// Sessions idle longer than this are reaped (marked dead, not deleted).
    pub max_idle_secs: i64,
    /// How often the background reaper sweeps the whole table.
    pub sweep_interval_secs: u64,
}

impl SessionConfig {
    pub fn from_env() -> Self {
        Self {
            max_idle_secs: env::var("SESSION_MAX_IDLE")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(3600), // matches the default token TTL
            sweep_interval_secs: env::var("SESSION_SWEEP_INTERVAL")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(300), // 5 minutes
        }
    }
}
