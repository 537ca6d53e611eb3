use anyhow::{Context, Result};

/// Application configuration loaded from environment variables.
/// Everything has a sensible default; the service starts with no .env at all.
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub rust_log: String,
    /// Maximum undo-and-retry steps before the engine declares infeasibility.
    pub solver_max_backtracks: u64,
    /// Wall-clock ceiling for one generation search, in milliseconds.
    pub solver_timeout_ms: u64,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            port: env_or("PORT", "8080")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            solver_max_backtracks: env_or("SOLVER_MAX_BACKTRACKS", "10000")?,
            solver_timeout_ms: env_or("SOLVER_TIMEOUT_MS", "2000")?,
        })
    }
}

fn env_or<T: std::str::FromStr>(key: &str, default: &str) -> Result<T>
where
    T::Err: std::error::Error + Send + Sync + 'static,
{
    std::env::var(key)
        .unwrap_or_else(|_| default.to_string())
        .parse::<T>()
        .with_context(|| format!("Environment variable '{key}' has an invalid value"))
}
