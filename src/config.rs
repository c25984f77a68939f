use anyhow::{bail, Context, Result};
use std::env;
use std::net::SocketAddr;
use std::time::Duration;

const DEFAULT_TIMEOUT_SECS: u64 = 120;

pub struct Config {
    pub api_key: String,
    pub addr: SocketAddr,
    pub upstream_timeout: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let api_key = match get("GEMINI_API_KEY") {
            Some(key) if !key.trim().is_empty() => key.trim().to_string(),
            _ => bail!("GEMINI_API_KEY is not set"),
        };

        let host = get("HOST").unwrap_or_else(|| "0.0.0.0".to_string());
        let port: u16 = get("PORT").and_then(|s| s.parse().ok()).unwrap_or(8080);
        let addr: SocketAddr = format!("{}:{}", host, port).parse().context("invalid HOST/PORT")?;

        let secs = get("UPSTREAM_TIMEOUT_SECS")
            .and_then(|s| s.parse::<u64>().ok())
            .filter(|&s| s > 0)
            .unwrap_or(DEFAULT_TIMEOUT_SECS);

        Ok(Self {
            api_key,
            addr,
            upstream_timeout: Duration::from_secs(secs),
        })
    }
}
