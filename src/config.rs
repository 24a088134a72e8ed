//! Environment-driven configuration.

use std::env;
use std::net::SocketAddr;
use std::time::Duration;

pub struct Config {
    /// Discord bot token.
    pub token: String,
    /// Address the liveness endpoint binds to.
    pub health_addr: SocketAddr,
    /// How often the idle-room sweep runs.
    pub sweep_interval: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self, crate::Error> {
        let token = env::var("DISCORD_TOKEN").map_err(|_| "Missing DISCORD_TOKEN")?;

        let health_addr = env::var("HEALTH_ADDR")
            .unwrap_or_else(|_| "0.0.0.0:8080".to_string())
            .parse()
            .map_err(|e| format!("Invalid HEALTH_ADDR: {e}"))?;

        let sweep_interval = env::var("ROOM_SWEEP_INTERVAL_SECS")
            .ok()
            .and_then(|value| value.parse().ok())
            .map(Duration::from_secs)
            .unwrap_or(Duration::from_secs(60));

        Ok(Self {
            token,
            health_addr,
            sweep_interval,
        })
    }
}
