use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;

/// Signing secret used when `SATCHEL_JWT_SECRET` is unset. Development only.
pub const DEV_JWT_SECRET: &str = "dev-secret-change-me";

/// Process configuration, read from `SATCHEL_*` environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub data_dir: PathBuf,
    pub translate_url: String,
    pub translate_api_key: Option<String>,
    /// Real length of one timer minute
    pub timer_unit: Duration,
    /// HS256 secret shared with the chat front end that mints Identify tokens
    pub jwt_secret: String,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(var: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let port = match var("SATCHEL_PORT") {
            Some(port) => port.parse().context("SATCHEL_PORT must be a port number")?,
            None => 3000,
        };
        let unit_secs: u64 = match var("SATCHEL_TIMER_UNIT_SECS") {
            Some(secs) => secs
                .parse()
                .context("SATCHEL_TIMER_UNIT_SECS must be a whole number of seconds")?,
            None => 60,
        };
        if unit_secs == 0 {
            anyhow::bail!("SATCHEL_TIMER_UNIT_SECS must be greater than zero");
        }

        Ok(Self {
            host: var("SATCHEL_HOST").unwrap_or_else(|| "0.0.0.0".into()),
            port,
            data_dir: PathBuf::from(var("SATCHEL_DATA_DIR").unwrap_or_else(|| ".".into())),
            translate_url: var("SATCHEL_TRANSLATE_URL")
                .unwrap_or_else(|| "http://127.0.0.1:5000".into()),
            translate_api_key: var("SATCHEL_TRANSLATE_API_KEY").filter(|key| !key.is_empty()),
            timer_unit: Duration::from_secs(unit_secs),
            jwt_secret: var("SATCHEL_JWT_SECRET")
                .filter(|secret| !secret.is_empty())
                .unwrap_or_else(|| DEV_JWT_SECRET.into()),
        })
    }

    pub fn addr(&self) -> anyhow::Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .with_context(|| format!("invalid listen address {}:{}", self.host, self.port))
    }
}
