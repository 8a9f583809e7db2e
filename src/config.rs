// src/config.rs

use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;
use url::Url;

use crate::draft::ImageScope;

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("brak wymaganej zmiennej środowiskowej {0}")]
    Missing(&'static str),

    #[error("niepoprawna wartość {name}='{value}'")]
    Invalid { name: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub api_url: Url,
    pub bind_addr: SocketAddr,
    pub image_scope: ImageScope,
    pub http_timeout: Duration,
    pub session_idle: Duration,
    pub delete_confirm_ttl: Duration,
    pub static_dir: PathBuf,
    pub max_upload_bytes: usize,
}

const DEFAULT_MAX_UPLOAD_BYTES: usize = 20 * 1024 * 1024;
// moka odrzuca czasy bezczynności dłuższe niż 1000 lat
const MAX_SESSION_IDLE_MINUTES: u64 = 365 * 24 * 60;

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Buduje konfigurację z dowolnego źródła zmiennych (w testach z mapy).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &'static str| lookup(name).filter(|value| !value.trim().is_empty());

        let raw_url = get("API_URL").ok_or(ConfigError::Missing("API_URL"))?;
        let api_url = Url::parse(raw_url.trim()).map_err(|_| ConfigError::Invalid {
            name: "API_URL",
            value: raw_url.clone(),
        })?;

        Ok(Self {
            api_url,
            bind_addr: parse("BIND_ADDR", get("BIND_ADDR"), || {
                SocketAddr::from(([0, 0, 0, 0], 3000))
            })?,
            image_scope: parse("IMAGE_SCOPE", get("IMAGE_SCOPE"), ImageScope::default)?,
            http_timeout: Duration::from_secs(parse(
                "HTTP_TIMEOUT_SECS",
                get("HTTP_TIMEOUT_SECS"),
                || 30,
            )?),
            session_idle: Duration::from_secs(
                parse::<u64, _>("SESSION_IDLE_MINUTES", get("SESSION_IDLE_MINUTES"), || 120)?
                    .min(MAX_SESSION_IDLE_MINUTES)
                    .saturating_mul(60),
            ),
            delete_confirm_ttl: Duration::from_secs(parse(
                "DELETE_CONFIRM_TTL_SECS",
                get("DELETE_CONFIRM_TTL_SECS"),
                || 300,
            )?),
            static_dir: get("STATIC_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("static")),
            max_upload_bytes: parse("MAX_UPLOAD_BYTES", get("MAX_UPLOAD_BYTES"), || {
                DEFAULT_MAX_UPLOAD_BYTES
            })?,
        })
    }
}

fn parse<T, D>(name: &'static str, raw: Option<String>, default: D) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    D: FnOnce() -> T,
{
    match raw {
        None => Ok(default()),
        Some(value) => value.trim().parse().map_err(|_| ConfigError::Invalid {
            name,
            value,
        }),
    }
}
